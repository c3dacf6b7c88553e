//! iCalendar rendering of the reconciled fixture list.

use chrono::{DateTime, Utc};
use ical::generator::*;
use ical::ical_property;
use ical::property::Property;
use sha2::{Digest, Sha256};
use tfc_core::{Fixture, ScheduleRules};

pub const CRATE_NAME: &str = "tfc-ics";

pub const PRODID: &str = "-//Teddy Stadium Football//EN";
pub const CALENDAR_NAME: &str = "Teddy Stadium Matches";
pub const LOCATION: &str = "Teddy Stadium, Jerusalem";

/// Deterministic event identifier derived from the fixture's local date and
/// team names. Stable across runs, so re-generating the calendar does not
/// spawn duplicate events in subscribed clients.
pub fn event_uid(fixture: &Fixture) -> String {
    let date = fixture.kickoff.format("%Y%m%d");
    let mut hasher = Sha256::new();
    hasher.update(
        format!("{date}-{}-{}", fixture.home_team, fixture.away_team).as_bytes(),
    );
    let digest = hex::encode(hasher.finalize());
    format!("teddy-{date}-{}@football-matches", &digest[..8])
}

fn utc_stamp(instant: DateTime<Utc>) -> String {
    instant.format("%Y%m%dT%H%M%S").to_string()
}

/// Render the fixtures as a VCALENDAR document. Event times are emitted in
/// UTC; `generated_at` becomes each event's DTSTAMP.
pub fn render_calendar(
    fixtures: &[Fixture],
    rules: &ScheduleRules,
    generated_at: DateTime<Utc>,
) -> String {
    let mut cal = IcalCalendarBuilder::version("2.0")
        .noscale()
        .prodid(PRODID)
        .set(ical_property!("X-WR-CALNAME", CALENDAR_NAME))
        .set(ical_property!("X-WR-TIMEZONE", "Asia/Jerusalem"))
        .build();
    cal.properties.push(ical_property!("CALSCALE", "GREGORIAN"));

    for fixture in fixtures {
        let start = fixture.kickoff.with_timezone(&Utc);
        let end = start + rules.match_duration;
        let summary = format!("⚽ {} vs {}", fixture.home_team, fixture.away_team);

        let event = IcalEventBuilder::tzid("UTC")
            .uid(event_uid(fixture))
            .changed(utc_stamp(generated_at))
            .start(utc_stamp(start))
            .end(utc_stamp(end))
            .set(ical_property!("SUMMARY", summary))
            .set(ical_property!("LOCATION", LOCATION))
            .build();
        cal.events.push(event);
    }

    cal.generate()
}
