//! Positional flat-text parser for the Hapoel Jerusalem fan-club schedule.
//!
//! The page renders its upcoming-fixtures table without reliable per-field
//! markup, so structure is recovered from the fixed emission order of fields
//! relative to the date line, the only unambiguous anchor:
//!
//! ```text
//! time?, venue?, guest, home, date
//! ```

use chrono::DateTime;
use chrono_tz::Tz;
use regex::Regex;
use tfc_core::{local_kickoff, Fixture, ScheduleRules, SourceId};
use tracing::warn;

use crate::{parse_hm, visible_text_lines, SourceError};

pub const SCHEDULE_URL: &str = "https://www.hjfc.co.il/schedule";

/// Exact heading of the upcoming-fixtures section.
const UPCOMING_HEADER: &str = "משחקים קרובים";

/// Column labels: time, pitch, guest, host, date.
const COLUMN_HEADERS: [&str; 5] = ["שעה", "מגרש", "אורחת", "מארחת", "תאריך"];

/// Lines that end the upcoming section: the completed-fixtures heading, its
/// column labels, and repeated header tokens that double as boundaries.
const SECTION_BREAKERS: [&str; 6] = [
    "משחקים שהסתיימו",
    "שעה",
    "תוצאה",
    "אורחת",
    "מארחת",
    "תאריך",
];

/// Extract upcoming Teddy fixtures from the fan-club page.
///
/// A missing section heading is recoverable: the source simply yields zero
/// fixtures for this run.
pub fn parse_schedule(
    html: &str,
    rules: &ScheduleRules,
    now: DateTime<Tz>,
) -> Result<Vec<Fixture>, SourceError> {
    let lines = visible_text_lines(html);
    let Some(start) = lines.iter().position(|line| line == UPCOMING_HEADER) else {
        warn!("upcoming-fixtures section not found on fan-club page");
        return Ok(Vec::new());
    };
    let (fixtures, _cursor) = scan_upcoming_rows(&lines, start, rules, now)?;
    Ok(fixtures)
}

/// Scan fixture rows from `start` (the section heading) until a section
/// boundary or the end of input. Returns the fixtures plus the line index
/// where scanning stopped.
pub fn scan_upcoming_rows(
    lines: &[String],
    start: usize,
    rules: &ScheduleRules,
    now: DateTime<Tz>,
) -> Result<(Vec<Fixture>, usize), SourceError> {
    let date_line =
        Regex::new(r"^\d{2}/\d{2}/\d{4}$").map_err(|e| SourceError::Message(e.to_string()))?;
    let time_prefix =
        Regex::new(r"^\d{2}:\d{2}").map_err(|e| SourceError::Message(e.to_string()))?;

    let mut fixtures = Vec::new();
    let mut i = start + 1;

    // Column labels sit directly under the heading, in any order and with
    // repetitions.
    while i < lines.len() && COLUMN_HEADERS.contains(&lines[i].as_str()) {
        i += 1;
    }

    while i < lines.len() {
        let line = lines[i].as_str();
        if SECTION_BREAKERS.contains(&line) {
            break;
        }

        if date_line.is_match(line) {
            let preceding = collect_preceding(lines, start, i, &date_line);
            let home_team = from_end(&preceding, 1);
            let guest_team = from_end(&preceding, 2);
            let venue = from_end(&preceding, 3);
            let time_label = from_end(&preceding, 4);

            let hapoel_at_teddy =
                rules.keywords.is_hapoel(home_team) && rules.keywords.at_teddy(venue);
            let derby = rules.keywords.is_derby(home_team, guest_team);
            if hapoel_at_teddy || derby {
                if let Some(kickoff) = row_kickoff(line, time_label, &time_prefix, rules) {
                    if kickoff > now {
                        fixtures.push(Fixture {
                            home_team: home_team.to_string(),
                            away_team: guest_team.to_string(),
                            kickoff,
                            venue: rules.venue_label.clone(),
                            source: SourceId::Hapoel,
                        });
                    }
                }
            }
        }

        i += 1;
    }

    Ok((fixtures, i))
}

/// Up to 4 lines immediately before the date line, document order preserved;
/// the walk stops early at another date, a header token, or the heading.
fn collect_preceding<'a>(
    lines: &'a [String],
    start: usize,
    date_idx: usize,
    date_line: &Regex,
) -> Vec<&'a str> {
    let mut preceding = Vec::new();
    let mut j = date_idx;
    while j > start && preceding.len() < 4 {
        let prev = lines[j - 1].as_str();
        if date_line.is_match(prev) {
            break;
        }
        if COLUMN_HEADERS.contains(&prev) || prev == UPCOMING_HEADER {
            break;
        }
        preceding.insert(0, prev);
        j -= 1;
    }
    preceding
}

/// Right-aligned positional slot, `n` counted 1-based from the date line.
/// Missing slots read as empty, which the keyword filter then rejects.
fn from_end<'a>(items: &[&'a str], n: usize) -> &'a str {
    items
        .len()
        .checked_sub(n)
        .map(|idx| items[idx])
        .unwrap_or("")
}

fn row_kickoff(
    date: &str,
    time_label: &str,
    time_prefix: &Regex,
    rules: &ScheduleRules,
) -> Option<DateTime<Tz>> {
    let mut parts = date.splitn(3, '/');
    let day: u32 = parts.next()?.parse().ok()?;
    let month: u32 = parts.next()?.parse().ok()?;
    let year: i32 = parts.next()?.parse().ok()?;
    let (hour, minute) = if time_prefix.is_match(time_label) {
        parse_hm(time_label)?
    } else {
        rules.default_kickoff
    };
    let (hour, minute) = rules.coerce_tbd_time(hour, minute);
    local_kickoff(year, month, day, hour, minute)
}
