//! Core domain model and matching rules for the Teddy Stadium fixture feed.

use chrono::{DateTime, Duration, TimeZone};
use chrono_tz::Tz;
use serde::Serialize;

pub const CRATE_NAME: &str = "tfc-core";

/// Civil timezone of Teddy Stadium; every kickoff is expressed in it.
pub const STADIUM_TZ: Tz = chrono_tz::Asia::Jerusalem;

/// Which club site produced a fixture record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SourceId {
    Beitar,
    Hapoel,
}

/// A single scheduled match at Teddy Stadium.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fixture {
    pub home_team: String,
    pub away_team: String,
    pub kickoff: DateTime<Tz>,
    pub venue: String,
    pub source: SourceId,
}

impl Fixture {
    /// Order-independent team pairing, used as the duplicate key: a derby
    /// reads home/away flipped between the two sites.
    pub fn pair_key(&self) -> (&str, &str) {
        let (a, b) = (self.home_team.as_str(), self.away_team.as_str());
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }
}

/// Substring keywords recognising the two Jerusalem clubs and their shared
/// ground. Substring matching against the scraped Hebrew labels is deliberate:
/// neither site is consistent about full club names.
#[derive(Debug, Clone)]
pub struct ClubKeywords {
    pub beitar: String,
    pub hapoel: String,
    pub teddy: String,
}

impl Default for ClubKeywords {
    fn default() -> Self {
        Self {
            beitar: "בית".to_string(),
            hapoel: "הפועל ירושלים".to_string(),
            teddy: "טדי".to_string(),
        }
    }
}

impl ClubKeywords {
    pub fn is_beitar(&self, team: &str) -> bool {
        team.contains(&self.beitar)
    }

    pub fn is_hapoel(&self, team: &str) -> bool {
        team.contains(&self.hapoel)
    }

    pub fn at_teddy(&self, venue: &str) -> bool {
        venue.contains(&self.teddy)
    }

    /// A Jerusalem derby is always played at Teddy, whichever club is
    /// nominally home.
    pub fn is_derby(&self, home: &str, away: &str) -> bool {
        (self.is_beitar(home) && self.is_hapoel(away))
            || (self.is_hapoel(home) && self.is_beitar(away))
    }
}

/// Immutable parsing/reconciliation configuration shared by both parsers and
/// the reconciler.
#[derive(Debug, Clone)]
pub struct ScheduleRules {
    pub keywords: ClubKeywords,
    pub venue_label: String,
    /// Kickoff used when a site has not announced a real time yet.
    pub default_kickoff: (u32, u32),
    /// Announced hours below this are placeholder values for an unconfirmed
    /// kickoff and are replaced by `default_kickoff`.
    pub plausible_hour_floor: u32,
    pub duplicate_window: Duration,
    pub match_duration: Duration,
}

impl Default for ScheduleRules {
    fn default() -> Self {
        Self {
            keywords: ClubKeywords::default(),
            venue_label: "Teddy Stadium".to_string(),
            default_kickoff: (20, 30),
            plausible_hour_floor: 10,
            duplicate_window: Duration::days(3),
            match_duration: Duration::hours(2) + Duration::minutes(30),
        }
    }
}

impl ScheduleRules {
    pub fn coerce_tbd_time(&self, hour: u32, minute: u32) -> (u32, u32) {
        if hour < self.plausible_hour_floor {
            self.default_kickoff
        } else {
            (hour, minute)
        }
    }
}

/// Build a stadium-local kickoff; `None` when the civil datetime is invalid.
/// A DST-ambiguous wall time resolves to its earlier reading.
pub fn local_kickoff(
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
) -> Option<DateTime<Tz>> {
    STADIUM_TZ
        .with_ymd_and_hms(year, month, day, hour, minute, 0)
        .earliest()
}
