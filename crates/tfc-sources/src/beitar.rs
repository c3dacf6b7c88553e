//! Structured parser for the Beitar Jerusalem official schedule page.

use chrono::DateTime;
use chrono_tz::Tz;
use regex::Regex;
use scraper::Html;
use tfc_core::{local_kickoff, Fixture, ScheduleRules, SourceId};
use tracing::debug;

use crate::{parse_hm, parse_selector, scoped_first_text, SourceError};

/// Official schedule page; the path is the Hebrew word for "matches".
pub const SCHEDULE_URL: &str =
    "https://www.beitarfc.co.il/%D7%9E%D7%A9%D7%97%D7%A7%D7%99%D7%9D/";

/// Date/time token inside a block's free-text info field: `DD/MM/YY -> HH:MM`.
const INFO_TOKEN: &str = r"(\d{2}/\d{2}/\d{2})\s*->\s*(\d{2}:\d{2})";

/// Extract upcoming Teddy fixtures from the official site markup.
///
/// A block is included when Beitar is the home side or the pairing is a
/// Jerusalem derby. Blocks missing a required sub-element or the date token
/// are skipped; kickoffs not strictly after `now` are dropped.
pub fn parse_schedule(
    html: &str,
    rules: &ScheduleRules,
    now: DateTime<Tz>,
) -> Result<Vec<Fixture>, SourceError> {
    let document = Html::parse_document(html);
    let block_sel = parse_selector(".game_list_item")?;
    let home_sel = parse_selector(".teams_names .home")?;
    let away_sel = parse_selector(".teams_names .away")?;
    let info_sel = parse_selector(".game_info")?;
    let token = Regex::new(INFO_TOKEN).map_err(|e| SourceError::Message(e.to_string()))?;

    let blocks: Vec<_> = document.select(&block_sel).collect();
    debug!(blocks = blocks.len(), "official-site fixture blocks found");

    let mut fixtures = Vec::new();
    for item in blocks {
        let Some(home_name) = scoped_first_text(item, &home_sel) else {
            continue;
        };
        let Some(away_name) = scoped_first_text(item, &away_sel) else {
            continue;
        };

        let beitar_home = rules.keywords.is_beitar(&home_name);
        let derby = rules.keywords.is_derby(&home_name, &away_name);
        if !beitar_home && !derby {
            continue;
        }

        // TBD fixtures sometimes ship without the date token; there is no
        // fallback date.
        let Some(info_text) = scoped_first_text(item, &info_sel) else {
            continue;
        };
        let Some(caps) = token.captures(&info_text) else {
            continue;
        };

        let Some(kickoff) = kickoff_from_token(&caps[1], &caps[2], rules) else {
            continue;
        };
        if kickoff <= now {
            continue;
        }

        fixtures.push(Fixture {
            home_team: home_name,
            away_team: away_name,
            kickoff,
            venue: rules.venue_label.clone(),
            source: SourceId::Beitar,
        });
    }

    Ok(fixtures)
}

/// Two-digit years are 20xx; placeholder times (hour below the floor) are
/// coerced to the default kickoff.
fn kickoff_from_token(date: &str, time: &str, rules: &ScheduleRules) -> Option<DateTime<Tz>> {
    let mut parts = date.splitn(3, '/');
    let day: u32 = parts.next()?.parse().ok()?;
    let month: u32 = parts.next()?.parse().ok()?;
    let year: i32 = parts.next()?.parse::<i32>().ok()? + 2000;
    let (hour, minute) = parse_hm(time)?;
    let (hour, minute) = rules.coerce_tbd_time(hour, minute);
    local_kickoff(year, month, day, hour, minute)
}
