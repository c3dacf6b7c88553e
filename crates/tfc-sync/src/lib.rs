//! Sequential fetch → parse → reconcile → render pipeline.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tfc_core::{Fixture, ScheduleRules, SourceId, STADIUM_TZ};
use tfc_fetch::{HttpClientConfig, HttpFetcher};
use tracing::info;
use uuid::Uuid;

pub const CRATE_NAME: &str = "tfc-sync";

#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub output_path: PathBuf,
    pub http_timeout_secs: u64,
    pub user_agent: Option<String>,
    pub beitar_url: String,
    pub hapoel_url: String,
}

impl SyncConfig {
    pub fn from_env() -> Self {
        Self {
            output_path: std::env::var("TFC_OUTPUT_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("docs/teddy_matches.ics")),
            http_timeout_secs: std::env::var("TFC_HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            user_agent: std::env::var("TFC_USER_AGENT").ok(),
            beitar_url: std::env::var("TFC_BEITAR_URL")
                .unwrap_or_else(|_| tfc_sources::beitar::SCHEDULE_URL.to_string()),
            hapoel_url: std::env::var("TFC_HAPOEL_URL")
                .unwrap_or_else(|_| tfc_sources::hapoel::SCHEDULE_URL.to_string()),
        }
    }
}

/// Collapse both sources' candidate lists into one ordered, duplicate-free
/// list.
///
/// Two records describe the same real-world match when their unordered team
/// pair matches and the kickoffs lie within the duplicate window; the record
/// from the home club's own site supersedes the other, and any other
/// duplicate is dropped first-seen-wins.
pub fn reconcile(rules: &ScheduleRules, mut candidates: Vec<Fixture>) -> Vec<Fixture> {
    candidates.sort_by_key(|f| f.kickoff);

    let mut unique: Vec<Fixture> = Vec::new();
    for candidate in candidates {
        let mut duplicate = false;
        for existing in unique.iter_mut() {
            if existing.pair_key() != candidate.pair_key() {
                continue;
            }
            if (candidate.kickoff - existing.kickoff).abs() > rules.duplicate_window {
                continue;
            }

            let home_is_hapoel = rules.keywords.is_hapoel(&existing.home_team);
            if home_is_hapoel && candidate.source == SourceId::Hapoel {
                *existing = candidate.clone();
            } else if !home_is_hapoel && candidate.source == SourceId::Beitar {
                *existing = candidate.clone();
            }
            duplicate = true;
            break;
        }
        if !duplicate {
            unique.push(candidate);
        }
    }

    unique.sort_by_key(|f| f.kickoff);
    unique
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncRunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub beitar_candidates: usize,
    pub hapoel_candidates: usize,
    pub unique_fixtures: usize,
    pub output_path: String,
}

#[derive(Debug)]
pub struct CollectedFixtures {
    pub fixtures: Vec<Fixture>,
    pub beitar_candidates: usize,
    pub hapoel_candidates: usize,
}

pub struct SyncPipeline {
    config: SyncConfig,
    rules: ScheduleRules,
    http: HttpFetcher,
}

impl SyncPipeline {
    pub fn new(config: SyncConfig) -> Result<Self> {
        let mut http_config = HttpClientConfig {
            timeout: Duration::from_secs(config.http_timeout_secs),
            ..Default::default()
        };
        if let Some(user_agent) = &config.user_agent {
            http_config.user_agent = user_agent.clone();
        }
        let http = HttpFetcher::new(&http_config)?;
        Ok(Self {
            config,
            rules: ScheduleRules::default(),
            http,
        })
    }

    pub fn with_rules(mut self, rules: ScheduleRules) -> Self {
        self.rules = rules;
        self
    }

    /// Fetch both sources sequentially and return the reconciled list.
    /// Either fetch failing is fatal for the whole run; a parse yielding
    /// zero fixtures is not.
    pub fn collect_fixtures(&self) -> Result<CollectedFixtures> {
        let now = Utc::now().with_timezone(&STADIUM_TZ);

        let beitar_html = self
            .http
            .fetch_text("beitar", &self.config.beitar_url)
            .context("fetching the Beitar schedule page")?;
        let beitar = tfc_sources::beitar::parse_schedule(&beitar_html, &self.rules, now)
            .context("parsing the Beitar schedule page")?;
        info!(fixtures = beitar.len(), "parsed official-site schedule");

        let hapoel_html = self
            .http
            .fetch_text("hapoel", &self.config.hapoel_url)
            .context("fetching the Hapoel schedule page")?;
        let hapoel = tfc_sources::hapoel::parse_schedule(&hapoel_html, &self.rules, now)
            .context("parsing the Hapoel schedule page")?;
        info!(fixtures = hapoel.len(), "parsed fan-club schedule");

        let beitar_candidates = beitar.len();
        let hapoel_candidates = hapoel.len();
        let mut candidates = beitar;
        candidates.extend(hapoel);

        Ok(CollectedFixtures {
            fixtures: reconcile(&self.rules, candidates),
            beitar_candidates,
            hapoel_candidates,
        })
    }

    /// Full run: collect, render the calendar, write it to disk.
    pub fn run_once(&self) -> Result<SyncRunSummary> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();

        let collected = self.collect_fixtures()?;
        let calendar = tfc_ics::render_calendar(&collected.fixtures, &self.rules, started_at);

        if let Some(parent) = self.config.output_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
        }
        fs::write(&self.config.output_path, calendar)
            .with_context(|| format!("writing {}", self.config.output_path.display()))?;

        let finished_at = Utc::now();
        info!(
            %run_id,
            fixtures = collected.fixtures.len(),
            output = %self.config.output_path.display(),
            "calendar written"
        );

        Ok(SyncRunSummary {
            run_id,
            started_at,
            finished_at,
            beitar_candidates: collected.beitar_candidates,
            hapoel_candidates: collected.hapoel_candidates,
            unique_fixtures: collected.fixtures.len(),
            output_path: self.config.output_path.display().to_string(),
        })
    }
}

pub fn run_sync_once_from_env() -> Result<SyncRunSummary> {
    SyncPipeline::new(SyncConfig::from_env())?.run_once()
}

pub fn preview_from_env() -> Result<Vec<Fixture>> {
    let pipeline = SyncPipeline::new(SyncConfig::from_env())?;
    Ok(pipeline.collect_fixtures()?.fixtures)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tfc_core::local_kickoff;

    const BEITAR: &str = "בית\"ר ירושלים";
    const HAPOEL: &str = "הפועל ירושלים";
    const HAIFA: &str = "מכבי חיפה";

    fn mk(
        home: &str,
        away: &str,
        day: u32,
        hour: u32,
        minute: u32,
        source: SourceId,
    ) -> Fixture {
        Fixture {
            home_team: home.to_string(),
            away_team: away.to_string(),
            kickoff: local_kickoff(2031, 3, day, hour, minute).unwrap(),
            venue: "Teddy Stadium".to_string(),
            source,
        }
    }

    #[test]
    fn a_two_source_derby_collapses_to_the_home_sites_record() {
        let rules = ScheduleRules::default();
        let merged = reconcile(
            &rules,
            vec![
                mk(BEITAR, HAPOEL, 1, 20, 30, SourceId::Beitar),
                mk(HAPOEL, BEITAR, 2, 18, 0, SourceId::Hapoel),
            ],
        );
        // Beitar is home per the first-accepted record, so the official
        // Beitar entry survives and the fan-club one is dropped.
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].source, SourceId::Beitar);
        assert_eq!(merged[0].home_team, BEITAR);
    }

    #[test]
    fn the_home_clubs_own_source_replaces_the_other_sites_report() {
        let rules = ScheduleRules::default();
        // Both sites report the Hapoel-hosted derby; the Beitar site's copy
        // sorts first but must yield to Hapoel's own record.
        let merged = reconcile(
            &rules,
            vec![
                mk(HAPOEL, BEITAR, 1, 20, 30, SourceId::Beitar),
                mk(HAPOEL, BEITAR, 2, 18, 0, SourceId::Hapoel),
            ],
        );
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].source, SourceId::Hapoel);
        assert_eq!(merged[0].kickoff, local_kickoff(2031, 3, 2, 18, 0).unwrap());
    }

    #[test]
    fn the_beitar_site_wins_a_beitar_hosted_derby() {
        let rules = ScheduleRules::default();
        let merged = reconcile(
            &rules,
            vec![
                mk(BEITAR, HAPOEL, 1, 18, 0, SourceId::Hapoel),
                mk(BEITAR, HAPOEL, 2, 20, 30, SourceId::Beitar),
            ],
        );
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].source, SourceId::Beitar);
        assert_eq!(merged[0].kickoff, local_kickoff(2031, 3, 2, 20, 30).unwrap());
    }

    #[test]
    fn the_same_pair_outside_the_window_stays_two_fixtures() {
        let rules = ScheduleRules::default();
        let merged = reconcile(
            &rules,
            vec![
                mk(BEITAR, HAIFA, 1, 20, 0, SourceId::Beitar),
                mk(HAIFA, BEITAR, 6, 20, 0, SourceId::Beitar),
            ],
        );
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn dedup_is_exhaustive_not_just_adjacent() {
        let rules = ScheduleRules::default();
        let merged = reconcile(
            &rules,
            vec![
                mk(BEITAR, HAIFA, 1, 20, 0, SourceId::Beitar),
                mk(HAPOEL, HAIFA, 2, 20, 0, SourceId::Hapoel),
                mk(BEITAR, HAIFA, 3, 20, 0, SourceId::Beitar),
            ],
        );
        // The third record duplicates the first despite another fixture
        // sitting between them in kickoff order.
        assert_eq!(merged.len(), 2);
        for pair in merged.windows(2) {
            assert!(pair[0].kickoff <= pair[1].kickoff);
        }
    }

    #[test]
    fn reconciliation_is_idempotent() {
        let rules = ScheduleRules::default();
        let input = vec![
            mk(BEITAR, HAPOEL, 1, 20, 30, SourceId::Beitar),
            mk(HAPOEL, BEITAR, 2, 18, 0, SourceId::Hapoel),
            mk(BEITAR, HAIFA, 10, 20, 0, SourceId::Beitar),
        ];
        let once = reconcile(&rules, input);
        let twice = reconcile(&rules, once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn output_is_sorted_by_kickoff_ascending() {
        let rules = ScheduleRules::default();
        let merged = reconcile(
            &rules,
            vec![
                mk(BEITAR, HAIFA, 20, 20, 0, SourceId::Beitar),
                mk(BEITAR, "מכבי תל אביב", 5, 19, 0, SourceId::Beitar),
                mk(HAPOEL, "בני סכנין", 12, 20, 30, SourceId::Hapoel),
            ],
        );
        assert_eq!(merged.len(), 3);
        for pair in merged.windows(2) {
            assert!(pair[0].kickoff <= pair[1].kickoff);
        }
    }

    #[test]
    fn a_pipeline_builds_offline_and_accepts_substitute_rules() {
        let rules = ScheduleRules {
            plausible_hour_floor: 12,
            ..ScheduleRules::default()
        };
        let pipeline = SyncPipeline::new(SyncConfig::from_env())
            .unwrap()
            .with_rules(rules);
        assert_eq!(pipeline.rules.plausible_hour_floor, 12);
    }

    #[test]
    fn config_defaults_point_at_the_club_sites() {
        let config = SyncConfig::from_env();
        assert!(config.beitar_url.contains("beitarfc.co.il"));
        assert!(config.hapoel_url.contains("hjfc.co.il"));
        assert_eq!(config.http_timeout_secs, 30);
    }
}
