//! Feature table construction
//!
//! Joins fixtures with their statistics and prior-season standings, walks the
//! fixtures in (date, fixture id) order computing form from per-team
//! histories, backfills upcoming fixtures and splits the result.

use crate::data::{StandingsTable, TeamAliases};
use crate::features::backfill::backfill_unplayed;
use crate::features::carry_over;
use crate::features::columns::FeatureColumn;
use crate::features::overall::SeasonHistories;
use crate::features::role_form::RoleHistories;
use crate::features::row::{FeatureRow, Side, StatLine};
use crate::{FeatureConfig, MatchRecord, MatchStatus, Result, TeamStatRecord};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::path::Path;

/// Completed fixtures for training and upcoming fixtures for prediction
#[derive(Debug, Clone, Default)]
pub struct FeatureTable {
    pub train: Vec<FeatureRow>,
    pub predict: Vec<FeatureRow>,
}

impl FeatureTable {
    /// Latest kick-off among completed fixtures
    pub fn latest_played_date(&self) -> Option<chrono::NaiveDate> {
        self.train.iter().map(|r| r.date.date()).max()
    }

    /// Write both tables to CSV with every catalogued column
    pub fn export_csv<P: AsRef<Path>>(&self, path: P, config: &FeatureConfig) -> Result<()> {
        let columns: Vec<FeatureColumn> = FeatureColumn::catalogue(config)
            .into_iter()
            .filter(|c| !c.is_categorical())
            .collect();

        let mut writer = csv::Writer::from_path(path.as_ref())?;
        let mut header: Vec<String> = [
            "fixture_id",
            "date",
            "season",
            "home_team",
            "away_team",
            "home_score",
            "away_score",
            "status",
            "target",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        header.extend(columns.iter().map(|c| c.to_string()));
        writer.write_record(&header)?;

        let fmt_opt = |v: Option<f64>| v.map(|v| v.to_string()).unwrap_or_default();
        for row in self.train.iter().chain(self.predict.iter()) {
            let mut record = vec![
                row.fixture_id.to_string(),
                row.date.format("%Y-%m-%d %H:%M:%S").to_string(),
                row.season.to_string(),
                row.home_team.clone(),
                row.away_team.clone(),
                row.home_score.map(|s| s.to_string()).unwrap_or_default(),
                row.away_score.map(|s| s.to_string()).unwrap_or_default(),
                row.status.to_string(),
                row.target.map(|t| t.to_string()).unwrap_or_default(),
            ];
            record.extend(columns.iter().map(|c| fmt_opt(c.value(row))));
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Builds leakage-safe feature rows from raw fixtures
pub struct FeatureBuilder {
    config: FeatureConfig,
    aliases: TeamAliases,
    standings: Option<StandingsTable>,
}

impl FeatureBuilder {
    pub fn new(config: FeatureConfig, standings: Option<StandingsTable>) -> Self {
        let aliases = TeamAliases::new(config.team_aliases.clone());
        FeatureBuilder {
            config,
            aliases,
            standings,
        }
    }

    pub fn build(&self, matches: &[MatchRecord], stats: &[TeamStatRecord]) -> FeatureTable {
        let mut rows = self.join(matches, stats);

        match &self.standings {
            Some(standings) => {
                carry_over::attach(&mut rows, standings, &self.aliases);
                let filled = carry_over::fill_promoted(
                    &mut rows,
                    standings,
                    self.config.promoted_reference_position,
                );
                debug!("Promoted-team fill: {} carry-over cells", filled);
            }
            None => debug!("No standings table; carry-over columns left empty"),
        }

        rows.sort_by(|a, b| (a.date, a.fixture_id).cmp(&(b.date, b.fixture_id)));
        self.compute_form(&mut rows);

        let backfilled = backfill_unplayed(&mut rows);
        debug!("Backfilled {} upcoming fixtures", backfilled);

        let (predict, train): (Vec<_>, Vec<_>) = rows
            .into_iter()
            .partition(|r| r.status == MatchStatus::NotStarted);
        info!(
            "Feature table: {} completed, {} upcoming fixtures",
            train.len(),
            predict.len()
        );
        FeatureTable { train, predict }
    }

    /// Left-join statistics by (fixture, team name). Drops fixtures in other
    /// states and played fixtures without a recorded score.
    fn join(&self, matches: &[MatchRecord], stats: &[TeamStatRecord]) -> Vec<FeatureRow> {
        let by_key: HashMap<(i64, &str), &TeamStatRecord> = stats
            .iter()
            .map(|s| ((s.fixture_id, s.team_name.as_str()), s))
            .collect();

        let mut excluded = 0;
        let mut unscored = 0;
        let rows: Vec<FeatureRow> = matches
            .iter()
            .filter(|m| match m.status {
                MatchStatus::NotStarted => true,
                MatchStatus::Played if m.outcome().is_some() => true,
                MatchStatus::Played => {
                    unscored += 1;
                    false
                }
                MatchStatus::Other(_) => {
                    excluded += 1;
                    false
                }
            })
            .map(|m| {
                let mut row = FeatureRow::from_match(m);
                let lookup = |team: &str| {
                    by_key
                        .get(&(m.fixture_id, team))
                        .map(|s| StatLine::from_record(s))
                        .unwrap_or_default()
                };
                row.home_stats = lookup(&m.home_team);
                row.away_stats = lookup(&m.away_team);
                if m.status.is_played() {
                    row.home_stats.fill_missing_with_zero();
                    row.away_stats.fill_missing_with_zero();
                }
                row
            })
            .collect();

        if excluded > 0 {
            debug!("Excluded {} fixtures that are neither played nor upcoming", excluded);
        }
        if unscored > 0 {
            warn!("Dropped {} played fixtures with no recorded score", unscored);
        }
        rows
    }

    /// Causal pass: read each team's history, then record the result
    fn compute_form(&self, rows: &mut [FeatureRow]) {
        let mut roles = RoleHistories::new(&self.config.windows);
        let mut seasons = SeasonHistories::new(
            self.config.season_window,
            self.config.overall_recent_window,
        );

        for row in rows.iter_mut() {
            row.home_form = roles.form(&row.home_team, Side::Home);
            row.away_form = roles.form(&row.away_team, Side::Away);
            row.home_overall = seasons.form(row.season, &row.home_team);
            row.away_overall = seasons.form(row.season, &row.away_team);

            let Some(outcome) = row.target.filter(|_| row.status.is_played()) else {
                continue;
            };
            let (home_goals, away_goals) = match (row.home_score, row.away_score) {
                (Some(h), Some(a)) => (h, a),
                _ => continue,
            };
            roles.record(&row.home_team, Side::Home, home_goals, away_goals);
            roles.record(&row.away_team, Side::Away, away_goals, home_goals);

            let (home_points, away_points) = outcome.points();
            seasons.record(row.season, &row.home_team, home_points);
            seasons.record(row.season, &row.away_team, away_points);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::columns::{FeatureColumn, FeatureSpec, FormField};
    use crate::{Outcome, SeasonStanding};
    use chrono::{Duration, NaiveDate};

    fn config() -> FeatureConfig {
        FeatureConfig {
            windows: vec![2],
            ..FeatureConfig::default()
        }
    }

    /// Round robin between three teams, one fixture a week
    fn fixtures(season: i32, results: &[(&str, &str, u32, u32)], first_id: i64) -> Vec<MatchRecord> {
        let start = NaiveDate::from_ymd_opt(season, 8, 10)
            .unwrap()
            .and_hms_opt(15, 0, 0)
            .unwrap();
        results
            .iter()
            .enumerate()
            .map(|(i, (home, away, hs, as_))| MatchRecord {
                fixture_id: first_id + i as i64,
                date: start + Duration::days(7 * i as i64),
                season,
                home_team: home.to_string(),
                away_team: away.to_string(),
                home_score: Some(*hs),
                away_score: Some(*as_),
                status: MatchStatus::Played,
            })
            .collect()
    }

    fn sample_matches() -> Vec<MatchRecord> {
        fixtures(
            2024,
            &[
                ("Arsenal", "Chelsea", 2, 0),
                ("Chelsea", "Everton", 1, 1),
                ("Everton", "Arsenal", 0, 3),
                ("Arsenal", "Everton", 1, 0),
                ("Chelsea", "Arsenal", 2, 2),
                ("Arsenal", "Chelsea", 0, 1),
            ],
            100,
        )
    }

    fn form_value(row: &FeatureRow, side: Side, field: FormField) -> Option<f64> {
        FeatureColumn::Form(side, field, 2).value(row)
    }

    #[test]
    fn test_home_form_window() {
        let builder = FeatureBuilder::new(config(), None);
        let table = builder.build(&sample_matches(), &[]);
        assert_eq!(table.train.len(), 6);
        assert!(table.predict.is_empty());

        // Arsenal's home games: 2-0, 1-0, then 0-1
        let third_home = table.train.iter().find(|r| r.fixture_id == 105).unwrap();
        assert_eq!(form_value(third_home, Side::Home, FormField::Scores), Some(3.0));
        assert_eq!(form_value(third_home, Side::Home, FormField::GoalAgainst), Some(0.0));
        assert_eq!(form_value(third_home, Side::Home, FormField::Wins), Some(2.0));
        let second_home = table.train.iter().find(|r| r.fixture_id == 103).unwrap();
        assert_eq!(form_value(second_home, Side::Home, FormField::Scores), Some(0.0));
    }

    #[test]
    fn test_overall_points_cross_roles() {
        let builder = FeatureBuilder::new(config(), None);
        let table = builder.build(&sample_matches(), &[]);

        // Before fixture 104 Arsenal has W (home), W (away), W (home); Chelsea L, D
        let row = table.train.iter().find(|r| r.fixture_id == 104).unwrap();
        assert_eq!(row.away_overall.total_points, 9);
        assert_eq!(row.home_overall.total_points, 1);
        assert_eq!(row.away_overall.season_win_rate, 100.0);
        assert_eq!(row.points_difference(), -8);
        assert_eq!(row.target, Some(Outcome::Draw));
    }

    #[test]
    fn test_later_result_does_not_change_earlier_features() {
        let builder = FeatureBuilder::new(config(), None);
        let baseline = builder.build(&sample_matches(), &[]);

        let mut perturbed = sample_matches();
        perturbed[4].home_score = Some(7);
        perturbed[4].away_score = Some(0);
        let changed = builder.build(&perturbed, &[]);

        let all_columns = FeatureColumn::catalogue(&config());
        for (a, b) in baseline.train.iter().zip(changed.train.iter()) {
            if a.fixture_id > 104 {
                break;
            }
            for column in &all_columns {
                assert_eq!(column.value(a), column.value(b), "{} at {}", column, a.fixture_id);
            }
        }
        let last_a = &baseline.train[5];
        let last_b = &changed.train[5];
        assert_ne!(
            last_a.away_overall.total_points,
            last_b.away_overall.total_points
        );
    }

    #[test]
    fn test_statistics_fill_only_touches_played_rows() {
        let mut matches = sample_matches();
        matches.push(MatchRecord {
            fixture_id: 200,
            date: matches[5].date + Duration::days(7),
            season: 2024,
            home_team: "Everton".to_string(),
            away_team: "Chelsea".to_string(),
            home_score: None,
            away_score: None,
            status: MatchStatus::NotStarted,
        });
        let stats = vec![TeamStatRecord {
            fixture_id: 100,
            team_id: Some(1),
            team_name: "Arsenal".to_string(),
            possession: Some(58.0),
            ..Default::default()
        }];

        let table = FeatureBuilder::new(config(), None).build(&matches, &stats);
        let first = &table.train[0];
        assert_eq!(first.home_stats.possession, Some(58.0));
        assert_eq!(first.home_stats.corners, Some(0.0));
        assert_eq!(first.away_stats.possession, Some(0.0));

        assert_eq!(table.predict.len(), 1);
        assert_eq!(table.predict[0].home_stats.possession, None);
    }

    #[test]
    fn test_other_statuses_are_excluded() {
        let mut matches = sample_matches();
        matches[2].status = MatchStatus::Other("PST".to_string());
        matches[3].status = MatchStatus::Other("CANC".to_string());
        let table = FeatureBuilder::new(config(), None).build(&matches, &[]);

        let train_ids: Vec<i64> = table.train.iter().map(|r| r.fixture_id).collect();
        assert_eq!(train_ids, vec![100, 101, 104, 105]);
        assert!(table.predict.is_empty());
    }

    #[test]
    fn test_played_fixture_without_score_is_dropped() {
        let mut matches = sample_matches();
        matches[1].home_score = None;
        matches[1].away_score = None;
        matches[4].away_score = None;
        matches.push(MatchRecord {
            fixture_id: 300,
            date: matches[5].date + Duration::days(7),
            season: 2024,
            home_team: "Everton".to_string(),
            away_team: "Chelsea".to_string(),
            home_score: None,
            away_score: None,
            status: MatchStatus::NotStarted,
        });
        let table = FeatureBuilder::new(config(), None).build(&matches, &[]);

        let train_ids: Vec<i64> = table.train.iter().map(|r| r.fixture_id).collect();
        assert_eq!(train_ids, vec![100, 102, 103, 105]);
        assert!(table.train.iter().all(|r| r.target.is_some()));
        let predict_ids: Vec<i64> = table.predict.iter().map(|r| r.fixture_id).collect();
        assert_eq!(predict_ids, vec![300]);
    }

    #[test]
    fn test_carry_over_uses_previous_season_table() {
        let standings = StandingsTable::from_records(vec![SeasonStanding {
            season_end_year: 2024,
            team: "Arsenal".to_string(),
            position: 2,
            won: 28,
            drawn: 5,
            lost: 5,
            goals_for: 91,
            goals_against: 29,
            goal_difference: 62,
            points: 89,
        }]);
        let table = FeatureBuilder::new(config(), Some(standings)).build(&sample_matches(), &[]);

        let spec = FeatureSpec::from_config(&FeatureConfig {
            columns: vec!["home_last_points".to_string(), "away_last_gd".to_string()],
            ..config()
        })
        .unwrap();
        let matrix = spec.matrix(&table.train);
        assert_eq!(matrix.numeric[0], vec![Some(89.0), None]);
        assert_eq!(matrix.numeric[2], vec![None, Some(62.0)]);
    }

    #[test]
    fn test_export_writes_both_tables() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("features.csv");
        let table = FeatureBuilder::new(config(), None).build(&sample_matches(), &[]);
        table.export_csv(&path, &config()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("fixture_id,date,season,home_team"));
        assert!(header.contains("home_recent_2_goal_diff"));
        assert_eq!(lines.count(), 6);
    }
}
