//! SQLite store for fixtures, per-team match statistics and predictions

use crate::predict::Prediction;
use crate::{KickoffError, MatchRecord, MatchStatus, Result, TeamStatRecord};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Database connection and operations
pub struct MatchStore {
    conn: Connection,
}

impl MatchStore {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let store = MatchStore { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory database (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = MatchStore { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS matches (
                fixture_id INTEGER PRIMARY KEY,
                date TEXT,
                season INTEGER,
                home_team TEXT,
                away_team TEXT,
                home_score INTEGER,
                away_score INTEGER,
                status TEXT
            );

            CREATE TABLE IF NOT EXISTS match_statistics (
                fixture_id INTEGER,
                team_id INTEGER,
                team_name TEXT,
                shots_on_goal INTEGER,
                shots_off_goal INTEGER,
                possession REAL,
                passes INTEGER,
                passes_accuracy REAL,
                fouls INTEGER,
                corners INTEGER,
                yellow_cards INTEGER,
                red_cards INTEGER,
                PRIMARY KEY (fixture_id, team_id)
            );

            CREATE INDEX IF NOT EXISTS idx_matches_date ON matches(date);
            "#,
        )?;
        Ok(())
    }

    // ==================== Matches ====================

    /// Insert or update a fixture
    pub fn upsert_match(&self, record: &MatchRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO matches (fixture_id, date, season, home_team, away_team,
                                 home_score, away_score, status)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(fixture_id) DO UPDATE SET
                date = excluded.date,
                season = excluded.season,
                home_team = excluded.home_team,
                away_team = excluded.away_team,
                home_score = excluded.home_score,
                away_score = excluded.away_score,
                status = excluded.status
            "#,
            params![
                record.fixture_id,
                record.date.format(DATE_FORMAT).to_string(),
                record.season,
                record.home_team,
                record.away_team,
                record.home_score,
                record.away_score,
                record.status.code(),
            ],
        )?;
        Ok(())
    }

    pub fn upsert_matches(&self, records: &[MatchRecord]) -> Result<usize> {
        for record in records {
            self.upsert_match(record)?;
        }
        Ok(records.len())
    }

    /// Every stored fixture, unordered; the feature builder sorts
    pub fn load_matches(&self) -> Result<Vec<MatchRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT fixture_id, date, season, home_team, away_team,
                    home_score, away_score, status
             FROM matches",
        )?;

        let raw = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, i32>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, Option<u32>>(5)?,
                    row.get::<_, Option<u32>>(6)?,
                    row.get::<_, Option<String>>(7)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        raw.into_iter()
            .map(
                |(fixture_id, date, season, home_team, away_team, home_score, away_score, status)| {
                    let date = date.ok_or_else(|| {
                        KickoffError::Parse(format!("fixture {} has no date", fixture_id))
                    })?;
                    Ok(MatchRecord {
                        fixture_id,
                        date: parse_match_date(&date)?,
                        season,
                        home_team,
                        away_team,
                        home_score,
                        away_score,
                        status: MatchStatus::from_code(status.as_deref().unwrap_or("")),
                    })
                },
            )
            .collect()
    }

    // ==================== Statistics ====================

    pub fn upsert_statistics(&self, stats: &TeamStatRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO match_statistics (fixture_id, team_id, team_name, shots_on_goal,
                shots_off_goal, possession, passes, passes_accuracy, fouls, corners,
                yellow_cards, red_cards)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            ON CONFLICT(fixture_id, team_id) DO UPDATE SET
                team_name = excluded.team_name,
                shots_on_goal = excluded.shots_on_goal,
                shots_off_goal = excluded.shots_off_goal,
                possession = excluded.possession,
                passes = excluded.passes,
                passes_accuracy = excluded.passes_accuracy,
                fouls = excluded.fouls,
                corners = excluded.corners,
                yellow_cards = excluded.yellow_cards,
                red_cards = excluded.red_cards
            "#,
            params![
                stats.fixture_id,
                stats.team_id,
                stats.team_name,
                stats.shots_on_goal,
                stats.shots_off_goal,
                stats.possession,
                stats.passes,
                stats.passes_accuracy,
                stats.fouls,
                stats.corners,
                stats.yellow_cards,
                stats.red_cards,
            ],
        )?;
        Ok(())
    }

    pub fn load_statistics(&self) -> Result<Vec<TeamStatRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT fixture_id, team_id, team_name, shots_on_goal, shots_off_goal,
                    possession, passes, passes_accuracy, fouls, corners,
                    yellow_cards, red_cards
             FROM match_statistics",
        )?;

        let stats = stmt
            .query_map([], |row| {
                Ok(TeamStatRecord {
                    fixture_id: row.get(0)?,
                    team_id: row.get(1)?,
                    team_name: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    shots_on_goal: row.get(3)?,
                    shots_off_goal: row.get(4)?,
                    possession: row.get(5)?,
                    passes: row.get(6)?,
                    passes_accuracy: row.get(7)?,
                    fouls: row.get(8)?,
                    corners: row.get(9)?,
                    yellow_cards: row.get(10)?,
                    red_cards: row.get(11)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(stats)
    }

    // ==================== Predictions ====================

    /// Replace the predictions table in one transaction
    pub fn replace_predictions(&mut self, predictions: &[Prediction]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        tx.execute_batch(
            r#"
            DROP TABLE IF EXISTS predictions;
            CREATE TABLE predictions (
                fixture_id INTEGER,
                date TEXT,
                home_team TEXT,
                away_team TEXT,
                predicted_result TEXT,
                proba_H REAL,
                proba_D REAL,
                proba_A REAL,
                prediction_time TEXT
            );
            "#,
        )?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO predictions (fixture_id, date, home_team, away_team,
                    predicted_result, proba_H, proba_D, proba_A, prediction_time)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;
            for p in predictions {
                stmt.execute(params![
                    p.fixture_id,
                    p.date.format(DATE_FORMAT).to_string(),
                    p.home_team,
                    p.away_team,
                    p.prediction.code(),
                    p.proba_home,
                    p.proba_draw,
                    p.proba_away,
                    p.predicted_at.format(DATE_FORMAT).to_string(),
                ])?;
            }
        }
        tx.commit()?;
        Ok(predictions.len())
    }

    pub fn prediction_count(&self) -> Result<usize> {
        let exists: Option<String> = self
            .conn
            .query_row(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'predictions'",
                [],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Ok(0);
        }
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM predictions", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// When the stored predictions were made, if any
    pub fn latest_prediction_time(&self) -> Result<Option<String>> {
        if self.prediction_count()? == 0 {
            return Ok(None);
        }
        let latest: Option<String> =
            self.conn
                .query_row("SELECT MAX(prediction_time) FROM predictions", [], |row| {
                    row.get(0)
                })?;
        Ok(latest)
    }

    // ==================== Status ====================

    /// Row counts and date coverage of the store
    pub fn status(&self) -> Result<StoreStatus> {
        let matches = self.load_matches()?;
        let statistics_count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM match_statistics", [], |row| row.get(0))?;

        let mut seasons: Vec<i32> = matches.iter().map(|m| m.season).collect();
        seasons.sort_unstable();
        seasons.dedup();

        Ok(StoreStatus {
            match_count: matches.len(),
            played_count: matches.iter().filter(|m| m.status.is_played()).count(),
            upcoming_count: matches
                .iter()
                .filter(|m| m.status == MatchStatus::NotStarted)
                .count(),
            statistics_count: statistics_count as usize,
            prediction_count: self.prediction_count()?,
            earliest_match: matches.iter().map(|m| m.date.date()).min(),
            latest_match: matches.iter().map(|m| m.date.date()).max(),
            seasons,
        })
    }
}

/// Store statistics
#[derive(Debug, Clone)]
pub struct StoreStatus {
    pub match_count: usize,
    pub played_count: usize,
    pub upcoming_count: usize,
    pub statistics_count: usize,
    pub prediction_count: usize,
    pub earliest_match: Option<NaiveDate>,
    pub latest_match: Option<NaiveDate>,
    pub seasons: Vec<i32>,
}

/// Parse a stored kick-off time into naive wall-clock time.
///
/// Provider timestamps carry an offset (`2024-08-16T19:00:00+00:00`); the
/// offset is dropped and the local time kept.
pub fn parse_match_date(text: &str) -> Result<NaiveDateTime> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.naive_local());
    }
    for format in [DATE_FORMAT, "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(dt);
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| KickoffError::Parse(format!("unrecognised match date '{}'", text)))
}
