//! League fixture outcome prediction
//!
//! Turns an append-only log of matches and per-match team statistics into
//! leakage-safe feature rows, estimates classifier quality with walk-forward
//! validation, retrains on the full history and predicts unplayed fixtures.

pub mod data;
pub mod features;
pub mod model;
pub mod pipeline;
pub mod predict;
pub mod training;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Backend used for training (autodiff over the CPU ndarray backend)
pub type TrainBackend = burn::backend::Autodiff<burn::backend::NdArray<f32>>;

/// Backend used for inference from a persisted artifact
pub type InferBackend = burn::backend::NdArray<f32>;

/// Lifecycle state of a fixture as reported by the provider
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchStatus {
    Played,
    NotStarted,
    Other(String),
}

impl MatchStatus {
    /// Map a provider short status code
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_uppercase().as_str() {
            "FT" | "AET" | "PEN" => MatchStatus::Played,
            "NS" | "TBD" => MatchStatus::NotStarted,
            other => MatchStatus::Other(other.to_string()),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            MatchStatus::Played => "FT",
            MatchStatus::NotStarted => "NS",
            MatchStatus::Other(code) => code,
        }
    }

    pub fn is_played(&self) -> bool {
        matches!(self, MatchStatus::Played)
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Full-time result from the home side's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    #[serde(rename = "H")]
    Home,
    #[serde(rename = "D")]
    Draw,
    #[serde(rename = "A")]
    Away,
}

impl Outcome {
    pub fn from_scores(home_score: u32, away_score: u32) -> Self {
        match home_score.cmp(&away_score) {
            std::cmp::Ordering::Greater => Outcome::Home,
            std::cmp::Ordering::Less => Outcome::Away,
            std::cmp::Ordering::Equal => Outcome::Draw,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Outcome::Home => "H",
            Outcome::Draw => "D",
            Outcome::Away => "A",
        }
    }

    /// League points earned by the home and away side
    pub fn points(&self) -> (u32, u32) {
        match self {
            Outcome::Home => (3, 0),
            Outcome::Draw => (1, 1),
            Outcome::Away => (0, 3),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A single fixture as stored by the data collector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRecord {
    pub fixture_id: i64,
    /// Kick-off time, timezone-naive
    pub date: NaiveDateTime,
    /// Season start year
    pub season: i32,
    pub home_team: String,
    pub away_team: String,
    pub home_score: Option<u32>,
    pub away_score: Option<u32>,
    pub status: MatchStatus,
}

impl MatchRecord {
    /// Final result, only for played matches with both scores recorded
    pub fn outcome(&self) -> Option<Outcome> {
        if !self.status.is_played() {
            return None;
        }
        match (self.home_score, self.away_score) {
            (Some(h), Some(a)) => Some(Outcome::from_scores(h, a)),
            _ => None,
        }
    }

    pub fn involves(&self, team: &str) -> bool {
        self.home_team == team || self.away_team == team
    }
}

/// Per-team statistics for one fixture; every counter is independently nullable
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeamStatRecord {
    pub fixture_id: i64,
    pub team_id: Option<i64>,
    pub team_name: String,
    pub shots_on_goal: Option<f64>,
    pub shots_off_goal: Option<f64>,
    pub possession: Option<f64>,
    pub passes: Option<f64>,
    pub passes_accuracy: Option<f64>,
    pub fouls: Option<f64>,
    pub corners: Option<f64>,
    pub yellow_cards: Option<f64>,
    pub red_cards: Option<f64>,
}

/// Final league table entry for one team in one season
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonStanding {
    pub season_end_year: i32,
    pub team: String,
    pub position: u32,
    pub won: u32,
    pub drawn: u32,
    pub lost: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    pub goal_difference: i32,
    pub points: u32,
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum KickoffError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unknown feature column: {0}")]
    UnknownFeature(String),

    #[error("No completed matches to train on")]
    EmptyTrainingSet,

    #[error("Model not found at {0} - run `kickoff train` first")]
    NoModel(PathBuf),

    #[error("Model error: {0}")]
    Model(String),
}

pub type Result<T> = std::result::Result<T, KickoffError>;

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub data: DataConfig,
    pub features: FeatureConfig,
    pub validation: ValidationConfig,
    pub model: ModelConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub database_path: String,
    pub standings_path: String,
    pub model_dir: String,
    pub dashboard_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Role-specific rolling horizons
    pub windows: Vec<usize>,
    /// Upper bound on in-season matches for cumulative aggregates
    pub season_window: usize,
    /// Horizon of the role-agnostic recent win feature
    pub overall_recent_window: usize,
    /// League position whose record seeds promoted teams
    pub promoted_reference_position: u32,
    /// Model input columns
    pub columns: Vec<String>,
    /// Name variant -> canonical team name
    pub team_aliases: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    pub fold_count: usize,
    pub validation_span_days: i64,
    pub gap_days: i64,
    pub early_stopping_patience: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub epochs: usize,
    pub learning_rate: f64,
    pub weight_decay: f64,
    pub hidden_dims: Vec<usize>,
    pub dropout: f64,
    pub team_embedding_dim: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data: DataConfig {
                database_path: "db/matches.db".to_string(),
                standings_path: "data/premier_league.csv".to_string(),
                model_dir: "models".to_string(),
                dashboard_path: "data/latest_predictions.json".to_string(),
            },
            features: FeatureConfig::default(),
            validation: ValidationConfig {
                fold_count: 3,
                validation_span_days: 30,
                gap_days: 10,
                early_stopping_patience: 50,
            },
            model: ModelConfig {
                epochs: 400,
                learning_rate: 5e-3,
                weight_decay: 1e-4,
                hidden_dims: vec![32, 16],
                dropout: 0.1,
                team_embedding_dim: 4,
            },
        }
    }
}

impl Default for FeatureConfig {
    fn default() -> Self {
        FeatureConfig {
            windows: vec![5, 10, 20],
            season_window: 38,
            overall_recent_window: 5,
            promoted_reference_position: 17,
            columns: [
                "home_team",
                "away_team",
                "home_season_wins_ave_overall",
                "away_season_wins_ave_overall",
                "home_last_points",
                "away_last_points",
                "home_last_gd",
                "away_last_gd",
                "home_recent_10_goal_diff",
                "away_recent_10_goal_diff",
                "points_difference",
            ]
            .iter()
            .map(|c| c.to_string())
            .collect(),
            team_aliases: data::aliases::default_aliases(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            KickoffError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| KickoffError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| KickoffError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Override the epoch count and re-check the result
    pub fn with_epochs(mut self, epochs: usize) -> Result<Self> {
        self.model.epochs = epochs;
        self.validate()?;
        Ok(self)
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.features.windows.iter().any(|w| *w == 0) {
            return Err(KickoffError::Config(
                "features.windows must be positive".to_string(),
            ));
        }
        if self.features.season_window == 0 || self.features.overall_recent_window == 0 {
            return Err(KickoffError::Config(
                "season and overall windows must be positive".to_string(),
            ));
        }
        if self.validation.fold_count == 0 {
            return Err(KickoffError::Config(
                "validation.fold_count must be at least 1".to_string(),
            ));
        }
        if self.validation.validation_span_days < 0 || self.validation.gap_days < 0 {
            return Err(KickoffError::Config(
                "validation spans must not be negative".to_string(),
            ));
        }
        if self.model.epochs == 0 {
            return Err(KickoffError::Config("model.epochs must be positive".to_string()));
        }
        features::FeatureSpec::from_config(&self.features)?;
        Ok(())
    }
}
