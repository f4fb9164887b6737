//! Dashboard payload: cross-validation KPIs plus upcoming predictions

use chrono::NaiveDateTime;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::predict::inference::Prediction;
use crate::training::walk_forward::CvSummary;
use crate::Result;

const UNAVAILABLE: &str = "n/a";

/// Headline numbers shown on the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiSummary {
    /// Mean fold accuracy, e.g. "52.3%"
    pub accuracy: String,
    /// Mean fold weighted F1, e.g. "0.48"
    pub f1: String,
    /// Rows the production model was trained on
    pub matches: usize,
    #[serde(rename = "lastUpdate")]
    pub last_update: String,
}

impl KpiSummary {
    pub fn new(cv: &CvSummary, matches: usize, updated_at: NaiveDateTime) -> Self {
        KpiSummary {
            accuracy: cv
                .mean_accuracy()
                .map(|a| format!("{:.1}%", a * 100.0))
                .unwrap_or_else(|| UNAVAILABLE.to_string()),
            f1: cv
                .mean_f1_weighted()
                .map(|f| format!("{:.2}", f))
                .unwrap_or_else(|| UNAVAILABLE.to_string()),
            matches,
            last_update: updated_at.format("%Y/%m/%d %H:%M:%S").to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardRow {
    pub date: String,
    pub home_team: String,
    pub away_team: String,
    pub prediction: String,
    #[serde(rename = "proba_H")]
    pub proba_home: f64,
    #[serde(rename = "proba_D")]
    pub proba_draw: f64,
    #[serde(rename = "proba_A")]
    pub proba_away: f64,
    pub confidence: f64,
}

impl From<&Prediction> for DashboardRow {
    fn from(p: &Prediction) -> Self {
        DashboardRow {
            date: p.date.format("%Y-%m-%d").to_string(),
            home_team: p.home_team.clone(),
            away_team: p.away_team.clone(),
            prediction: p.prediction.code().to_string(),
            proba_home: p.proba_home,
            proba_draw: p.proba_draw,
            proba_away: p.proba_away,
            confidence: p.confidence,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub kpis: KpiSummary,
    pub predictions: Vec<DashboardRow>,
}

impl Dashboard {
    pub fn new(kpis: KpiSummary, predictions: &[Prediction]) -> Self {
        Dashboard {
            kpis,
            predictions: predictions.iter().map(DashboardRow::from).collect(),
        }
    }

    /// Write via a sibling temp file and rename, so readers never see a partial file
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.stage(path)?.commit()
    }

    /// Write the sibling temp file only; the dashboard at `path` is unchanged
    /// until the returned handle is committed.
    pub fn stage<P: AsRef<Path>>(&self, path: P) -> Result<StagedDashboard> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let staged = StagedDashboard {
            tmp: path.with_extension("json.tmp"),
            path: path.to_path_buf(),
            committed: false,
        };
        fs::write(&staged.tmp, serde_json::to_string_pretty(self)?)?;
        Ok(staged)
    }

    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }
}

/// Dashboard JSON waiting in its temp file; removed again if dropped uncommitted
#[derive(Debug)]
pub struct StagedDashboard {
    tmp: PathBuf,
    path: PathBuf,
    committed: bool,
}

impl StagedDashboard {
    pub fn commit(mut self) -> Result<()> {
        fs::rename(&self.tmp, &self.path)?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for StagedDashboard {
    fn drop(&mut self) {
        if !self.committed && self.tmp.exists() {
            if let Err(e) = fs::remove_file(&self.tmp) {
                warn!("Could not remove {}: {}", self.tmp.display(), e);
            }
        }
    }
}
