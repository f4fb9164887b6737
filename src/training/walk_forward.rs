//! Walk-forward cross-validation
//!
//! One classifier per fold, trained on rows dated up to the fold's training
//! cutoff and scored on its validation window. Produces metrics only.

use log::{info, warn};
use serde::Serialize;

use crate::features::{FeatureRow, FeatureSpec};
use crate::training::classifier::{LabeledSet, OutcomeClassifier, ProbabilisticModel};
use crate::training::folds::Fold;
use crate::training::labels::LabelEncoder;
use crate::training::metrics::ClassificationMetrics;
use crate::{Outcome, Result};

/// Scores of one evaluated fold
#[derive(Debug, Clone, Serialize)]
pub struct FoldResult {
    pub index: usize,
    pub fold: Fold,
    pub train_rows: usize,
    pub val_rows: usize,
    pub metrics: ClassificationMetrics,
}

/// Aggregate of all folds that could be evaluated
#[derive(Debug, Clone, Default, Serialize)]
pub struct CvSummary {
    pub folds: Vec<FoldResult>,
    /// Indices of folds skipped for an empty window
    pub skipped: Vec<usize>,
    /// Class order used for every fold
    pub labels: Vec<Outcome>,
}

impl CvSummary {
    fn mean_of(&self, f: impl Fn(&ClassificationMetrics) -> f64) -> Option<f64> {
        if self.folds.is_empty() {
            return None;
        }
        let total: f64 = self.folds.iter().map(|r| f(&r.metrics)).sum();
        Some(total / self.folds.len() as f64)
    }

    /// Unweighted mean accuracy across evaluated folds
    pub fn mean_accuracy(&self) -> Option<f64> {
        self.mean_of(|m| m.accuracy)
    }

    /// Unweighted mean weighted-F1 across evaluated folds
    pub fn mean_f1_weighted(&self) -> Option<f64> {
        self.mean_of(|m| m.f1_weighted)
    }

    pub fn mean_log_loss(&self) -> Option<f64> {
        self.mean_of(|m| m.log_loss)
    }
}

/// Evaluate `classifier` on every fold, sequentially.
///
/// `rows` are completed fixtures. Folds whose training or validation window
/// is empty are skipped with a warning.
pub fn evaluate<C: OutcomeClassifier>(
    classifier: &C,
    rows: &[FeatureRow],
    spec: &FeatureSpec,
    encoder: &LabelEncoder,
    folds: &[Fold],
) -> Result<CvSummary> {
    let mut summary = CvSummary {
        labels: encoder.labels().to_vec(),
        ..CvSummary::default()
    };

    for (index, fold) in folds.iter().enumerate() {
        let train = LabeledSet::from_rows(
            rows.iter().filter(|r| fold.in_train(r.date.date())),
            spec,
            encoder,
        );
        let val = LabeledSet::from_rows(
            rows.iter().filter(|r| fold.in_validation(r.date.date())),
            spec,
            encoder,
        );

        if val.is_empty() {
            warn!("Fold {} ({}): no matches in validation window, skipping", index, fold);
            summary.skipped.push(index);
            continue;
        }
        if train.is_empty() {
            warn!("Fold {} ({}): no matches before training cutoff, skipping", index, fold);
            summary.skipped.push(index);
            continue;
        }

        info!(
            "Fold {}: training on {} matches, validating on {}",
            index,
            train.len(),
            val.len()
        );
        let model = classifier.fit(&train, Some(&val), encoder.len())?;
        let proba = model.predict_proba(&val.features)?;
        let metrics = ClassificationMetrics::evaluate(&val.labels, &proba);
        info!("Fold {}: {}", index, metrics);

        summary.folds.push(FoldResult {
            index,
            fold: *fold,
            train_rows: train.len(),
            val_rows: val.len(),
            metrics,
        });
    }

    match (summary.mean_accuracy(), summary.mean_f1_weighted()) {
        (Some(acc), Some(f1)) => info!(
            "Cross-validation over {} folds: accuracy {:.2}%, weighted F1 {:.4}",
            summary.folds.len(),
            acc * 100.0,
            f1
        ),
        _ => warn!("No fold could be evaluated"),
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureMatrix;
    use crate::training::folds::generate_folds;
    use crate::{FeatureConfig, MatchRecord, MatchStatus};
    use chrono::NaiveDate;
    use std::cell::RefCell;

    /// Always predicts the majority training class; records training sizes
    struct Majority {
        fits: RefCell<Vec<(usize, usize)>>,
    }

    struct Constant {
        class: usize,
        n_classes: usize,
    }

    impl ProbabilisticModel for Constant {
        fn predict_proba(&self, features: &FeatureMatrix) -> Result<Vec<Vec<f64>>> {
            let mut p = vec![0.0; self.n_classes];
            p[self.class] = 1.0;
            Ok(vec![p; features.len()])
        }
    }

    impl OutcomeClassifier for Majority {
        type Model = Constant;

        fn fit(
            &self,
            train: &LabeledSet,
            eval: Option<&LabeledSet>,
            n_classes: usize,
        ) -> Result<Constant> {
            self.fits
                .borrow_mut()
                .push((train.len(), eval.map(|e| e.len()).unwrap_or(0)));
            let mut counts = vec![0usize; n_classes];
            for &l in &train.labels {
                counts[l] += 1;
            }
            let class = (0..n_classes).max_by_key(|&c| counts[c]).unwrap_or(0);
            Ok(Constant { class, n_classes })
        }
    }

    fn row(id: i64, day: u32, home: u32, away: u32) -> FeatureRow {
        let record = MatchRecord {
            fixture_id: id,
            date: NaiveDate::from_ymd_opt(2024, 3, day)
                .unwrap()
                .and_hms_opt(15, 0, 0)
                .unwrap(),
            season: 2023,
            home_team: "Arsenal".to_string(),
            away_team: "Chelsea".to_string(),
            home_score: Some(home),
            away_score: Some(away),
            status: MatchStatus::Played,
        };
        FeatureRow::from_match(&record)
    }

    fn spec() -> FeatureSpec {
        FeatureSpec::from_config(&FeatureConfig {
            columns: vec!["home_team".to_string(), "points_difference".to_string()],
            ..FeatureConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_folds_train_on_past_only() {
        // home wins early, away wins late
        let rows: Vec<FeatureRow> = (1..=20)
            .map(|d| if d <= 10 { row(d as i64, d, 2, 0) } else { row(d as i64, d, 0, 1) })
            .collect();
        let encoder = LabelEncoder::fit(rows.iter().filter_map(|r| r.target));
        let folds = generate_folds(NaiveDate::from_ymd_opt(2024, 3, 20).unwrap(), 2, 4, 5);
        let classifier = Majority {
            fits: RefCell::new(Vec::new()),
        };

        let summary = evaluate(&classifier, &rows, &spec(), &encoder, &folds).unwrap();

        assert_eq!(summary.labels, vec![Outcome::Home, Outcome::Away]);
        assert_eq!(summary.folds.len(), 2);
        // fold 0 validates 16..=20, trains on 1..=15
        assert_eq!(classifier.fits.borrow()[0], (15, 5));
        assert_eq!(summary.folds[0].metrics.accuracy, 0.0);
        // fold 1 validates 11..=15, trains on 1..=10
        assert_eq!(classifier.fits.borrow()[1], (10, 5));
        assert_eq!(summary.mean_accuracy(), Some(0.0));
    }

    #[test]
    fn test_empty_windows_are_skipped() {
        let rows: Vec<FeatureRow> = (1..=10).map(|d| row(d as i64, d, 1, 1)).collect();
        let encoder = LabelEncoder::fit(rows.iter().filter_map(|r| r.target));
        let folds = vec![
            // nothing to validate on
            Fold {
                train_end: NaiveDate::from_ymd_opt(2024, 3, 20).unwrap(),
                val_start: NaiveDate::from_ymd_opt(2024, 3, 21).unwrap(),
                val_end: NaiveDate::from_ymd_opt(2024, 3, 30).unwrap(),
            },
            // nothing to train on
            Fold {
                train_end: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
                val_start: NaiveDate::from_ymd_opt(2024, 2, 2).unwrap(),
                val_end: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
            },
            Fold {
                train_end: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
                val_start: NaiveDate::from_ymd_opt(2024, 3, 6).unwrap(),
                val_end: NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
            },
        ];
        let classifier = Majority {
            fits: RefCell::new(Vec::new()),
        };

        let summary = evaluate(&classifier, &rows, &spec(), &encoder, &folds).unwrap();
        assert_eq!(summary.skipped, vec![0, 1]);
        assert_eq!(summary.folds.len(), 1);
        assert_eq!(summary.folds[0].index, 2);
        assert_eq!(summary.mean_accuracy(), Some(1.0));
    }

    #[test]
    fn test_no_folds_has_no_means() {
        let summary = CvSummary::default();
        assert_eq!(summary.mean_accuracy(), None);
        assert_eq!(summary.mean_f1_weighted(), None);
    }
}
