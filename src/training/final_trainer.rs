//! Production training on every completed fixture

use log::info;

use crate::features::{FeatureRow, FeatureSpec};
use crate::training::classifier::{LabeledSet, OutcomeClassifier};
use crate::training::labels::LabelEncoder;
use crate::{KickoffError, Result};

/// A model fitted on the full table, with the row count it saw
pub struct FinalModel<M> {
    pub model: M,
    pub training_rows: usize,
}

/// Fit one classifier on all `rows` with no held-out set, so the full epoch
/// schedule runs.
pub fn train_final<C: OutcomeClassifier>(
    classifier: &C,
    rows: &[FeatureRow],
    spec: &FeatureSpec,
    encoder: &LabelEncoder,
) -> Result<FinalModel<C::Model>> {
    let train = LabeledSet::from_rows(rows, spec, encoder);
    if train.is_empty() {
        return Err(KickoffError::EmptyTrainingSet);
    }

    info!(
        "Training final model on {} matches ({} classes)",
        train.len(),
        encoder.len()
    );
    let model = classifier.fit(&train, None, encoder.len())?;
    Ok(FinalModel {
        model,
        training_rows: train.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureMatrix;
    use crate::training::classifier::ProbabilisticModel;
    use crate::{FeatureConfig, MatchRecord, MatchStatus};
    use chrono::NaiveDate;
    use std::cell::Cell;

    struct Uniform;

    impl ProbabilisticModel for Uniform {
        fn predict_proba(&self, features: &FeatureMatrix) -> Result<Vec<Vec<f64>>> {
            Ok(vec![vec![0.5, 0.5]; features.len()])
        }
    }

    struct Recorder {
        saw_eval: Cell<Option<bool>>,
    }

    impl OutcomeClassifier for Recorder {
        type Model = Uniform;

        fn fit(&self, _: &LabeledSet, eval: Option<&LabeledSet>, _: usize) -> Result<Uniform> {
            self.saw_eval.set(Some(eval.is_some()));
            Ok(Uniform)
        }
    }

    fn spec() -> FeatureSpec {
        FeatureSpec::from_config(&FeatureConfig::default()).unwrap()
    }

    #[test]
    fn test_trains_on_everything_without_eval_set() {
        let rows: Vec<FeatureRow> = (0..6)
            .map(|i| {
                FeatureRow::from_match(&MatchRecord {
                    fixture_id: i,
                    date: NaiveDate::from_ymd_opt(2024, 1, 1 + i as u32)
                        .unwrap()
                        .and_hms_opt(20, 0, 0)
                        .unwrap(),
                    season: 2023,
                    home_team: "Leeds United".to_string(),
                    away_team: "Burnley".to_string(),
                    home_score: Some(i as u32 % 2),
                    away_score: Some(0),
                    status: MatchStatus::Played,
                })
            })
            .collect();
        let encoder = LabelEncoder::fit(rows.iter().filter_map(|r| r.target));
        let classifier = Recorder {
            saw_eval: Cell::new(None),
        };

        let trained = train_final(&classifier, &rows, &spec(), &encoder).unwrap();
        assert_eq!(trained.training_rows, 6);
        assert_eq!(classifier.saw_eval.get(), Some(false));
    }

    #[test]
    fn test_empty_table_is_an_error() {
        let classifier = Recorder {
            saw_eval: Cell::new(None),
        };
        let encoder = LabelEncoder::from_labels(Vec::new());
        assert!(matches!(
            train_final(&classifier, &[], &spec(), &encoder),
            Err(KickoffError::EmptyTrainingSet)
        ));
    }
}
