//! Inference on not-yet-played fixtures

use chrono::NaiveDateTime;
use log::{info, warn};
use serde::Serialize;
use std::path::Path;

use crate::features::{FeatureRow, FeatureSpec};
use crate::model::artifact::{self, ModelArtifact};
use crate::training::classifier::ProbabilisticModel;
use crate::training::labels::LabelEncoder;
use crate::training::metrics::argmax;
use crate::{FeatureConfig, KickoffError, Outcome, Result};

/// Predicted outcome of one upcoming fixture
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub fixture_id: i64,
    pub date: NaiveDateTime,
    pub home_team: String,
    pub away_team: String,
    pub prediction: Outcome,
    pub proba_home: f64,
    pub proba_draw: f64,
    pub proba_away: f64,
    /// Probability of the predicted class
    pub confidence: f64,
    pub predicted_at: NaiveDateTime,
}

/// Score `rows` with any fitted model, decoding class indices through `encoder`.
///
/// Outcomes the model was never trained on get probability 0.
pub fn predict_rows<M: ProbabilisticModel>(
    model: &M,
    rows: &[FeatureRow],
    spec: &FeatureSpec,
    encoder: &LabelEncoder,
    predicted_at: NaiveDateTime,
) -> Result<Vec<Prediction>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let proba = model.predict_proba(&spec.matrix(rows))?;

    rows.iter()
        .zip(proba)
        .map(|(row, p)| {
            let best = argmax(&p);
            let prediction = encoder.decode(best).ok_or_else(|| {
                KickoffError::Model(format!(
                    "class index {} outside label set of {}",
                    best,
                    encoder.len()
                ))
            })?;
            let of = |outcome: Outcome| {
                encoder
                    .encode(outcome)
                    .and_then(|i| p.get(i).copied())
                    .unwrap_or(0.0)
            };
            Ok(Prediction {
                fixture_id: row.fixture_id,
                date: row.date,
                home_team: row.home_team.clone(),
                away_team: row.away_team.clone(),
                prediction,
                proba_home: of(Outcome::Home),
                proba_draw: of(Outcome::Draw),
                proba_away: of(Outcome::Away),
                confidence: p[best],
                predicted_at,
            })
        })
        .collect()
}

/// Persisted model plus the column set and label order it was trained with
pub struct Predictor {
    artifact: ModelArtifact,
    spec: FeatureSpec,
    encoder: LabelEncoder,
}

impl Predictor {
    /// Load the artifact in `model_dir`. Column names are resolved against
    /// `features` so window sizes must still match the training run.
    pub fn load<P: AsRef<Path>>(model_dir: P, features: &FeatureConfig) -> Result<Self> {
        let artifact = artifact::load(model_dir)?;
        let spec = FeatureSpec::from_config(&FeatureConfig {
            columns: artifact.metadata.feature_columns.clone(),
            ..features.clone()
        })?;
        let encoder = LabelEncoder::from_labels(artifact.metadata.labels.clone());
        Ok(Predictor {
            artifact,
            spec,
            encoder,
        })
    }

    pub fn trained_at(&self) -> NaiveDateTime {
        self.artifact.metadata.trained_at
    }

    pub fn predict(&self, rows: &[FeatureRow]) -> Result<Vec<Prediction>> {
        predict_rows(
            &self.artifact.model,
            rows,
            &self.spec,
            &self.encoder,
            chrono::Local::now().naive_local(),
        )
    }
}

/// Predict upcoming fixtures; an empty table or a missing model yields no
/// predictions rather than an error.
pub fn predict_upcoming<P: AsRef<Path>>(
    model_dir: P,
    features: &FeatureConfig,
    rows: &[FeatureRow],
) -> Result<Vec<Prediction>> {
    if rows.is_empty() {
        warn!("No upcoming fixtures to predict");
        return Ok(Vec::new());
    }
    let predictor = match Predictor::load(model_dir, features) {
        Ok(p) => p,
        Err(KickoffError::NoModel(path)) => {
            warn!("No model at {}, skipping prediction", path.display());
            return Ok(Vec::new());
        }
        Err(e) => return Err(e),
    };

    let predictions = predictor.predict(rows)?;
    info!(
        "Predicted {} fixtures with model trained {}",
        predictions.len(),
        predictor.trained_at().format("%Y-%m-%d %H:%M")
    );
    Ok(predictions)
}

/// Predictions as CSV with the dashboard's probability column names
pub fn write_predictions_csv<W: std::io::Write>(predictions: &[Prediction], out: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record([
        "fixture_id",
        "date",
        "home_team",
        "away_team",
        "prediction",
        "proba_H",
        "proba_D",
        "proba_A",
        "confidence",
    ])?;
    for p in predictions {
        writer.write_record([
            p.fixture_id.to_string(),
            p.date.format("%Y-%m-%d").to_string(),
            p.home_team.clone(),
            p.away_team.clone(),
            p.prediction.code().to_string(),
            format!("{:.4}", p.proba_home),
            format!("{:.4}", p.proba_draw),
            format!("{:.4}", p.proba_away),
            format!("{:.4}", p.confidence),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureMatrix;
    use crate::{MatchRecord, MatchStatus};
    use chrono::NaiveDate;

    struct Fixed(Vec<f64>);

    impl ProbabilisticModel for Fixed {
        fn predict_proba(&self, features: &FeatureMatrix) -> Result<Vec<Vec<f64>>> {
            Ok(vec![self.0.clone(); features.len()])
        }
    }

    fn upcoming() -> FeatureRow {
        FeatureRow::from_match(&MatchRecord {
            fixture_id: 77,
            date: NaiveDate::from_ymd_opt(2025, 5, 25)
                .unwrap()
                .and_hms_opt(16, 0, 0)
                .unwrap(),
            season: 2024,
            home_team: "Brighton".to_string(),
            away_team: "Spurs".to_string(),
            home_score: None,
            away_score: None,
            status: MatchStatus::NotStarted,
        })
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 5, 20)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    fn spec() -> FeatureSpec {
        FeatureSpec::from_config(&FeatureConfig::default()).unwrap()
    }

    #[test]
    fn test_decodes_through_stored_label_order() {
        // index 0 = Draw, 1 = Away, 2 = Home
        let encoder = LabelEncoder::from_labels(vec![Outcome::Draw, Outcome::Away, Outcome::Home]);
        let model = Fixed(vec![0.2, 0.7, 0.1]);
        let out = predict_rows(&model, &[upcoming()], &spec(), &encoder, now()).unwrap();

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].prediction, Outcome::Away);
        assert_eq!(out[0].proba_draw, 0.2);
        assert_eq!(out[0].proba_away, 0.7);
        assert_eq!(out[0].proba_home, 0.1);
        assert_eq!(out[0].confidence, 0.7);
        assert_eq!(out[0].fixture_id, 77);
    }

    #[test]
    fn test_untrained_outcome_gets_zero() {
        let encoder = LabelEncoder::from_labels(vec![Outcome::Home, Outcome::Away]);
        let out = predict_rows(&Fixed(vec![0.45, 0.55]), &[upcoming()], &spec(), &encoder, now())
            .unwrap();
        assert_eq!(out[0].prediction, Outcome::Away);
        assert_eq!(out[0].proba_draw, 0.0);
    }

    #[test]
    fn test_label_order_round_trip_through_training() {
        use crate::training::classifier::{LabeledSet, OutcomeClassifier};
        use crate::training::mlp::MlpClassifier;
        use crate::{ModelConfig, TrainBackend};

        // home_total_points separates the classes: 0 draw, 10 away, 20 home
        let classes = [(0, Outcome::Draw), (10, Outcome::Away), (20, Outcome::Home)];
        let rows: Vec<FeatureRow> = (0..30)
            .map(|i| {
                let (points, outcome) = classes[i % 3];
                let mut row = upcoming();
                row.fixture_id = i as i64;
                row.home_overall.total_points = points + (i % 2) as i32;
                row.target = Some(outcome);
                row
            })
            .collect();
        let spec = FeatureSpec::from_config(&FeatureConfig {
            columns: vec!["home_total_points".to_string()],
            ..FeatureConfig::default()
        })
        .unwrap();
        let encoder = LabelEncoder::fit(rows.iter().filter_map(|r| r.target));
        assert_eq!(encoder.labels(), &[Outcome::Draw, Outcome::Away, Outcome::Home]);

        let config = ModelConfig {
            epochs: 500,
            learning_rate: 0.05,
            weight_decay: 0.0,
            hidden_dims: vec![16],
            dropout: 0.0,
            team_embedding_dim: 0,
        };
        let model = MlpClassifier::<TrainBackend>::new(config, 0, Default::default())
            .fit(&LabeledSet::from_rows(&rows, &spec, &encoder), None, encoder.len())
            .unwrap();

        let out = predict_rows(&model, &rows, &spec, &encoder, now()).unwrap();
        for (p, row) in out.iter().zip(&rows) {
            assert_eq!(Some(p.prediction), row.target);
        }
    }

    #[test]
    fn test_csv_quotes_team_names() {
        let encoder = LabelEncoder::from_labels(vec![Outcome::Home, Outcome::Draw, Outcome::Away]);
        let mut row = upcoming();
        row.home_team = "Brighton & Hove Albion, \"The Seagulls\"".to_string();
        let predictions =
            predict_rows(&Fixed(vec![0.5, 0.25, 0.25]), &[row], &spec(), &encoder, now()).unwrap();

        let mut out = Vec::new();
        write_predictions_csv(&predictions, &mut out).unwrap();

        let mut reader = csv::Reader::from_reader(out.as_slice());
        let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].len(), 9);
        assert_eq!(&records[0][2], "Brighton & Hove Albion, \"The Seagulls\"");
        assert_eq!(&records[0][4], "H");
        assert_eq!(&records[0][5], "0.5000");
    }

    #[test]
    fn test_missing_model_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let out = predict_upcoming(dir.path(), &FeatureConfig::default(), &[upcoming()]).unwrap();
        assert!(out.is_empty());
        let out = predict_upcoming(dir.path(), &FeatureConfig::default(), &[]).unwrap();
        assert!(out.is_empty());
    }
}
