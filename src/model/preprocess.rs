//! Input preparation shared by training and inference
//!
//! Numeric columns are z-score normalised with training statistics; missing
//! values become the training mean (0 after normalisation). Team names map to
//! embedding indices with 0 reserved for teams never seen in training.

use crate::features::FeatureMatrix;
use serde::{Deserialize, Serialize};

/// Fitted normalisation and team vocabulary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preprocessor {
    pub numeric_names: Vec<String>,
    pub categorical_names: Vec<String>,
    pub mean: Vec<f32>,
    pub std: Vec<f32>,
    pub teams: Vec<String>,
}

/// Flattened, row-major network inputs
#[derive(Debug, Clone, Default)]
pub struct EncodedInputs {
    pub rows: usize,
    pub numeric: Vec<f32>,
    pub team_ids: Vec<i32>,
}

impl Preprocessor {
    pub fn fit(matrix: &FeatureMatrix) -> Self {
        let dim = matrix.numeric_names.len();
        let mut sum = vec![0.0f64; dim];
        let mut sum_sq = vec![0.0f64; dim];
        let mut count = vec![0usize; dim];

        for row in &matrix.numeric {
            for (j, value) in row.iter().enumerate() {
                if let Some(v) = value {
                    sum[j] += v;
                    sum_sq[j] += v * v;
                    count[j] += 1;
                }
            }
        }

        let mean: Vec<f64> = (0..dim)
            .map(|j| if count[j] == 0 { 0.0 } else { sum[j] / count[j] as f64 })
            .collect();
        let std: Vec<f32> = (0..dim)
            .map(|j| {
                if count[j] == 0 {
                    return 1.0;
                }
                let var = sum_sq[j] / count[j] as f64 - mean[j] * mean[j];
                (var.max(0.0).sqrt() as f32).max(0.001)
            })
            .collect();

        let mut teams: Vec<String> = matrix.categorical.iter().flatten().cloned().collect();
        teams.sort();
        teams.dedup();

        Preprocessor {
            numeric_names: matrix.numeric_names.clone(),
            categorical_names: matrix.categorical_names.clone(),
            mean: mean.into_iter().map(|m| m as f32).collect(),
            std,
            teams,
        }
    }

    pub fn numeric_dim(&self) -> usize {
        self.numeric_names.len()
    }

    pub fn categorical_count(&self) -> usize {
        self.categorical_names.len()
    }

    /// Embedding rows including the unknown slot
    pub fn vocab_size(&self) -> usize {
        self.teams.len() + 1
    }

    pub fn team_id(&self, team: &str) -> i32 {
        self.teams
            .binary_search_by(|t| t.as_str().cmp(team))
            .map(|i| i as i32 + 1)
            .unwrap_or(0)
    }

    pub fn transform(&self, matrix: &FeatureMatrix) -> EncodedInputs {
        let rows = matrix.len();
        let mut numeric = Vec::with_capacity(rows * self.numeric_dim());
        let mut team_ids = Vec::with_capacity(rows * self.categorical_count());

        for (values, categories) in matrix.numeric.iter().zip(&matrix.categorical) {
            for (j, value) in values.iter().enumerate() {
                let v = value.map(|v| v as f32).unwrap_or(self.mean[j]);
                numeric.push((v - self.mean[j]) / self.std[j]);
            }
            team_ids.extend(categories.iter().map(|team| self.team_id(team)));
        }

        EncodedInputs {
            rows,
            numeric,
            team_ids,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix() -> FeatureMatrix {
        FeatureMatrix {
            numeric_names: vec!["a".to_string(), "b".to_string()],
            categorical_names: vec!["home_team".to_string()],
            numeric: vec![
                vec![Some(1.0), None],
                vec![Some(3.0), Some(10.0)],
                vec![Some(5.0), Some(10.0)],
            ],
            categorical: vec![
                vec!["Chelsea".to_string()],
                vec!["Arsenal".to_string()],
                vec!["Chelsea".to_string()],
            ],
        }
    }

    #[test]
    fn test_fit_ignores_missing_values() {
        let pre = Preprocessor::fit(&matrix());
        assert_eq!(pre.mean, vec![3.0, 10.0]);
        // constant column gets the floor
        assert_eq!(pre.std[1], 0.001);
        assert_eq!(pre.teams, vec!["Arsenal".to_string(), "Chelsea".to_string()]);
    }

    #[test]
    fn test_transform_imputes_and_maps_unknown_teams() {
        let pre = Preprocessor::fit(&matrix());
        let mut m = matrix();
        m.categorical[0] = vec!["Ipswich".to_string()];
        let encoded = pre.transform(&m);

        assert_eq!(encoded.rows, 3);
        assert_eq!(encoded.numeric[1], 0.0);
        assert!(encoded.numeric[0] < 0.0);
        assert_eq!(encoded.team_ids, vec![0, 1, 2]);
    }
}
