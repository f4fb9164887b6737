//! Classifier seam used by the walk-forward evaluator and the final trainer

use crate::features::{FeatureMatrix, FeatureRow, FeatureSpec};
use crate::training::labels::LabelEncoder;
use crate::Result;

/// Feature matrix with dense class indices
#[derive(Debug, Clone, Default)]
pub struct LabeledSet {
    pub features: FeatureMatrix,
    pub labels: Vec<usize>,
}

impl LabeledSet {
    /// Project completed rows; rows whose outcome the encoder lacks are dropped
    pub fn from_rows<'a, I>(rows: I, spec: &FeatureSpec, encoder: &LabelEncoder) -> Self
    where
        I: IntoIterator<Item = &'a FeatureRow>,
    {
        let (kept, labels): (Vec<&FeatureRow>, Vec<usize>) = rows
            .into_iter()
            .filter_map(|row| {
                let label = encoder.encode(row.target?)?;
                Some((row, label))
            })
            .unzip();
        LabeledSet {
            features: spec.matrix(kept),
            labels,
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// A supervised multi-class classifier: hyperparameters in, fitted model out
pub trait OutcomeClassifier {
    type Model: ProbabilisticModel;

    /// Fit on `train`. With `eval`, stop early on its loss and keep the best
    /// epoch; without it, run the full schedule.
    fn fit(&self, train: &LabeledSet, eval: Option<&LabeledSet>, n_classes: usize)
        -> Result<Self::Model>;
}

/// A fitted model producing one probability per class index
pub trait ProbabilisticModel {
    fn predict_proba(&self, features: &FeatureMatrix) -> Result<Vec<Vec<f64>>>;
}
