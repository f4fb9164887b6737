//! Model training and evaluation
//!
//! Fold scheduling, walk-forward cross-validation, the final full-table fit,
//! and the burn classifier behind the `OutcomeClassifier` seam.

pub mod classifier;
pub mod final_trainer;
pub mod folds;
pub mod labels;
pub mod metrics;
pub mod mlp;
pub mod walk_forward;

pub use classifier::{LabeledSet, OutcomeClassifier, ProbabilisticModel};
pub use final_trainer::{train_final, FinalModel};
pub use folds::{generate_folds, Fold};
pub use labels::LabelEncoder;
pub use metrics::{ClassificationMetrics, TrainingHistory};
pub use mlp::{FittedMlp, MlpClassifier};
pub use walk_forward::{CvSummary, FoldResult};
