//! Prediction and reporting
//!
//! Load the trained model, score upcoming fixtures and publish the dashboard payload.

pub mod inference;
pub mod report;

pub use inference::{predict_upcoming, write_predictions_csv, Prediction, Predictor};
pub use report::{Dashboard, KpiSummary, StagedDashboard};
