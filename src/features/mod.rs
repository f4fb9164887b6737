//! Feature engineering
//!
//! Converts raw fixtures into leakage-safe, per-fixture feature rows.

pub mod backfill;
pub mod builder;
pub mod carry_over;
pub mod columns;
pub mod overall;
pub mod role_form;
pub mod rolling;
pub mod row;

pub use builder::{FeatureBuilder, FeatureTable};
pub use columns::{FeatureColumn, FeatureMatrix, FeatureSpec};
pub use row::{FeatureRow, Side};
