//! Neural network, input preprocessing and model persistence
//!
//! The network is a small MLP over normalised numeric features and learned
//! team embeddings. See `training::mlp` for how it is fitted.

pub mod artifact;
pub mod net;
pub mod preprocess;

pub use artifact::{ArtifactMetadata, ModelArtifact, StagedArtifact};
pub use net::{NetShape, OutcomeNet};
pub use preprocess::Preprocessor;
