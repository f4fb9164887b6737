//! Persisted production model
//!
//! An artifact is two files in the model directory: `final_model.mpk` (burn
//! record) and `final_model.json` (label order, input columns, preprocessing
//! and network shape). Both are written into `.staging/` first and renamed
//! into place once complete.

use chrono::NaiveDateTime;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::model::net::{NetShape, OutcomeNet};
use crate::model::preprocess::Preprocessor;
use crate::training::metrics::TrainingHistory;
use crate::training::mlp::FittedMlp;
use crate::{InferBackend, KickoffError, Outcome, Result};

const MODEL_STEM: &str = "final_model";
const STAGING_DIR: &str = ".staging";

/// Everything needed to rebuild and decode the network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    /// Class index -> outcome, in first-occurrence order of the training target
    pub labels: Vec<Outcome>,
    pub feature_columns: Vec<String>,
    pub preprocessor: Preprocessor,
    pub shape: NetShape,
    pub training_rows: usize,
    pub trained_at: NaiveDateTime,
}

impl ArtifactMetadata {
    pub fn new<B: burn::tensor::backend::Backend>(
        model: &FittedMlp<B>,
        labels: Vec<Outcome>,
        feature_columns: Vec<String>,
        training_rows: usize,
    ) -> Self {
        ArtifactMetadata {
            labels,
            feature_columns,
            preprocessor: model.preprocessor.clone(),
            shape: model.shape.clone(),
            training_rows,
            trained_at: chrono::Local::now().naive_local(),
        }
    }
}

/// A loaded artifact ready for inference
#[derive(Debug)]
pub struct ModelArtifact {
    pub metadata: ArtifactMetadata,
    pub model: FittedMlp<InferBackend>,
}

fn weights_path(dir: &Path) -> PathBuf {
    dir.join(format!("{}.mpk", MODEL_STEM))
}

fn metadata_path(dir: &Path) -> PathBuf {
    dir.join(format!("{}.json", MODEL_STEM))
}

/// Whether both artifact files exist
pub fn exists<P: AsRef<Path>>(model_dir: P) -> bool {
    let dir = model_dir.as_ref();
    weights_path(dir).exists() && metadata_path(dir).exists()
}

/// Artifact files written to the staging directory but not yet in place.
///
/// Dropping it without [`StagedArtifact::commit`] removes the staged files and
/// leaves any previous artifact untouched.
#[derive(Debug)]
pub struct StagedArtifact {
    dir: PathBuf,
    staging: PathBuf,
    committed: bool,
}

impl StagedArtifact {
    /// Move both files into the model directory
    pub fn commit(mut self) -> Result<()> {
        fs::rename(weights_path(&self.staging), weights_path(&self.dir))?;
        fs::rename(metadata_path(&self.staging), metadata_path(&self.dir))?;
        self.committed = true;
        fs::remove_dir_all(&self.staging)?;
        info!("Saved model to {}", weights_path(&self.dir).display());
        Ok(())
    }
}

impl Drop for StagedArtifact {
    fn drop(&mut self) {
        if !self.committed && self.staging.exists() {
            if let Err(e) = fs::remove_dir_all(&self.staging) {
                warn!("Could not remove {}: {}", self.staging.display(), e);
            }
        }
    }
}

/// Write both artifact files into `.staging/` without touching the current artifact
pub fn stage<B, P>(
    model_dir: P,
    model: &FittedMlp<B>,
    metadata: &ArtifactMetadata,
) -> Result<StagedArtifact>
where
    B: burn::tensor::backend::Backend,
    B::FloatElem: serde::Serialize + serde::de::DeserializeOwned,
    B::IntElem: serde::Serialize + serde::de::DeserializeOwned,
    P: AsRef<Path>,
{
    let dir = model_dir.as_ref();
    let staging = dir.join(STAGING_DIR);
    if staging.exists() {
        fs::remove_dir_all(&staging)?;
    }
    fs::create_dir_all(&staging)?;
    let staged = StagedArtifact {
        dir: dir.to_path_buf(),
        staging,
        committed: false,
    };

    model.net.save(&staged.staging.join(MODEL_STEM))?;
    fs::write(
        metadata_path(&staged.staging),
        serde_json::to_string_pretty(metadata)?,
    )?;
    debug!(
        "Staged model ({} rows, {} columns) in {}",
        metadata.training_rows,
        metadata.feature_columns.len(),
        staged.staging.display()
    );
    Ok(staged)
}

/// Write the artifact, replacing any previous one only after both files are complete
pub fn save<B, P>(model_dir: P, model: &FittedMlp<B>, metadata: &ArtifactMetadata) -> Result<()>
where
    B: burn::tensor::backend::Backend,
    B::FloatElem: serde::Serialize + serde::de::DeserializeOwned,
    B::IntElem: serde::Serialize + serde::de::DeserializeOwned,
    P: AsRef<Path>,
{
    stage(model_dir, model, metadata)?.commit()
}

/// Load the artifact onto the inference backend
pub fn load<P: AsRef<Path>>(model_dir: P) -> Result<ModelArtifact> {
    let dir = model_dir.as_ref();
    if !exists(dir) {
        return Err(KickoffError::NoModel(weights_path(dir)));
    }

    let metadata: ArtifactMetadata =
        serde_json::from_str(&fs::read_to_string(metadata_path(dir))?)?;
    if metadata.labels.len() != metadata.shape.n_classes {
        return Err(KickoffError::Model(format!(
            "artifact lists {} labels for {} output classes",
            metadata.labels.len(),
            metadata.shape.n_classes
        )));
    }

    let device = Default::default();
    let net = OutcomeNet::<InferBackend>::load(&device, &dir.join(MODEL_STEM), &metadata.shape)?;
    let model = FittedMlp {
        net,
        preprocessor: metadata.preprocessor.clone(),
        shape: metadata.shape.clone(),
        history: TrainingHistory::new(),
        device,
    };

    Ok(ModelArtifact { metadata, model })
}
