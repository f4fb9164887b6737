//! Outcome network
//!
//! Architecture: [numeric inputs | team embeddings] → Hidden(h1) → ReLU → Dropout
//!                                                  → ... → Linear(n_classes)

use burn::module::Module;
use burn::nn::{self, Dropout, DropoutConfig, Linear, LinearConfig};
use burn::record::{FullPrecisionSettings, Recorder};
use burn::tensor::activation::relu;
use burn::tensor::backend::Backend;
use burn::tensor::{Int, Tensor};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::model::preprocess::EncodedInputs;
use crate::{KickoffError, Result};

/// Dimensions needed to rebuild the network before loading weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetShape {
    pub numeric_dim: usize,
    pub categorical_count: usize,
    pub vocab_size: usize,
    pub embedding_dim: usize,
    pub hidden_dims: Vec<usize>,
    pub dropout: f64,
    pub n_classes: usize,
}

impl NetShape {
    fn uses_embedding(&self) -> bool {
        self.categorical_count > 0 && self.embedding_dim > 0
    }

    pub fn input_dim(&self) -> usize {
        let embedded = if self.uses_embedding() {
            self.categorical_count * self.embedding_dim
        } else {
            0
        };
        self.numeric_dim + embedded
    }
}

/// Learned team embeddings shared by every team column
#[derive(Module, Debug)]
pub struct TeamEmbedding<B: Backend> {
    embedding: nn::Embedding<B>,
}

impl<B: Backend> TeamEmbedding<B> {
    pub fn new(device: &B::Device, num_teams: usize, embed_dim: usize) -> Self {
        TeamEmbedding {
            embedding: nn::EmbeddingConfig::new(num_teams, embed_dim).init(device),
        }
    }

    /// [batch, columns] team ids -> [batch, columns * embed_dim]
    pub fn forward(&self, team_ids: Tensor<B, 2, Int>) -> Tensor<B, 2> {
        let [batch, columns] = team_ids.dims();
        let embedded = self.embedding.forward(team_ids);
        let [_, _, dim] = embedded.dims();
        embedded.reshape([batch, columns * dim])
    }
}

/// A single hidden layer block: Linear → ReLU → Dropout
#[derive(Module, Debug)]
pub struct HiddenBlock<B: Backend> {
    linear: Linear<B>,
    dropout: Dropout,
}

impl<B: Backend> HiddenBlock<B> {
    pub fn new(device: &B::Device, in_dim: usize, out_dim: usize, dropout: f64) -> Self {
        HiddenBlock {
            linear: LinearConfig::new(in_dim, out_dim).init(device),
            dropout: DropoutConfig::new(dropout).init(),
        }
    }

    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.linear.forward(x);
        let x = relu(x);
        self.dropout.forward(x)
    }
}

/// Tensors for one full batch
#[derive(Debug, Clone)]
pub struct NetInputs<B: Backend> {
    pub numeric: Option<Tensor<B, 2>>,
    pub team_ids: Option<Tensor<B, 2, Int>>,
}

impl<B: Backend> NetInputs<B> {
    pub fn from_encoded(encoded: &EncodedInputs, shape: &NetShape, device: &B::Device) -> Self {
        let rows = encoded.rows;
        let numeric = (shape.numeric_dim > 0).then(|| {
            Tensor::<B, 1>::from_floats(encoded.numeric.as_slice(), device)
                .reshape([rows, shape.numeric_dim])
        });
        let team_ids = shape.uses_embedding().then(|| {
            Tensor::<B, 1, Int>::from_ints(encoded.team_ids.as_slice(), device)
                .reshape([rows, shape.categorical_count])
        });
        NetInputs { numeric, team_ids }
    }
}

/// Multi-class outcome classifier network
#[derive(Module, Debug)]
pub struct OutcomeNet<B: Backend> {
    team_embedding: Option<TeamEmbedding<B>>,
    hidden: Vec<HiddenBlock<B>>,
    head: Linear<B>,
}

impl<B: Backend> OutcomeNet<B> {
    pub fn new(device: &B::Device, shape: &NetShape) -> Result<Self> {
        let input_dim = shape.input_dim();
        if input_dim == 0 {
            return Err(KickoffError::Model("network has no inputs".to_string()));
        }
        if shape.n_classes == 0 {
            return Err(KickoffError::Model("network has no classes".to_string()));
        }

        let team_embedding = shape
            .uses_embedding()
            .then(|| TeamEmbedding::new(device, shape.vocab_size, shape.embedding_dim));

        let mut hidden = Vec::with_capacity(shape.hidden_dims.len());
        let mut in_dim = input_dim;
        for &out_dim in &shape.hidden_dims {
            hidden.push(HiddenBlock::new(device, in_dim, out_dim, shape.dropout));
            in_dim = out_dim;
        }

        Ok(OutcomeNet {
            team_embedding,
            hidden,
            head: LinearConfig::new(in_dim, shape.n_classes).init(device),
        })
    }

    /// Class logits [batch, n_classes]
    pub fn forward(&self, inputs: NetInputs<B>) -> Tensor<B, 2> {
        let mut parts = Vec::with_capacity(2);
        if let Some(numeric) = inputs.numeric {
            parts.push(numeric);
        }
        if let (Some(embedding), Some(ids)) = (&self.team_embedding, inputs.team_ids) {
            parts.push(embedding.forward(ids));
        }

        let mut x = Tensor::cat(parts, 1);
        for block in &self.hidden {
            x = block.forward(x);
        }
        self.head.forward(x)
    }

    /// Save weights; the recorder appends `.mpk`
    pub fn save(&self, path: &Path) -> Result<()>
    where
        B::FloatElem: serde::Serialize + serde::de::DeserializeOwned,
        B::IntElem: serde::Serialize + serde::de::DeserializeOwned,
    {
        let recorder = burn::record::NamedMpkFileRecorder::<FullPrecisionSettings>::new();
        recorder
            .record(self.clone().into_record(), path.to_path_buf())
            .map_err(|e| KickoffError::Io(std::io::Error::other(e.to_string())))
    }

    pub fn load(device: &B::Device, path: &Path, shape: &NetShape) -> Result<Self>
    where
        B::FloatElem: serde::Serialize + serde::de::DeserializeOwned,
        B::IntElem: serde::Serialize + serde::de::DeserializeOwned,
    {
        let recorder = burn::record::NamedMpkFileRecorder::<FullPrecisionSettings>::new();
        let record = recorder
            .load(path.to_path_buf(), device)
            .map_err(|e| KickoffError::Io(std::io::Error::other(e.to_string())))?;

        let model = Self::new(device, shape)?;
        Ok(model.load_record(record))
    }
}
