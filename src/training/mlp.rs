//! Burn MLP implementation of [`OutcomeClassifier`]
//!
//! Full-batch Adam on softmax cross-entropy. Tables here are a few thousand
//! rows at most, so every epoch is one step over the whole training set.

use burn::module::AutodiffModule;
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::tensor::activation::{log_softmax, softmax};
use burn::tensor::backend::{AutodiffBackend, Backend};
use burn::tensor::{ElementConversion, Tensor};
use log::{debug, info};

use crate::features::FeatureMatrix;
use crate::model::net::{NetInputs, NetShape, OutcomeNet};
use crate::model::preprocess::Preprocessor;
use crate::training::classifier::{LabeledSet, OutcomeClassifier, ProbabilisticModel};
use crate::training::metrics::TrainingHistory;
use crate::{KickoffError, ModelConfig, Result};

/// Hyperparameters plus the device to train on
#[derive(Debug, Clone)]
pub struct MlpClassifier<B: AutodiffBackend> {
    config: ModelConfig,
    early_stopping_patience: usize,
    device: B::Device,
}

impl<B: AutodiffBackend> MlpClassifier<B> {
    pub fn new(config: ModelConfig, early_stopping_patience: usize, device: B::Device) -> Self {
        MlpClassifier {
            config,
            early_stopping_patience,
            device,
        }
    }
}

/// A trained network with the preprocessing it was trained behind
#[derive(Debug)]
pub struct FittedMlp<B: Backend> {
    pub net: OutcomeNet<B>,
    pub preprocessor: Preprocessor,
    pub shape: NetShape,
    pub history: TrainingHistory,
    pub device: B::Device,
}

fn one_hot<B: Backend>(labels: &[usize], n_classes: usize, device: &B::Device) -> Tensor<B, 2> {
    let mut data = vec![0.0f32; labels.len() * n_classes];
    for (i, &label) in labels.iter().enumerate() {
        data[i * n_classes + label] = 1.0;
    }
    Tensor::<B, 1>::from_floats(data.as_slice(), device).reshape([labels.len(), n_classes])
}

/// Mean softmax cross-entropy against one-hot targets
fn cross_entropy<B: Backend>(logits: Tensor<B, 2>, targets: Tensor<B, 2>) -> Tensor<B, 1> {
    (log_softmax(logits, 1) * targets).sum_dim(1).mean().neg()
}

fn check_labels(set: &LabeledSet, n_classes: usize) -> Result<()> {
    match set.labels.iter().find(|l| **l >= n_classes) {
        Some(label) => Err(KickoffError::Model(format!(
            "class index {} outside {} classes",
            label, n_classes
        ))),
        None => Ok(()),
    }
}

impl<B: AutodiffBackend> OutcomeClassifier for MlpClassifier<B> {
    type Model = FittedMlp<B::InnerBackend>;

    fn fit(
        &self,
        train: &LabeledSet,
        eval: Option<&LabeledSet>,
        n_classes: usize,
    ) -> Result<Self::Model> {
        if train.is_empty() {
            return Err(KickoffError::EmptyTrainingSet);
        }
        check_labels(train, n_classes)?;
        if let Some(eval) = eval {
            check_labels(eval, n_classes)?;
        }

        let preprocessor = Preprocessor::fit(&train.features);
        let shape = NetShape {
            numeric_dim: preprocessor.numeric_dim(),
            categorical_count: preprocessor.categorical_count(),
            vocab_size: preprocessor.vocab_size(),
            embedding_dim: self.config.team_embedding_dim,
            hidden_dims: self.config.hidden_dims.clone(),
            dropout: self.config.dropout,
            n_classes,
        };

        let mut model = OutcomeNet::<B>::new(&self.device, &shape)?;
        let mut optimizer = AdamConfig::new()
            .with_weight_decay(Some(burn::optim::decay::WeightDecayConfig::new(
                self.config.weight_decay as f32,
            )))
            .init();

        let inputs = NetInputs::<B>::from_encoded(
            &preprocessor.transform(&train.features),
            &shape,
            &self.device,
        );
        let targets = one_hot::<B>(&train.labels, n_classes, &self.device);

        let eval_tensors = eval.filter(|e| !e.is_empty()).map(|e| {
            (
                NetInputs::<B::InnerBackend>::from_encoded(
                    &preprocessor.transform(&e.features),
                    &shape,
                    &self.device,
                ),
                one_hot::<B::InnerBackend>(&e.labels, n_classes, &self.device),
            )
        });

        let mut history = TrainingHistory::new();
        let mut best: Option<OutcomeNet<B::InnerBackend>> = None;

        for epoch in 0..self.config.epochs {
            let logits = model.forward(inputs.clone());
            let loss = cross_entropy(logits, targets.clone());
            let train_loss: f32 = loss.clone().into_scalar().elem();

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optimizer.step(self.config.learning_rate, model, grads);

            let val_loss = eval_tensors.as_ref().map(|(x, y)| {
                let logits = model.valid().forward(x.clone());
                let loss: f32 = cross_entropy(logits, y.clone()).into_scalar().elem();
                loss as f64
            });

            if history.record_epoch(epoch, train_loss as f64, val_loss) {
                best = Some(model.valid());
            }

            debug!(
                "Epoch {}/{}: train loss {:.4}{}",
                epoch + 1,
                self.config.epochs,
                train_loss,
                val_loss
                    .map(|v| format!(", val loss {:.4}", v))
                    .unwrap_or_default()
            );

            if eval_tensors.is_some() && history.should_early_stop(self.early_stopping_patience) {
                info!(
                    "Early stopping at epoch {} (best was epoch {})",
                    epoch + 1,
                    history.best_epoch + 1
                );
                break;
            }
        }

        let net = best.unwrap_or_else(|| model.valid());
        Ok(FittedMlp {
            net,
            preprocessor,
            shape,
            history,
            device: self.device.clone(),
        })
    }
}

impl<B: Backend> FittedMlp<B> {
    /// Probabilities as a [rows, n_classes] tensor
    fn forward_proba(&self, features: &FeatureMatrix, device: &B::Device) -> Tensor<B, 2> {
        let inputs =
            NetInputs::<B>::from_encoded(&self.preprocessor.transform(features), &self.shape, device);
        softmax(self.net.forward(inputs), 1)
    }
}

impl<B: Backend> ProbabilisticModel for FittedMlp<B> {
    fn predict_proba(&self, features: &FeatureMatrix) -> Result<Vec<Vec<f64>>> {
        if features.is_empty() {
            return Ok(Vec::new());
        }
        let flat: Vec<f32> = self
            .forward_proba(features, &self.device)
            .into_data()
            .to_vec()
            .map_err(|e| KickoffError::Model(format!("{:?}", e)))?;

        Ok(flat
            .chunks(self.shape.n_classes)
            .map(|row| row.iter().map(|p| *p as f64).collect())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::metrics::argmax;
    use burn::backend::{Autodiff, NdArray};

    type TrainB = Autodiff<NdArray<f32>>;

    fn config(epochs: usize) -> ModelConfig {
        ModelConfig {
            epochs,
            learning_rate: 0.05,
            weight_decay: 0.0,
            hidden_dims: vec![16],
            dropout: 0.0,
            team_embedding_dim: 0,
        }
    }

    /// Three well separated clusters on one numeric input
    fn clusters(per_class: usize) -> LabeledSet {
        let mut numeric = Vec::new();
        let mut labels = Vec::new();
        for i in 0..per_class {
            for (class, centre) in [(0usize, -4.0), (1, 0.0), (2, 4.0)] {
                numeric.push(vec![Some(centre + (i % 3) as f64 * 0.1)]);
                labels.push(class);
            }
        }
        LabeledSet {
            features: FeatureMatrix {
                numeric_names: vec!["x".to_string()],
                categorical_names: vec![],
                categorical: vec![vec![]; numeric.len()],
                numeric,
            },
            labels,
        }
    }

    #[test]
    fn test_learns_separable_classes() {
        let classifier = MlpClassifier::<TrainB>::new(config(500), 0, Default::default());
        let train = clusters(10);
        let model = classifier.fit(&train, None, 3).unwrap();
        assert_eq!(model.history.epochs(), 500);

        let proba = model.predict_proba(&train.features).unwrap();
        assert_eq!(proba.len(), train.len());
        for (p, label) in proba.iter().zip(&train.labels) {
            assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-4);
            assert_eq!(argmax(p), *label);
        }
    }

    #[test]
    fn test_early_stopping_with_eval_set() {
        let classifier = MlpClassifier::<TrainB>::new(config(500), 5, Default::default());
        let train = clusters(5);
        let model = classifier.fit(&train, Some(&clusters(2)), 3).unwrap();
        assert!(model.history.epochs() <= 500);
        assert!(model.history.best_val_loss.is_finite());
    }

    #[test]
    fn test_rejects_empty_and_out_of_range() {
        let classifier = MlpClassifier::<TrainB>::new(config(10), 0, Default::default());
        assert!(matches!(
            classifier.fit(&LabeledSet::default(), None, 3),
            Err(KickoffError::EmptyTrainingSet)
        ));
        assert!(classifier.fit(&clusters(2), None, 2).is_err());
    }
}
