//! Classification metrics and training history

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

const PROBA_EPS: f64 = 1e-15;

/// Precision/recall/F1 for one class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassReport {
    pub class: usize,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Scores of one probabilistic classifier on one labelled set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    pub samples: usize,
    pub accuracy: f64,
    pub log_loss: f64,
    pub f1_macro: f64,
    pub f1_weighted: f64,
    pub per_class: Vec<ClassReport>,
}

impl ClassificationMetrics {
    /// Score class probabilities against true class indices.
    ///
    /// Per-class figures cover every class seen in either the truth or the
    /// predictions; a class with no predicted or no true members scores 0.
    pub fn evaluate(y_true: &[usize], proba: &[Vec<f64>]) -> Self {
        let n = y_true.len().min(proba.len());
        if n == 0 {
            return ClassificationMetrics {
                samples: 0,
                accuracy: 0.0,
                log_loss: 0.0,
                f1_macro: 0.0,
                f1_weighted: 0.0,
                per_class: Vec::new(),
            };
        }

        let y_pred: Vec<usize> = proba[..n].iter().map(|p| argmax(p)).collect();
        let correct = y_true[..n]
            .iter()
            .zip(&y_pred)
            .filter(|(t, p)| t == p)
            .count();

        let log_loss = y_true[..n]
            .iter()
            .zip(&proba[..n])
            .map(|(&t, p)| {
                let total: f64 = p.iter().sum();
                let actual = p.get(t).copied().unwrap_or(0.0) / total.max(PROBA_EPS);
                -actual.clamp(PROBA_EPS, 1.0 - PROBA_EPS).ln()
            })
            .sum::<f64>()
            / n as f64;

        let classes: BTreeSet<usize> = y_true[..n].iter().chain(&y_pred).copied().collect();
        let per_class: Vec<ClassReport> = classes
            .iter()
            .map(|&class| {
                let tp = y_true[..n]
                    .iter()
                    .zip(&y_pred)
                    .filter(|(t, p)| **t == class && **p == class)
                    .count();
                let predicted = y_pred.iter().filter(|p| **p == class).count();
                let support = y_true[..n].iter().filter(|t| **t == class).count();
                let precision = ratio(tp, predicted);
                let recall = ratio(tp, support);
                let f1 = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };
                ClassReport {
                    class,
                    precision,
                    recall,
                    f1,
                    support,
                }
            })
            .collect();

        let f1_macro = per_class.iter().map(|c| c.f1).sum::<f64>() / per_class.len() as f64;
        let f1_weighted =
            per_class.iter().map(|c| c.f1 * c.support as f64).sum::<f64>() / n as f64;

        ClassificationMetrics {
            samples: n,
            accuracy: correct as f64 / n as f64,
            log_loss,
            f1_macro,
            f1_weighted,
            per_class,
        }
    }
}

impl fmt::Display for ClassificationMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Acc: {:.2}% | LogLoss: {:.4} | F1 macro: {:.4} | F1 weighted: {:.4} | n={}",
            self.accuracy * 100.0,
            self.log_loss,
            self.f1_macro,
            self.f1_weighted,
            self.samples
        )
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Index of the largest probability; ties go to the lowest index
pub fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

/// Per-epoch losses for tracking progress
#[derive(Debug, Clone, Default)]
pub struct TrainingHistory {
    pub train_losses: Vec<f64>,
    pub val_losses: Vec<f64>,
    pub best_val_loss: f64,
    pub best_epoch: usize,
}

impl TrainingHistory {
    pub fn new() -> Self {
        Self {
            best_val_loss: f64::INFINITY,
            ..Default::default()
        }
    }

    /// Record losses for an epoch; returns true when validation improved
    pub fn record_epoch(&mut self, epoch: usize, train_loss: f64, val_loss: Option<f64>) -> bool {
        self.train_losses.push(train_loss);
        let Some(val_loss) = val_loss else {
            self.best_epoch = epoch;
            return false;
        };
        self.val_losses.push(val_loss);
        if val_loss < self.best_val_loss {
            self.best_val_loss = val_loss;
            self.best_epoch = epoch;
            return true;
        }
        false
    }

    /// Check if we should early stop
    pub fn should_early_stop(&self, patience: usize) -> bool {
        if patience == 0 || self.val_losses.len() < patience {
            return false;
        }
        let current_epoch = self.val_losses.len() - 1;
        current_epoch - self.best_epoch >= patience
    }

    pub fn epochs(&self) -> usize {
        self.train_losses.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_hot(class: usize, p: f64) -> Vec<f64> {
        let rest = (1.0 - p) / 2.0;
        (0..3).map(|c| if c == class { p } else { rest }).collect()
    }

    #[test]
    fn test_perfect_predictions() {
        let y = vec![0, 1, 2, 0];
        let proba: Vec<_> = y.iter().map(|&c| one_hot(c, 0.9)).collect();
        let m = ClassificationMetrics::evaluate(&y, &proba);
        assert_eq!(m.accuracy, 1.0);
        assert!((m.f1_macro - 1.0).abs() < 1e-12);
        assert!((m.f1_weighted - 1.0).abs() < 1e-12);
        assert!((m.log_loss - (-(0.9f64).ln())).abs() < 1e-9);
    }

    #[test]
    fn test_f1_against_hand_computed_values() {
        // truth:     0 0 0 1 1 2
        // predicted: 0 0 1 1 0 2
        let y = vec![0, 0, 0, 1, 1, 2];
        let pred = [0, 0, 1, 1, 0, 2];
        let proba: Vec<_> = pred.iter().map(|&c| one_hot(c, 0.6)).collect();
        let m = ClassificationMetrics::evaluate(&y, &proba);

        assert!((m.accuracy - 4.0 / 6.0).abs() < 1e-12);
        // class 0: p=2/3 r=2/3 f1=2/3; class 1: p=1/2 r=1/2 f1=1/2; class 2: f1=1
        let f1 = [2.0 / 3.0, 0.5, 1.0];
        for (report, expected) in m.per_class.iter().zip(f1) {
            assert!((report.f1 - expected).abs() < 1e-12);
        }
        assert!((m.f1_macro - (2.0 / 3.0 + 0.5 + 1.0) / 3.0).abs() < 1e-12);
        let weighted = (2.0 / 3.0 * 3.0 + 0.5 * 2.0 + 1.0) / 6.0;
        assert!((m.f1_weighted - weighted).abs() < 1e-12);
        assert_eq!(m.per_class[0].support, 3);
    }

    #[test]
    fn test_predicted_only_class_counts_in_macro() {
        let y = vec![0, 0];
        let proba = vec![one_hot(0, 0.8), one_hot(1, 0.8)];
        let m = ClassificationMetrics::evaluate(&y, &proba);
        assert_eq!(m.per_class.len(), 2);
        // class 0: p=1, r=0.5 -> 2/3; class 1: 0
        assert!((m.f1_macro - (2.0 / 3.0) / 2.0).abs() < 1e-12);
        assert!((m.f1_weighted - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_input() {
        let m = ClassificationMetrics::evaluate(&[], &[]);
        assert_eq!(m.samples, 0);
    }

    #[test]
    fn test_early_stopping() {
        let mut history = TrainingHistory::new();
        assert!(history.record_epoch(0, 1.0, Some(0.9)));
        assert!(!history.record_epoch(1, 0.9, Some(0.95)));
        assert!(!history.should_early_stop(2));
        assert!(!history.record_epoch(2, 0.8, Some(0.97)));
        assert!(history.should_early_stop(2));
        assert_eq!(history.best_epoch, 0);
    }
}
