//! Dense integer encoding of match outcomes

use crate::Outcome;
use serde::{Deserialize, Serialize};

/// Outcome <-> class index mapping in first-occurrence order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
    labels: Vec<Outcome>,
}

impl LabelEncoder {
    /// Assign indices in the order outcomes first appear
    pub fn fit<I: IntoIterator<Item = Outcome>>(targets: I) -> Self {
        let mut labels = Vec::new();
        for outcome in targets {
            if !labels.contains(&outcome) {
                labels.push(outcome);
            }
        }
        LabelEncoder { labels }
    }

    pub fn from_labels(labels: Vec<Outcome>) -> Self {
        LabelEncoder { labels }
    }

    pub fn encode(&self, outcome: Outcome) -> Option<usize> {
        self.labels.iter().position(|l| *l == outcome)
    }

    pub fn decode(&self, index: usize) -> Option<Outcome> {
        self.labels.get(index).copied()
    }

    pub fn labels(&self) -> &[Outcome] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
