//! Rolling-origin fold scheduling

use chrono::{Duration, NaiveDate};
use log::info;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One walk-forward split, all bounds inclusive at day granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fold {
    pub train_end: NaiveDate,
    pub val_start: NaiveDate,
    pub val_end: NaiveDate,
}

impl Fold {
    pub fn in_train(&self, date: NaiveDate) -> bool {
        date <= self.train_end
    }

    pub fn in_validation(&self, date: NaiveDate) -> bool {
        date >= self.val_start && date <= self.val_end
    }
}

impl fmt::Display for Fold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "train <= {}, validate {} .. {}",
            self.train_end, self.val_start, self.val_end
        )
    }
}

/// Folds anchored at `anchor`, most recent first.
///
/// Fold `i` validates on `[anchor - i*gap - span, anchor - i*gap]` and trains
/// on everything up to the day before that window opens.
pub fn generate_folds(
    anchor: NaiveDate,
    fold_count: usize,
    validation_span_days: i64,
    gap_days: i64,
) -> Vec<Fold> {
    let folds: Vec<Fold> = (0..fold_count)
        .map(|i| {
            let val_end = anchor - Duration::days(i as i64 * gap_days);
            let val_start = val_end - Duration::days(validation_span_days);
            Fold {
                train_end: val_start - Duration::days(1),
                val_start,
                val_end,
            }
        })
        .collect();

    for (i, fold) in folds.iter().enumerate() {
        info!("Fold {}: {}", i, fold);
    }
    folds
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_default_schedule() {
        let folds = generate_folds(date(2025, 5, 25), 3, 30, 10);
        assert_eq!(folds.len(), 3);
        assert_eq!(folds[0].val_end, date(2025, 5, 25));
        assert_eq!(folds[0].val_start, date(2025, 4, 25));
        assert_eq!(folds[0].train_end, date(2025, 4, 24));
        assert_eq!(folds[2].val_end, date(2025, 5, 5));
        assert_eq!(folds[2].train_end, date(2025, 4, 4));
    }

    #[test]
    fn test_folds_are_ordered_and_well_formed() {
        for (count, span, gap) in [(3, 30, 10), (5, 7, 7), (4, 0, 3), (2, 60, 45)] {
            let folds = generate_folds(date(2024, 12, 31), count, span, gap);
            for fold in &folds {
                assert!(fold.train_end < fold.val_start);
                assert!(fold.val_start <= fold.val_end);
            }
            for pair in folds.windows(2) {
                assert!(pair[1].val_end <= pair[0].val_end);
                assert!(pair[1].val_start <= pair[0].val_start);
            }
        }
    }

    #[test]
    fn test_window_membership_is_inclusive() {
        let fold = generate_folds(date(2025, 1, 31), 1, 10, 10)[0];
        assert!(fold.in_validation(date(2025, 1, 21)));
        assert!(fold.in_validation(date(2025, 1, 31)));
        assert!(!fold.in_validation(date(2025, 1, 20)));
        assert!(fold.in_train(date(2025, 1, 20)));
        assert!(!fold.in_train(date(2025, 1, 21)));
    }
}
