//! Role-agnostic in-season form
//!
//! Every fixture is seen twice, once from each team's point of view, and
//! accumulated per (season, team). Windows here accept partial history: the
//! first match of a season reads zeros, the second reads one match, and so on.

use crate::features::rolling::{partial_window_mean, partial_window_sum, round2};
use crate::features::row::OverallForm;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
struct SeasonHistory {
    points: Vec<u32>,
    wins: Vec<u32>,
}

/// Arena of per-(season, team) histories
#[derive(Debug)]
pub struct SeasonHistories {
    season_window: usize,
    recent_window: usize,
    histories: HashMap<(i32, String), SeasonHistory>,
}

impl SeasonHistories {
    pub fn new(season_window: usize, recent_window: usize) -> Self {
        SeasonHistories {
            season_window,
            recent_window,
            histories: HashMap::new(),
        }
    }

    pub fn form(&self, season: i32, team: &str) -> OverallForm {
        let Some(history) = self.histories.get(&(season, team.to_string())) else {
            return OverallForm::default();
        };

        let total_points = partial_window_sum(&history.points, self.season_window) as i32;
        // Truncating cast: only an unbroken run of wins reads 1
        let recent_wins = partial_window_mean(&history.wins, self.recent_window)
            .map(|mean| mean as i32)
            .unwrap_or(0);
        let season_win_rate = partial_window_mean(&history.wins, self.season_window)
            .map(|mean| round2(mean * 100.0))
            .unwrap_or(0.0);

        OverallForm {
            total_points,
            recent_wins,
            season_win_rate,
        }
    }

    /// Append one team's result: league points earned and whether it won
    pub fn record(&mut self, season: i32, team: &str, points: u32) {
        let history = self
            .histories
            .entry((season, team.to_string()))
            .or_default();
        history.points.push(points);
        history.wins.push(u32::from(points == 3));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_season_to_date_aggregates() {
        let mut histories = SeasonHistories::new(38, 2);
        assert_eq!(histories.form(2024, "Everton"), OverallForm::default());

        for points in [3, 1, 3] {
            histories.record(2024, "Everton", points);
        }
        let form = histories.form(2024, "Everton");
        assert_eq!(form.total_points, 7);
        // last two: draw then win -> mean 0.5 truncates to 0
        assert_eq!(form.recent_wins, 0);
        assert_eq!(form.season_win_rate, 66.67);

        histories.record(2024, "Everton", 3);
        assert_eq!(histories.form(2024, "Everton").recent_wins, 1);
    }

    #[test]
    fn test_new_season_starts_from_zero() {
        let mut histories = SeasonHistories::new(38, 5);
        histories.record(2023, "Fulham", 3);
        let form = histories.form(2024, "Fulham");
        assert_eq!(form.total_points, 0);
        assert_eq!(form.season_win_rate, 0.0);
    }

    #[test]
    fn test_season_window_caps_history() {
        let mut histories = SeasonHistories::new(2, 5);
        for points in [3, 0, 1] {
            histories.record(2024, "Brentford", points);
        }
        assert_eq!(histories.form(2024, "Brentford").total_points, 1);
    }
}
