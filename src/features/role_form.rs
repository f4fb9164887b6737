//! Home-only and away-only rolling form
//!
//! Each (team, role) pair owns its own ordered history. A team's home form
//! never sees its away matches and vice versa, but histories do span seasons.

use crate::features::rolling::full_window_sum;
use crate::features::row::{RoleForm, Side, WindowForm};
use std::collections::HashMap;

/// Results of one team in one role, oldest first
#[derive(Debug, Clone, Default)]
struct RoleHistory {
    wins: Vec<i32>,
    scored: Vec<i32>,
    conceded: Vec<i32>,
    goal_diff: Vec<i32>,
}

/// Arena of per-(team, role) histories
#[derive(Debug, Default)]
pub struct RoleHistories {
    windows: Vec<usize>,
    histories: HashMap<(String, Side), RoleHistory>,
}

impl RoleHistories {
    pub fn new(windows: &[usize]) -> Self {
        RoleHistories {
            windows: windows.to_vec(),
            histories: HashMap::new(),
        }
    }

    /// Form of `team` in `role` from the matches recorded so far
    pub fn form(&self, team: &str, role: Side) -> RoleForm {
        let history = self.histories.get(&(team.to_string(), role));
        let windows = self
            .windows
            .iter()
            .map(|&window| match history {
                Some(h) => WindowForm {
                    window,
                    wins: full_window_sum(&h.wins, window),
                    scored: full_window_sum(&h.scored, window),
                    conceded: full_window_sum(&h.conceded, window),
                    goal_diff: full_window_sum(&h.goal_diff, window),
                },
                None => WindowForm {
                    window,
                    ..Default::default()
                },
            })
            .collect();
        RoleForm { windows }
    }

    /// Append a completed match seen from `team` playing `role`
    pub fn record(&mut self, team: &str, role: Side, scored: u32, conceded: u32) {
        let history = self
            .histories
            .entry((team.to_string(), role))
            .or_default();
        let (scored, conceded) = (scored as i32, conceded as i32);
        history.wins.push(i32::from(scored > conceded));
        history.scored.push(scored);
        history.conceded.push(conceded);
        history.goal_diff.push(scored - conceded);
    }
}
