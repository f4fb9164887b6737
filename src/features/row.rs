//! Per-fixture feature record

use crate::{MatchRecord, MatchStatus, Outcome, SeasonStanding, TeamStatRecord};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Which side of a fixture a value describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Home,
    Away,
}

impl Side {
    pub fn prefix(&self) -> &'static str {
        match self {
            Side::Home => "home",
            Side::Away => "away",
        }
    }

    pub fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "home" => Some(Side::Home),
            "away" => Some(Side::Away),
            _ => None,
        }
    }
}

/// Joined match statistics for one side
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatLine {
    pub shots_on_goal: Option<f64>,
    pub shots_off_goal: Option<f64>,
    pub possession: Option<f64>,
    pub passes: Option<f64>,
    pub passes_accuracy: Option<f64>,
    pub fouls: Option<f64>,
    pub corners: Option<f64>,
    pub yellow_cards: Option<f64>,
    pub red_cards: Option<f64>,
}

impl StatLine {
    pub fn from_record(record: &TeamStatRecord) -> Self {
        StatLine {
            shots_on_goal: record.shots_on_goal,
            shots_off_goal: record.shots_off_goal,
            possession: record.possession,
            passes: record.passes,
            passes_accuracy: record.passes_accuracy,
            fouls: record.fouls,
            corners: record.corners,
            yellow_cards: record.yellow_cards,
            red_cards: record.red_cards,
        }
    }

    /// Provider omits zero-valued counters on completed matches
    pub fn fill_missing_with_zero(&mut self) {
        for value in self.values_mut() {
            value.get_or_insert(0.0);
        }
    }

    fn values_mut(&mut self) -> [&mut Option<f64>; 9] {
        [
            &mut self.shots_on_goal,
            &mut self.shots_off_goal,
            &mut self.possession,
            &mut self.passes,
            &mut self.passes_accuracy,
            &mut self.fouls,
            &mut self.corners,
            &mut self.yellow_cards,
            &mut self.red_cards,
        ]
    }
}

/// Previous-season final standing carried into a fixture
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CarryOver {
    pub position: u32,
    pub points: u32,
    pub won: u32,
    pub drawn: u32,
    pub lost: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    pub goal_difference: i32,
}

impl From<&SeasonStanding> for CarryOver {
    fn from(s: &SeasonStanding) -> Self {
        CarryOver {
            position: s.position,
            points: s.points,
            won: s.won,
            drawn: s.drawn,
            lost: s.lost,
            goals_for: s.goals_for,
            goals_against: s.goals_against,
            goal_difference: s.goal_difference,
        }
    }
}

/// Role-specific aggregates over the previous `window` matches in that role
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowForm {
    pub window: usize,
    pub wins: i32,
    pub scored: i32,
    pub conceded: i32,
    pub goal_diff: i32,
}

/// Home-only or away-only form for one side of a fixture
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoleForm {
    pub windows: Vec<WindowForm>,
}

impl RoleForm {
    pub fn window(&self, window: usize) -> Option<&WindowForm> {
        self.windows.iter().find(|w| w.window == window)
    }
}

/// Role-agnostic in-season aggregates for one side of a fixture
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OverallForm {
    /// League points from earlier matches this season
    pub total_points: i32,
    /// Truncated mean of the recent win flags
    pub recent_wins: i32,
    /// Season-to-date win percentage, two decimals
    pub season_win_rate: f64,
}

/// One fixture with every derived value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureRow {
    pub fixture_id: i64,
    pub date: NaiveDateTime,
    pub season: i32,
    pub home_team: String,
    pub away_team: String,
    pub home_score: Option<u32>,
    pub away_score: Option<u32>,
    pub status: MatchStatus,
    pub target: Option<Outcome>,
    pub home_stats: StatLine,
    pub away_stats: StatLine,
    pub home_carry: Option<CarryOver>,
    pub away_carry: Option<CarryOver>,
    pub home_form: RoleForm,
    pub away_form: RoleForm,
    pub home_overall: OverallForm,
    pub away_overall: OverallForm,
}

impl FeatureRow {
    /// Bare row carrying only the fixture fields
    pub fn from_match(record: &MatchRecord) -> Self {
        FeatureRow {
            fixture_id: record.fixture_id,
            date: record.date,
            season: record.season,
            home_team: record.home_team.clone(),
            away_team: record.away_team.clone(),
            home_score: record.home_score,
            away_score: record.away_score,
            status: record.status.clone(),
            target: record.outcome(),
            home_stats: StatLine::default(),
            away_stats: StatLine::default(),
            home_carry: None,
            away_carry: None,
            home_form: RoleForm::default(),
            away_form: RoleForm::default(),
            home_overall: OverallForm::default(),
            away_overall: OverallForm::default(),
        }
    }

    pub fn is_played(&self) -> bool {
        self.status.is_played() && self.target.is_some()
    }

    pub fn team(&self, side: Side) -> &str {
        match side {
            Side::Home => &self.home_team,
            Side::Away => &self.away_team,
        }
    }

    pub fn side_of(&self, team: &str) -> Option<Side> {
        if self.home_team == team {
            Some(Side::Home)
        } else if self.away_team == team {
            Some(Side::Away)
        } else {
            None
        }
    }

    pub fn stats(&self, side: Side) -> &StatLine {
        match side {
            Side::Home => &self.home_stats,
            Side::Away => &self.away_stats,
        }
    }

    pub fn carry(&self, side: Side) -> Option<&CarryOver> {
        match side {
            Side::Home => self.home_carry.as_ref(),
            Side::Away => self.away_carry.as_ref(),
        }
    }

    pub fn carry_mut(&mut self, side: Side) -> &mut Option<CarryOver> {
        match side {
            Side::Home => &mut self.home_carry,
            Side::Away => &mut self.away_carry,
        }
    }

    pub fn form(&self, side: Side) -> &RoleForm {
        match side {
            Side::Home => &self.home_form,
            Side::Away => &self.away_form,
        }
    }

    pub fn overall(&self, side: Side) -> &OverallForm {
        match side {
            Side::Home => &self.home_overall,
            Side::Away => &self.away_overall,
        }
    }

    pub fn overall_mut(&mut self, side: Side) -> &mut OverallForm {
        match side {
            Side::Home => &mut self.home_overall,
            Side::Away => &mut self.away_overall,
        }
    }

    /// Difference in season-to-date league points
    pub fn points_difference(&self) -> i32 {
        self.home_overall.total_points - self.away_overall.total_points
    }

    /// Goals for and against from the perspective of `side`
    pub fn goals_for(&self, side: Side) -> Option<(u32, u32)> {
        let (h, a) = (self.home_score?, self.away_score?);
        Some(match side {
            Side::Home => (h, a),
            Side::Away => (a, h),
        })
    }
}
