//! Named feature columns
//!
//! Every value a [`FeatureRow`] carries can be addressed by a column name such
//! as `home_recent_10_goal_diff` or `away_last_points`. The model input set is
//! a list of these names in configuration.

use crate::features::row::{FeatureRow, Side};
use crate::{FeatureConfig, KickoffError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prior-season standing field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CarryField {
    Points,
    Position,
    Won,
    Drawn,
    Lost,
    GoalsFor,
    GoalsAgainst,
    GoalDifference,
}

impl CarryField {
    pub const ALL: [CarryField; 8] = [
        CarryField::Points,
        CarryField::Position,
        CarryField::Won,
        CarryField::Drawn,
        CarryField::Lost,
        CarryField::GoalsFor,
        CarryField::GoalsAgainst,
        CarryField::GoalDifference,
    ];

    fn suffix(&self) -> &'static str {
        match self {
            CarryField::Points => "points",
            CarryField::Position => "position",
            CarryField::Won => "won",
            CarryField::Drawn => "drawn",
            CarryField::Lost => "lost",
            CarryField::GoalsFor => "gf",
            CarryField::GoalsAgainst => "ga",
            CarryField::GoalDifference => "gd",
        }
    }
}

/// Joined match statistic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatField {
    ShotsOnGoal,
    ShotsOffGoal,
    Possession,
    Passes,
    PassesAccuracy,
    Fouls,
    Corners,
    YellowCards,
    RedCards,
}

impl StatField {
    pub const ALL: [StatField; 9] = [
        StatField::ShotsOnGoal,
        StatField::ShotsOffGoal,
        StatField::Possession,
        StatField::Passes,
        StatField::PassesAccuracy,
        StatField::Fouls,
        StatField::Corners,
        StatField::YellowCards,
        StatField::RedCards,
    ];

    fn suffix(&self) -> &'static str {
        match self {
            StatField::ShotsOnGoal => "shots_on_goal",
            StatField::ShotsOffGoal => "shots_off_goal",
            StatField::Possession => "possession",
            StatField::Passes => "passes",
            StatField::PassesAccuracy => "passes_accuracy",
            StatField::Fouls => "fouls",
            StatField::Corners => "corners",
            StatField::YellowCards => "yellow_cards",
            StatField::RedCards => "red_cards",
        }
    }
}

/// Role-specific windowed aggregate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormField {
    Wins,
    Scores,
    GoalAgainst,
    GoalDiff,
}

impl FormField {
    pub const ALL: [FormField; 4] = [
        FormField::Wins,
        FormField::Scores,
        FormField::GoalAgainst,
        FormField::GoalDiff,
    ];
}

/// One addressable value of a feature row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureColumn {
    /// Team identity, categorical
    Team(Side),
    Carry(Side, CarryField),
    Stat(Side, StatField),
    Form(Side, FormField, usize),
    TotalPoints(Side),
    RecentWinsOverall(Side, usize),
    SeasonWinRate(Side),
    PointsDifference,
}

impl FeatureColumn {
    /// Resolve a column name against the configured windows
    pub fn parse(name: &str, config: &FeatureConfig) -> Result<Self> {
        let unknown = || KickoffError::UnknownFeature(name.to_string());

        if name == "points_difference" {
            return Ok(FeatureColumn::PointsDifference);
        }
        let (prefix, rest) = name.split_once('_').ok_or_else(unknown)?;
        let side = Side::from_prefix(prefix).ok_or_else(unknown)?;

        match rest {
            "team" => return Ok(FeatureColumn::Team(side)),
            "total_points" => return Ok(FeatureColumn::TotalPoints(side)),
            "season_wins_ave_overall" => return Ok(FeatureColumn::SeasonWinRate(side)),
            _ => {}
        }

        if let Some(field) = rest.strip_prefix("last_") {
            return CarryField::ALL
                .iter()
                .find(|f| f.suffix() == field)
                .map(|f| FeatureColumn::Carry(side, *f))
                .ok_or_else(unknown);
        }

        if let Some(window) = rest
            .strip_prefix("team_recent_")
            .and_then(|r| r.strip_suffix("_wins_overall"))
        {
            let window: usize = window.parse().map_err(|_| unknown())?;
            if window != config.overall_recent_window {
                return Err(unknown());
            }
            return Ok(FeatureColumn::RecentWinsOverall(side, window));
        }

        let form = if let Some(w) = rest
            .strip_prefix("team_recent_")
            .and_then(|r| r.strip_suffix("_wins"))
        {
            Some((FormField::Wins, w))
        } else if let Some(r) = rest.strip_prefix("recent_") {
            [
                ("_scores", FormField::Scores),
                ("_goal_against", FormField::GoalAgainst),
                ("_goal_diff", FormField::GoalDiff),
            ]
            .iter()
            .find_map(|(suffix, field)| r.strip_suffix(suffix).map(|w| (*field, w)))
        } else {
            None
        };
        if let Some((field, window)) = form {
            let window: usize = window.parse().map_err(|_| unknown())?;
            if !config.windows.contains(&window) {
                return Err(unknown());
            }
            return Ok(FeatureColumn::Form(side, field, window));
        }

        StatField::ALL
            .iter()
            .find(|f| f.suffix() == rest)
            .map(|f| FeatureColumn::Stat(side, *f))
            .ok_or_else(unknown)
    }

    pub fn is_categorical(&self) -> bool {
        matches!(self, FeatureColumn::Team(_))
    }

    /// Categorical value of the column
    pub fn category<'a>(&self, row: &'a FeatureRow) -> Option<&'a str> {
        match self {
            FeatureColumn::Team(side) => Some(row.team(*side)),
            _ => None,
        }
    }

    /// Numeric value of the column; `None` when absent or categorical
    pub fn value(&self, row: &FeatureRow) -> Option<f64> {
        match *self {
            FeatureColumn::Team(_) => None,
            FeatureColumn::Carry(side, field) => {
                let c = row.carry(side)?;
                Some(match field {
                    CarryField::Points => c.points as f64,
                    CarryField::Position => c.position as f64,
                    CarryField::Won => c.won as f64,
                    CarryField::Drawn => c.drawn as f64,
                    CarryField::Lost => c.lost as f64,
                    CarryField::GoalsFor => c.goals_for as f64,
                    CarryField::GoalsAgainst => c.goals_against as f64,
                    CarryField::GoalDifference => c.goal_difference as f64,
                })
            }
            FeatureColumn::Stat(side, field) => {
                let s = row.stats(side);
                match field {
                    StatField::ShotsOnGoal => s.shots_on_goal,
                    StatField::ShotsOffGoal => s.shots_off_goal,
                    StatField::Possession => s.possession,
                    StatField::Passes => s.passes,
                    StatField::PassesAccuracy => s.passes_accuracy,
                    StatField::Fouls => s.fouls,
                    StatField::Corners => s.corners,
                    StatField::YellowCards => s.yellow_cards,
                    StatField::RedCards => s.red_cards,
                }
            }
            FeatureColumn::Form(side, field, window) => {
                let w = row.form(side).window(window)?;
                let value = match field {
                    FormField::Wins => w.wins,
                    FormField::Scores => w.scored,
                    FormField::GoalAgainst => w.conceded,
                    FormField::GoalDiff => w.goal_diff,
                };
                Some(value as f64)
            }
            FeatureColumn::TotalPoints(side) => Some(row.overall(side).total_points as f64),
            FeatureColumn::RecentWinsOverall(side, _) => {
                Some(row.overall(side).recent_wins as f64)
            }
            FeatureColumn::SeasonWinRate(side) => Some(row.overall(side).season_win_rate),
            FeatureColumn::PointsDifference => Some(row.points_difference() as f64),
        }
    }

    /// Every column a row built with `config` exposes
    pub fn catalogue(config: &FeatureConfig) -> Vec<FeatureColumn> {
        let mut columns = Vec::new();
        for side in [Side::Home, Side::Away] {
            columns.push(FeatureColumn::Team(side));
            columns.extend(StatField::ALL.iter().map(|f| FeatureColumn::Stat(side, *f)));
            columns.extend(CarryField::ALL.iter().map(|f| FeatureColumn::Carry(side, *f)));
            for &window in &config.windows {
                columns.extend(
                    FormField::ALL
                        .iter()
                        .map(|f| FeatureColumn::Form(side, *f, window)),
                );
            }
            columns.push(FeatureColumn::TotalPoints(side));
            columns.push(FeatureColumn::RecentWinsOverall(
                side,
                config.overall_recent_window,
            ));
            columns.push(FeatureColumn::SeasonWinRate(side));
        }
        columns.push(FeatureColumn::PointsDifference);
        columns
    }

    /// Whether the column belongs to the rolling or cumulative form families
    pub fn is_form(&self) -> bool {
        matches!(
            self,
            FeatureColumn::Form(..)
                | FeatureColumn::TotalPoints(_)
                | FeatureColumn::RecentWinsOverall(..)
                | FeatureColumn::SeasonWinRate(_)
                | FeatureColumn::PointsDifference
        )
    }
}

impl fmt::Display for FeatureColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureColumn::Team(side) => write!(f, "{}_team", side.prefix()),
            FeatureColumn::Carry(side, field) => {
                write!(f, "{}_last_{}", side.prefix(), field.suffix())
            }
            FeatureColumn::Stat(side, field) => write!(f, "{}_{}", side.prefix(), field.suffix()),
            FeatureColumn::Form(side, field, w) => match field {
                FormField::Wins => write!(f, "{}_team_recent_{}_wins", side.prefix(), w),
                FormField::Scores => write!(f, "{}_recent_{}_scores", side.prefix(), w),
                FormField::GoalAgainst => {
                    write!(f, "{}_recent_{}_goal_against", side.prefix(), w)
                }
                FormField::GoalDiff => write!(f, "{}_recent_{}_goal_diff", side.prefix(), w),
            },
            FeatureColumn::TotalPoints(side) => write!(f, "{}_total_points", side.prefix()),
            FeatureColumn::RecentWinsOverall(side, w) => {
                write!(f, "{}_team_recent_{}_wins_overall", side.prefix(), w)
            }
            FeatureColumn::SeasonWinRate(side) => {
                write!(f, "{}_season_wins_ave_overall", side.prefix())
            }
            FeatureColumn::PointsDifference => write!(f, "points_difference"),
        }
    }
}

/// The ordered model input columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSpec {
    pub columns: Vec<FeatureColumn>,
}

impl FeatureSpec {
    pub fn from_config(config: &FeatureConfig) -> Result<Self> {
        let columns = config
            .columns
            .iter()
            .map(|name| FeatureColumn::parse(name, config))
            .collect::<Result<Vec<_>>>()?;
        Ok(FeatureSpec { columns })
    }

    pub fn names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.to_string()).collect()
    }

    pub fn numeric(&self) -> impl Iterator<Item = &FeatureColumn> {
        self.columns.iter().filter(|c| !c.is_categorical())
    }

    pub fn categorical(&self) -> impl Iterator<Item = &FeatureColumn> {
        self.columns.iter().filter(|c| c.is_categorical())
    }

    /// Project rows onto the input columns
    pub fn matrix<'a, I>(&self, rows: I) -> FeatureMatrix
    where
        I: IntoIterator<Item = &'a FeatureRow>,
    {
        let rows: Vec<&FeatureRow> = rows.into_iter().collect();
        FeatureMatrix {
            numeric_names: self.numeric().map(|c| c.to_string()).collect(),
            categorical_names: self.categorical().map(|c| c.to_string()).collect(),
            numeric: rows
                .iter()
                .map(|row| self.numeric().map(|c| c.value(row)).collect())
                .collect(),
            categorical: rows
                .iter()
                .map(|row| {
                    self.categorical()
                        .filter_map(|c| c.category(row).map(str::to_string))
                        .collect()
                })
                .collect(),
        }
    }
}

/// Row-major model inputs
#[derive(Debug, Clone, Default)]
pub struct FeatureMatrix {
    pub numeric_names: Vec<String>,
    pub categorical_names: Vec<String>,
    pub numeric: Vec<Vec<Option<f64>>>,
    pub categorical: Vec<Vec<String>>,
}

impl FeatureMatrix {
    pub fn len(&self) -> usize {
        self.numeric.len()
    }

    pub fn is_empty(&self) -> bool {
        self.numeric.is_empty()
    }

    /// Subset of rows by index
    pub fn select(&self, indices: &[usize]) -> FeatureMatrix {
        FeatureMatrix {
            numeric_names: self.numeric_names.clone(),
            categorical_names: self.categorical_names.clone(),
            numeric: indices.iter().map(|&i| self.numeric[i].clone()).collect(),
            categorical: indices.iter().map(|&i| self.categorical[i].clone()).collect(),
        }
    }
}
