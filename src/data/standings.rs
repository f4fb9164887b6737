//! Historical season standings loaded from CSV
//!
//! The file is optional. When it is missing or unreadable the feature builder
//! runs without carry-over columns instead of failing.

use crate::data::TeamAliases;
use crate::{Result, SeasonStanding};
use log::{info, warn};
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

/// One line of the standings archive; `played` and `notes` are ignored
#[derive(Debug, Deserialize)]
struct StandingRow {
    season_end_year: i32,
    team: String,
    position: u32,
    won: u32,
    drawn: u32,
    lost: u32,
    gf: u32,
    ga: u32,
    gd: i32,
    points: u32,
}

/// Final tables indexed by (season end year, canonical team)
#[derive(Debug, Clone, Default)]
pub struct StandingsTable {
    by_team: HashMap<(i32, String), SeasonStanding>,
    by_position: HashMap<(i32, u32), SeasonStanding>,
}

impl StandingsTable {
    pub fn from_records(records: Vec<SeasonStanding>) -> Self {
        let mut table = StandingsTable::default();
        for record in records {
            table
                .by_position
                .insert((record.season_end_year, record.position), record.clone());
            table
                .by_team
                .insert((record.season_end_year, record.team.clone()), record);
        }
        table
    }

    /// Parse CSV text, canonicalising team names
    pub fn from_reader<R: Read>(reader: R, aliases: &TeamAliases) -> Result<Self> {
        let mut reader = csv::Reader::from_reader(reader);
        let mut records = Vec::new();
        for row in reader.deserialize::<StandingRow>() {
            let row = row?;
            records.push(SeasonStanding {
                season_end_year: row.season_end_year,
                team: aliases.canonical(&row.team),
                position: row.position,
                won: row.won,
                drawn: row.drawn,
                lost: row.lost,
                goals_for: row.gf,
                goals_against: row.ga,
                goal_difference: row.gd,
                points: row.points,
            });
        }
        Ok(Self::from_records(records))
    }

    pub fn load<P: AsRef<Path>>(path: P, aliases: &TeamAliases) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        Self::from_reader(std::io::BufReader::new(file), aliases)
    }

    /// Load the archive, degrading to `None` with a warning on any failure
    pub fn load_optional<P: AsRef<Path>>(path: P, aliases: &TeamAliases) -> Option<Self> {
        let path = path.as_ref();
        match Self::load(path, aliases) {
            Ok(table) => {
                info!(
                    "Loaded {} season standings from {}",
                    table.len(),
                    path.display()
                );
                Some(table)
            }
            Err(e) => {
                warn!(
                    "Season standings unavailable ({}): {} - carry-over features skipped",
                    path.display(),
                    e
                );
                None
            }
        }
    }

    /// Standing of a (canonical) team in the season ending in `season_end_year`
    pub fn lookup(&self, season_end_year: i32, team: &str) -> Option<&SeasonStanding> {
        self.by_team.get(&(season_end_year, team.to_string()))
    }

    pub fn at_position(&self, season_end_year: i32, position: u32) -> Option<&SeasonStanding> {
        self.by_position.get(&(season_end_year, position))
    }

    pub fn len(&self) -> usize {
        self.by_team.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_team.is_empty()
    }
}
