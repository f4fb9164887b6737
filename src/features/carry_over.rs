//! Prior-season carry-over and promoted-team imputation

use crate::data::{StandingsTable, TeamAliases};
use crate::features::row::{CarryOver, FeatureRow, Side};
use log::{debug, warn};
use std::collections::BTreeSet;

/// Attach each side's previous-season standing.
///
/// A fixture's `season` is the start year, so the final table that ended in
/// that same year is the previous season.
pub fn attach(rows: &mut [FeatureRow], standings: &StandingsTable, aliases: &TeamAliases) {
    for row in rows.iter_mut() {
        for side in [Side::Home, Side::Away] {
            let team = aliases.canonical(row.team(side));
            *row.carry_mut(side) = standings.lookup(row.season, &team).map(CarryOver::from);
        }
    }
}

/// Fill still-missing carry-over cells with that season's reference position.
///
/// Only rows of the season whose table supplied the reference are touched.
/// Returns the number of cells filled.
pub fn fill_promoted(rows: &mut [FeatureRow], standings: &StandingsTable, position: u32) -> usize {
    let seasons: BTreeSet<i32> = rows.iter().map(|r| r.season).collect();
    let mut filled = 0;

    for season in seasons {
        let missing = rows
            .iter()
            .filter(|r| r.season == season)
            .any(|r| r.home_carry.is_none() || r.away_carry.is_none());
        if !missing {
            continue;
        }

        let Some(reference) = standings.at_position(season, position) else {
            warn!(
                "No position {} standing for season ending {} - promoted-team fill skipped",
                position, season
            );
            continue;
        };
        let reference = CarryOver::from(reference);

        for row in rows.iter_mut().filter(|r| r.season == season) {
            for side in [Side::Home, Side::Away] {
                let cell = row.carry_mut(side);
                if cell.is_none() {
                    *cell = Some(reference);
                    filled += 1;
                }
            }
        }
        debug!("Season {}: promoted teams seeded from {}", season, position);
    }

    filled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MatchRecord, MatchStatus, SeasonStanding};
    use chrono::NaiveDate;

    fn standing(year: i32, team: &str, position: u32, points: u32) -> SeasonStanding {
        SeasonStanding {
            season_end_year: year,
            team: team.to_string(),
            position,
            won: points / 3,
            drawn: points % 3,
            lost: 38 - points / 3 - points % 3,
            goals_for: 40,
            goals_against: 50,
            goal_difference: -10,
            points,
        }
    }

    fn row(season: i32, home: &str, away: &str) -> FeatureRow {
        FeatureRow::from_match(&MatchRecord {
            fixture_id: season as i64,
            date: NaiveDate::from_ymd_opt(season, 9, 1)
                .unwrap()
                .and_hms_opt(15, 0, 0)
                .unwrap(),
            season,
            home_team: home.to_string(),
            away_team: away.to_string(),
            home_score: None,
            away_score: None,
            status: MatchStatus::NotStarted,
        })
    }

    #[test]
    fn test_promoted_team_gets_that_seasons_seventeenth() {
        let standings = StandingsTable::from_records(vec![
            standing(2022, "Arsenal", 5, 69),
            standing(2022, "Leeds", 17, 38),
            standing(2023, "Arsenal", 2, 84),
            standing(2023, "Leicester", 17, 34),
        ]);
        let aliases = TeamAliases::new(crate::data::aliases::default_aliases());

        let mut rows = vec![
            row(2022, "Arsenal", "Fulham"),
            row(2023, "Luton Town", "Arsenal"),
        ];
        attach(&mut rows, &standings, &aliases);
        assert_eq!(rows[0].home_carry.unwrap().points, 69);
        assert!(rows[0].away_carry.is_none());
        assert!(rows[1].home_carry.is_none());

        let filled = fill_promoted(&mut rows, &standings, 17);
        assert_eq!(filled, 2);
        assert_eq!(rows[0].away_carry.unwrap().points, 38);
        assert_eq!(rows[1].home_carry.unwrap().points, 34);
        assert_eq!(rows[1].away_carry.unwrap().points, 84);
    }

    #[test]
    fn test_season_without_reference_is_skipped() {
        let standings = StandingsTable::from_records(vec![standing(2023, "Arsenal", 2, 84)]);
        let mut rows = vec![row(2023, "Arsenal", "Ipswich")];
        attach(&mut rows, &standings, &TeamAliases::default());

        assert_eq!(fill_promoted(&mut rows, &standings, 17), 0);
        assert!(rows[0].away_carry.is_none());
        assert!(rows[0].home_carry.is_some());
    }
}
