//! Last-known-form backfill for unplayed fixtures
//!
//! An unplayed fixture's causal features only reflect the history at its
//! scheduled date, which may be stale or empty. Upcoming fixtures of the
//! current season instead take each team's snapshot from its most recent
//! played match. Sources are played rows only, so applying this repeatedly
//! gives the same result.

use crate::features::row::{FeatureRow, OverallForm, RoleForm, Side};
use crate::MatchStatus;
use chrono::NaiveDateTime;
use std::collections::HashMap;

type RowKey = (NaiveDateTime, i64);

#[derive(Debug, Default)]
struct Snapshots {
    home: HashMap<String, (RowKey, RoleForm)>,
    away: HashMap<String, (RowKey, RoleForm)>,
    overall: HashMap<String, (RowKey, OverallForm)>,
}

fn keep_latest<T>(map: &mut HashMap<String, (RowKey, T)>, team: &str, key: RowKey, value: T) {
    match map.get(team) {
        Some((existing, _)) if *existing >= key => {}
        _ => {
            map.insert(team.to_string(), (key, value));
        }
    }
}

impl Snapshots {
    fn collect(rows: &[FeatureRow]) -> Self {
        let mut snapshots = Snapshots::default();
        for row in rows.iter().filter(|r| r.is_played()) {
            let key = (row.date, row.fixture_id);
            keep_latest(&mut snapshots.home, &row.home_team, key, row.home_form.clone());
            keep_latest(&mut snapshots.away, &row.away_team, key, row.away_form.clone());
            for side in [Side::Home, Side::Away] {
                keep_latest(&mut snapshots.overall, row.team(side), key, *row.overall(side));
            }
        }
        snapshots
    }
}

/// Overwrite the form of current-season unplayed fixtures.
///
/// Home form comes from the team's latest played home match, away form from
/// its latest away match, and overall form from its latest match in either
/// role, read from whichever side the team was on there. Teams without any
/// played match keep their causal values. Returns the number of rows that took
/// at least one snapshot.
pub fn backfill_unplayed(rows: &mut [FeatureRow]) -> usize {
    let Some(current_season) = rows.iter().map(|r| r.season).max() else {
        return 0;
    };
    let snapshots = Snapshots::collect(rows);
    let mut touched = 0;

    for row in rows
        .iter_mut()
        .filter(|r| r.season == current_season && r.status == MatchStatus::NotStarted)
    {
        let mut applied = false;
        if let Some((_, form)) = snapshots.home.get(&row.home_team) {
            row.home_form = form.clone();
            applied = true;
        }
        if let Some((_, form)) = snapshots.away.get(&row.away_team) {
            row.away_form = form.clone();
            applied = true;
        }
        for side in [Side::Home, Side::Away] {
            if let Some((_, overall)) = snapshots.overall.get(row.team(side)) {
                *row.overall_mut(side) = *overall;
                applied = true;
            }
        }
        if applied {
            touched += 1;
        }
    }

    touched
}
