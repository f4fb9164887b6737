//! Team name canonicalisation
//!
//! The standings file and the fixture provider spell some clubs differently
//! ("Manchester Utd" vs "Manchester United"). Every join key goes through
//! [`TeamAliases::canonical`] first.

use std::collections::BTreeMap;

/// Variant -> canonical name lookup
#[derive(Debug, Clone, Default)]
pub struct TeamAliases {
    map: BTreeMap<String, String>,
}

impl TeamAliases {
    pub fn new(map: BTreeMap<String, String>) -> Self {
        let map = map
            .into_iter()
            .map(|(variant, canonical)| (variant.to_lowercase(), canonical))
            .collect();
        TeamAliases { map }
    }

    /// Canonical spelling of a team name; unknown names pass through unchanged
    pub fn canonical(&self, name: &str) -> String {
        let trimmed = name.trim();
        self.map
            .get(&trimmed.to_lowercase())
            .cloned()
            .unwrap_or_else(|| trimmed.to_string())
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Premier League spellings used by the standings archive
pub fn default_aliases() -> BTreeMap<String, String> {
    [
        ("Manchester Utd", "Manchester United"),
        ("Leicester City", "Leicester"),
        ("Leeds United", "Leeds"),
        ("Newcastle Utd", "Newcastle"),
        ("Norwich City", "Norwich"),
        ("Luton Town", "Luton"),
    ]
    .iter()
    .map(|(variant, canonical)| (variant.to_string(), canonical.to_string()))
    .collect()
}
