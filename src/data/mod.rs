//! Data access and storage
//!
//! SQLite match store, the optional season standings file and team name
//! canonicalisation shared by both.

pub mod aliases;
pub mod database;
pub mod standings;

pub use aliases::TeamAliases;
pub use database::{MatchStore, StoreStatus};
pub use standings::StandingsTable;
