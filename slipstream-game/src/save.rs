//! Full-state persistence snapshot.
//!
//! A [`SaveGame`] captures everything observable about a campaign: entities,
//! standings, market rates, pending spends, and the exact RNG stream
//! positions. Restoring it through [`crate::session::Session::restore`]
//! yields a simulation that continues identically to the original, draw for
//! draw. The encoding here is JSON via serde, but the record itself is
//! format-agnostic; platform backends pick their own medium through the
//! [`crate::GameStorage`] trait.

use serde::{Deserialize, Serialize};

use crate::entities::{TeamId, World};
use crate::market::MarketState;
use crate::rng::RngBundlePosition;
use crate::standings::SeasonStandings;

/// Bumped when the snapshot layout changes shape.
pub const SAVE_VERSION: u32 = 1;

/// Serializable snapshot of one campaign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveGame {
    pub version: u32,
    pub year: u32,
    pub week: u32,
    pub player_team: TeamId,
    #[serde(default)]
    pub entered_this_week: bool,
    #[serde(default)]
    pub pending_upgrade_spend: i64,
    #[serde(default)]
    pub pending_maintenance_spend: i64,
    #[serde(default)]
    pub market: MarketState,
    pub world: World,
    pub standings: SeasonStandings,
    pub rng: RngBundlePosition,
}

impl SaveGame {
    /// Encode the snapshot as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decode a snapshot from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON does not describe a valid snapshot.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
