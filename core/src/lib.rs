#![no_std]

extern crate alloc;

use serde::{Deserialize, Serialize};

pub use engine::*;
pub use error::*;
pub use line::*;
pub use milestones::*;
pub use persistence::*;
pub use session::*;
pub use spawn::*;
pub use types::*;

mod engine;
mod error;
mod line;
mod milestones;
mod persistence;
mod session;
mod spawn;
mod types;

/// Tunable rules for a game: the tile that counts as a win and how new tiles are drawn.
///
/// Deserialized values are normalized the same way as [`EngineConfig::new`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawEngineConfig")]
pub struct EngineConfig {
    win_tile: Tile,
    spawn: SpawnPolicy,
}

#[derive(Deserialize)]
struct RawEngineConfig {
    win_tile: Tile,
    spawn: SpawnPolicy,
}

impl From<RawEngineConfig> for EngineConfig {
    fn from(raw: RawEngineConfig) -> Self {
        Self::new(raw.win_tile, raw.spawn)
    }
}

impl EngineConfig {
    pub const DEFAULT_WIN_TILE: Tile = 2048;

    /// Standard rules: win at 2048, spawn 2 or 4.
    pub const CLASSIC: Self = Self::new_unchecked(Self::DEFAULT_WIN_TILE, SpawnPolicy::Standard);

    /// Win at 2048, spawn only 2.
    pub const ALWAYS_TWO: Self = Self::new_unchecked(Self::DEFAULT_WIN_TILE, SpawnPolicy::AlwaysTwo);

    const fn new_unchecked(win_tile: Tile, spawn: SpawnPolicy) -> Self {
        Self { win_tile, spawn }
    }

    /// Rounds `win_tile` up to a power of two within `4..=MAX_TILE`.
    pub fn new(win_tile: Tile, spawn: SpawnPolicy) -> Self {
        let win_tile = win_tile.clamp(4, MAX_TILE).next_power_of_two();
        Self::new_unchecked(win_tile, spawn)
    }

    pub fn win_tile(&self) -> Tile {
        self.win_tile
    }

    pub fn spawn(&self) -> SpawnPolicy {
        self.spawn
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::CLASSIC
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_normalizes_win_tile() {
        assert_eq!(EngineConfig::new(2048, SpawnPolicy::Standard), EngineConfig::CLASSIC);
        assert_eq!(EngineConfig::new(1000, SpawnPolicy::Standard).win_tile(), 1024);
        assert_eq!(EngineConfig::new(0, SpawnPolicy::AlwaysTwo).win_tile(), 4);
        assert_eq!(EngineConfig::new(Tile::MAX, SpawnPolicy::AlwaysTwo).win_tile(), MAX_TILE);
    }

    #[test]
    fn config_survives_json() {
        let json = serde_json::to_string(&EngineConfig::ALWAYS_TWO).unwrap();
        let config: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, EngineConfig::ALWAYS_TWO);
    }

    #[test]
    fn deserialized_config_is_normalized() {
        let json = serde_json::to_string(&EngineConfig::ALWAYS_TWO)
            .unwrap()
            .replace("2048", "3");
        let config: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config.win_tile(), 4);
        assert_eq!(config.spawn(), SpawnPolicy::AlwaysTwo);
    }
}
