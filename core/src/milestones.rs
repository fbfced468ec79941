use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::*;

bitflags! {
    /// Tile values worth announcing the first time a merge produces them.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Milestones: u8 {
        const TILE_512  = 1;
        const TILE_1024 = 1 << 1;
        const TILE_2048 = 1 << 2;
        const TILE_4096 = 1 << 3;
        const TILE_8192 = 1 << 4;
    }
}

impl Milestones {
    pub const TIERS: [(Tile, Milestones); 5] = [
        (512, Self::TILE_512),
        (1024, Self::TILE_1024),
        (2048, Self::TILE_2048),
        (4096, Self::TILE_4096),
        (8192, Self::TILE_8192),
    ];

    /// Every tier at or below `value`.
    pub fn reached_by(value: Tile) -> Self {
        Self::TIERS
            .iter()
            .filter(|&&(tile, _)| tile <= value)
            .fold(Self::empty(), |acc, &(_, flag)| acc | flag)
    }

    /// Tile values of the tiers in this set, lowest first.
    pub fn tiles(self) -> impl Iterator<Item = Tile> {
        Self::TIERS
            .into_iter()
            .filter(move |&(_, flag)| self.contains(flag))
            .map(|(tile, _)| tile)
    }
}

/// Remembers which milestones were already announced during a game.
///
/// This lives outside [`GridEngine`]; it only looks at merges reported in [`MoveResult`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneTracker {
    unlocked: Milestones,
}

impl MilestoneTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unlocked(&self) -> Milestones {
        self.unlocked
    }

    /// Returns the milestones first crossed by the merges in `result`.
    pub fn observe(&mut self, result: &MoveResult) -> Milestones {
        let reached = result
            .merges()
            .fold(Milestones::empty(), |acc, change| {
                acc | Milestones::reached_by(change.new)
            });

        let fresh = reached.difference(self.unlocked);
        if !fresh.is_empty() {
            log::info!("milestones unlocked: {:?}", fresh);
            self.unlocked |= fresh;
        }
        fresh
    }

    pub fn reset(&mut self) {
        self.unlocked = Milestones::empty();
    }
}
