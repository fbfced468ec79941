use alloc::vec::Vec;
use core::convert::Infallible;
use core::fmt::Debug;
use serde::{Deserialize, Serialize};

use crate::*;

/// Full game state as handed to and from a persistence backend.
///
/// Field names follow the `{grid, score, bestScore}` JSON layout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedGame {
    pub grid: Vec<Tile>,
    pub score: Score,
    pub best_score: Score,
}

impl SavedGame {
    /// Checks the saved grid and scores, returning the grid they describe.
    pub fn validate(&self) -> Result<Grid> {
        let grid = Grid::from_cells(&self.grid)?;
        if self.best_score < self.score {
            return Err(GameError::InconsistentBestScore {
                score: self.score,
                best: self.best_score,
            });
        }
        Ok(grid)
    }
}

/// Storage for best score and in-progress games. The medium is up to the implementor.
pub trait Persistence {
    type Error: Debug;

    fn load_best_score(&mut self) -> core::result::Result<Score, Self::Error>;

    fn save_best_score(&mut self, best_score: Score) -> core::result::Result<(), Self::Error>;

    fn load_game_state(&mut self) -> core::result::Result<Option<SavedGame>, Self::Error>;

    fn save_game_state(&mut self, state: &SavedGame) -> core::result::Result<(), Self::Error>;

    /// Drops a stored game, used when the stored one could not be restored.
    fn clear_game_state(&mut self) -> core::result::Result<(), Self::Error>;
}

impl<P: Persistence + ?Sized> Persistence for &mut P {
    type Error = P::Error;

    fn load_best_score(&mut self) -> core::result::Result<Score, Self::Error> {
        (**self).load_best_score()
    }

    fn save_best_score(&mut self, best_score: Score) -> core::result::Result<(), Self::Error> {
        (**self).save_best_score(best_score)
    }

    fn load_game_state(&mut self) -> core::result::Result<Option<SavedGame>, Self::Error> {
        (**self).load_game_state()
    }

    fn save_game_state(&mut self, state: &SavedGame) -> core::result::Result<(), Self::Error> {
        (**self).save_game_state(state)
    }

    fn clear_game_state(&mut self) -> core::result::Result<(), Self::Error> {
        (**self).clear_game_state()
    }
}

/// Keeps everything in memory; nothing survives the process.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryStore {
    pub best_score: Score,
    pub game: Option<SavedGame>,
}

impl Persistence for MemoryStore {
    type Error = Infallible;

    fn load_best_score(&mut self) -> core::result::Result<Score, Self::Error> {
        Ok(self.best_score)
    }

    fn save_best_score(&mut self, best_score: Score) -> core::result::Result<(), Self::Error> {
        self.best_score = best_score;
        Ok(())
    }

    fn load_game_state(&mut self) -> core::result::Result<Option<SavedGame>, Self::Error> {
        Ok(self.game.clone())
    }

    fn save_game_state(&mut self, state: &SavedGame) -> core::result::Result<(), Self::Error> {
        self.game = Some(state.clone());
        Ok(())
    }

    fn clear_game_state(&mut self) -> core::result::Result<(), Self::Error> {
        self.game = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn saved_game_uses_camel_case_fields() {
        let json = r#"{"grid":[0,0,0,0,0,2,0,0,0,0,0,0,0,0,0,4],"score":12,"bestScore":96}"#;
        let saved: SavedGame = serde_json::from_str(json).unwrap();

        assert_eq!(saved.best_score, 96);
        assert_eq!(saved.validate().unwrap()[15], 4);
    }

    #[test]
    fn validate_rejects_best_below_score() {
        let saved = SavedGame {
            grid: vec![0; CELL_COUNT],
            score: 100,
            best_score: 50,
        };
        assert_eq!(
            saved.validate(),
            Err(GameError::InconsistentBestScore {
                score: 100,
                best: 50
            })
        );
    }

    #[test]
    fn memory_store_round_trips_through_trait() {
        let mut store = MemoryStore::default();
        let saved = SavedGame {
            grid: vec![2; CELL_COUNT],
            score: 0,
            best_score: 0,
        };

        store.save_game_state(&saved).unwrap();
        store.save_best_score(64).unwrap();

        assert_eq!(store.load_game_state().unwrap(), Some(saved));
        assert_eq!(store.load_best_score().unwrap(), 64);

        store.clear_game_state().unwrap();
        assert_eq!(store.load_game_state().unwrap(), None);
    }
}
