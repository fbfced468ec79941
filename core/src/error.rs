use thiserror::Error;

use crate::{Score, Tile};

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Unrecognized move direction")]
    InvalidDirection,
    #[error("Grid must have 16 cells, got {0}")]
    InvalidGridLength(usize),
    #[error("Cell {index} holds {value}, which is not an empty cell or a power of two tile")]
    InvalidTile { index: usize, value: Tile },
    #[error("Best score {best} is below the saved score {score}")]
    InconsistentBestScore { score: Score, best: Score },
}

pub type Result<T> = core::result::Result<T, GameError>;
