use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::*;

/// How the value of a freshly spawned tile is chosen.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpawnPolicy {
    /// `2` nine times out of ten, otherwise `4`.
    Standard,
    /// Always `2`.
    AlwaysTwo,
}

impl SpawnPolicy {
    pub const FOUR_PROBABILITY: f64 = 0.1;

    pub fn draw_value<R: Rng + ?Sized>(self, rng: &mut R) -> Tile {
        match self {
            Self::Standard if rng.random_bool(Self::FOUR_PROBABILITY) => 4,
            Self::Standard | Self::AlwaysTwo => 2,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::AlwaysTwo => "always-two",
        }
    }
}

impl Default for SpawnPolicy {
    fn default() -> Self {
        Self::Standard
    }
}

/// A tile placed after a move or at the start of a game.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnedTile {
    pub index: CellIndex,
    pub value: Tile,
}

/// Picks an empty cell uniformly at random and draws its value from `policy`.
///
/// Returns `None` when the grid is full.
pub(crate) fn pick_spawn<R: Rng + ?Sized>(
    grid: &Grid,
    policy: SpawnPolicy,
    rng: &mut R,
) -> Option<SpawnedTile> {
    let free = grid.empty_count();
    if free == 0 {
        return None;
    }

    let index = grid.empty_cells().nth(rng.random_range(0..free))?;
    let value = policy.draw_value(rng);
    Some(SpawnedTile { index, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn always_two_never_draws_four() {
        let mut rng = SmallRng::seed_from_u64(7);
        assert!((0..1000).all(|_| SpawnPolicy::AlwaysTwo.draw_value(&mut rng) == 2));
    }

    #[test]
    fn standard_draws_mostly_twos_and_some_fours() {
        let mut rng = SmallRng::seed_from_u64(11);
        let fours = (0..10_000)
            .filter(|_| SpawnPolicy::Standard.draw_value(&mut rng) == 4)
            .count();
        assert!((700..1300).contains(&fours), "fours: {fours}");
    }

    #[test]
    fn spawn_picks_each_empty_cell_evenly() {
        let mut rng = SmallRng::seed_from_u64(3);
        let mut cells = [2; CELL_COUNT];
        cells[6] = 0;
        cells[9] = 0;
        let grid = Grid::new_unchecked(cells);

        let mut hits = [0u32; 2];
        for _ in 0..400 {
            let spawned = pick_spawn(&grid, SpawnPolicy::Standard, &mut rng).unwrap();
            match spawned.index {
                6 => hits[0] += 1,
                9 => hits[1] += 1,
                index => panic!("spawned on occupied cell {index}"),
            }
            assert!(spawned.value == 2 || spawned.value == 4);
        }
        assert!(hits.iter().all(|&count| (120..=280).contains(&count)), "{hits:?}");
    }

    #[test]
    fn spawn_on_full_grid_is_none() {
        let mut rng = SmallRng::seed_from_u64(3);
        let grid = Grid::new_unchecked([2; CELL_COUNT]);
        assert_eq!(pick_spawn(&grid, SpawnPolicy::AlwaysTwo, &mut rng), None);
    }
}
