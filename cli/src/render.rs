use merge2048_core::{CELL_COUNT, CellIndex, GridEngine, MoveResult, SIDE};
use std::io::{self, Write};

const RULE: &str = "+------+------+------+------+";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Marker {
    None,
    Merged,
    Spawned,
}

impl Marker {
    const fn symbol(self) -> char {
        match self {
            Self::None => ' ',
            Self::Merged => '*',
            Self::Spawned => '+',
        }
    }
}

fn markers(last: Option<&MoveResult>) -> [Marker; CELL_COUNT] {
    let mut markers = [Marker::None; CELL_COUNT];
    if let Some(result) = last {
        for change in result.merges() {
            markers[usize::from(change.index)] = Marker::Merged;
        }
        if let Some(spawned) = result.spawned {
            markers[usize::from(spawned.index)] = Marker::Spawned;
        }
    }
    markers
}

/// Draws the score line and board; cells touched by `last` are marked
/// `*` for merges and `+` for the spawned tile.
pub fn draw(
    out: &mut impl Write,
    engine: &GridEngine,
    last: Option<&MoveResult>,
) -> io::Result<()> {
    let markers = markers(last);
    let gained = last.map_or(0, |result| result.score_delta);

    write!(out, "Score: {}", engine.score())?;
    if gained > 0 {
        write!(out, " (+{gained})")?;
    }
    writeln!(out, "   Best: {}", engine.best_score())?;

    writeln!(out, "{RULE}")?;
    for row in 0..SIDE {
        write!(out, "|")?;
        for col in 0..SIDE {
            let index = (row * SIDE + col) as CellIndex;
            let value = engine.grid()[index];
            let marker = markers[usize::from(index)].symbol();
            if value == 0 {
                write!(out, "      |")?;
            } else {
                write!(out, "{value:>5}{marker}|")?;
            }
        }
        writeln!(out)?;
        writeln!(out, "{RULE}")?;
    }
    Ok(())
}
