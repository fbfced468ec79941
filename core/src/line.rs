use crate::*;

/// Result of sliding one oriented line toward element 0.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LineSlide {
    pub cells: [Tile; SIDE],
    /// Positions in `cells` that were produced by a merge during this slide.
    pub merged: [bool; SIDE],
    /// Sum of the values created by merges.
    pub gained: Score,
}

impl LineSlide {
    pub fn merge_count(&self) -> usize {
        self.merged.iter().filter(|&&merged| merged).count()
    }
}

/// Compresses `line` toward element 0 and merges adjacent equal pairs once each.
///
/// A tile created by a merge is never merged again within the same slide, so
/// `[2, 2, 2, 2]` becomes `[4, 4, 0, 0]` rather than `[8, 0, 0, 0]`. Pairs of
/// [`MAX_TILE`] stay apart.
pub fn slide_line(line: [Tile; SIDE]) -> LineSlide {
    let mut compressed = [0; SIDE];
    let mut len = 0;
    for value in line.into_iter().filter(|&value| value != 0) {
        compressed[len] = value;
        len += 1;
    }

    let mut slide = LineSlide {
        cells: [0; SIDE],
        merged: [false; SIDE],
        gained: 0,
    };
    let mut read = 0;
    let mut write = 0;
    while read < len {
        let value = compressed[read];
        if read + 1 < len && can_merge(value, compressed[read + 1]) {
            let doubled = value << 1;
            slide.cells[write] = doubled;
            slide.merged[write] = true;
            slide.gained += Score::from(doubled);
            read += 2;
        } else {
            slide.cells[write] = value;
            read += 1;
        }
        write += 1;
    }

    slide
}
