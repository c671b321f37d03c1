use std::collections::HashSet;

use tracing::debug;

use crate::field::{Field, Point};

/// Who asked for a reveal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// The player. Can detonate mines and chords already-revealed cells.
    Player,
    /// A deduction. Never detonates and never chords.
    Deduction,
}

/// What a reveal or chord did to the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sweep {
    Unchanged,
    /// This many cells were newly revealed.
    Revealed(usize),
    /// A player reveal landed on the mine at this point. The mine stays covered.
    Detonated(Point),
}

impl Sweep {
    fn then(self, next: Sweep) -> Sweep {
        match (self, next) {
            (Sweep::Detonated(at), _) | (_, Sweep::Detonated(at)) => Sweep::Detonated(at),
            (Sweep::Revealed(a), Sweep::Revealed(b)) => Sweep::Revealed(a + b),
            (Sweep::Unchanged, other) | (other, Sweep::Unchanged) => other,
        }
    }
}

impl Field {
    /// Reveals the cell at `at`.
    ///
    /// A player reveal on an already-revealed cell chords it instead. Flagged cells are left
    /// alone. A zero cell cascades over its whole zero region and that region's numbered border.
    pub fn reveal(&mut self, at: Point, trigger: Trigger) -> Sweep {
        let Some(&cell) = self.get(at) else {
            return Sweep::Unchanged;
        };

        if cell.revealed {
            return match trigger {
                Trigger::Player => self.chord(at),
                Trigger::Deduction => Sweep::Unchanged,
            };
        }
        if cell.flagged {
            return Sweep::Unchanged;
        }
        if cell.mine {
            return match trigger {
                Trigger::Player => Sweep::Detonated(at),
                Trigger::Deduction => Sweep::Unchanged,
            };
        }

        Sweep::Revealed(self.cascade(at))
    }

    /// Reveals every hidden neighbor of a revealed cell once at least as many flags as mines
    /// surround it. Wrong flags mean this can detonate, just like a direct reveal.
    pub fn chord(&mut self, at: Point) -> Sweep {
        if !self.get(at).is_some_and(|cell| cell.revealed) {
            return Sweep::Unchanged;
        }
        if self.adjacent_flags(at) < self.adjacent_mines(at) {
            return Sweep::Unchanged;
        }

        let mut sweep = Sweep::Unchanged;
        for neighbor in self.neighbors(at) {
            // An earlier neighbor's cascade may already have opened this one.
            if self[neighbor].is_hidden() {
                sweep = sweep.then(self.reveal(neighbor, Trigger::Player));
            }
        }
        sweep
    }

    /// Flood-fills from a safe, hidden cell and returns how many cells were revealed.
    fn cascade(&mut self, start: Point) -> usize {
        let mut visited = HashSet::new();
        let mut stack = vec![start];
        let mut revealed = 0;

        while let Some(point) = stack.pop() {
            let cell = self[point];
            if cell.revealed || cell.flagged {
                continue;
            }
            // Only neighbors of zero cells are queued, and those are never mines.
            debug_assert!(!cell.mine, "cascade reached a mine at {point:?}");
            if cell.mine {
                continue;
            }

            self[point].revealed = true;
            revealed += 1;

            if self.adjacent_mines(point) == 0 && visited.insert(point) {
                stack.extend(self.neighbors(point).filter(|&n| self[n].is_hidden()));
            }
        }

        if revealed > 1 {
            debug!(x = start.x, y = start.y, revealed, "cascade");
        }
        revealed
    }
}
