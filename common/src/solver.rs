//! Deterministic solver, used to check that generated fields are solvable without taking
//! risks and as the in-game "solve" assist.
//!
//! Each round scans every revealed cell and applies two rules:
//! - if its number equals flags plus hidden neighbors, the hidden neighbors are mines;
//! - if its number equals its flags, the hidden neighbors are safe.
//!
//! Rounds repeat until one makes no progress.

use tracing::{debug, warn};

use crate::{
    error::{Error, Result},
    field::{Field, Point},
    sweep::{Sweep, Trigger},
};

/// What a run of the solver achieved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Resolution {
    /// No cell is left both covered and unflagged.
    pub solved: bool,
    /// Full scans performed, including the final one that found nothing.
    pub rounds: usize,
    pub flagged: usize,
    pub revealed: usize,
}

/// Runs the rules to a fixpoint, checking every conclusion against the mines.
///
/// Returns [`Error::InvariantViolation`] before touching a cell the rules got wrong, which
/// only happens if a flag on the field is misplaced.
pub fn try_solve(field: &mut Field) -> Result<Resolution> {
    let mut resolution = Resolution::default();

    loop {
        resolution.rounds += 1;
        let mut progress = false;

        for y in 0..field.height() {
            for x in 0..field.width() {
                let point = Point { x, y };
                if !field[point].revealed {
                    continue;
                }

                let adj_mines = field.adjacent_mines(point);
                let adj_flags = field.adjacent_flags(point);
                let hidden: Vec<Point> = field
                    .neighbors(point)
                    .filter(|&n| field[n].is_hidden())
                    .collect();
                if hidden.is_empty() {
                    continue;
                }

                if adj_mines == adj_flags + hidden.len() {
                    if let Some(&at) = hidden.iter().find(|&&n| !field[n].mine) {
                        return Err(Error::InvariantViolation {
                            at,
                            detail: "deduced a mine on a safe cell",
                        });
                    }
                    for &n in &hidden {
                        field[n].flagged = true;
                    }
                    resolution.flagged += hidden.len();
                    progress = true;
                } else if adj_mines == adj_flags {
                    if let Some(&at) = hidden.iter().find(|&&n| field[n].mine) {
                        return Err(Error::InvariantViolation {
                            at,
                            detail: "deduced a mine to be safe",
                        });
                    }
                    for &n in &hidden {
                        // A cascade from an earlier neighbor may have opened it already.
                        if let Sweep::Revealed(count) = field.reveal(n, Trigger::Deduction) {
                            resolution.revealed += count;
                        }
                    }
                    progress = true;
                }
            }
        }

        if !progress {
            break;
        }
    }

    resolution.solved = field.hidden_count() == 0;
    debug!(
        rounds = resolution.rounds,
        flagged = resolution.flagged,
        revealed = resolution.revealed,
        solved = resolution.solved,
        "solver reached fixpoint"
    );
    Ok(resolution)
}

/// Whether `field` can be fully resolved by deduction alone. Mutates the field along the way.
///
/// An invariant violation is a solver bug here: it panics in debug builds and counts as
/// unsolvable otherwise.
pub fn solve(field: &mut Field) -> bool {
    match try_solve(field) {
        Ok(resolution) => resolution.solved,
        Err(err) => {
            debug_assert!(false, "{err}");
            warn!(%err, "solve aborted");
            false
        }
    }
}

/// Whether a fresh copy of `field`, opened at `opening`, can be solved without guessing.
pub fn is_solvable_from(field: &Field, opening: Point) -> bool {
    let mut scratch = field.clone();
    match scratch.reveal(opening, Trigger::Player) {
        Sweep::Detonated(_) => false,
        _ => solve(&mut scratch),
    }
}
