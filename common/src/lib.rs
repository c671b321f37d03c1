//! A minesweeper engine: lazily mined fields, cascading reveals, chording, and a
//! deduction solver that tells whether a field can be cleared without guessing.
//!
//! Rendering and input handling live outside this crate. A host feeds [`Input`]s to
//! [`Game::apply`] one at a time and reads the result back through the query methods on
//! [`Game`].

pub mod analysis;
pub mod config;
pub mod error;
pub mod field;
pub mod game;
pub mod generate;
pub mod input;
pub mod solver;
pub mod sweep;

pub use analysis::{Analysis, Deduction, analyze};
pub use config::{Difficulty, Preferences};
pub use error::{Error, Result};
pub use field::{Cell, Field, Point};
pub use game::{CellView, Direction, Game};
pub use generate::{Generation, MAX_GENERATION_ATTEMPTS, SafeZone, generate_solvable, place_mines};
pub use input::{Control, Input};
pub use solver::{Resolution, is_solvable_from, solve, try_solve};
pub use sweep::{Sweep, Trigger};
