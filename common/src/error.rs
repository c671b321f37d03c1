use crate::field::Point;

/// Everything that can go wrong while configuring, solving or transporting a game.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("a {width}x{height} field has no cells")]
    EmptyField { width: usize, height: usize },

    #[error("a field needs at least one mine")]
    NoMines,

    #[error("too many mines for the field: {mines} mines in {cells} cells")]
    TooManyMines { mines: usize, cells: usize },

    /// The solver reached a conclusion the ground truth contradicts.
    #[error("invariant violated at ({}, {}): {detail}", at.x, at.y)]
    InvariantViolation { at: Point, detail: &'static str },

    /// No mine layout agrees with every revealed number and the mine counter.
    #[error("visible board is contradictory")]
    Unsatisfiable,

    #[error("sat solver: {0}")]
    Solver(#[from] varisat::solver::SolverError),

    #[error("game state codec: {0}")]
    Codec(#[from] bcs::Error),

    /// Decoded state that no sequence of moves could have produced.
    #[error("corrupt game state: {0}")]
    CorruptState(&'static str),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
