use rand::{SeedableRng, rngs::SmallRng};
use tracing::{debug, info, warn};

use crate::{
    analysis,
    config::Preferences,
    error::{Error, Result},
    field::{Field, Point},
    generate::{self, MAX_GENERATION_ATTEMPTS, SafeZone},
    solver,
    sweep::{Sweep, Trigger},
};

/// Cursor movement. The cursor wraps around at the field's edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Everything a renderer needs to draw one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellView {
    pub is_mine: bool,
    pub is_flagged: bool,
    pub is_revealed: bool,
    pub adjacent_mines: u8,
}

/// One game, from the empty field to a win or a detonation.
///
/// Mines are placed on the first reveal, away from the revealed cell. Once the game is over,
/// every operation that would change the field is ignored; only [`Game::restart`] moves on.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Game {
    prefs: Preferences,
    field: Field,
    cursor: Point,
    started: bool,
    game_over: bool,
    /// The mine a player reveal landed on, if any.
    exploded: Option<Point>,
    /// Drives mine placement, so a game can be replayed from it.
    seed: u64,
}

impl Game {
    /// A fresh game with a random seed.
    pub fn new(prefs: Preferences) -> Result<Self> {
        Game::with_seed(prefs, rand::random())
    }

    pub fn with_seed(prefs: Preferences, seed: u64) -> Result<Self> {
        prefs.validate()?;
        Ok(Game::fresh(prefs, seed))
    }

    /// A game over an already-mined field. It still starts on its first reveal, but keeps
    /// these mines.
    pub fn from_field(field: Field) -> Result<Self> {
        let prefs = Preferences::new(field.width(), field.height(), field.mine_count());
        prefs.validate()?;
        Ok(Game {
            field,
            ..Game::fresh(prefs, 0)
        })
    }

    fn fresh(prefs: Preferences, seed: u64) -> Self {
        Game {
            prefs,
            field: Field::new(prefs.width, prefs.height, prefs.mines),
            cursor: Point::new(prefs.width / 2, prefs.height / 2),
            started: false,
            game_over: false,
            exploded: None,
            seed,
        }
    }

    /// Throws this game away for a new one with the same preferences and a new seed.
    pub fn restart(&mut self) {
        self.restart_with_seed(rand::random());
    }

    pub fn restart_with_seed(&mut self, seed: u64) {
        *self = Game::fresh(self.prefs, seed);
    }

    /// Places the mines around the opening move.
    fn start(&mut self, opening: Point) {
        self.started = true;
        if self.field.is_mined() {
            return;
        }

        let mut rng = SmallRng::seed_from_u64(self.seed);
        if self.prefs.no_guess {
            let generation = generate::generate_solvable(
                &mut self.field,
                opening,
                &mut rng,
                MAX_GENERATION_ATTEMPTS,
                solver::is_solvable_from,
            );
            if !generation.solvable {
                warn!(attempts = generation.attempts, "no guess-free layout found");
            }
        } else {
            generate::place_mines(&mut self.field, opening, SafeZone::Cell, &mut rng);
        }
        debug!(x = opening.x, y = opening.y, seed = self.seed, "mines placed");
    }

    fn settle(&mut self, sweep: Sweep) -> Sweep {
        if let Sweep::Detonated(at) = sweep {
            info!(x = at.x, y = at.y, "mine detonated");
            self.exploded = Some(at);
            self.game_over = true;
        } else if self.field.did_win() {
            info!("field cleared");
            self.game_over = true;
        }
        sweep
    }

    /// Reveals `at`, or chords it if it is already revealed. The first reveal places the mines.
    pub fn reveal(&mut self, at: Point) -> Sweep {
        if self.game_over || !self.field.contains(at) {
            return Sweep::Unchanged;
        }
        if !self.started {
            self.start(at);
        }
        let sweep = self.field.reveal(at, Trigger::Player);
        self.settle(sweep)
    }

    pub fn chord(&mut self, at: Point) -> Sweep {
        if self.game_over || !self.started {
            return Sweep::Unchanged;
        }
        let sweep = self.field.chord(at);
        self.settle(sweep)
    }

    /// Flips the flag on a covered cell. Returns whether anything changed.
    pub fn toggle_flag(&mut self, at: Point) -> bool {
        if self.game_over || !self.started {
            return false;
        }
        match self.field.get(at).copied() {
            Some(cell) if !cell.revealed => {
                self.field[at].flagged = !cell.flagged;
                true
            }
            _ => false,
        }
    }

    pub fn move_cursor(&mut self, direction: Direction) {
        let Point { x, y } = self.cursor;
        let (width, height) = (self.field.width(), self.field.height());
        self.cursor = match direction {
            Direction::Up => Point::new(x, (y + height - 1) % height),
            Direction::Down => Point::new(x, (y + 1) % height),
            Direction::Left => Point::new((x + width - 1) % width, y),
            Direction::Right => Point::new((x + 1) % width, y),
        };
    }

    pub fn set_cursor(&mut self, at: Point) {
        if self.field.contains(at) {
            self.cursor = at;
        }
    }

    /// Lets the solver flag and reveal everything it can prove. Returns whether the field
    /// ended up fully resolved.
    pub fn solve(&mut self) -> bool {
        if self.game_over || !self.started {
            return false;
        }
        match solver::try_solve(&mut self.field) {
            Ok(resolution) => {
                self.settle(Sweep::Revealed(resolution.revealed));
                resolution.solved
            }
            Err(err) => {
                // Misplaced player flags lead here; the field is left as the last good round.
                warn!(%err, "solve aborted");
                false
            }
        }
    }

    /// A covered, unflagged cell the visible board proves safe.
    pub fn hint(&self) -> Option<Point> {
        if self.game_over || !self.started {
            return None;
        }
        let analysis = match analysis::analyze(&self.field) {
            Ok(analysis) => analysis,
            Err(err) => {
                warn!(%err, "hint analysis failed");
                return None;
            }
        };
        analysis.safe().find(|&p| !self.field[p].flagged)
    }

    pub fn toggle_debug(&mut self) {
        self.prefs.debug = !self.prefs.debug;
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    /// Unlike [`Field::did_win`], a game that detonated a mine is never won.
    pub fn did_win(&self) -> bool {
        self.exploded.is_none() && self.field.did_win()
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn exploded(&self) -> Option<Point> {
        self.exploded
    }

    /// Mines minus flags on covered cells. Negative once the player over-flags.
    pub fn mines_remaining(&self) -> isize {
        self.field.mine_count() as isize - self.field.flagged_count() as isize
    }

    pub fn cursor(&self) -> Point {
        self.cursor
    }

    pub fn preferences(&self) -> &Preferences {
        &self.prefs
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    pub fn cell_view(&self, at: Point) -> Option<CellView> {
        let cell = self.field.get(at)?;
        Some(CellView {
            is_mine: cell.mine,
            is_flagged: cell.flagged,
            is_revealed: cell.revealed,
            adjacent_mines: self.field.adjacent_mines(at) as u8,
        })
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        Ok(bcs::to_bytes(self)?)
    }

    /// Decodes a game and rejects state that would break the field's invariants.
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        let game: Game = bcs::from_bytes(bytes)?;
        game.check()?;
        Ok(game)
    }

    fn check(&self) -> Result<()> {
        self.prefs.validate()?;

        let field = &self.field;
        if !field.is_well_formed() {
            return Err(Error::CorruptState("board does not match its dimensions or mine count"));
        }
        let shape = (field.width(), field.height(), field.mine_count());
        if shape != (self.prefs.width, self.prefs.height, self.prefs.mines) {
            return Err(Error::CorruptState("preferences contradict the field"));
        }
        if !field.contains(self.cursor) {
            return Err(Error::CorruptState("cursor outside the field"));
        }
        if self.exploded.is_some_and(|at| !field.contains(at)) {
            return Err(Error::CorruptState("detonation outside the field"));
        }
        Ok(())
    }
}
