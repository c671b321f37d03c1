//! Input symbols delivered by whatever event loop hosts the game, one at a time.

use crate::game::{Direction, Game};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Input {
    Move(Direction),
    /// Reveal the cursor cell; chords it when it is already revealed.
    Reveal,
    /// The shared "flag" key: chords a revealed cell, toggles the flag on a covered one.
    Flag,
    /// Toggle the flag on the cursor cell and nothing else.
    ToggleMark,
    /// Let the solver finish what it can.
    Solve,
    /// Jump the cursor to a provably safe cell, if there is one.
    Hint,
    ToggleDebug,
    Restart,
    Quit,
}

/// Whether the event loop should keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

impl Game {
    /// Applies one input to the game, fully, before the next one arrives.
    pub fn apply(&mut self, input: Input) -> Control {
        let cursor = self.cursor();
        match input {
            Input::Quit => return Control::Quit,
            Input::Restart => self.restart(),
            Input::Move(direction) => self.move_cursor(direction),
            Input::Reveal => {
                self.reveal(cursor);
            }
            Input::Flag => self.chord_or_flag(),
            Input::ToggleMark => {
                self.toggle_flag(cursor);
            }
            Input::Solve => {
                self.solve();
            }
            Input::Hint => {
                if let Some(safe) = self.hint() {
                    self.set_cursor(safe);
                }
            }
            Input::ToggleDebug => self.toggle_debug(),
        }
        Control::Continue
    }

    fn chord_or_flag(&mut self) {
        let cursor = self.cursor();
        let revealed = self.field().get(cursor).is_some_and(|cell| cell.revealed);
        if revealed {
            self.chord(cursor);
        } else {
            self.toggle_flag(cursor);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Preferences,
        field::{Field, Point},
    };

    fn game_with_mines(width: usize, height: usize, mines: &[Point]) -> Game {
        Game::from_field(Field::with_mines(width, height, mines)).unwrap()
    }

    #[test]
    fn test_quit_stops_everything_else_continues() {
        let mut game = Game::with_seed(Preferences::default(), 1).unwrap();
        assert_eq!(game.apply(Input::Move(Direction::Up)), Control::Continue);
        assert_eq!(game.apply(Input::Reveal), Control::Continue);
        assert_eq!(game.apply(Input::Quit), Control::Quit);
    }

    #[test]
    fn test_flag_key_toggles_covered_and_chords_revealed() {
        let mines = [Point::new(0, 0), Point::new(2, 0)];
        let mut game = game_with_mines(3, 3, &mines);
        game.set_cursor(Point::new(1, 1));
        game.apply(Input::Reveal);

        for mine in mines {
            game.set_cursor(mine);
            game.apply(Input::Flag);
            assert!(game.field()[mine].flagged);
        }

        game.set_cursor(Point::new(1, 1));
        game.apply(Input::Flag);

        assert!(game.did_win());
        assert!(game.is_game_over());
    }

    #[test]
    fn test_flag_key_on_unsatisfied_number_changes_nothing() {
        let mut game = game_with_mines(3, 3, &[Point::new(0, 0), Point::new(2, 0)]);
        game.set_cursor(Point::new(1, 1));
        game.apply(Input::Reveal);
        let before = game.clone();

        // (1,1) shows 2 with no flags around it: no chord, and a revealed cell takes no flag.
        assert_eq!(game.apply(Input::Flag), Control::Continue);

        assert_eq!(game, before);
    }

    #[test]
    fn test_toggle_mark_never_chords() {
        let mut game = game_with_mines(3, 3, &[Point::new(0, 0)]);
        game.set_cursor(Point::new(1, 1));
        game.apply(Input::Reveal);
        game.set_cursor(Point::new(0, 0));
        game.apply(Input::ToggleMark);

        game.set_cursor(Point::new(1, 1));
        game.apply(Input::ToggleMark);

        assert!(!game.field()[Point::new(1, 1)].flagged);
        assert_eq!(game.field().revealed_count(), 1);
    }

    #[test]
    fn test_hint_moves_the_cursor() {
        let mut game = game_with_mines(4, 4, &[Point::new(0, 0)]);
        game.set_cursor(Point::new(1, 1));
        game.apply(Input::Reveal);

        game.apply(Input::Hint);

        assert_eq!(game.cursor(), Point::new(3, 0));
    }

    #[test]
    fn test_restart_and_debug_toggle() {
        let mut game = Game::with_seed(Preferences::default(), 1).unwrap();
        game.apply(Input::ToggleDebug);
        game.apply(Input::Reveal);
        assert!(game.is_started());

        game.apply(Input::Restart);

        assert!(!game.is_started());
        assert!(game.preferences().debug);
    }

    #[test]
    fn test_solve_input_runs_the_assist() {
        let mut game = game_with_mines(3, 3, &[Point::new(0, 0)]);
        game.set_cursor(Point::new(1, 1));
        game.apply(Input::Reveal);
        game.set_cursor(Point::new(0, 0));
        game.apply(Input::Flag);

        game.apply(Input::Solve);

        assert!(game.did_win());
    }
}
