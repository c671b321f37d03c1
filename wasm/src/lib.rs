//! Browser bindings. The host keeps the game as an opaque byte buffer and passes it back in
//! on every call; each call applies one event and returns the updated buffer.

use minefield as ms;
use wasm_bindgen::prelude::*;

/// Cell codes returned by [`get_cells`], row-major.
const HIDDEN: i8 = -1;
const FLAGGED: i8 = -2;
const MINE: i8 = -3;

fn load(bts: &[u8]) -> Result<ms::Game, String> {
    console_error_panic_hook::set_once();
    ms::Game::deserialize(bts).map_err(|e| e.to_string())
}

fn store(game: &ms::Game) -> Result<Vec<u8>, String> {
    game.serialize().map_err(|e| e.to_string())
}

#[wasm_bindgen]
pub fn create_game(width: usize, height: usize, mines: usize, no_guess: bool) -> Result<Vec<u8>, String> {
    console_error_panic_hook::set_once();

    let mut prefs = ms::Preferences::new(width, height, mines);
    prefs.no_guess = no_guess;
    let game = ms::Game::new(prefs).map_err(|e| e.to_string())?;
    store(&game)
}

#[wasm_bindgen]
pub fn create_preset(name: &str) -> Result<Vec<u8>, String> {
    console_error_panic_hook::set_once();

    let difficulty = name.parse::<ms::Difficulty>().map_err(|e| e.to_string())?;
    let game = ms::Game::new(difficulty.preferences()).map_err(|e| e.to_string())?;
    store(&game)
}

/// Feeds one input to the game. `code` is one of `up`, `down`, `left`, `right`, `reveal`,
/// `flag`, `mark`, `solve`, `hint`, `debug`, `restart`.
#[wasm_bindgen]
pub fn apply(bts: Vec<u8>, code: &str) -> Result<Vec<u8>, String> {
    let mut game = load(&bts)?;
    let input = match code {
        "up" => ms::Input::Move(ms::Direction::Up),
        "down" => ms::Input::Move(ms::Direction::Down),
        "left" => ms::Input::Move(ms::Direction::Left),
        "right" => ms::Input::Move(ms::Direction::Right),
        "reveal" => ms::Input::Reveal,
        "flag" => ms::Input::Flag,
        "mark" => ms::Input::ToggleMark,
        "solve" => ms::Input::Solve,
        "hint" => ms::Input::Hint,
        "debug" => ms::Input::ToggleDebug,
        "restart" => ms::Input::Restart,
        other => return Err(format!("unknown input `{other}`")),
    };
    game.apply(input);
    store(&game)
}

/// Reveals (or chords) the cell at `(x, y)` and moves the cursor there.
#[wasm_bindgen]
pub fn choose_cell(bts: Vec<u8>, x: usize, y: usize) -> Result<Vec<u8>, String> {
    let mut game = load(&bts)?;
    let point = ms::Point { x, y };
    game.set_cursor(point);
    game.reveal(point);
    store(&game)
}

#[wasm_bindgen]
pub fn toggle_flag(bts: Vec<u8>, x: usize, y: usize) -> Result<Vec<u8>, String> {
    let mut game = load(&bts)?;
    game.toggle_flag(ms::Point { x, y });
    store(&game)
}

#[wasm_bindgen]
pub fn chord(bts: Vec<u8>, x: usize, y: usize) -> Result<Vec<u8>, String> {
    let mut game = load(&bts)?;
    game.chord(ms::Point { x, y });
    store(&game)
}

/// `[width, height, cursor_x, cursor_y]`.
#[wasm_bindgen]
pub fn get_layout(bts: Vec<u8>) -> Result<Vec<u32>, String> {
    let game = load(&bts)?;
    let field = game.field();
    let cursor = game.cursor();
    Ok([field.width(), field.height(), cursor.x, cursor.y]
        .into_iter()
        .map(|n| n as u32)
        .collect())
}

/// `0` playing, `1` won, `2` lost.
#[wasm_bindgen]
pub fn get_status(bts: Vec<u8>) -> Result<u8, String> {
    let game = load(&bts)?;
    Ok(match (game.is_game_over(), game.did_win()) {
        (false, _) => 0,
        (true, true) => 1,
        (true, false) => 2,
    })
}

#[wasm_bindgen]
pub fn mines_remaining(bts: Vec<u8>) -> Result<i32, String> {
    let game = load(&bts)?;
    Ok(game.mines_remaining() as i32)
}

/// One code per cell, row-major: `0..=8` revealed, `-1` hidden, `-2` flagged, `-3` a mine
/// the player may see (game over or debug mode).
#[wasm_bindgen]
pub fn get_cells(bts: Vec<u8>) -> Result<Vec<i8>, String> {
    let game = load(&bts)?;
    let show_mines = game.is_game_over() || game.preferences().debug;
    let field = game.field();

    Ok(field
        .points()
        .filter_map(|p| game.cell_view(p))
        .map(|cell| match cell {
            ms::CellView { is_mine: true, .. } if show_mines => MINE,
            ms::CellView {
                is_revealed: true, ..
            } => cell.adjacent_mines as i8,
            ms::CellView {
                is_flagged: true, ..
            } => FLAGGED,
            _ => HIDDEN,
        })
        .collect())
}
