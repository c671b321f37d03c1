use std::{env, thread, time::Duration};

use anyhow::Context;
use minefield::*;
use rand::{SeedableRng, prelude::IndexedRandom, rngs::SmallRng};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: minefield [beginner|intermediate|expert] [--seed N] [--attempts N] [--bot]";

struct Options {
    difficulty: Difficulty,
    seed: Option<u64>,
    attempts: u32,
    bot: bool,
}

fn parse_args() -> anyhow::Result<Options> {
    let mut options = Options {
        difficulty: Difficulty::default(),
        seed: None,
        attempts: MAX_GENERATION_ATTEMPTS,
        bot: false,
    };

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--bot" => options.bot = true,
            "--seed" => {
                let value = args.next().context("--seed needs a value")?;
                options.seed = Some(value.parse::<u64>().context("--seed must be an unsigned integer")?);
            }
            "--attempts" => {
                let value = args.next().context("--attempts needs a value")?;
                options.attempts = value.parse::<u32>().context("--attempts must be an unsigned integer")?;
            }
            "-h" | "--help" => {
                println!("{USAGE}");
                std::process::exit(0);
            }
            name => options.difficulty = name.parse::<Difficulty>().context(USAGE)?,
        }
    }

    Ok(options)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let options = parse_args()?;
    let seed = options.seed.unwrap_or_else(rand::random);
    info!(difficulty = %options.difficulty, seed, "starting");

    if options.bot {
        play(&options, seed)
    } else {
        find_solvable(&options, seed)
    }
}

/// Opens fresh fields at their center until the solver clears one without guessing.
fn find_solvable(options: &Options, seed: u64) -> anyhow::Result<()> {
    let prefs = options.difficulty.preferences();

    for tries in 1..=options.attempts.max(1) {
        let mut game = Game::with_seed(prefs, seed.wrapping_add(tries as u64))?;
        game.reveal(game.cursor());
        let before = render(&game, false);

        let solved = game.did_win() || game.solve();
        let status = if solved {
            "Solved:".to_string()
        } else {
            format!("Failed to solve: Remaining: {}", game.mines_remaining())
        };

        let mut panels = vec![
            titled("Trying to solve:", before),
            titled(&status, render(&game, false)),
        ];
        if !solved {
            panels.push(titled("Revealed:", render(&game, true)));
        }
        print_side_by_side(&panels);

        if solved {
            println!("Solved with {tries} tries (seed {})", game.seed());
            return Ok(());
        }
        debug!(tries, "field needs a guess, reshuffling");
    }

    anyhow::bail!("no guess-free field in {} tries", options.attempts)
}

/// Plays one game, taking proven-safe cells when the analysis finds one and guessing otherwise.
fn play(options: &Options, seed: u64) -> anyhow::Result<()> {
    let mut game = Game::with_seed(options.difficulty.preferences(), seed)?;
    let mut rng = SmallRng::seed_from_u64(seed.rotate_left(32));

    println!("--- Autonomous Minesweeper Bot ---");
    println!("Strategy: Prioritize logically safe moves, guess randomly otherwise.");
    print_board(&game);

    let mut move_count = 0;
    while !game.is_game_over() {
        move_count += 1;
        println!("\n--- Move #{move_count} ---");

        let target = if !game.is_started() {
            Some(game.cursor())
        } else if let Some(safe) = game.hint() {
            println!("Logic found a guaranteed safe cell.");
            Some(safe)
        } else {
            println!("No logically safe move found. Making a random guess...");
            let field = game.field();
            let hidden: Vec<Point> = field.points().filter(|&p| field[p].is_hidden()).collect();
            hidden.choose(&mut rng).copied()
        };

        let Some(point) = target else {
            println!("No valid moves left for the bot to make.");
            break;
        };

        println!("Bot reveals ({}, {})...", point.x, point.y);
        game.set_cursor(point);
        game.apply(Input::Reveal);
        print_board(&game);

        thread::sleep(Duration::from_millis(200));
    }

    println!("\n--- Game Over ---");
    if game.did_win() {
        println!("Result: The bot won in {move_count} moves!");
    } else if let Some(mine) = game.exploded() {
        println!("Result: The bot hit the mine at ({}, {}) and lost.", mine.x, mine.y);
    } else {
        println!("Result: The game ended unexpectedly.");
    }
    Ok(())
}

/// One line per row, with column and row indices. Mines show once the game is over, in
/// debug mode, or when `reveal_all` is set.
fn render(game: &Game, reveal_all: bool) -> Vec<String> {
    let field = game.field();
    let show_mines = reveal_all || game.is_game_over() || game.preferences().debug;

    let mut lines = Vec::with_capacity(field.height() + 2);
    lines.push(format!(
        "   {}",
        (0..field.width()).map(|x| format!("{:^3}", x)).collect::<String>()
    ));
    lines.push(format!("  +{}", "---".repeat(field.width())));

    for y in 0..field.height() {
        let mut line = format!("{:^2}|", y);
        for x in 0..field.width() {
            let point = Point::new(x, y);
            let Some(view) = game.cell_view(point) else {
                continue;
            };
            let symbol = match view {
                CellView { is_mine: true, .. } if show_mines => " * ".to_string(),
                CellView {
                    is_revealed: true, ..
                } => match view.adjacent_mines {
                    0 => " . ".to_string(),
                    n => format!(" {} ", n),
                },
                _ if reveal_all => format!(" {} ", view.adjacent_mines),
                CellView {
                    is_flagged: true, ..
                } => " F ".to_string(),
                _ if point == game.cursor() => " @ ".to_string(),
                _ => " ■ ".to_string(),
            };
            line.push_str(&symbol);
        }
        lines.push(line);
    }
    lines
}

fn print_board(game: &Game) {
    println!("{} mines left", game.mines_remaining());
    for line in render(game, false) {
        println!("{line}");
    }
    println!();
}

fn titled(title: &str, mut lines: Vec<String>) -> Vec<String> {
    lines.insert(0, title.to_string());
    lines
}

fn print_side_by_side(panels: &[Vec<String>]) {
    let widths: Vec<usize> = panels
        .iter()
        .map(|panel| panel.iter().map(|l| l.chars().count()).max().unwrap_or(0))
        .collect();
    let rows = panels.iter().map(Vec::len).max().unwrap_or(0);

    for row in 0..rows {
        let line: Vec<String> = panels
            .iter()
            .zip(&widths)
            .map(|(panel, &width)| {
                let text = panel.get(row).map(String::as_str).unwrap_or("");
                format!("{text:<width$}")
            })
            .collect();
        println!("{}", line.join("   ").trim_end());
    }
    println!();
}
