use std::{fmt, str::FromStr};

use crate::error::{Error, Result};

/// The knobs a player picks before a game starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Preferences {
    pub width: usize,
    pub height: usize,
    pub mines: usize,
    /// Reshuffle the opening layout until the solver can finish it without guessing.
    pub no_guess: bool,
    /// Show mines on the board while playing.
    pub debug: bool,
}

impl Preferences {
    pub fn new(width: usize, height: usize, mines: usize) -> Self {
        Preferences {
            width,
            height,
            mines,
            no_guess: false,
            debug: false,
        }
    }

    pub fn cells(&self) -> usize {
        self.width * self.height
    }

    /// Checks `0 < mines < width * height`.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::EmptyField {
                width: self.width,
                height: self.height,
            });
        }
        if self.mines == 0 {
            return Err(Error::NoMines);
        }
        if self.mines >= self.cells() {
            return Err(Error::TooManyMines {
                mines: self.mines,
                cells: self.cells(),
            });
        }
        Ok(())
    }
}

impl Default for Preferences {
    fn default() -> Self {
        Difficulty::default().preferences()
    }
}

/// Named width/height/mine presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Expert,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [
        Difficulty::Beginner,
        Difficulty::Intermediate,
        Difficulty::Expert,
    ];

    pub fn preferences(self) -> Preferences {
        match self {
            Difficulty::Beginner => Preferences::new(9, 9, 10),
            Difficulty::Intermediate => Preferences::new(16, 16, 40),
            Difficulty::Expert => Preferences::new(30, 16, 99),
        }
    }

    fn name(self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Expert => "expert",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Difficulty {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        Difficulty::ALL
            .into_iter()
            .find(|d| d.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| anyhow::anyhow!("unknown difficulty `{s}` (beginner, intermediate, expert)"))
    }
}
