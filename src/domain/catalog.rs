/// Catalog types: rooms, puzzles, power-up templates, achievement definitions.
///
/// Everything here is immutable once loaded. The session clones what it needs
/// when a room is selected and never writes back into the catalog.
///
/// ## TOML shape (one room per file):
///   ```toml
///   id = "egypt"
///   name = "Ancient Egypt"
///   theme = "egypt"
///   difficulty = "medium"
///   base_score = 1000
///   time_limit = 600
///
///   [[puzzle]]
///   id = "egypt-1"
///   type = "unscramble"
///   difficulty = "easy"
///   question = "HAROPA"
///   answer = "PHARAOH"
///   hints = ["Ruler of ancient Egypt"]
///   points = 100
///   time_bonus = 20
///
///   [[power_up]]
///   type = "doublePoints"
///   duration = 30
///   multiplier = 2.0
///   description = "Double points"
///
///   [[achievement]]
///   id = "egypt-speed"
///   name = "Sand Runner"
///   description = "Finish with over 5 minutes left"
///   condition = { kind = "time-remaining-above", seconds = 300 }
///   reward = 200
///   ```

use serde::Deserialize;
use thiserror::Error;

use super::achievement::Condition;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("room file parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("room {room}: puzzle list is empty")]
    NoPuzzles { room: String },

    #[error("room {room}: time limit must be positive")]
    ZeroTimeLimit { room: String },

    #[error("room {room}: puzzle {puzzle} has an empty answer")]
    EmptyAnswer { room: String, puzzle: String },
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Egypt,
    Space,
    Haunted,
    #[serde(other)]
    Other,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PuzzleKind {
    Unscramble,
    Riddle,
    WordSearch,
    FillBlanks,
    Code,
    MathWord,
    Anagram,
    Memory,
    Pattern,
    Crypto,
    #[serde(other)]
    Other,
}

impl PuzzleKind {
    /// Prompt line shown above the question.
    pub fn prompt(self) -> &'static str {
        match self {
            PuzzleKind::Unscramble => "Unscramble these letters:",
            PuzzleKind::Riddle => "Solve the riddle:",
            _ => "Current puzzle:",
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PowerUpKind {
    ExtraTime,
    DoublePoints,
    ExtraHint,
    SkipPuzzle,
}

impl PowerUpKind {
    pub fn label(self) -> &'static str {
        match self {
            PowerUpKind::ExtraTime => "Extra Time",
            PowerUpKind::DoublePoints => "Double Points",
            PowerUpKind::ExtraHint => "Extra Hint",
            PowerUpKind::SkipPuzzle => "Skip Puzzle",
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct PowerUpTemplate {
    #[serde(rename = "type")]
    pub kind: PowerUpKind,
    /// Seconds the effect lasts. `None` = lasts until consumed or deactivated.
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default)]
    pub multiplier: Option<f64>,
    #[serde(default)]
    pub description: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AchievementDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub condition: Condition,
    pub reward: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Puzzle {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: PuzzleKind,
    #[serde(default)]
    pub difficulty: Difficulty,
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub hints: Vec<String>,
    pub points: u32,
    #[serde(default)]
    pub time_bonus: Option<u32>,
}

impl Puzzle {
    /// Case-insensitive answer check; surrounding and repeated inner
    /// whitespace is ignored on both sides.
    pub fn accepts(&self, raw: &str) -> bool {
        normalize_answer(raw) == normalize_answer(&self.answer)
    }
}

pub fn normalize_answer(s: &str) -> String {
    s.split_whitespace()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Clone, Debug, Deserialize)]
pub struct Room {
    pub id: String,
    pub name: String,
    pub theme: Theme,
    #[serde(default)]
    pub description: String,
    pub difficulty: Difficulty,
    pub base_score: u32,
    /// Seconds.
    pub time_limit: u32,
    #[serde(rename = "puzzle")]
    pub puzzles: Vec<Puzzle>,
    #[serde(rename = "power_up", default)]
    pub power_ups: Vec<PowerUpTemplate>,
    #[serde(rename = "achievement", default)]
    pub achievements: Vec<AchievementDefinition>,
}

impl Room {
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.puzzles.is_empty() {
            return Err(CatalogError::NoPuzzles { room: self.id.clone() });
        }
        if self.time_limit == 0 {
            return Err(CatalogError::ZeroTimeLimit { room: self.id.clone() });
        }
        if let Some(p) = self.puzzles.iter().find(|p| normalize_answer(&p.answer).is_empty()) {
            return Err(CatalogError::EmptyAnswer {
                room: self.id.clone(),
                puzzle: p.id.clone(),
            });
        }
        Ok(())
    }

    pub fn puzzle(&self, index: usize) -> Option<&Puzzle> {
        self.puzzles.get(index)
    }

    pub fn is_last_puzzle(&self, index: usize) -> bool {
        index + 1 >= self.puzzles.len()
    }
}
