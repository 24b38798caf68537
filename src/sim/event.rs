/// Events emitted by state-machine operations.
/// The presentation layer consumes these for sound and status messages.

use crate::domain::catalog::PowerUpKind;

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    RoomSelected { room_id: String },
    CorrectAnswer { puzzle_id: String, points: u32 },
    WrongAnswer { puzzle_id: String, penalty: u32 },
    HintRevealed { puzzle_id: String, hint_index: usize, penalty: u32 },
    PuzzleSkipped { puzzle_id: String },
    PowerUpActivated { kind: PowerUpKind },
    PowerUpExpired { kind: PowerUpKind },
    AchievementUnlocked { id: String, name: String, reward: u32 },
    /// `escaped` is false when at least one puzzle was skipped.
    RoomCompleted { room_id: String, escaped: bool, bonus: u32 },
    TimeUp,
}
