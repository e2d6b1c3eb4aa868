use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Difficulty tiers, easiest first
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Challenger,
    Master,
    Creator,
}

impl Difficulty {
    /// The five tiers backed by the built-in word lists
    pub const STANDARD: [Difficulty; 5] = [
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::Challenger,
        Difficulty::Master,
    ];

    /// Hint and flavor text mock the player on the harder tiers.
    pub fn is_taunting(&self) -> bool {
        matches!(
            self,
            Difficulty::Challenger | Difficulty::Master | Difficulty::Creator
        )
    }

    /// Hints only carry a jab on the two tiers that gate them.
    pub fn taunts_hints(&self) -> bool {
        matches!(self, Difficulty::Challenger | Difficulty::Master)
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ProfileError {
    #[error("max_attempts must be at least 1")]
    NoAttempts,

    #[error("{0} time limit must be greater than zero")]
    ZeroTimeLimit(&'static str),
}

/// Immutable per-tier rules a session is played under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DifficultyProfile {
    difficulty: Difficulty,
    max_attempts: u32,
    game_time_limit_secs: u64,
    turn_time_limit_secs: u64,
    letter_score: u32,
    word_score: u32,
    max_hints: u32,
    hint_unlock_at: Option<u32>,
}

impl DifficultyProfile {
    pub fn new(
        difficulty: Difficulty,
        max_attempts: u32,
        game_time_limit_secs: u64,
        turn_time_limit_secs: u64,
        letter_score: u32,
        word_score: u32,
    ) -> Result<Self, ProfileError> {
        if max_attempts == 0 {
            return Err(ProfileError::NoAttempts);
        }
        if game_time_limit_secs == 0 {
            return Err(ProfileError::ZeroTimeLimit("game"));
        }
        if turn_time_limit_secs == 0 {
            return Err(ProfileError::ZeroTimeLimit("turn"));
        }

        let (max_hints, hint_unlock_at) = match difficulty {
            Difficulty::Easy | Difficulty::Medium | Difficulty::Hard => (3, None),
            Difficulty::Challenger => (1, Some(2)),
            Difficulty::Master => (1, Some(1)),
            Difficulty::Creator => (1, None),
        };

        Ok(Self {
            difficulty,
            max_attempts,
            game_time_limit_secs,
            turn_time_limit_secs,
            letter_score,
            word_score,
            max_hints,
            hint_unlock_at,
        })
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn name(&self) -> String {
        self.difficulty.to_string()
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn game_time_limit(&self) -> Duration {
        Duration::from_secs(self.game_time_limit_secs)
    }

    pub fn turn_time_limit(&self) -> Duration {
        Duration::from_secs(self.turn_time_limit_secs)
    }

    pub fn letter_score(&self) -> u32 {
        self.letter_score
    }

    pub fn word_score(&self) -> u32 {
        self.word_score
    }

    pub fn max_hints(&self) -> u32 {
        self.max_hints
    }

    /// Remaining-attempts threshold at or below which hints unlock
    pub fn hint_unlock_at(&self) -> Option<u32> {
        self.hint_unlock_at
    }
}

/// Creator-mode settings supplied by the player instead of the built-in table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreatorOverrides {
    pub attempts: u32,
    pub game_time_limit_secs: u64,
    pub turn_time_limit_secs: u64,
}

impl Default for CreatorOverrides {
    fn default() -> Self {
        Self {
            attempts: 10,
            game_time_limit_secs: 900,
            turn_time_limit_secs: 120,
        }
    }
}

/// Lookup of every tier's profile, built once at startup and shared by reference.
#[derive(Debug, Clone)]
pub struct ProfileTable {
    profiles: Vec<DifficultyProfile>,
}

impl ProfileTable {
    pub fn standard() -> Self {
        Self::with_creator(CreatorOverrides::default())
            .unwrap_or_else(|_| unreachable!("default creator overrides are valid"))
    }

    /// Builds the table with creator mode replaced by `overrides`.
    pub fn with_creator(overrides: CreatorOverrides) -> Result<Self, ProfileError> {
        // (difficulty, attempts, game secs, turn secs, letter, word)
        let rows = [
            (Difficulty::Easy, 9, 600, 60, 10, 10),
            (Difficulty::Medium, 8, 540, 45, 15, 15),
            (Difficulty::Hard, 7, 480, 30, 20, 30),
            (Difficulty::Challenger, 6, 420, 25, 25, 45),
            (Difficulty::Master, 5, 360, 15, 30, 60),
            (
                Difficulty::Creator,
                overrides.attempts,
                overrides.game_time_limit_secs,
                overrides.turn_time_limit_secs,
                20,
                30,
            ),
        ];

        let profiles = rows
            .into_iter()
            .map(|(d, attempts, game, turn, letter, word)| {
                DifficultyProfile::new(d, attempts, game, turn, letter, word)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { profiles })
    }

    pub fn get(&self, difficulty: Difficulty) -> &DifficultyProfile {
        &self.profiles[difficulty.index()]
    }
}

impl Default for ProfileTable {
    fn default() -> Self {
        Self::standard()
    }
}
