use std::time::Duration;

use tracing::{debug, info, warn};

use crate::clock::{MonotonicTime, TimeSource, TurnClock};
use crate::error::{GameError, Result};
use crate::hint::{HintKind, HintProvider};
use crate::ledger::{normalize_phrase, GuessLedger, PhraseMatch};
use crate::profile::{Difficulty, DifficultyProfile};
use crate::score::{time_bonus, ScoreDelta, ScoreEngine, TIMEOUT_PENALTY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Status {
    InProgress,
    Won,
    LostAttempts,
    LostTime,
    Resigned,
}

impl Status {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Status::InProgress)
    }
}

/// What a single action did to the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The turn clock ran out before the action arrived; the action was dropped
    TimedOut { penalty: ScoreDelta },
    Letter {
        letter: char,
        occurrences: usize,
        delta: ScoreDelta,
    },
    Phrase {
        phrase: String,
        verdict: PhraseMatch,
        delta: ScoreDelta,
    },
    Hint {
        kind: HintKind,
        text: String,
        delta: ScoreDelta,
    },
    Resigned {
        secret: String,
        elapsed: Duration,
        delta: ScoreDelta,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionReport {
    pub outcome: TurnOutcome,
    pub status: Status,
    /// Bonus paid for unused game time, only on a win
    pub time_bonus: Option<ScoreDelta>,
}

/// Final numbers of a session, handed to the stats store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub secret: String,
    pub difficulty: Difficulty,
    pub status: Status,
    pub final_score: u32,
    pub high_score: u32,
    pub outstanding_score: u32,
    pub elapsed: Duration,
    pub remaining_attempts: u32,
    pub hints_used: u32,
}

/// One game of hangman against a single secret.
///
/// Every mutation goes through [`Session::submit_letter`], [`Session::submit_phrase`],
/// [`Session::request_hint`] or [`Session::resign`]. Each of them refuses to run
/// on a finished (or not yet begun) session, then checks the turn clock: if the
/// countdown fired, the timeout penalty is applied in place of the requested action.
#[derive(Debug)]
pub struct Session<T: TimeSource = MonotonicTime> {
    profile: DifficultyProfile,
    ledger: GuessLedger,
    clock: TurnClock<T>,
    score: ScoreEngine,
    remaining_attempts: u32,
    hints_used: u32,
    status: Status,
    finished_after: Option<Duration>,
}

impl Session<MonotonicTime> {
    pub fn new(secret: &str, profile: DifficultyProfile, high_score: u32) -> Result<Self> {
        Self::with_time_source(secret, profile, high_score, MonotonicTime)
    }
}

impl<T: TimeSource> Session<T> {
    pub fn with_time_source(
        secret: &str,
        profile: DifficultyProfile,
        high_score: u32,
        time: T,
    ) -> Result<Self> {
        let secret = secret.trim();
        if !secret.chars().any(char::is_alphabetic) {
            return Err(GameError::InvalidInput(
                "secret must contain at least one letter".to_string(),
            ));
        }
        // every non-space character must be guessable
        if !secret.chars().all(|c| c.is_alphabetic() || c.is_whitespace()) {
            return Err(GameError::InvalidInput(
                "secret may only contain letters and spaces".to_string(),
            ));
        }

        Ok(Self {
            ledger: GuessLedger::new(secret),
            clock: TurnClock::with_time_source(&profile, time),
            score: ScoreEngine::new(high_score),
            remaining_attempts: profile.max_attempts(),
            hints_used: 0,
            status: Status::InProgress,
            finished_after: None,
            profile,
        })
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.clock = self.clock.with_poll_interval(poll_interval);
        self
    }

    /// Starts the game clock and arms the first turn.
    pub fn begin(&mut self) -> Result<()> {
        if self.status.is_terminal() {
            return Err(GameError::InvalidState("session is already over"));
        }
        self.clock.start_game()?;
        self.clock.start_turn();
        info!(
            difficulty = %self.profile.difficulty(),
            attempts = self.remaining_attempts,
            "session started"
        );
        Ok(())
    }

    pub fn submit_letter(&mut self, input: &str) -> Result<ActionReport> {
        self.ensure_playable()?;
        if let Some(report) = self.take_timeout() {
            return Ok(report);
        }

        let mut chars = input.trim().chars();
        let letter = match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_alphabetic() => c,
            _ => {
                return Err(GameError::InvalidInput(format!(
                    "'{}' is not a single letter",
                    input.trim()
                )))
            }
        };

        let occurrences = self.ledger.guess_letter(letter)?;
        self.clock.end_turn();

        let letter_score = self.profile.letter_score();
        let delta = if occurrences > 0 {
            self.score.apply(times(occurrences, letter_score), 0)
        } else {
            self.lose_attempt();
            self.score.apply(0, letter_score)
        };
        debug!(%letter, occurrences, score = delta.new, "letter guessed");

        let outcome = TurnOutcome::Letter {
            letter: letter.to_lowercase().next().unwrap_or(letter),
            occurrences,
            delta,
        };
        Ok(self.finish_action(outcome, true))
    }

    pub fn submit_phrase(&mut self, text: &str) -> Result<ActionReport> {
        self.ensure_playable()?;
        if let Some(report) = self.take_timeout() {
            return Ok(report);
        }

        if text.trim().is_empty() {
            return Err(GameError::InvalidInput("phrase is empty".to_string()));
        }

        let verdict = self.ledger.guess_phrase(text)?;
        self.clock.end_turn();

        let phrase = normalize_phrase(text);
        let word_score = self.profile.word_score();
        let delta = match verdict {
            PhraseMatch::Exact { undisclosed } => {
                let delta = self.score.apply(times(undisclosed, word_score), 0);
                self.ledger.mark_all_guessed();
                delta
            }
            PhraseMatch::Partial => self
                .score
                .apply(times(phrase.chars().count(), word_score / 2), 0),
            PhraseMatch::Miss => {
                self.lose_attempt();
                self.score.apply(0, word_score)
            }
        };
        debug!(?verdict, score = delta.new, "phrase guessed");

        let outcome = TurnOutcome::Phrase {
            phrase,
            verdict,
            delta,
        };
        Ok(self.finish_action(outcome, true))
    }

    /// Buys a hint for the price of one letter.
    pub fn request_hint(
        &mut self,
        kind: HintKind,
        provider: &dyn HintProvider,
    ) -> Result<ActionReport> {
        self.ensure_playable()?;
        if let Some(report) = self.take_timeout() {
            return Ok(report);
        }

        let max = self.profile.max_hints();
        if self.hints_used >= max {
            return Err(GameError::HintExhausted { max });
        }
        if let Some(threshold) = self.profile.hint_unlock_at() {
            if self.remaining_attempts > threshold {
                return Err(GameError::HintNotYetAvailable {
                    threshold,
                    remaining: self.remaining_attempts,
                });
            }
        }

        self.clock.end_turn();
        let taunt = self.profile.difficulty().taunts_hints();
        let text = provider.get_hint(&self.ledger.secret(), kind, taunt);
        self.hints_used += 1;
        let delta = self.score.apply(0, self.profile.letter_score());
        info!(%kind, hints_used = self.hints_used, "hint given");

        Ok(self.finish_action(TurnOutcome::Hint { kind, text, delta }, false))
    }

    pub fn resign(&mut self) -> Result<ActionReport> {
        self.ensure_playable()?;
        if let Some(report) = self.take_timeout() {
            return Ok(report);
        }

        self.clock.end_turn();
        let delta = self.score.forfeit();
        self.status = Status::Resigned;
        self.conclude();

        let outcome = TurnOutcome::Resigned {
            secret: self.ledger.secret(),
            elapsed: self.elapsed_game_time(),
            delta,
        };
        Ok(ActionReport {
            outcome,
            status: self.status,
            time_bonus: None,
        })
    }

    fn ensure_playable(&self) -> Result<()> {
        if self.status.is_terminal() {
            return Err(GameError::InvalidState("session is already over"));
        }
        if !self.clock.has_started() {
            return Err(GameError::InvalidState("session has not begun"));
        }
        Ok(())
    }

    fn take_timeout(&mut self) -> Option<ActionReport> {
        if !self.clock.is_turn_timed_out() {
            return None;
        }

        self.clock.end_turn();
        self.lose_attempt();
        let penalty = self.score.apply(0, TIMEOUT_PENALTY);
        warn!(
            attempts = self.remaining_attempts,
            score = penalty.new,
            "turn timed out"
        );
        Some(self.finish_action(TurnOutcome::TimedOut { penalty }, true))
    }

    fn lose_attempt(&mut self) {
        self.remaining_attempts = self.remaining_attempts.saturating_sub(1);
    }

    fn finish_action(&mut self, outcome: TurnOutcome, evaluate: bool) -> ActionReport {
        let time_bonus = if evaluate { self.evaluate() } else { None };
        if self.status.is_terminal() {
            self.conclude();
        } else {
            self.clock.start_turn();
        }
        ActionReport {
            outcome,
            status: self.status,
            time_bonus,
        }
    }

    /// Settles the status after a guess or a timeout; returns the win bonus if any.
    fn evaluate(&mut self) -> Option<ScoreDelta> {
        if self.ledger.is_fully_revealed() {
            self.status = Status::Won;
            let bonus = time_bonus(
                self.clock.game_limit().as_secs_f64(),
                self.clock.elapsed_game_time().as_secs_f64(),
            );
            (bonus > 0).then(|| self.score.apply(bonus, 0))
        } else if self.remaining_attempts == 0 {
            self.status = Status::LostAttempts;
            None
        } else if self.clock.remaining_game_time().is_zero() {
            self.status = Status::LostTime;
            None
        } else {
            None
        }
    }

    fn conclude(&mut self) {
        self.clock.stop();
        let elapsed = self.clock.elapsed_game_time();
        self.finished_after = Some(elapsed);
        info!(
            status = %self.status,
            score = self.score.current(),
            elapsed_secs = elapsed.as_secs(),
            "session finished"
        );
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn profile(&self) -> &DifficultyProfile {
        &self.profile
    }

    pub fn ledger(&self) -> &GuessLedger {
        &self.ledger
    }

    pub fn display_mask(&self) -> String {
        self.ledger.display_mask()
    }

    pub fn secret(&self) -> String {
        self.ledger.secret()
    }

    pub fn remaining_attempts(&self) -> u32 {
        self.remaining_attempts
    }

    pub fn hints_used(&self) -> u32 {
        self.hints_used
    }

    pub fn hints_remaining(&self) -> u32 {
        self.profile.max_hints().saturating_sub(self.hints_used)
    }

    pub fn current_score(&self) -> u32 {
        self.score.current()
    }

    pub fn outstanding_score(&self) -> u32 {
        self.score.outstanding()
    }

    pub fn high_score(&self) -> u32 {
        self.score.high()
    }

    pub fn has_begun(&self) -> bool {
        self.clock.has_started()
    }

    /// Game time so far, frozen once the session is over
    pub fn elapsed_game_time(&self) -> Duration {
        self.finished_after
            .unwrap_or_else(|| self.clock.elapsed_game_time())
    }

    pub fn remaining_game_time(&self) -> Duration {
        self.profile
            .game_time_limit()
            .saturating_sub(self.elapsed_game_time())
    }

    pub fn turn_remaining(&self) -> Option<Duration> {
        if self.status.is_terminal() {
            None
        } else {
            self.clock.turn_remaining()
        }
    }

    pub fn is_turn_timed_out(&self) -> bool {
        self.clock.is_turn_timed_out()
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            secret: self.ledger.secret(),
            difficulty: self.profile.difficulty(),
            status: self.status,
            final_score: self.score.current(),
            high_score: self.score.high(),
            outstanding_score: self.score.outstanding(),
            elapsed: self.elapsed_game_time(),
            remaining_attempts: self.remaining_attempts,
            hints_used: self.hints_used,
        }
    }
}

fn times(count: usize, value: u32) -> u32 {
    u32::try_from(count)
        .unwrap_or(u32::MAX)
        .saturating_mul(value)
}
