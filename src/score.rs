/// Fixed penalty for letting the turn clock run out
pub const TIMEOUT_PENALTY: u32 = 5;

/// Fraction of the unused game time paid out as a win bonus
pub const TIME_BONUS_RATE: f64 = 0.1;

/// Score before and after one application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreDelta {
    pub old: u32,
    pub new: u32,
}

impl ScoreDelta {
    pub fn change(&self) -> i64 {
        i64::from(self.new) - i64::from(self.old)
    }
}

impl From<ScoreDelta> for (u32, u32) {
    fn from(d: ScoreDelta) -> Self {
        (d.old, d.new)
    }
}

/// Running score, positive-gain accumulator and high-water mark of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreEngine {
    current: u32,
    outstanding: u32,
    high: u32,
}

impl ScoreEngine {
    /// Starts a session seeded with the player's stored high score.
    pub fn new(high_score: u32) -> Self {
        Self {
            current: 0,
            outstanding: 0,
            high: high_score,
        }
    }

    pub fn apply(&mut self, gain: u32, loss: u32) -> ScoreDelta {
        let old = self.current;
        self.current = old.saturating_add(gain).saturating_sub(loss);
        self.outstanding = self.outstanding.saturating_add(gain);
        self.high = self.high.max(self.current);
        ScoreDelta {
            old,
            new: self.current,
        }
    }

    /// Folds the current score into the high score and resets it to zero.
    pub fn forfeit(&mut self) -> ScoreDelta {
        let old = self.current;
        self.high = self.high.max(old);
        self.current = 0;
        ScoreDelta { old, new: 0 }
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn outstanding(&self) -> u32 {
        self.outstanding
    }

    pub fn high(&self) -> u32 {
        self.high
    }
}

/// Win bonus for the game time left on the clock
pub fn time_bonus(game_limit_secs: f64, elapsed_secs: f64) -> u32 {
    let bonus = ((game_limit_secs - elapsed_secs) * TIME_BONUS_RATE).floor();
    if bonus > 0.0 {
        bonus as u32
    } else {
        0
    }
}
