use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::{GameError, Result};
use crate::profile::DifficultyProfile;

/// How often an armed countdown re-checks the clock
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Source of monotonic instants for the clock and its countdown thread
pub trait TimeSource: Send + Sync + 'static {
    fn now(&self) -> Instant;
}

/// Production time source
#[derive(Clone, Copy, Debug, Default)]
pub struct MonotonicTime;

impl TimeSource for MonotonicTime {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Time source that only moves when told to
#[derive(Clone, Debug)]
pub struct ManualTime {
    now: Arc<Mutex<Instant>>,
}

impl ManualTime {
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Default for ManualTime {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for ManualTime {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Handle to the armed countdown thread
#[derive(Debug)]
struct Countdown {
    cancel: Sender<()>,
    handle: JoinHandle<()>,
}

impl Countdown {
    fn arm<T: TimeSource>(
        time: Arc<T>,
        flag: Arc<AtomicBool>,
        started: Instant,
        limit: Duration,
        poll: Duration,
    ) -> Self {
        let (cancel, cancelled) = mpsc::channel::<()>();

        let handle = thread::spawn(move || loop {
            let elapsed = time.now().saturating_duration_since(started);
            if elapsed >= limit {
                flag.store(true, Ordering::Release);
                debug!(?limit, "turn countdown expired");
                break;
            }

            match cancelled.recv_timeout((limit - elapsed).min(poll)) {
                Err(RecvTimeoutError::Timeout) => continue,
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        });

        Self { cancel, handle }
    }

    fn disarm(self) {
        let _ = self.cancel.send(());
        let _ = self.handle.join();
    }
}

/// Whole-game stopwatch plus a per-turn countdown running on its own thread.
///
/// The countdown thread only ever writes the timed-out flag; everything else is
/// read and mutated by the owner.
#[derive(Debug)]
pub struct TurnClock<T: TimeSource = MonotonicTime> {
    time: Arc<T>,
    game_limit: Duration,
    turn_limit: Duration,
    poll_interval: Duration,
    game_started_at: Option<Instant>,
    turn_started_at: Option<Instant>,
    timed_out: Arc<AtomicBool>,
    countdown: Option<Countdown>,
}

impl TurnClock<MonotonicTime> {
    pub fn new(profile: &DifficultyProfile) -> Self {
        Self::with_time_source(profile, MonotonicTime)
    }
}

impl<T: TimeSource> TurnClock<T> {
    pub fn with_time_source(profile: &DifficultyProfile, time: T) -> Self {
        Self {
            time: Arc::new(time),
            game_limit: profile.game_time_limit(),
            turn_limit: profile.turn_time_limit(),
            poll_interval: POLL_INTERVAL,
            game_started_at: None,
            turn_started_at: None,
            timed_out: Arc::new(AtomicBool::new(false)),
            countdown: None,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn start_game(&mut self) -> Result<()> {
        if self.game_started_at.is_some() {
            return Err(GameError::InvalidState("game clock already started"));
        }
        self.game_started_at = Some(self.time.now());
        Ok(())
    }

    pub fn has_started(&self) -> bool {
        self.game_started_at.is_some()
    }

    pub fn elapsed_game_time(&self) -> Duration {
        match self.game_started_at {
            Some(start) => self.time.now().saturating_duration_since(start),
            None => Duration::ZERO,
        }
    }

    pub fn remaining_game_time(&self) -> Duration {
        self.game_limit.saturating_sub(self.elapsed_game_time())
    }

    pub fn game_limit(&self) -> Duration {
        self.game_limit
    }

    pub fn turn_limit(&self) -> Duration {
        self.turn_limit
    }

    /// Arms a fresh countdown, cancelling the previous one first.
    pub fn start_turn(&mut self) {
        self.stop();
        self.timed_out.store(false, Ordering::Release);

        let started = self.time.now();
        self.turn_started_at = Some(started);
        self.countdown = Some(Countdown::arm(
            Arc::clone(&self.time),
            Arc::clone(&self.timed_out),
            started,
            self.turn_limit,
            self.poll_interval,
        ));
    }

    /// Disarms the countdown and returns how long the turn lasted.
    pub fn end_turn(&mut self) -> Duration {
        self.stop();
        self.timed_out.store(false, Ordering::Release);
        match self.turn_started_at.take() {
            Some(start) => self.time.now().saturating_duration_since(start),
            None => Duration::ZERO,
        }
    }

    pub fn is_turn_timed_out(&self) -> bool {
        self.timed_out.load(Ordering::Acquire)
    }

    /// Time left in the current turn, if one is running
    pub fn turn_remaining(&self) -> Option<Duration> {
        self.turn_started_at.map(|start| {
            self.turn_limit
                .saturating_sub(self.time.now().saturating_duration_since(start))
        })
    }

    pub fn is_countdown_armed(&self) -> bool {
        self.countdown.is_some()
    }

    /// Cancels and joins the countdown thread, if any.
    pub fn stop(&mut self) {
        if let Some(countdown) = self.countdown.take() {
            countdown.disarm();
        }
    }
}

impl<T: TimeSource> Drop for TurnClock<T> {
    fn drop(&mut self) {
        self.stop();
    }
}
