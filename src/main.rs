mod ui;

use std::{
    collections::VecDeque,
    error::Error,
    fs::File,
    io::{self, stdin, Write},
    mem,
    path::PathBuf,
    time::Duration,
};

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use hangtime::{
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore, HintBackend},
    error::GameError,
    hint::{FlavorKind, GenerativeHints, HintKind, HintProvider, OfflineHints},
    ledger::PhraseMatch,
    profile::{Difficulty, ProfileTable},
    runtime::{CrosstermEventSource, FixedTicker, GameEvent, GameEventSource, Runner, Ticker},
    session::{ActionReport, Session, SessionSummary, Status, TurnOutcome},
    stats::{GameRecord, PlayerStats, StatsDb},
    words::{validate_secret, WordSource},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;

const TICK_RATE_MS: u64 = 100;
const MESSAGE_LOG_LEN: usize = 6;
const RECENT_GAMES: usize = 5;
const LEADERBOARD_SIZE: usize = 20;

/// terminal hangman with turn timers, hints and a leaderboard
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Guess the hidden word or phrase one letter (or one phrase) at a time before the turn clock, the game clock or your attempts run out. Scores are kept per player in a local leaderboard."
)]
pub struct Cli {
    /// player name recorded on the leaderboard
    #[clap(short = 'n', long)]
    name: Option<String>,

    /// difficulty tier to play
    #[clap(short = 'd', long, value_enum)]
    difficulty: Option<Difficulty>,

    /// never call the hint service, even if a key is configured
    #[clap(long)]
    offline: bool,

    /// seconds to wait for the hint service before falling back
    #[clap(long, value_name = "SECS")]
    hint_timeout: Option<u64>,

    /// dictionary file with words and phrases per tier
    #[clap(long, value_name = "PATH")]
    words: Option<PathBuf>,

    /// stats database to use instead of the default location
    #[clap(long, value_name = "PATH")]
    db: Option<PathBuf>,

    /// config file to use instead of the default location
    #[clap(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// print the leaderboard and exit
    #[clap(long)]
    leaderboard: bool,

    /// write the leaderboard as CSV and exit
    #[clap(long, value_name = "PATH")]
    export_leaderboard: Option<PathBuf>,

    /// attempts allowed in creator mode
    #[clap(long, value_name = "N")]
    creator_attempts: Option<u32>,

    /// game time limit in creator mode
    #[clap(long, value_name = "SECS")]
    creator_game_secs: Option<u64>,

    /// turn time limit in creator mode
    #[clap(long, value_name = "SECS")]
    creator_turn_secs: Option<u64>,

    /// add a word or phrase to the creator list and exit
    #[clap(long, value_name = "WORD")]
    add_word: Option<String>,

    /// delete every stored score and game, then exit
    #[clap(long)]
    clear_stats: bool,

    /// save the effective settings as the new defaults
    #[clap(long)]
    save_config: bool,
}

impl Cli {
    /// Flags override the stored config for this run.
    fn apply(&self, mut cfg: Config) -> Config {
        if let Some(name) = &self.name {
            cfg.player_name = name.clone();
        }
        if let Some(difficulty) = self.difficulty {
            cfg.difficulty = difficulty;
        }
        if self.offline {
            cfg.hint_backend = HintBackend::Offline;
        }
        if let Some(secs) = self.hint_timeout {
            cfg.hint_timeout_secs = secs;
        }
        if let Some(path) = &self.words {
            cfg.dictionary = Some(path.clone());
        }
        let creator = &mut cfg.creator.overrides;
        if let Some(attempts) = self.creator_attempts {
            creator.attempts = attempts;
        }
        if let Some(secs) = self.creator_game_secs {
            creator.game_time_limit_secs = secs;
        }
        if let Some(secs) = self.creator_turn_secs {
            creator.turn_time_limit_secs = secs;
        }
        cfg
    }

    fn db_path(&self) -> PathBuf {
        self.db
            .clone()
            .or_else(AppDirs::db_path)
            .unwrap_or_else(|| PathBuf::from("hangtime_stats.db"))
    }

    fn config_store(&self) -> FileConfigStore {
        match &self.config {
            Some(path) => FileConfigStore::with_path(path),
            None => FileConfigStore::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Playing,
    Finished,
    Leaderboard,
    Rules,
}

/// What the keyboard is currently feeding while a game is on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    Command,
    Letter(String),
    Phrase(String),
    HintMenu,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Action {
    None,
    Letter(String),
    Phrase(String),
    Hint(HintKind),
    Resign,
    Rules,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Applies one key press to the input line and reports what it asks for.
fn read_input(input: &mut InputMode, key: KeyEvent) -> Action {
    let letter_mode = matches!(input, InputMode::Letter(_));
    match input {
        InputMode::Command => {
            match key.code {
                KeyCode::Char('l') => *input = InputMode::Letter(String::new()),
                KeyCode::Char('w') => *input = InputMode::Phrase(String::new()),
                KeyCode::Char('h') => *input = InputMode::HintMenu,
                KeyCode::Char('r') => return Action::Resign,
                KeyCode::Char('?') => return Action::Rules,
                KeyCode::Esc => return Action::Quit,
                _ => {}
            }
            Action::None
        }
        InputMode::Letter(buf) | InputMode::Phrase(buf) => match key.code {
            KeyCode::Esc => {
                *input = InputMode::Command;
                Action::None
            }
            KeyCode::Backspace => {
                buf.pop();
                Action::None
            }
            KeyCode::Enter => {
                let text = mem::take(buf);
                *input = InputMode::Command;
                if letter_mode {
                    Action::Letter(text)
                } else {
                    Action::Phrase(text)
                }
            }
            KeyCode::Char(c) => {
                if letter_mode {
                    buf.clear();
                }
                buf.push(c);
                Action::None
            }
            _ => Action::None,
        },
        InputMode::HintMenu => match key.code {
            KeyCode::Char(c) => match HintKind::from_key(c) {
                Some(kind) => {
                    *input = InputMode::Command;
                    Action::Hint(kind)
                }
                None => Action::None,
            },
            KeyCode::Esc => {
                *input = InputMode::Command;
                Action::None
            }
            _ => Action::None,
        },
    }
}

pub struct App {
    pub config: Config,
    pub profiles: ProfileTable,
    pub words: WordSource,
    pub hints: Box<dyn HintProvider>,
    pub stats: Option<StatsDb>,
    pub session: Session,
    pub state: AppState,
    pub return_to: AppState,
    pub input: InputMode,
    pub messages: VecDeque<String>,
    pub last_summary: Option<SessionSummary>,
    /// the player's latest games, newest first, refreshed when a game ends
    pub recent: Vec<GameRecord>,
    pub leaderboard: Vec<PlayerStats>,
    pub leaderboard_scroll: usize,
    timeout_noticed: bool,
}

impl App {
    pub fn new(
        config: Config,
        profiles: ProfileTable,
        words: WordSource,
        hints: Box<dyn HintProvider>,
        stats: Option<StatsDb>,
    ) -> Result<Self, Box<dyn Error>> {
        let difficulty = playable_difficulty(config.difficulty, &words);
        let (session, opening) = start_session(
            &config,
            &profiles,
            &words,
            hints.as_ref(),
            stats.as_ref(),
            difficulty,
        )?;

        let mut app = Self {
            config,
            profiles,
            words,
            hints,
            stats,
            session,
            state: AppState::Playing,
            return_to: AppState::Playing,
            input: InputMode::Command,
            messages: VecDeque::new(),
            last_summary: None,
            recent: Vec::new(),
            leaderboard: Vec::new(),
            leaderboard_scroll: 0,
            timeout_noticed: false,
        };
        if difficulty != app.config.difficulty {
            app.push_message(format!(
                "No creator words saved yet, playing {difficulty} instead."
            ));
        }
        app.push_message(opening);
        Ok(app)
    }

    pub fn new_game(&mut self) -> Result<(), Box<dyn Error>> {
        let difficulty = playable_difficulty(self.config.difficulty, &self.words);
        let (session, opening) = start_session(
            &self.config,
            &self.profiles,
            &self.words,
            self.hints.as_ref(),
            self.stats.as_ref(),
            difficulty,
        )?;
        self.session = session;
        self.state = AppState::Playing;
        self.input = InputMode::Command;
        self.messages.clear();
        self.last_summary = None;
        self.recent.clear();
        self.timeout_noticed = false;
        self.push_message(opening);
        Ok(())
    }

    pub fn push_message<S: Into<String>>(&mut self, message: S) {
        if self.messages.len() == MESSAGE_LOG_LEN {
            self.messages.pop_front();
        }
        self.messages.push_back(message.into());
    }

    fn on_tick(&mut self) {
        if self.state == AppState::Playing
            && !self.timeout_noticed
            && self.session.is_turn_timed_out()
        {
            self.timeout_noticed = true;
            self.push_message("Turn time is up! Your next move only pays the penalty.");
        }
    }

    fn on_key(&mut self, key: KeyEvent) -> Flow {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.abandon();
            return Flow::Quit;
        }

        match self.state {
            AppState::Playing => self.on_playing_key(key),
            AppState::Finished => match key.code {
                KeyCode::Char('n') => {
                    if let Err(e) = self.new_game() {
                        warn!(error = %e, "unable to start a new game");
                        self.push_message(format!("Unable to start a new game: {e}"));
                    }
                    Flow::Continue
                }
                KeyCode::Char('b') => {
                    self.show(AppState::Leaderboard);
                    Flow::Continue
                }
                KeyCode::Char('?') => {
                    self.show(AppState::Rules);
                    Flow::Continue
                }
                KeyCode::Esc | KeyCode::Char('q') => Flow::Quit,
                _ => Flow::Continue,
            },
            AppState::Leaderboard | AppState::Rules => {
                match key.code {
                    KeyCode::Esc | KeyCode::Char('b') | KeyCode::Backspace => {
                        self.state = self.return_to;
                    }
                    KeyCode::Up => {
                        self.leaderboard_scroll = self.leaderboard_scroll.saturating_sub(1);
                    }
                    KeyCode::Down => {
                        if self.leaderboard_scroll + 1 < self.leaderboard.len() {
                            self.leaderboard_scroll += 1;
                        }
                    }
                    _ => {}
                }
                Flow::Continue
            }
        }
    }

    fn on_playing_key(&mut self, key: KeyEvent) -> Flow {
        let result = match read_input(&mut self.input, key) {
            Action::None => return Flow::Continue,
            Action::Rules => {
                self.show(AppState::Rules);
                return Flow::Continue;
            }
            Action::Quit => {
                self.abandon();
                return Flow::Quit;
            }
            Action::Letter(text) => self.session.submit_letter(&text),
            Action::Phrase(text) => self.session.submit_phrase(&text),
            Action::Hint(kind) => self.session.request_hint(kind, self.hints.as_ref()),
            Action::Resign => self.session.resign(),
        };
        self.handle(result);
        Flow::Continue
    }

    fn show(&mut self, state: AppState) {
        self.return_to = self.state;
        if state == AppState::Leaderboard {
            self.refresh_leaderboard();
        }
        self.state = state;
    }

    fn handle(&mut self, result: Result<ActionReport, GameError>) {
        let report = match result {
            Ok(report) => report,
            Err(e) => {
                self.push_message(e.to_string());
                return;
            }
        };

        self.timeout_noticed = false;
        self.push_message(describe(&report.outcome));
        if let Some(bonus) = report.time_bonus {
            self.push_message(format!(
                "Time bonus: +{} for the clock you had left.",
                bonus.change()
            ));
        }
        if report.status.is_terminal() {
            self.finish();
        }
    }

    fn finish(&mut self) {
        let summary = self.session.summary();
        if summary.status == Status::Resigned {
            let flavor = self.hints.get_flavor(
                &summary.secret,
                FlavorKind::Resignation,
                summary.difficulty,
            );
            self.push_message(flavor);
        }

        let mut save_failed = false;
        if let Some(db) = self.stats.as_mut() {
            if let Err(e) = db.record_game(&self.config.player_name, &summary) {
                warn!(error = %e, "unable to record game");
                save_failed = true;
            }
            match db.recent_games(&self.config.player_name, RECENT_GAMES) {
                Ok(games) => self.recent = games,
                Err(e) => warn!(error = %e, "unable to load recent games"),
            }
        }
        if save_failed {
            self.push_message("Could not save this game to the leaderboard.");
        }

        self.last_summary = Some(summary);
        self.input = InputMode::Command;
        self.state = AppState::Finished;
    }

    /// Resigns a game that is still running, e.g. when the player quits.
    fn abandon(&mut self) {
        while self.session.has_begun() && !self.session.status().is_terminal() {
            let result = self.session.resign();
            let failed = result.is_err();
            self.handle(result);
            if failed {
                break;
            }
        }
    }

    fn refresh_leaderboard(&mut self) {
        self.leaderboard_scroll = 0;
        self.leaderboard = match self.stats.as_ref().map(|db| db.leaderboard(LEADERBOARD_SIZE)) {
            Some(Ok(players)) => players,
            Some(Err(e)) => {
                warn!(error = %e, "unable to read leaderboard");
                Vec::new()
            }
            None => Vec::new(),
        };
    }
}

/// Creator mode needs at least one custom word; otherwise fall back to easy.
fn playable_difficulty(wanted: Difficulty, words: &WordSource) -> Difficulty {
    if wanted == Difficulty::Creator && !words.has_creator_words() {
        Difficulty::Easy
    } else {
        wanted
    }
}

fn start_session(
    config: &Config,
    profiles: &ProfileTable,
    words: &WordSource,
    hints: &dyn HintProvider,
    stats: Option<&StatsDb>,
    difficulty: Difficulty,
) -> Result<(Session, String), Box<dyn Error>> {
    let secret = words.pick(difficulty, &mut rand::thread_rng())?;
    let high_score = match stats.map(|db| db.high_score(&config.player_name)) {
        Some(Ok(score)) => score,
        Some(Err(e)) => {
            warn!(error = %e, "unable to read high score");
            0
        }
        None => 0,
    };

    let mut session = Session::new(&secret, profiles.get(difficulty).clone(), high_score)?;
    let opening = hints.get_flavor(&secret, FlavorKind::Opening, difficulty);
    session.begin()?;
    Ok((session, opening))
}

fn describe(outcome: &TurnOutcome) -> String {
    match outcome {
        TurnOutcome::TimedOut { penalty } => format!(
            "Too slow! That turn cost an attempt. Score {} -> {}.",
            penalty.old, penalty.new
        ),
        TurnOutcome::Letter {
            letter,
            occurrences: 0,
            delta,
        } => format!("No '{letter}' in it. Score {} -> {}.", delta.old, delta.new),
        TurnOutcome::Letter {
            letter,
            occurrences,
            delta,
        } => format!(
            "'{letter}' appears {occurrences} time(s). Score {} -> {}.",
            delta.old, delta.new
        ),
        TurnOutcome::Phrase {
            phrase,
            verdict,
            delta,
        } => {
            let verdict = match verdict {
                PhraseMatch::Exact { .. } => "is the answer",
                PhraseMatch::Partial => "is part of the answer",
                PhraseMatch::Miss => "is not in the answer",
            };
            format!(
                "'{phrase}' {verdict}. Score {} -> {}.",
                delta.old, delta.new
            )
        }
        TurnOutcome::Hint { kind, text, delta } => {
            format!("Hint ({kind}, score {} -> {}): {text}", delta.old, delta.new)
        }
        TurnOutcome::Resigned {
            secret, elapsed, ..
        } => format!(
            "You resigned after {}. The answer was '{secret}'.",
            ui::format_clock(*elapsed)
        ),
    }
}

fn build_hint_provider(config: &Config) -> Box<dyn HintProvider> {
    if config.hint_backend == HintBackend::Offline {
        return Box::new(OfflineHints);
    }

    let Ok(api_key) = std::env::var("GEMINI_API_KEY") else {
        warn!("GEMINI_API_KEY is not set, using offline hints");
        return Box::new(OfflineHints);
    };
    match GenerativeHints::new(
        api_key,
        config.hint_model.clone(),
        Duration::from_secs(config.hint_timeout_secs),
    ) {
        Ok(hints) => Box::new(hints),
        Err(e) => {
            warn!(error = %e, "unable to build hint client, using offline hints");
            Box::new(OfflineHints)
        }
    }
}

fn build_word_source(config: &Config) -> Result<WordSource, Box<dyn Error>> {
    let source = match &config.dictionary {
        Some(path) => WordSource::with_dictionary(path)?,
        None => WordSource::embedded()?,
    };
    Ok(source.with_custom_words(&config.creator.words))
}

fn print_leaderboard<W: Write>(players: &[PlayerStats], out: &mut W) -> io::Result<()> {
    if players.is_empty() {
        return writeln!(out, "No games recorded yet.");
    }

    writeln!(
        out,
        "{:<5}{:<20}{:>8}{:>13}{:>7}  last played",
        "rank", "name", "high", "outstanding", "games"
    )?;
    for (rank, p) in players.iter().enumerate() {
        writeln!(
            out,
            "{:<5}{:<20}{:>8}{:>13}{:>7}  {}",
            rank + 1,
            p.name,
            p.high_score,
            p.outstanding_score,
            p.games_played,
            p.last_played.format("%Y-%m-%d %H:%M")
        )?;
    }
    Ok(())
}

/// Logs go to a file so they never draw over the terminal UI.
fn setup_logging() -> Option<WorkerGuard> {
    use tracing_subscriber::EnvFilter;

    let log_dir = AppDirs::log_dir()?;
    std::fs::create_dir_all(&log_dir).ok()?;

    let file_appender = tracing_appender::rolling::never(&log_dir, "hangtime.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .ok()?;
    Some(guard)
}

fn main() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let _log_guard = setup_logging();

    let store = cli.config_store();
    let mut config = cli.apply(store.load());
    let profiles = ProfileTable::with_creator(config.creator.overrides)?;

    if let Some(word) = &cli.add_word {
        let word = validate_secret(word)?;
        if !config.creator.words.contains(&word) {
            config.creator.words.push(word.clone());
        }
        store.save(&config)?;
        info!(%word, "added creator word");
        println!(
            "Added '{word}' to the creator list ({} word(s)).",
            config.creator.words.len()
        );
        return Ok(());
    }

    if cli.save_config {
        store.save(&config)?;
        println!("Saved settings to {}", store.path().display());
    }

    let db_path = cli.db_path();
    if cli.clear_stats {
        StatsDb::open(&db_path)?.clear_all_stats()?;
        println!("Cleared all stats in {}", db_path.display());
        return Ok(());
    }
    if cli.leaderboard {
        let db = StatsDb::open(&db_path)?;
        print_leaderboard(&db.leaderboard(LEADERBOARD_SIZE)?, &mut io::stdout())?;
        return Ok(());
    }
    if let Some(path) = &cli.export_leaderboard {
        let db = StatsDb::open(&db_path)?;
        let written = db.export_leaderboard_csv(File::create(path)?)?;
        println!("Exported {written} player(s) to {}", path.display());
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let words = build_word_source(&config)?;
    let hints = build_hint_provider(&config);
    let stats = match StatsDb::open(&db_path) {
        Ok(db) => Some(db),
        Err(e) => {
            warn!(error = %e, "playing without a stats database");
            None
        }
    };
    let mut app = App::new(config, profiles, words, hints, stats)?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );
    let result = start_tui(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend, E: GameEventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E, T>,
) -> Result<(), Box<dyn Error>> {
    terminal.draw(|f| render(app, f))?;

    loop {
        match runner.step() {
            GameEvent::Tick => app.on_tick(),
            GameEvent::Resize => {}
            GameEvent::Key(key) => {
                if app.on_key(key) == Flow::Quit {
                    break;
                }
            }
        }
        terminal.draw(|f| render(app, f))?;
    }

    Ok(())
}

fn render(app: &App, f: &mut Frame) {
    ui::screen::current_screen(&app.state).render(app, f);
}

#[cfg(test)]
pub(crate) fn test_app(secret: &str) -> App {
    let config = Config {
        player_name: "tester".into(),
        difficulty: Difficulty::Creator,
        ..Config::default()
    };
    let words = WordSource::embedded().unwrap().with_custom_words([secret]);
    let stats = StatsDb::open_in_memory().unwrap();
    App::new(
        config,
        ProfileTable::standard(),
        words,
        Box::new(OfflineHints),
        Some(stats),
    )
    .unwrap()
}
