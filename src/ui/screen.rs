use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::{ui::leaderboard::render_leaderboard, App, AppState};

const RULES: &[&str] = &[
    "Guess the hidden word or phrase before you run out of attempts or time.",
    "",
    "(l) guess a letter. Every hidden copy is revealed and scores points;",
    "    a wrong letter costs one attempt and the letter score.",
    "(w) guess the whole word or phrase for a big payout, or a piece of it",
    "    for half the word score per character. A miss costs an attempt.",
    "(h) ask for a hint for the price of one letter.",
    "    The hardest tiers only unlock hints when attempts run low.",
    "(r) resign. The answer is revealed, your score counts toward your",
    "    best and then drops to 0.",
    "",
    "Each turn has its own clock. Let it run out and the turn is spent",
    "with a penalty of 5 points and one attempt.",
    "Finish early to earn a bonus for the game time left.",
];

/// A UI screen boundary
pub trait Screen {
    fn render(&self, app: &App, f: &mut Frame);
}

/// Game board, rendered by the App widget
pub struct PlayingScreen;

impl Screen for PlayingScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        f.render_widget(app, f.area());
    }
}

/// Round results, rendered by the App widget
pub struct FinishedScreen;

impl Screen for FinishedScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        f.render_widget(app, f.area());
    }
}

pub struct LeaderboardScreen;

impl Screen for LeaderboardScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        render_leaderboard(app, f);
    }
}

pub struct RulesScreen;

impl Screen for RulesScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(2)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(f.area());

        let profile = app.session.profile();
        let mut lines: Vec<Line> = RULES.iter().map(|l| Line::raw(*l)).collect();
        lines.push(Line::raw(""));
        lines.push(Line::styled(
            format!(
                "This round ({}): {} attempts, {}s per turn, {} letter / {} word points.",
                profile.name(),
                profile.max_attempts(),
                profile.turn_time_limit().as_secs(),
                profile.letter_score(),
                profile.word_score(),
            ),
            Style::default().fg(Color::Cyan),
        ));

        let rules = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Rules"))
            .wrap(Wrap { trim: false });
        f.render_widget(rules, chunks[0]);

        let back = Paragraph::new("(b/esc) back")
            .style(Style::default().add_modifier(Modifier::ITALIC))
            .alignment(Alignment::Center);
        f.render_widget(back, chunks[1]);
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(state: &AppState) -> Box<dyn Screen> {
    match state {
        AppState::Playing => Box::new(PlayingScreen),
        AppState::Finished => Box::new(FinishedScreen),
        AppState::Leaderboard => Box::new(LeaderboardScreen),
        AppState::Rules => Box::new(RulesScreen),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_app;
    use ratatui::{backend::TestBackend, Terminal};

    fn draw(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal
            .draw(|f| current_screen(&app.state).render(app, f))
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn each_state_has_a_screen() {
        let mut app = test_app("ox");
        for state in [
            AppState::Playing,
            AppState::Leaderboard,
            AppState::Rules,
            AppState::Finished,
        ] {
            app.state = state;
            draw(&app);
        }
    }

    #[test]
    fn rules_mention_current_tier() {
        let mut app = test_app("ox");
        app.state = AppState::Rules;
        let text = draw(&app);
        assert!(text.contains("This round (creator): 10 attempts"));
        assert!(text.contains("(b/esc) back"));
    }

    #[test]
    fn rules_say_resigning_clears_the_score() {
        let mut app = test_app("ox");
        app.state = AppState::Rules;
        let text = draw(&app);
        assert!(text.contains("best and then drops to 0."));
        assert!(!text.contains("banked"));
    }
}
