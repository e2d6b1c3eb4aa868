pub mod gallows;
pub mod leaderboard;
pub mod screen;

use std::time::Duration;

use hangtime::session::Status;
use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::{App, AppState, InputMode, MESSAGE_LOG_LEN, RECENT_GAMES};

const HORIZONTAL_MARGIN: u16 = 2;
const VERTICAL_MARGIN: u16 = 1;
const GALLOWS_WIDTH: u16 = 14;
/// Turn time below which the turn clock turns red
const TURN_WARNING: Duration = Duration::from_secs(5);

/// `mm:ss`
pub(crate) fn format_clock(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.state {
            AppState::Finished => render_finished(self, area, buf),
            _ => render_playing(self, area, buf),
        }
    }
}

fn render_playing(app: &App, area: Rect, buf: &mut Buffer) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let dim = Style::default().add_modifier(Modifier::DIM);
    let session = &app.session;
    let profile = session.profile();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1),                            // title
            Constraint::Min(8),                               // gallows + board
            Constraint::Length(MESSAGE_LOG_LEN as u16 + 2),   // messages
            Constraint::Length(1),                            // input line
            Constraint::Length(1),                            // legend
        ])
        .split(area);

    Paragraph::new(Line::from(vec![
        Span::styled("hangtime", bold.fg(Color::Magenta)),
        Span::raw(format!("  {}  ", app.config.player_name)),
        Span::styled(profile.name(), bold),
    ]))
    .render(chunks[0], buf);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(GALLOWS_WIDTH), Constraint::Min(20)])
        .split(chunks[1]);

    let figure = gallows::figure(
        profile.difficulty(),
        profile.max_attempts(),
        session.remaining_attempts(),
    );
    Paragraph::new(figure.iter().map(|l| Line::raw(*l)).collect::<Vec<_>>())
        .render(body[0], buf);

    let ledger = session.ledger();
    let guessed: Vec<Span> = ledger
        .guessed_letters()
        .iter()
        .map(|c| {
            let color = if ledger.valid_letters().contains(c) {
                Color::Green
            } else {
                Color::Red
            };
            Span::styled(format!("{c} "), Style::default().fg(color))
        })
        .collect();

    let turn = match session.turn_remaining() {
        _ if session.is_turn_timed_out() => {
            Span::styled("TIME UP", bold.fg(Color::Red))
        }
        Some(left) => {
            let style = if left < TURN_WARNING {
                bold.fg(Color::Red)
            } else {
                bold
            };
            Span::styled(format!("{:.1}s", left.as_secs_f64()), style)
        }
        None => Span::styled("-", dim),
    };

    let mask = session.display_mask();
    let board = vec![
        Line::styled(mask, bold.fg(Color::Cyan)),
        Line::raw(""),
        Line::from(
            std::iter::once(Span::raw("Letters: "))
                .chain(guessed)
                .collect::<Vec<_>>(),
        ),
        Line::raw(format!(
            "Phrases: {}",
            ledger.guessed_phrases().iter().join(", ")
        )),
        Line::raw(format!(
            "Attempts: {}/{}   Hints left: {}",
            session.remaining_attempts(),
            profile.max_attempts(),
            session.hints_remaining()
        )),
        Line::raw(format!(
            "Score: {}   High: {}   Outstanding: {}",
            session.current_score(),
            session.high_score(),
            session.outstanding_score()
        )),
        Line::from(vec![
            Span::raw(format!(
                "Game: {}   Turn: ",
                format_clock(session.remaining_game_time())
            )),
            turn,
        ]),
    ];
    Paragraph::new(board)
        .wrap(Wrap { trim: false })
        .render(body[1], buf);

    render_messages(app, chunks[2], buf);

    let prompt = match &app.input {
        InputMode::Command => Line::styled("", dim),
        InputMode::Letter(text) => Line::from(vec![
            Span::styled("letter> ", bold),
            Span::raw(text.clone()),
        ]),
        InputMode::Phrase(text) => Line::from(vec![
            Span::styled("phrase> ", bold),
            Span::raw(text.clone()),
        ]),
        InputMode::HintMenu => Line::styled(
            "hint: (1) definition (2) letter (3) context (esc) cancel",
            bold.fg(Color::Yellow),
        ),
    };
    Paragraph::new(prompt).render(chunks[3], buf);

    let legend = match app.input {
        InputMode::Command => {
            "(l)etter (w)ord/phrase (h)int (r)esign (?) rules (esc) quit"
        }
        _ => "(enter) submit (esc) cancel",
    };
    Paragraph::new(Span::styled(legend, dim.add_modifier(Modifier::ITALIC)))
        .alignment(Alignment::Center)
        .render(chunks[4], buf);
}

fn render_messages(app: &App, area: Rect, buf: &mut Buffer) {
    let lines: Vec<Line> = app.messages.iter().map(|m| Line::raw(m.as_str())).collect();
    Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("log"))
        .wrap(Wrap { trim: true })
        .render(area, buf);
}

fn render_finished(app: &App, area: Rect, buf: &mut Buffer) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let italic = Style::default().add_modifier(Modifier::ITALIC);

    let Some(summary) = &app.last_summary else {
        return render_playing(app, area, buf);
    };

    let (headline, color) = match summary.status {
        Status::Won => ("You got it!", Color::Green),
        Status::LostAttempts => ("Out of attempts", Color::Red),
        Status::LostTime => ("Out of time", Color::Red),
        Status::Resigned => ("Resigned", Color::Yellow),
        Status::InProgress => ("", Color::Reset),
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(7),
            Constraint::Length(RECENT_GAMES as u16 + 2),
            Constraint::Length(MESSAGE_LOG_LEN as u16 + 2),
            Constraint::Length(1),
        ])
        .split(area);

    let secret = summary.secret.as_str();
    let lines = vec![
        Line::styled(headline, bold.fg(color)),
        Line::raw(""),
        Line::from(vec![
            Span::raw("The answer was "),
            Span::styled(secret, bold.fg(Color::Cyan)),
        ]),
        Line::raw(format!(
            "Score: {}   High: {}   Outstanding: {}",
            summary.final_score, summary.high_score, summary.outstanding_score
        )),
        Line::raw(format!(
            "Time: {}   Attempts left: {}   Hints used: {}",
            format_clock(summary.elapsed),
            summary.remaining_attempts,
            summary.hints_used
        )),
    ];

    // keep short answers centered, let long ones wrap from the left
    let alignment = if secret.width() + 16 <= chunks[0].width as usize {
        Alignment::Center
    } else {
        Alignment::Left
    };
    Paragraph::new(lines)
        .alignment(alignment)
        .wrap(Wrap { trim: true })
        .render(chunks[0], buf);

    render_recent(app, chunks[1], buf);
    render_messages(app, chunks[2], buf);

    Paragraph::new(Span::styled(
        "(n)ew game (b) leaderboard (?) rules (esc) quit",
        italic,
    ))
    .alignment(Alignment::Center)
    .render(chunks[3], buf);
}

fn render_recent(app: &App, area: Rect, buf: &mut Buffer) {
    let lines = app
        .recent
        .iter()
        .map(|game| {
            Line::raw(format!(
                "{:<10} {:<14} {:>5} pts  {}",
                game.difficulty,
                game.status,
                game.final_score,
                game.played_at.format("%Y-%m-%d %H:%M"),
            ))
        })
        .collect_vec();

    Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("recent games"))
        .render(area, buf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_app;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    fn rendered(app: &App, width: u16, height: u16) -> String {
        let area = Rect::new(0, 0, width, height);
        let mut buffer = Buffer::empty(area);
        app.render(area, &mut buffer);
        buffer.content.iter().map(|c| c.symbol()).collect()
    }

    fn press(app: &mut App, code: KeyCode) {
        app.on_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    #[test]
    fn format_clock_pads_minutes_and_seconds() {
        assert_eq!(format_clock(Duration::from_secs(0)), "00:00");
        assert_eq!(format_clock(Duration::from_secs(605)), "10:05");
    }

    #[test]
    fn playing_screen_shows_mask_and_status() {
        let app = test_app("ox");
        let text = rendered(&app, 100, 30);
        assert!(text.contains("_ _"));
        assert!(text.contains("Attempts: 10/10"));
        assert!(text.contains("creator"));
        assert!(text.contains("(l)etter"));
    }

    #[test]
    fn guessed_letter_is_revealed() {
        let mut app = test_app("ox");
        for code in [KeyCode::Char('l'), KeyCode::Char('o'), KeyCode::Enter] {
            press(&mut app, code);
        }
        let text = rendered(&app, 100, 30);
        assert!(text.contains("o _"));
        assert!(text.contains("Letters: o"));
    }

    #[test]
    fn letter_prompt_is_shown_while_typing() {
        let mut app = test_app("ox");
        press(&mut app, KeyCode::Char('l'));
        press(&mut app, KeyCode::Char('q'));
        let text = rendered(&app, 100, 30);
        assert!(text.contains("letter> q"));
        assert!(text.contains("(enter) submit"));
    }

    #[test]
    fn finished_screen_reveals_answer() {
        let mut app = test_app("ox");
        press(&mut app, KeyCode::Char('r'));
        let text = rendered(&app, 100, 30);
        assert!(text.contains("Resigned"));
        assert!(text.contains("The answer was ox"));
        assert!(text.contains("(n)ew game"));
    }

    #[test]
    fn finished_screen_lists_recent_games() {
        let mut app = test_app("ox");
        press(&mut app, KeyCode::Char('r'));
        let text = rendered(&app, 100, 30);
        assert!(text.contains("recent games"));
        assert!(text.contains("creator    resigned"));
    }

    #[test]
    fn tiny_area_does_not_panic() {
        let app = test_app("ox");
        rendered(&app, 10, 5);
        rendered(&app, 1, 1);
    }
}
