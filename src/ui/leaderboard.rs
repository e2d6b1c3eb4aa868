use hangtime::stats::PlayerStats;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::App;

/// Pure presenter for one leaderboard row
pub fn present_row(rank: usize, player: &PlayerStats, current_player: &str) -> Row<'static> {
    let medal = match rank {
        1 => Color::Yellow,
        2 => Color::White,
        3 => Color::LightRed,
        _ => Color::Reset,
    };

    let name_style = if player.name == current_player {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };

    Row::new(vec![
        Cell::from(format!("{rank}.")).style(Style::default().fg(medal)),
        Cell::from(player.name.clone()).style(name_style),
        Cell::from(player.high_score.to_string()).style(Style::default().add_modifier(Modifier::BOLD)),
        Cell::from(player.outstanding_score.to_string()),
        Cell::from(player.games_played.to_string()),
        Cell::from(player.last_played.format("%Y-%m-%d %H:%M").to_string()),
    ])
}

/// Render the leaderboard screen
pub fn render_leaderboard(app: &App, f: &mut Frame) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(0),    // Table
            Constraint::Length(2), // Instructions
        ])
        .split(f.area());

    let title = Paragraph::new("Leaderboard")
        .block(Block::default().borders(Borders::ALL))
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    if app.leaderboard.is_empty() {
        let no_data = Paragraph::new("No games recorded yet. Finish a game to get on the board.")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Gray));
        f.render_widget(no_data, chunks[1]);
    } else {
        let table_height = chunks[1].height.saturating_sub(3) as usize; // borders + header
        let max_scroll = app.leaderboard.len().saturating_sub(table_height);
        let scroll = app.leaderboard_scroll.min(max_scroll);

        let header = Row::new(vec![
            Cell::from("#"),
            Cell::from("Player"),
            Cell::from("High"),
            Cell::from("Outstanding"),
            Cell::from("Games"),
            Cell::from("Last Played"),
        ])
        .style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

        let rows: Vec<Row> = app
            .leaderboard
            .iter()
            .enumerate()
            .skip(scroll)
            .take(table_height)
            .map(|(i, player)| present_row(i + 1, player, &app.config.player_name))
            .collect();

        let widths = [
            Constraint::Length(4),
            Constraint::Min(12),
            Constraint::Length(6),
            Constraint::Length(12),
            Constraint::Length(6),
            Constraint::Length(17),
        ];

        let table = Table::new(rows, widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL).title("Top players"))
            .column_spacing(2);
        f.render_widget(table, chunks[1]);
    }

    let instructions = Paragraph::new("(↑/↓) scroll  (b/esc) back")
        .alignment(Alignment::Center)
        .wrap(ratatui::widgets::Wrap { trim: true });
    f.render_widget(instructions, chunks[2]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;
    use ratatui::{backend::TestBackend, Terminal};

    use crate::test_app;

    fn player(name: &str, high: u32) -> PlayerStats {
        PlayerStats {
            name: name.to_string(),
            high_score: high,
            outstanding_score: high * 2,
            games_played: 3,
            last_played: Local::now(),
        }
    }

    fn draw(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(90, 20)).unwrap();
        terminal.draw(|f| render_leaderboard(app, f)).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn empty_board_shows_placeholder() {
        let app = test_app("ox");
        assert!(draw(&app).contains("No games recorded yet"));
    }

    #[test]
    fn players_are_listed_in_rank_order() {
        let mut app = test_app("ox");
        app.leaderboard = vec![player("ada", 120), player("bob", 80)];
        let text = draw(&app);
        let ada = text.find("ada").unwrap();
        let bob = text.find("bob").unwrap();
        assert!(ada < bob);
        assert!(text.contains("120"));
    }

    #[test]
    fn scroll_past_the_end_is_clamped() {
        let mut app = test_app("ox");
        app.leaderboard = (0..40).map(|i| player(&format!("p{i:02}"), 100 - i)).collect();
        app.leaderboard_scroll = 1_000;
        let text = draw(&app);
        assert!(text.contains("p39"));
        assert!(!text.contains("p00"));
    }
}
