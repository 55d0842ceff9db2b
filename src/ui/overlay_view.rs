use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Sparkline},
    Frame,
};

use super::overlay_state::OverlayState;

const PANEL_WIDTH: u16 = 44;
const PANEL_HEIGHT: u16 = 10;

/// Render the status panel in the top-right corner.
pub fn render(frame: &mut Frame, state: &OverlayState) {
    let area = panel_area(frame.area());

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(3)])
        .split(area);

    render_text(frame, state, rows[0]);
    render_rewards(frame, state, rows[1]);
}

fn panel_area(full: Rect) -> Rect {
    let width = PANEL_WIDTH.min(full.width);
    let height = PANEL_HEIGHT.min(full.height);
    Rect {
        x: full.x + full.width - width,
        y: full.y,
        width,
        height,
    }
}

fn render_text(frame: &mut Frame, state: &OverlayState, area: Rect) {
    let lines: Vec<Line> = state
        .lines()
        .into_iter()
        .map(|l| {
            Line::from(Span::styled(
                l,
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            ))
        })
        .collect();

    let text = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Minesweeper  [q] hide "),
        );

    frame.render_widget(text, area);
}

fn render_rewards(frame: &mut Frame, state: &OverlayState, area: Rect) {
    let data = state.sparkline_data();
    let sparkline = Sparkline::default()
        .block(Block::default().borders(Borders::ALL).title("Reward"))
        .data(&data)
        .style(Style::default().fg(Color::Green));

    frame.render_widget(sparkline, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::status_feed::StatusUpdate;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    #[test]
    fn test_render_shows_status_text() {
        let mut state = OverlayState::new();
        state.apply(StatusUpdate {
            wins: 4,
            losses: 9,
            last_reward: 30.0,
            max_reward: 1050.0,
        });

        let mut terminal = Terminal::new(TestBackend::new(80, 12)).unwrap();
        terminal.draw(|f| render(f, &state)).unwrap();

        let buffer = terminal.backend().buffer().clone();
        let text: String = buffer.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("Wins: 4 | Loses: 9"));
        assert!(text.contains("Max reward: 1050"));
    }

    #[test]
    fn test_panel_fits_small_terminal() {
        let area = panel_area(Rect::new(0, 0, 20, 4));
        assert_eq!(area, Rect::new(0, 0, 20, 4));
    }
}
