use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
};

use crate::game::{CellState, CollisionType, GridSimulation, Position};
use crate::metrics::{GameMetrics, LeaderboardEntry};

pub struct Renderer;

impl Renderer {
    pub fn new() -> Self {
        Self
    }

    /// Draw one frame; `leaders` is listed on the game-over panel
    pub fn render(
        &self,
        frame: &mut Frame,
        sim: &GridSimulation,
        metrics: &GameMetrics,
        leaders: &[LeaderboardEntry],
    ) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(0),    // Game area
                Constraint::Length(3), // Footer
            ])
            .split(frame.area());

        frame.render_widget(self.render_stats(sim, metrics), chunks[0]);

        let game_area = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(10),
                Constraint::Percentage(80),
                Constraint::Percentage(10),
            ])
            .split(chunks[1])[1];

        if sim.is_over() {
            frame.render_widget(self.render_game_over(sim, metrics, leaders), game_area);
        } else {
            frame.render_widget(self.render_grid(sim), game_area);
        }

        frame.render_widget(self.render_controls(), chunks[2]);
    }

    fn cell_span(&self, sim: &GridSimulation, pos: Position) -> Span<'static> {
        if sim.snake().head() == Some(pos) {
            return Span::styled(
                "■ ",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            );
        }

        match sim.cell(pos).unwrap_or_default() {
            CellState::Snake => Span::styled("□ ", Style::default().fg(Color::Green)),
            CellState::Food => Span::styled(
                "O ",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ),
            CellState::Outside => Span::styled("▓ ", Style::default().fg(Color::Gray)),
            CellState::Empty => Span::styled(". ", Style::default().fg(Color::DarkGray)),
        }
    }

    fn render_grid(&self, sim: &GridSimulation) -> Paragraph<'static> {
        let lines = (0..sim.rows() as i32)
            .map(|row| {
                let spans = (0..sim.cols() as i32)
                    .map(|col| self.cell_span(sim, Position::new(row, col)))
                    .collect::<Vec<_>>();
                Line::from(spans)
            })
            .collect::<Vec<_>>();

        let title = if sim.is_running() {
            format!(" Snake ({}) ", sim.level_size())
        } else {
            " Snake (paused) ".to_string()
        };

        Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Double)
                    .border_style(Style::default().fg(Color::White))
                    .title(title),
            )
            .alignment(Alignment::Center)
    }

    fn render_stats(&self, sim: &GridSimulation, metrics: &GameMetrics) -> Paragraph<'static> {
        let label = Style::default().fg(Color::Yellow);
        let value = Style::default().fg(Color::White);

        let text = vec![Line::from(vec![
            Span::styled("Score: ", label),
            Span::styled(sim.score().to_string(), value.add_modifier(Modifier::BOLD)),
            Span::raw("    "),
            Span::styled("Best: ", label),
            Span::styled(metrics.high_score.max(sim.score()).to_string(), value),
            Span::raw("    "),
            Span::styled("Steps: ", label),
            Span::styled(sim.steps().to_string(), value),
            Span::raw("    "),
            Span::styled("Time: ", label),
            Span::styled(metrics.format_time(), value),
        ])];

        Paragraph::new(text).alignment(Alignment::Center)
    }

    fn render_game_over(
        &self,
        sim: &GridSimulation,
        metrics: &GameMetrics,
        leaders: &[LeaderboardEntry],
    ) -> Paragraph<'static> {
        let cause = match sim.collision() {
            Some(CollisionType::Wall) => "You hit a wall",
            Some(CollisionType::SelfCollision) => "You bit yourself",
            None => "",
        };

        let mut text = vec![
            Line::from(""),
            Line::from(vec![Span::styled(
                "GAME OVER",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )]),
            Line::from(Span::styled(cause, Style::default().fg(Color::Gray))),
            Line::from(""),
            Line::from(vec![
                Span::styled("Final Score: ", Style::default().fg(Color::Yellow)),
                Span::styled(
                    sim.score().to_string(),
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw("    "),
                Span::styled("High Score: ", Style::default().fg(Color::Yellow)),
                Span::styled(
                    metrics.high_score.to_string(),
                    Style::default().fg(Color::White),
                ),
            ]),
            Line::from(""),
            Line::from(vec![
                Span::styled("Press ", Style::default().fg(Color::Gray)),
                Span::styled(
                    "R",
                    Style::default()
                        .fg(Color::Green)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(" to restart or ", Style::default().fg(Color::Gray)),
                Span::styled(
                    "Q",
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                ),
                Span::styled(" to quit", Style::default().fg(Color::Gray)),
            ]),
        ];

        if !leaders.is_empty() {
            text.push(Line::from(""));
            text.push(Line::from(Span::styled(
                "Top Players",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )));
            text.extend(leaders.iter().map(|entry| {
                Line::from(Span::styled(
                    entry.to_string(),
                    Style::default().fg(Color::White),
                ))
            }));
        }

        Paragraph::new(text).alignment(Alignment::Center).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red)),
        )
    }

    fn render_controls(&self) -> Paragraph<'static> {
        let text = vec![Line::from(vec![
            Span::styled("↑↓←→", Style::default().fg(Color::Cyan)),
            Span::raw(" or "),
            Span::styled("WASD", Style::default().fg(Color::Cyan)),
            Span::raw(" to move | "),
            Span::styled("P", Style::default().fg(Color::Yellow)),
            Span::raw(" or "),
            Span::styled("Space", Style::default().fg(Color::Yellow)),
            Span::raw(" to pause | "),
            Span::styled("R", Style::default().fg(Color::Green)),
            Span::raw(" to restart | "),
            Span::styled("Q", Style::default().fg(Color::Red)),
            Span::raw(" to quit"),
        ])];

        Paragraph::new(text).alignment(Alignment::Center)
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}
