use anyhow::{Context, Result};
use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use log::{info, warn};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{Stderr, stderr};
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::interval;

use crate::game::step_loop::{lock, share};
use crate::game::{GameConfig, GameEvent, GridSimulation, SharedSimulation, StepLoop};
use crate::input::{InputHandler, KeyAction};
use crate::metrics::{GameMetrics, LeaderboardEntry, ScoreBoard};
use crate::render::Renderer;

/// Players listed on the game-over panel
const PANEL_LEADERS: usize = 3;

/// Keyboard-driven play in the terminal
pub struct HumanMode {
    sim: SharedSimulation,
    step_loop: Option<StepLoop>,
    tick_interval: Duration,
    metrics: GameMetrics,
    scores: ScoreBoard,
    leaders: Vec<LeaderboardEntry>,
    player: String,
    score_file: Option<PathBuf>,
    renderer: Renderer,
    input_handler: InputHandler,
    should_quit: bool,
}

impl HumanMode {
    /// Load the configured level. Fails if the level cannot be read or parsed.
    ///
    /// Finished games are recorded under `player` in `score_file`, if given.
    pub fn new(
        config: &GameConfig,
        player: impl Into<String>,
        score_file: Option<PathBuf>,
    ) -> Result<Self> {
        let mut sim = GridSimulation::new(config.level_source());
        sim.load(config.level_size)
            .with_context(|| format!("Failed to load the {} level", config.level_size))?;

        let scores = match &score_file {
            Some(path) => ScoreBoard::load(path)?,
            None => ScoreBoard::new(),
        };
        let player = player.into();

        Ok(Self {
            sim: share(sim),
            step_loop: None,
            tick_interval: config.tick_interval(),
            metrics: GameMetrics::with_high_score(scores.player(&player).high_score),
            leaders: scores.leaderboard(PANEL_LEADERS),
            scores,
            player,
            score_file,
            renderer: Renderer::new(),
            input_handler: InputHandler::new(),
            should_quit: false,
        })
    }

    /// Play until the user quits. Returns the score of the last game.
    pub async fn run(&mut self) -> Result<u32> {
        // Setup terminal
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stderr = stderr();
        execute!(stderr, EnterAlternateScreen).context("Failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stderr);
        let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;
        terminal.hide_cursor().context("Failed to hide cursor")?;
        terminal.clear().context("Failed to clear terminal")?;

        self.restart();

        // Run game loop with cleanup
        let result = self.run_game_loop(&mut terminal).await;

        self.step_loop = None;
        self.cleanup_terminal(&mut terminal)?;

        result?;
        Ok(lock(&self.sim).score())
    }

    async fn run_game_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stderr>>,
    ) -> Result<()> {
        let mut event_stream = EventStream::new();
        let mut game_events = lock(&self.sim).subscribe();

        // Redraw at 30 FPS to keep the clock moving while paused
        let mut render_timer = interval(Duration::from_millis(33));

        loop {
            tokio::select! {
                maybe_event = event_stream.next() => {
                    if let Some(Ok(event)) = maybe_event {
                        self.handle_event(event);
                    }
                }

                Some(game_event) = game_events.recv() => {
                    self.handle_game_event(game_event);
                    if game_event == GameEvent::StateChanged {
                        self.draw(terminal)?;
                    }
                }

                _ = render_timer.tick() => {
                    self.draw(terminal)?;
                }

                _ = tokio::signal::ctrl_c() => {
                    self.should_quit = true;
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    fn draw(&mut self, terminal: &mut Terminal<CrosstermBackend<Stderr>>) -> Result<()> {
        self.metrics.update();
        let sim = lock(&self.sim);
        terminal
            .draw(|frame| self.renderer.render(frame, &sim, &self.metrics, &self.leaders))
            .context("Failed to draw frame")?;
        Ok(())
    }

    fn handle_event(&mut self, event: Event) {
        if let Event::Key(key) = event {
            // Only process key press events, not release
            if key.kind != KeyEventKind::Press {
                return;
            }

            match self.input_handler.handle_key_event(key) {
                KeyAction::Turn(direction) => lock(&self.sim).change_direction(direction),
                KeyAction::Pause => {
                    let mut sim = lock(&self.sim);
                    if !sim.is_over() {
                        sim.manage_pause();
                    }
                }
                KeyAction::Restart => self.restart(),
                KeyAction::Quit => self.should_quit = true,
                KeyAction::None => {}
            }
        }
    }

    fn handle_game_event(&mut self, event: GameEvent) {
        match event {
            GameEvent::GameOver => {
                let score = lock(&self.sim).score();
                self.metrics.on_game_over(score);
                self.scores.record(&self.player, score);
                self.leaders = self.scores.leaderboard(PANEL_LEADERS);
                if let Some(path) = &self.score_file {
                    if let Err(err) = self.scores.save(path) {
                        warn!("Could not save scores: {:#}", err);
                    }
                }
            }
            GameEvent::RunStateChanged(is_running) => self.metrics.on_pause_changed(is_running),
            GameEvent::LevelLoaded | GameEvent::StateChanged | GameEvent::AteFood => {}
        }
    }

    fn restart(&mut self) {
        // Dropping the old handle aborts its loop
        self.step_loop = None;
        self.step_loop = Some(StepLoop::restart(self.sim.clone(), self.tick_interval));
        self.metrics.on_game_start();
        info!("New game started");
    }

    fn cleanup_terminal(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stderr>>,
    ) -> Result<()> {
        disable_raw_mode().context("Failed to disable raw mode")?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)
            .context("Failed to leave alternate screen")?;
        terminal.show_cursor().context("Failed to show cursor")?;
        Ok(())
    }
}
