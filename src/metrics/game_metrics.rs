use std::time::{Duration, Instant};

/// Per-process play statistics shown next to the board
pub struct GameMetrics {
    pub start_time: Instant,
    pub elapsed_time: Duration,
    pub high_score: u32,
    pub games_played: u32,
    paused_at: Option<Instant>,
}

impl GameMetrics {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            elapsed_time: Duration::ZERO,
            high_score: 0,
            games_played: 0,
            paused_at: None,
        }
    }

    /// Start from a previously saved high score
    pub fn with_high_score(high_score: u32) -> Self {
        Self {
            high_score,
            ..Self::new()
        }
    }

    /// Refresh the elapsed time. The clock stands still while paused.
    pub fn update(&mut self) {
        if self.paused_at.is_none() {
            self.elapsed_time = self.start_time.elapsed();
        }
    }

    pub fn on_game_start(&mut self) {
        self.start_time = Instant::now();
        self.elapsed_time = Duration::ZERO;
        self.paused_at = None;
    }

    pub fn on_pause_changed(&mut self, is_running: bool) {
        match (is_running, self.paused_at) {
            (false, None) => {
                self.update();
                self.paused_at = Some(Instant::now());
            }
            (true, Some(paused_at)) => {
                self.start_time += paused_at.elapsed();
                self.paused_at = None;
            }
            _ => {}
        }
    }

    pub fn on_game_over(&mut self, final_score: u32) {
        self.games_played += 1;
        if final_score > self.high_score {
            self.high_score = final_score;
        }
    }

    pub fn format_time(&self) -> String {
        let total_secs = self.elapsed_time.as_secs();
        let minutes = total_secs / 60;
        let seconds = total_secs % 60;
        format!("{:02}:{:02}", minutes, seconds)
    }
}

impl Default for GameMetrics {
    fn default() -> Self {
        Self::new()
    }
}
