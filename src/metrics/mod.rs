pub mod game_metrics;
pub mod score_record;

pub use game_metrics::GameMetrics;
pub use score_record::{LeaderboardEntry, ScoreBoard, ScoreRecord};
