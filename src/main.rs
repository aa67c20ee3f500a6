use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use grid_snake::game::{GameConfig, LevelSize};
use grid_snake::metrics::ScoreBoard;
use grid_snake::modes::HumanMode;
use log::info;
use simplelog::{Config, LevelFilter, WriteLogger};

#[derive(Parser)]
#[command(name = "grid_snake")]
#[command(version, about = "Snake on a grid with barriers")]
struct Cli {
    /// Level size class
    #[arg(long)]
    size: Option<LevelSize>,

    /// Milliseconds between steps
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Directory holding small.txt, medium.txt and large.txt level files
    #[arg(long)]
    levels_dir: Option<PathBuf>,

    /// JSON configuration file; flags given on the command line win
    #[arg(long)]
    config: Option<PathBuf>,

    /// Where to keep every player's last and best scores
    #[arg(long)]
    score_file: Option<PathBuf>,

    /// Name the scores of this session are recorded under
    #[arg(long, default_value = "player")]
    player: String,

    /// Print the best players from the score file and exit
    #[arg(long)]
    leaderboard: bool,

    /// Players listed by --leaderboard
    #[arg(long, default_value_t = 10)]
    top: usize,

    /// Log file
    #[arg(long, default_value = "grid_snake.log")]
    log_file: PathBuf,

    /// Log at debug level
    #[arg(long, short)]
    verbose: bool,
}

impl Cli {
    fn game_config(&self) -> Result<GameConfig> {
        let mut config = match &self.config {
            Some(path) => GameConfig::from_file(path)?,
            None => GameConfig::default(),
        };

        if let Some(size) = self.size {
            config.level_size = size;
        }
        if let Some(tick_ms) = self.tick_ms {
            config.tick_ms = tick_ms;
        }
        if let Some(dir) = &self.levels_dir {
            config.levels_dir = Some(dir.clone());
        }

        Ok(config)
    }
}

fn print_leaderboard(cli: &Cli) -> Result<()> {
    let board = match &cli.score_file {
        Some(path) => ScoreBoard::load(path)?,
        None => ScoreBoard::new(),
    };

    let entries = board.leaderboard(cli.top);
    if entries.is_empty() {
        println!("No scores recorded yet");
    }
    for entry in entries {
        println!("{}", entry);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.leaderboard {
        return print_leaderboard(&cli);
    }

    // The terminal belongs to the game, so logs go to a file
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let log_file = File::create(&cli.log_file)
        .with_context(|| format!("Failed to create log file {:?}", cli.log_file))?;
    WriteLogger::init(level, Config::default(), log_file).context("Failed to initialize logger")?;

    let config = cli.game_config()?;
    info!("Starting with {:?}", config);

    let mut human_mode = HumanMode::new(&config, cli.player.clone(), cli.score_file.clone())?;
    let final_score = human_mode.run().await?;

    // Launchers read the final score from stdout
    println!("{}", final_score);

    Ok(())
}
