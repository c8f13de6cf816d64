mod collision;
mod config;
mod food;
mod game;
mod grid;
mod highscore;
mod input;
mod logging;
mod session;
mod snake;
mod term;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rand::{rngs::StdRng, SeedableRng};
use tracing::info;

use crate::config::GameConfig;
use crate::game::SnakeGame;
use crate::highscore::FileHighScoreStore;
use crate::session::GameSession;
use crate::term::TermRenderer;

#[derive(Parser)]
#[command(name = "grid-snake")]
#[command(version, about = "Classic snake on a fixed grid, in the terminal")]
struct Cli {
    /// Grid width in cells (overrides the config file)
    #[arg(long)]
    width: Option<u32>,

    /// Grid height in cells (overrides the config file)
    #[arg(long)]
    height: Option<u32>,

    /// JSON file with game settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Where the best score is kept [default: platform data directory]
    #[arg(long)]
    high_score_file: Option<PathBuf>,

    /// Write logs here; nothing is logged otherwise
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Seed for food placement
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(cli.log_file.as_deref())?;

    let mut config = match &cli.config {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };
    if let Some(width) = cli.width {
        config.grid_width = width;
    }
    if let Some(height) = cli.height {
        config.grid_height = height;
    }
    config.validate().context("Invalid game configuration")?;

    let high_score_path = match cli.high_score_file {
        Some(path) => path,
        None => FileHighScoreStore::default_path()?,
    };
    let store = FileHighScoreStore::new(high_score_path);
    info!(path = ?store.path(), width = config.grid_width, height = config.grid_height, "starting");

    let rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut renderer = TermRenderer::new(config.grid())?;
    term::install_panic_hook();
    renderer.setup()?;

    // The renderer restores the terminal when the game is dropped, error or not.
    let mut game = SnakeGame::new(renderer, store, |best| {
        Ok(GameSession::new(config, best, rng)?)
    })?;
    game.run()
}
