use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Where the best score lives between runs. Failures stay inside the store;
/// the game never waits on or reacts to them.
pub trait HighScoreStore {
    fn load_high_score(&mut self) -> u32;
    fn save_high_score(&mut self, score: u32);
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct HighScoreRecord {
    high_score: u32,
}

/// JSON file backed store.
pub struct FileHighScoreStore {
    path: PathBuf,
}

impl FileHighScoreStore {
    pub fn new(path: PathBuf) -> Self {
        FileHighScoreStore { path }
    }

    /// `<data dir>/grid-snake/highscore.json` for the current platform.
    pub fn default_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("", "", "grid-snake")
            .context("Could not resolve a data directory for the high score")?;
        Ok(dirs.data_local_dir().join("highscore.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<u32> {
        if !self.path.exists() {
            return Ok(0);
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read high score from {:?}", self.path))?;
        let record: HighScoreRecord = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse high score file {:?}", self.path))?;
        Ok(record.high_score)
    }

    fn write(&self, score: u32) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }

        // Written beside the target, then renamed over it.
        let tmp = self.path.with_extension("json.tmp");
        let data = serde_json::to_vec_pretty(&HighScoreRecord { high_score: score })
            .context("Failed to serialize high score")?;
        fs::write(&tmp, data).with_context(|| format!("Failed to write {:?}", tmp))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace {:?}", self.path))?;
        Ok(())
    }
}

impl HighScoreStore for FileHighScoreStore {
    fn load_high_score(&mut self) -> u32 {
        match self.read() {
            Ok(score) => score,
            Err(e) => {
                warn!(error = %format!("{:#}", e), "high score unavailable, starting from 0");
                0
            }
        }
    }

    fn save_high_score(&mut self, score: u32) {
        match self.write(score) {
            Ok(()) => info!(score, path = ?self.path, "high score saved"),
            Err(e) => warn!(error = %format!("{:#}", e), "failed to save high score"),
        }
    }
}
