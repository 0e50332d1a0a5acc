use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, warn};

#[derive(Debug, Default, Serialize, Deserialize)]
struct StreakFile {
    streak: u64,
}

/// Count of successful generations, persisted as a tiny JSON file.
#[derive(Debug, Clone)]
pub struct StreakCounter {
    path: PathBuf,
}

impl StreakCounter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Current value; a missing or unreadable file counts as zero.
    pub async fn current(&self) -> u64 {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => match serde_json::from_str::<StreakFile>(&raw) {
                Ok(file) => file.streak,
                Err(e) => {
                    warn!("Ignoring corrupt streak file {}: {}", self.path.display(), e);
                    0
                }
            },
            Err(_) => 0,
        }
    }

    pub async fn increment(&self) -> Result<u64, CoreError> {
        let streak = self.current().await + 1;
        let raw = serde_json::to_string(&StreakFile { streak })?;
        tokio::fs::write(&self.path, raw).await?;
        debug!("Streak is now {}", streak);
        Ok(streak)
    }
}
