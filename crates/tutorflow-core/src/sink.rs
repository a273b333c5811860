//! Destinations for confirmed lesson results.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{CoreError, Result};
use crate::result::SessionResult;

/// Receives each result as soon as the operator confirms it.
pub trait ResultSink: Send + Sync {
    fn record(&self, result: &SessionResult) -> Result<()>;
}

/// Appends results to a file, one JSON document per line.
#[derive(Debug, Clone)]
pub struct JsonlResultSink {
    path: PathBuf,
}

impl JsonlResultSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl ResultSink for JsonlResultSink {
    fn record(&self, result: &SessionResult) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let line = serde_json::to_string(result)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)?;

        debug!(subject = %result.subject, path = %self.path.display(), "Recorded lesson result");
        Ok(())
    }
}

/// Reads back every result written by a [`JsonlResultSink`].
pub fn load_results(path: impl AsRef<Path>) -> Result<Vec<SessionResult>> {
    let content = std::fs::read_to_string(path)?;
    content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str::<SessionResult>(l).map_err(CoreError::from))
        .collect()
}
