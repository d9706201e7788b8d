//! Append-only feedback log
//!
//! Free-text submissions land as one `<sender>: <text>` line each in a
//! plain text file. The bot never reads the file back; it is write-only
//! from the system's perspective.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::Result;

/// Writer for the feedback artifact.
#[derive(Debug, Clone)]
pub struct FeedbackSink {
    path: PathBuf,
}

impl FeedbackSink {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Append one submission. A write failure fails the enclosing
    /// operation; nothing is retried.
    pub fn submit(&self, sender: &str, text: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}: {}", sender, text)?;
        info!(sender, "Feedback recorded");
        Ok(())
    }
}
