//! Persistence layer for trellobackup.
//!
//! A [`BackupWriter`] owns one run's backup folder. The folder is created
//! lazily, right before the first file is written, and every file name is
//! sanitized before it touches the filesystem.

mod sanitize;

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tracing::{debug, info, instrument};

use trellobackup_shared::{Result, TrelloBackupError};

pub use sanitize::{attachment_file_name, board_file_name, sanitize_file_name};

/// Format used to name a run's folder before sanitization.
const RUN_FOLDER_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Folder name for a run started at `started_at` (e.g. `2024-05-01 103000`).
pub fn run_folder_name(started_at: &NaiveDateTime) -> String {
    sanitize_file_name(&started_at.format(RUN_FOLDER_FORMAT).to_string())
}

// ---------------------------------------------------------------------------
// BackupWriter
// ---------------------------------------------------------------------------

/// Writes backup files into a single run folder.
#[derive(Debug)]
pub struct BackupWriter {
    folder: PathBuf,
    created: bool,
}

impl BackupWriter {
    /// Writer for an explicit folder. Nothing is created until the first save.
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
            created: false,
        }
    }

    /// Writer for the run started at `started_at`, under `backup_root`.
    pub fn for_run(backup_root: &Path, started_at: &NaiveDateTime) -> Self {
        Self::new(backup_root.join(run_folder_name(started_at)))
    }

    /// The run folder (which may not exist yet).
    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// Whether this writer has created its folder.
    pub fn is_created(&self) -> bool {
        self.created
    }

    /// Write `content` to `<folder>/<sanitized file_name>`, overwriting any
    /// existing file. Returns the path written.
    #[instrument(skip(self, content), fields(folder = %self.folder.display()))]
    pub fn save(&mut self, file_name: &str, content: &[u8]) -> Result<PathBuf> {
        let path = self.folder.join(sanitize_file_name(file_name));
        info!(path = %path.display(), bytes = content.len(), "saving content to file");

        self.ensure_folder()?;

        std::fs::write(&path, content).map_err(|e| TrelloBackupError::io(&path, e))?;
        Ok(path)
    }

    fn ensure_folder(&mut self) -> Result<()> {
        if self.created {
            return Ok(());
        }

        // create_dir_all succeeds when the folder already exists.
        std::fs::create_dir_all(&self.folder).map_err(|e| {
            TrelloBackupError::save(format!(
                "Failed to create backup folder {}. {e}",
                self.folder.display()
            ))
        })?;
        debug!(folder = %self.folder.display(), "created backup folder");

        self.created = true;
        Ok(())
    }
}
