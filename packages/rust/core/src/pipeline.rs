//! End-to-end `backup` pipeline: credentials → enumerate → fetch → save (+ attachments).

use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::Local;
use tracing::{info, instrument};
use url::Url;

use trellobackup_client::{ClientOptions, TrelloClient, attachment_downloads};
use trellobackup_discovery::enumerate_boards;
use trellobackup_shared::{
    AppConfig, BoardDocument, CredentialStatus, Credentials, Result, TrelloConfig,
};
use trellobackup_storage::{BackupWriter, attachment_file_name, board_file_name};

/// Configuration for [`run_backup`]. Built once, before the run starts.
#[derive(Debug, Clone)]
pub struct BackupConfig {
    /// API key and application token.
    pub credentials: Credentials,
    /// Trello endpoints and request settings.
    pub trello: TrelloConfig,
    /// Directory that receives one timestamped folder per run.
    pub backup_root: PathBuf,
    /// Download and save attachments referenced by board actions.
    pub backup_attachments: bool,
}

impl BackupConfig {
    /// Take every setting from `config`; callers apply CLI overrides afterwards.
    pub fn from_app_config(config: &AppConfig, credentials: Credentials) -> Self {
        Self {
            credentials,
            trello: config.trello.clone(),
            backup_root: PathBuf::from(&config.defaults.backup_root),
            backup_attachments: config.defaults.backup_attachments,
        }
    }
}

/// How a backup run ended.
#[derive(Debug)]
pub enum BackupOutcome {
    /// No usable application token; the user must authorize one at this URL.
    /// Nothing was sent to the API.
    TokenRequired { authorize_url: Url },
    /// All boards were saved.
    Completed(BackupSummary),
}

/// Result of a completed backup run.
#[derive(Debug)]
pub struct BackupSummary {
    /// The run folder all files were written to.
    pub folder: PathBuf,
    /// Number of boards saved.
    pub board_count: usize,
    /// Number of attachments saved.
    pub attachment_count: usize,
    /// Every file written, in write order.
    pub files: Vec<PathBuf>,
    /// Total elapsed time.
    pub elapsed: Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called once the board list is known.
    fn boards_discovered(&self, count: usize);
    /// Called before a board's content is fetched.
    fn board_started(&self, board: &str, organization: &str, current: usize, total: usize);
    /// Called before an attachment is downloaded.
    fn attachment_started(&self, id: &str, name: &str);
    /// Called when the run completes.
    fn done(&self, summary: &BackupSummary);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn boards_discovered(&self, _count: usize) {}
    fn board_started(&self, _board: &str, _organization: &str, _current: usize, _total: usize) {}
    fn attachment_started(&self, _id: &str, _name: &str) {}
    fn done(&self, _summary: &BackupSummary) {}
}

/// Run the full `backup` pipeline.
///
/// 1. Validate credentials (a missing token ends the run before any request)
/// 2. Enumerate boards and resolve organization labels
/// 3. For each board: fetch content, save it, then save its attachments if enabled
///
/// Requests are awaited one after another. The first error aborts the run;
/// files saved before it stay on disk.
#[instrument(skip_all, fields(root = %config.backup_root.display(), attachments = config.backup_attachments))]
pub async fn run_backup(
    config: &BackupConfig,
    progress: &dyn ProgressReporter,
) -> Result<BackupOutcome> {
    let start = Instant::now();

    if config.credentials.validate()? == CredentialStatus::TokenMissing {
        let authorize_url = config
            .trello
            .authorize_url_for(&config.credentials.api_key)?;
        info!("application token not set, authorization required");
        return Ok(BackupOutcome::TokenRequired { authorize_url });
    }

    let client = TrelloClient::new(
        config.credentials.clone(),
        &ClientOptions::from(&config.trello),
    )?;
    let mut writer = BackupWriter::for_run(&config.backup_root, &Local::now().naive_local());

    info!(folder = %writer.folder().display(), "starting backup");

    // --- Phase 1: Enumerate ---
    let inventory = enumerate_boards(&client).await?;
    progress.boards_discovered(inventory.len());

    // --- Phase 2: Fetch & save ---
    let mut files = Vec::new();
    let mut attachment_count = 0;
    let total = inventory.len();

    for (i, board) in inventory.boards.iter().enumerate() {
        let organization = inventory.organization_label(board);
        progress.board_started(&board.name, organization, i + 1, total);
        info!(board = %board.name, %organization, "fetching board");

        let content = client.fetch_board(board).await?;
        let path = writer.save(
            &board_file_name(organization, &board.name),
            content.raw.as_bytes(),
        )?;
        files.push(path);

        if config.backup_attachments {
            attachment_count += save_attachments(
                &client,
                &content.document,
                &mut writer,
                progress,
                &mut files,
            )
            .await?;
        }
    }

    let summary = BackupSummary {
        folder: writer.folder().to_path_buf(),
        board_count: total,
        attachment_count,
        files,
        elapsed: start.elapsed(),
    };

    progress.done(&summary);

    info!(
        boards = summary.board_count,
        attachments = summary.attachment_count,
        folder = %summary.folder.display(),
        elapsed_ms = summary.elapsed.as_millis(),
        "backup complete"
    );

    Ok(BackupOutcome::Completed(summary))
}

// ---------------------------------------------------------------------------
// Attachments
// ---------------------------------------------------------------------------

/// Download and save every resolvable attachment of one board.
/// Returns the number saved.
async fn save_attachments(
    client: &TrelloClient,
    document: &BoardDocument,
    writer: &mut BackupWriter,
    progress: &dyn ProgressReporter,
    files: &mut Vec<PathBuf>,
) -> Result<usize> {
    let downloads = attachment_downloads(document);

    for attachment in &downloads {
        progress.attachment_started(&attachment.id, &attachment.name);
        info!(id = %attachment.id, name = %attachment.name, "fetching attachment");

        let body = client.download_attachment(attachment).await?;
        let path = writer.save(&attachment_file_name(&attachment.id, &attachment.name), &body)?;
        files.push(path);
    }

    Ok(downloads.len())
}
