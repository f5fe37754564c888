//! Application configuration for trellobackup.
//!
//! User config lives at `~/.trellobackup/trellobackup.toml`.
//! CLI flags override environment values, which override config file values,
//! which override defaults. Secrets are never stored in the config file; it only
//! names the environment variables that hold them.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, TrelloBackupError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "trellobackup.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".trellobackup";

/// Shortest API key or application token Trello hands out.
pub const MIN_CREDENTIAL_LEN: usize = 32;

// ---------------------------------------------------------------------------
// Config structs (matching trellobackup.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Backup defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Trello API settings.
    #[serde(default)]
    pub trello: TrelloConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Directory under which one timestamped folder per run is created.
    #[serde(default = "default_backup_root")]
    pub backup_root: String,

    /// Download and save attachments referenced by board actions.
    #[serde(default)]
    pub backup_attachments: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            backup_root: default_backup_root(),
            backup_attachments: false,
        }
    }
}

fn default_backup_root() -> String {
    "backups".into()
}

/// `[trello]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrelloConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Name of the env var holding the application token.
    #[serde(default = "default_app_token_env")]
    pub app_token_env: String,

    /// Base URL of the Trello REST API.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Page where a user authorizes an application token.
    #[serde(default = "default_authorize_url")]
    pub authorize_url: String,

    /// Application name shown on the authorization page.
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// Ceiling on the number of actions fetched per board.
    #[serde(default = "default_actions_limit")]
    pub actions_limit: u32,
}

impl Default for TrelloConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            app_token_env: default_app_token_env(),
            api_base_url: default_api_base_url(),
            authorize_url: default_authorize_url(),
            app_name: default_app_name(),
            actions_limit: default_actions_limit(),
        }
    }
}

fn default_api_key_env() -> String {
    "TRELLO_API_KEY".into()
}
fn default_app_token_env() -> String {
    "TRELLO_APP_TOKEN".into()
}
fn default_api_base_url() -> String {
    "https://api.trello.com/1".into()
}
fn default_authorize_url() -> String {
    "https://trello.com/1/authorize".into()
}
fn default_app_name() -> String {
    "My Backup App".into()
}
fn default_actions_limit() -> u32 {
    1000
}

impl TrelloConfig {
    /// Build the URL where the user requests a read-only, non-expiring token.
    pub fn authorize_url_for(&self, api_key: &str) -> Result<Url> {
        Url::parse_with_params(
            &self.authorize_url,
            &[
                ("key", api_key),
                ("name", self.app_name.as_str()),
                ("expiration", "never"),
                ("response_type", "token"),
                ("scope", "read"),
            ],
        )
        .map_err(|e| {
            TrelloBackupError::config(format!(
                "invalid authorize_url '{}': {e}",
                self.authorize_url
            ))
        })
    }
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// Trello API key and application token.
#[derive(Clone, Default)]
pub struct Credentials {
    pub api_key: String,
    pub app_token: String,
}

/// Outcome of checking a credential pair before a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialStatus {
    /// Both values look usable.
    Ready,
    /// The API key is fine but no application token has been obtained yet.
    TokenMissing,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, app_token: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            app_token: app_token.into(),
        }
    }

    /// Check the pair. A short API key is fatal; a short token is not.
    pub fn validate(&self) -> Result<CredentialStatus> {
        if self.api_key.len() < MIN_CREDENTIAL_LEN {
            return Err(TrelloBackupError::config("API key not set."));
        }
        if self.app_token.len() < MIN_CREDENTIAL_LEN {
            return Ok(CredentialStatus::TokenMissing);
        }
        Ok(CredentialStatus::Ready)
    }
}

// Secrets stay out of logs and panic messages.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &format_args!("<{} chars>", self.api_key.len()))
            .field("app_token", &format_args!("<{} chars>", self.app_token.len()))
            .finish()
    }
}

impl AppConfig {
    /// Read the credential pair from the environment variables named in `[trello]`.
    /// Unset variables yield empty strings, which [`Credentials::validate`] rejects.
    pub fn credentials(&self) -> Credentials {
        let read = |name: &str| std::env::var(name).unwrap_or_default();
        Credentials::new(
            read(&self.trello.api_key_env),
            read(&self.trello.app_token_env),
        )
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.trellobackup/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| TrelloBackupError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.trellobackup/trellobackup.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| TrelloBackupError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        TrelloBackupError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| TrelloBackupError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| TrelloBackupError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| TrelloBackupError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
