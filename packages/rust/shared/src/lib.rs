//! Shared types, error model, and configuration for trellobackup.
//!
//! This crate is the foundation depended on by all other trellobackup crates.
//! It provides:
//! - [`TrelloBackupError`]: the unified error type
//! - Trello domain types ([`BoardSummary`], [`Organization`], [`BoardDocument`], [`Action`])
//! - Configuration ([`AppConfig`], [`Credentials`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CredentialStatus, Credentials, DefaultsConfig, MIN_CREDENTIAL_LEN, TrelloConfig,
    config_dir, config_file_path, init_config, load_config, load_config_from,
};
pub use error::{Result, TrelloBackupError};
pub use types::{
    Action, ActionData, AttachmentRef, BoardDocument, BoardSummary, Card, CardRef, Organization,
};
