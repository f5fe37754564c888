//! Core pipeline orchestration for trellobackup.
//!
//! This crate ties together board discovery, content fetching, and backup
//! persistence into the end-to-end `backup` workflow ([`pipeline::run_backup`]).

pub mod pipeline;

pub use pipeline::{
    BackupConfig, BackupOutcome, BackupSummary, ProgressReporter, SilentProgress, run_backup,
};
