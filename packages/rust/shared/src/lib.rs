//! Shared types, error model, and configuration for newsbrief.
//!
//! This crate is the foundation depended on by all other newsbrief crates.
//! It provides:
//! - [`NewsbriefError`]: the unified error type
//! - Run-state types ([`RunState`], [`ArticleRecord`], [`StageUpdate`])
//! - Configuration ([`AppConfig`], [`FetchConfig`], [`MailSettings`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, FetchConfig, InputConfig, MailConfig, MailSettings, ModelConfig, config_dir,
    config_file_path, init_config, init_config_at, load_config, load_config_from,
};
pub use error::{NewsbriefError, Result};
pub use types::{ArticleRecord, RunState, StageUpdate, truncate_chars};
