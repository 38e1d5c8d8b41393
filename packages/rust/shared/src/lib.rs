//! Shared types, error model, and configuration for csindex.
//!
//! This crate is the foundation depended on by all other csindex crates.
//! It provides:
//! - [`CsIndexError`]: the unified error type
//! - Domain types ([`IndexRecord`], [`PageBatch`], [`CrawlResult`], [`Sheet`])
//! - Configuration ([`AppConfig`], [`CrawlConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, BrowserConfig, CrawlConfig, DirectConfig, ExportConfig, STRATEGY_NAMES,
    SelectorsConfig, config_dir, config_file_path, init_config, load_config, load_config_from,
};
pub use error::{CsIndexError, Result};
pub use types::{
    CODE_COLUMN, Cell, CrawlResult, CrawlStop, IndexRecord, NAME_COLUMN, PageBatch, RawRow, Sheet,
    TABLE_COLUMNS,
};
