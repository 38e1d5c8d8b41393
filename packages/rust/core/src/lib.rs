//! Pipeline orchestration for csindex.
//!
//! This crate ties the direct export, the browser crawl and the file
//! outputs together into end-to-end runs (`run_direct`, `run_browser`).

pub mod pipeline;

pub use pipeline::{
    BrowseOptions, BrowseReport, DirectOptions, DirectReport, ProgressReporter, SilentProgress,
    crawl_and_persist, export_structured, run_browser, run_direct,
};
