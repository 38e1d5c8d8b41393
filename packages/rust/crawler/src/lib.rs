//! Browser-driven crawl of the paginated index list.
//!
//! This crate provides:
//! - [`TablePage`]: the page operations pagination relies on, with a
//!   Chromium implementation in [`browser`]
//! - [`strategies`]: ordered ways of advancing the table
//! - [`Paginator`]: the page loop with repeat detection and a page cap
//! - [`records`]: code/name split and deduplication of scraped rows

pub mod browser;
pub mod engine;
pub mod extract;
pub mod page;
pub mod records;
pub mod strategies;

#[cfg(test)]
mod testing;

use tracing::{info, instrument};

use csindex_shared::{CrawlConfig, CrawlResult, Result};

pub use browser::{ChromePage, ChromeSession};
pub use engine::{CrawlProgress, PaginationOutcome, Paginator, SilentProgress};
pub use extract::RowExtractor;
pub use page::{ScrollTarget, TablePage};
pub use records::{dedup_by_label, split_code_name, structure_rows, to_record};
pub use strategies::{AdvanceStrategy, StrategyChain};

/// Page through the whole table and structure what was scraped.
///
/// Fails only when the configuration cannot build a paginator; page-level
/// failures end the crawl with whatever was gathered.
#[instrument(skip_all, fields(max_pages = config.max_pages))]
pub async fn crawl_all(
    page: &dyn TablePage,
    config: &CrawlConfig,
    progress: &dyn CrawlProgress,
) -> Result<CrawlResult> {
    let paginator = Paginator::new(config.clone())?;
    let outcome = paginator.run(page, progress).await;

    let pages_reached = outcome.pages_reached;
    let stop = outcome.stop;
    let raw_rows = outcome.into_rows();
    let records = dedup_by_label(structure_rows(&raw_rows));

    info!(
        pages = pages_reached,
        raw = raw_rows.len(),
        structured = records.len(),
        %stop,
        "crawl completed"
    );

    Ok(CrawlResult {
        raw_rows,
        records,
        pages_reached,
        stop,
    })
}
