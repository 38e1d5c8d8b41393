//! End-to-end runs: direct export, and browser crawl → dumps → spreadsheet.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{error, info, instrument, warn};

use csindex_crawler::{ChromeSession, CrawlProgress, TablePage, crawl_all};
use csindex_export::{export_sheet, read_records, records_to_sheet, write_raw_rows, write_records};
use csindex_shared::{AppConfig, CrawlConfig, CrawlResult, ExportConfig, Result, Sheet};

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each table page is read during a crawl.
    fn page_scraped(&self, page: u32, rows: usize, total: usize);
    /// Called when the pipeline completes.
    fn done(&self, summary: &str);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn page_scraped(&self, _page: u32, _rows: usize, _total: usize) {}
    fn done(&self, _summary: &str) {}
}

/// Adapts a `ProgressReporter` to the crawler's `CrawlProgress` interface.
struct PipelineCrawlProgress<'a> {
    inner: &'a dyn ProgressReporter,
}

impl CrawlProgress for PipelineCrawlProgress<'_> {
    fn page_scraped(&self, page: u32, rows: usize, total: usize) {
        self.inner.page_scraped(page, rows, total);
    }

    fn advanced(&self, page: u32, strategy: &str) {
        self.inner.phase(&format!("Loading page {page} ({strategy})"));
    }
}

// ---------------------------------------------------------------------------
// Direct pipeline
// ---------------------------------------------------------------------------

/// Options of [`run_direct`].
#[derive(Debug, Clone)]
pub struct DirectOptions {
    /// Spreadsheet path; defaults to the dated name in the output directory.
    pub output: Option<PathBuf>,
    /// Write the spreadsheet at all.
    pub export: bool,
}

impl Default for DirectOptions {
    fn default() -> Self {
        Self {
            output: None,
            export: true,
        }
    }
}

/// Result of [`run_direct`].
#[derive(Debug)]
pub struct DirectReport {
    /// Normalized index list.
    pub sheet: Sheet,
    /// Written spreadsheet, if any.
    pub spreadsheet: Option<PathBuf>,
    pub elapsed: Duration,
}

/// Download the index list through the export endpoint and save it.
///
/// Download and parse errors propagate; a failed export only leaves
/// `spreadsheet` empty.
#[instrument(skip_all, fields(url = %config.direct.export_url))]
pub async fn run_direct(
    config: &AppConfig,
    options: &DirectOptions,
    progress: &dyn ProgressReporter,
) -> Result<DirectReport> {
    let start = Instant::now();

    progress.phase("Downloading index list");
    let sheet = csindex_direct::fetch_index_list(&config.direct).await?;

    let spreadsheet = if options.export {
        progress.phase("Exporting spreadsheet");
        export_sheet(
            &sheet,
            options.output.as_deref(),
            &config.export.direct_prefix,
            &config.export,
        )
    } else {
        None
    };

    let report = DirectReport {
        sheet,
        spreadsheet,
        elapsed: start.elapsed(),
    };

    info!(
        rows = report.sheet.rows.len(),
        exported = report.spreadsheet.is_some(),
        elapsed_ms = report.elapsed.as_millis(),
        "direct pipeline completed"
    );
    progress.done(&format!("{} indices retrieved", report.sheet.rows.len()));

    Ok(report)
}

// ---------------------------------------------------------------------------
// Browser pipeline
// ---------------------------------------------------------------------------

/// Options of [`run_browser`] and [`crawl_and_persist`].
#[derive(Debug, Clone, Default)]
pub struct BrowseOptions {
    /// Spreadsheet path; defaults to the dated name in the output directory.
    pub output: Option<PathBuf>,
}

/// Result of a browser run. Empty when the run failed.
#[derive(Debug)]
pub struct BrowseReport {
    pub result: CrawlResult,
    pub raw_json: Option<PathBuf>,
    pub structured_json: Option<PathBuf>,
    pub spreadsheet: Option<PathBuf>,
    pub elapsed: Duration,
}

impl BrowseReport {
    pub fn empty() -> Self {
        Self {
            result: CrawlResult::empty(),
            raw_json: None,
            structured_json: None,
            spreadsheet: None,
            elapsed: Duration::ZERO,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.result.raw_rows.is_empty()
    }
}

/// Crawl the list page in a headless browser and save everything scraped.
///
/// Never fails: any top-level error is logged and turned into an empty
/// report. The browser is closed on every path.
#[instrument(skip_all, fields(url = %config.browser.list_url))]
pub async fn run_browser(
    config: &AppConfig,
    options: &BrowseOptions,
    progress: &dyn ProgressReporter,
) -> BrowseReport {
    let start = Instant::now();

    progress.phase("Launching browser");
    let outcome = match ChromeSession::launch(&config.browser).await {
        Ok(session) => {
            let outcome = async {
                progress.phase("Opening index list");
                session.open(&config.browser).await?;
                crawl_and_persist(session.page(), config, options, progress).await
            }
            .await;
            session.close().await;
            outcome
        }
        Err(e) => Err(e),
    };

    let mut report = match outcome {
        Ok(report) => report,
        Err(e) => {
            error!(error = %e, details = ?e, "browser pipeline failed");
            BrowseReport::empty()
        }
    };
    report.elapsed = start.elapsed();

    info!(
        raw = report.result.raw_count(),
        structured = report.result.structured_count(),
        elapsed_ms = report.elapsed.as_millis(),
        "browser pipeline completed"
    );
    progress.done(&format!(
        "{} rows scraped, {} indices structured",
        report.result.raw_count(),
        report.result.structured_count()
    ));

    report
}

/// Crawl an already-open page, then write the JSON dumps and the spreadsheet.
///
/// Nothing is written when no row was scraped.
#[instrument(skip_all)]
pub async fn crawl_and_persist(
    page: &dyn TablePage,
    config: &AppConfig,
    options: &BrowseOptions,
    progress: &dyn ProgressReporter,
) -> Result<BrowseReport> {
    progress.phase("Scraping pages");
    let crawl_progress = PipelineCrawlProgress { inner: progress };
    let result = crawl_all(page, &CrawlConfig::from(config), &crawl_progress).await?;

    let mut report = BrowseReport {
        result,
        ..BrowseReport::empty()
    };

    if report.is_empty() {
        warn!("no rows scraped, nothing saved");
        return Ok(report);
    }

    progress.phase("Saving data");
    let export = &config.export;

    let raw_path = export.path_for(&export.raw_json);
    write_raw_rows(&raw_path, &report.result.raw_rows)?;
    report.raw_json = Some(raw_path);

    let structured_path = export.path_for(&export.structured_json);
    write_records(&structured_path, &report.result.records)?;
    report.structured_json = Some(structured_path);

    progress.phase("Exporting spreadsheet");
    report.spreadsheet = export_sheet(
        &records_to_sheet(&report.result.records),
        options.output.as_deref(),
        &export.browser_prefix,
        export,
    );

    Ok(report)
}

// ---------------------------------------------------------------------------
// Re-export
// ---------------------------------------------------------------------------

/// Export a structured dump written by an earlier crawl.
///
/// `input` defaults to the structured dump in the output directory. A
/// missing, unreadable or empty dump yields `None`.
pub fn export_structured(
    config: &ExportConfig,
    input: Option<&Path>,
    filename: Option<&Path>,
) -> Option<PathBuf> {
    let input = input
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.path_for(&config.structured_json));

    if !input.exists() {
        warn!(path = %input.display(), "structured dump not found, nothing to export");
        return None;
    }

    let records = match read_records(&input) {
        Ok(records) => records,
        Err(e) => {
            warn!(path = %input.display(), error = %e, "structured dump unreadable");
            return None;
        }
    };

    info!(path = %input.display(), records = records.len(), "structured dump loaded");
    export_sheet(
        &records_to_sheet(&records),
        filename,
        &config.browser_prefix,
        config,
    )
}
