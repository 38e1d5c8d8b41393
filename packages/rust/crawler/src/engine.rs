//! Pagination loop over the rendered index table.
//!
//! The paginator reads the visible rows, appends them, and walks the
//! strategy chain to reach the next page. It stops when no strategy can
//! advance, when a page repeats the previous one, or at the page cap.

use tracing::{debug, info, instrument, warn};

use csindex_shared::{CrawlConfig, CrawlStop, CsIndexError, PageBatch, RawRow, Result};

use crate::extract::RowExtractor;
use crate::page::TablePage;
use crate::strategies::StrategyChain;

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Per-page progress callback.
pub trait CrawlProgress: Send + Sync {
    /// Called once per page read; `total` counts accumulated rows.
    fn page_scraped(&self, page: u32, rows: usize, total: usize);
    /// Called when a strategy moved the table to `page`.
    fn advanced(&self, page: u32, strategy: &str);
}

/// No-op progress for headless/test usage.
pub struct SilentProgress;

impl CrawlProgress for SilentProgress {
    fn page_scraped(&self, _page: u32, _rows: usize, _total: usize) {}
    fn advanced(&self, _page: u32, _strategy: &str) {}
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Batches gathered by one pagination run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationOutcome {
    /// Non-empty batches in page order.
    pub batches: Vec<PageBatch>,
    /// Last page counter that was read.
    pub pages_reached: u32,
    pub stop: CrawlStop,
}

impl PaginationOutcome {
    /// All rows, flattened in page order.
    pub fn into_rows(self) -> Vec<RawRow> {
        self.batches.into_iter().flat_map(|b| b.rows).collect()
    }
}

// ---------------------------------------------------------------------------
// Paginator
// ---------------------------------------------------------------------------

/// Drives a [`TablePage`] through its pages.
pub struct Paginator {
    config: CrawlConfig,
    extractor: RowExtractor,
    chain: StrategyChain,
}

impl Paginator {
    /// Create a paginator with the strategy chain named in `config`.
    pub fn new(config: CrawlConfig) -> Result<Self> {
        let chain = StrategyChain::from_config(&config)?;
        Self::with_chain(config, chain)
    }

    /// Create a paginator with an explicit strategy chain.
    pub fn with_chain(config: CrawlConfig, chain: StrategyChain) -> Result<Self> {
        if chain.is_empty() {
            return Err(CsIndexError::config("no advance strategy configured"));
        }
        let extractor = RowExtractor::new(&config.selectors, config.min_cells)?;
        Ok(Self {
            config,
            extractor,
            chain,
        })
    }

    /// Page through the table until a terminal state is reached.
    #[instrument(skip_all, fields(max_pages = self.config.max_pages))]
    pub async fn run(&self, page: &dyn TablePage, progress: &dyn CrawlProgress) -> PaginationOutcome {
        let mut batches: Vec<PageBatch> = Vec::new();
        let mut total = 0usize;
        let mut current: u32 = 1;
        let mut pages_reached: u32 = 0;

        info!(
            strategies = ?self.chain.names(),
            verify = self.config.verify_advance,
            "starting pagination"
        );

        let stop = loop {
            if current > self.config.max_pages {
                info!(max_pages = self.config.max_pages, "page cap reached");
                break CrawlStop::MaxPagesReached;
            }

            let rows = self.read_rows(page, current).await;
            pages_reached = current;

            if rows.is_empty() {
                warn!(page = current, "no rows extracted");
            } else {
                if batches.last().is_some_and(|last| last.rows == rows) {
                    info!(page = current, "page repeats the previous one, stopping");
                    break CrawlStop::RepeatDetected;
                }
                total += rows.len();
                debug!(page = current, rows = rows.len(), total, "page extracted");
                batches.push(PageBatch {
                    page: current,
                    rows: rows.clone(),
                });
            }
            progress.page_scraped(current, rows.len(), total);

            match self.advance(page, current, &rows).await {
                Some(strategy) => {
                    current += 1;
                    progress.advanced(current, strategy);
                }
                None => {
                    info!(page = current, "no strategy could advance, stopping");
                    break CrawlStop::Exhausted;
                }
            }
        };

        info!(
            pages = pages_reached,
            batches = batches.len(),
            rows = total,
            %stop,
            "pagination finished"
        );

        PaginationOutcome {
            batches,
            pages_reached,
            stop,
        }
    }

    /// Extract the visible rows; a failed read counts as an empty page.
    async fn read_rows(&self, page: &dyn TablePage, current: u32) -> Vec<RawRow> {
        match page.rendered_html().await {
            Ok(html) => self.extractor.extract(&html),
            Err(e) => {
                warn!(page = current, error = %e, "table extraction failed");
                Vec::new()
            }
        }
    }

    /// Try each strategy in order and return the name of the first that
    /// advanced the table.
    async fn advance(&self, page: &dyn TablePage, current: u32, before: &[RawRow]) -> Option<&str> {
        for strategy in self.chain.iter() {
            let name = strategy.name();

            match strategy.attempt(page, current).await {
                Ok(true) => {}
                Ok(false) => {
                    debug!(strategy = name, page = current, "strategy not applicable");
                    continue;
                }
                Err(e) => {
                    warn!(strategy = name, page = current, error = %e, "strategy failed");
                    continue;
                }
            }

            if !strategy.settles_itself() {
                page.wait(self.config.advance_wait).await;
            }

            if self.config.verify_advance {
                let after = self.read_rows(page, current + 1).await;
                if after == before {
                    warn!(strategy = name, page = current, "table unchanged after advance");
                    continue;
                }
            }

            debug!(strategy = name, page = current + 1, "advanced");
            return Some(name);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::strategies::AdvanceStrategy;
    use crate::testing::{Controls, FakePage, row};
    use csindex_shared::AppConfig;

    /// Submits `current + 2` to the page jumper.
    struct SkipOne;

    #[async_trait]
    impl AdvanceStrategy for SkipOne {
        fn name(&self) -> &str {
            "skip-one"
        }

        async fn attempt(&self, page: &dyn TablePage, current: u32) -> Result<bool> {
            page.set_input_and_submit(".ivu-page-options input", &(current + 2).to_string())
                .await
        }
    }

    fn config() -> CrawlConfig {
        CrawlConfig::from(&AppConfig::default())
    }

    fn page_rows(page: usize, n: usize) -> Vec<RawRow> {
        (0..n)
            .map(|i| row(&format!("9{page:02}{i:03}指数{page}-{i}")))
            .collect()
    }

    async fn run(page: &FakePage, config: CrawlConfig) -> PaginationOutcome {
        Paginator::new(config)
            .expect("paginator")
            .run(page, &SilentProgress)
            .await
    }

    #[tokio::test]
    async fn stops_when_no_strategy_advances() {
        let page = FakePage::with_next_button(vec![page_rows(1, 3), page_rows(2, 3), page_rows(3, 2)]);
        let outcome = run(&page, config()).await;

        assert_eq!(outcome.stop, CrawlStop::Exhausted);
        assert_eq!(outcome.pages_reached, 3);
        assert_eq!(outcome.batches.len(), 3);
        assert_eq!(outcome.batches[2].page, 3);
        assert_eq!(outcome.into_rows().len(), 8);
    }

    #[tokio::test]
    async fn repeated_page_is_not_appended() {
        let mut config = config();
        config.verify_advance = false;
        config.strategies = vec!["next-button".into()];
        let controls = Controls {
            next_button: true,
            ..Controls::default()
        };
        let page = FakePage::new(vec![page_rows(1, 2), page_rows(2, 2), page_rows(2, 2)], controls);

        let outcome = run(&page, config).await;
        assert_eq!(outcome.stop, CrawlStop::RepeatDetected);
        assert_eq!(outcome.pages_reached, 3);
        assert_eq!(outcome.batches.len(), 2);
    }

    #[tokio::test]
    async fn page_cap_is_honoured() {
        let mut config = config();
        config.max_pages = 2;
        let pages = (1..=5).map(|p| page_rows(p, 1)).collect();
        let page = FakePage::with_next_button(pages);

        let outcome = run(&page, config).await;
        assert_eq!(outcome.stop, CrawlStop::MaxPagesReached);
        assert_eq!(outcome.pages_reached, 2);
        assert_eq!(outcome.batches.len(), 2);
    }

    #[tokio::test]
    async fn unverified_success_falls_through() {
        // The next control claims success without changing the table; the
        // jumper input does the real work.
        let controls = Controls {
            next_button: true,
            stuck: true,
            page_input: true,
            ..Controls::default()
        };
        let page = FakePage::new(vec![page_rows(1, 2), page_rows(2, 2), page_rows(3, 2)], controls);

        let outcome = run(&page, config()).await;
        assert_eq!(outcome.stop, CrawlStop::Exhausted);
        assert_eq!(outcome.batches.len(), 3);
        assert!(page.actions().contains(&"set_input 2".to_string()));
        assert!(page.actions().contains(&"set_input 3".to_string()));
        // The scroll fallback was tried on the last page and rejected too
        assert!(page.actions().contains(&"scroll Top".to_string()));
    }

    #[tokio::test]
    async fn settle_wait_follows_each_click() {
        let mut config = config();
        config.strategies = vec!["next-button".into()];
        let page = FakePage::with_next_button(vec![page_rows(1, 1), page_rows(2, 1)]);

        run(&page, config).await;
        let actions = page.actions();
        assert_eq!(actions[0], "click_nth .ivu-page-next 0");
        assert_eq!(actions[1], "wait 5000");
    }

    #[tokio::test]
    async fn empty_page_is_skipped_but_crawl_continues() {
        let page = FakePage::with_next_button(vec![page_rows(1, 2), Vec::new(), page_rows(3, 2)]);
        let outcome = run(&page, config()).await;

        assert_eq!(outcome.batches.len(), 2);
        assert_eq!(outcome.batches[1].page, 3);
        assert_eq!(outcome.pages_reached, 3);
    }

    #[tokio::test]
    async fn broken_page_yields_nothing() {
        let controls = Controls {
            next_button: true,
            broken: true,
            ..Controls::default()
        };
        let page = FakePage::new(vec![page_rows(1, 2)], controls);
        let outcome = run(&page, config()).await;

        assert_eq!(outcome.stop, CrawlStop::Exhausted);
        assert!(outcome.batches.is_empty());
        assert_eq!(outcome.pages_reached, 1);
    }

    #[tokio::test]
    async fn explicit_chain_replaces_configured_one() {
        let controls = Controls {
            page_input: true,
            ..Controls::default()
        };
        let pages = (1..=5).map(|p| page_rows(p, 1)).collect();
        let page = FakePage::new(pages, controls);
        let chain = StrategyChain::new(vec![Box::new(SkipOne)]);
        assert_eq!(chain.len(), 1);

        let outcome = Paginator::with_chain(config(), chain)
            .expect("paginator")
            .run(&page, &SilentProgress)
            .await;

        assert_eq!(outcome.stop, CrawlStop::Exhausted);
        let rows: Vec<Vec<RawRow>> = outcome.batches.iter().map(|b| b.rows.clone()).collect();
        assert_eq!(rows, vec![page_rows(1, 1), page_rows(3, 1), page_rows(4, 1), page_rows(5, 1)]);
        assert_eq!(page.actions()[0], "set_input 3");
        // The configured next button is never touched
        assert!(!page.actions().iter().any(|a| a.starts_with("click_nth")));
    }

    #[test]
    fn empty_chain_is_rejected() {
        let err = Paginator::with_chain(config(), StrategyChain::new(Vec::new())).err().unwrap();
        assert!(matches!(err, CsIndexError::Config { .. }));
    }
}
