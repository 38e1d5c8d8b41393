//! Numbered page items of the pager.

use async_trait::async_trait;
use tracing::debug;

use csindex_shared::Result;

use super::AdvanceStrategy;
use crate::page::TablePage;

/// Clicks the page item following the current page.
///
/// Item `n` (0-based) is assumed to stand for page `n + 1`, so page `p`
/// advances by clicking item `p` when more than `p` items exist.
pub struct PageNumber {
    selector: String,
}

impl PageNumber {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
        }
    }
}

#[async_trait]
impl AdvanceStrategy for PageNumber {
    fn name(&self) -> &str {
        "page-number"
    }

    async fn attempt(&self, page: &dyn TablePage, current: u32) -> Result<bool> {
        let items = page.count(&self.selector).await?;
        let next = current as usize;
        debug!(items, next_item = next, "page items found");

        if items <= next {
            return Ok(false);
        }
        page.click_nth(&self.selector, next).await
    }
}
