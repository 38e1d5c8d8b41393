//! Dedicated "next page" control of the pager.

use async_trait::async_trait;
use tracing::debug;

use csindex_shared::Result;

use super::AdvanceStrategy;
use crate::page::TablePage;

/// Clicks the pager's next control when it is visible and enabled.
pub struct NextButton {
    selector: String,
}

impl NextButton {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
        }
    }
}

#[async_trait]
impl AdvanceStrategy for NextButton {
    fn name(&self) -> &str {
        "next-button"
    }

    async fn attempt(&self, page: &dyn TablePage, _current: u32) -> Result<bool> {
        if !page.is_actionable(&self.selector).await? {
            debug!(selector = %self.selector, "next control hidden or disabled");
            return Ok(false);
        }
        page.click_nth(&self.selector, 0).await
    }
}
