//! Any button labelled as the next page.

use async_trait::async_trait;

use csindex_shared::Result;

use super::AdvanceStrategy;
use crate::page::TablePage;

/// Clicks a button whose visible text contains the "next page" label.
pub struct NextText {
    selector: String,
    text: String,
}

impl NextText {
    pub fn new(selector: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            text: text.into(),
        }
    }
}

#[async_trait]
impl AdvanceStrategy for NextText {
    fn name(&self) -> &str {
        "next-text"
    }

    async fn attempt(&self, page: &dyn TablePage, _current: u32) -> Result<bool> {
        page.click_by_text(&self.selector, &self.text).await
    }
}
