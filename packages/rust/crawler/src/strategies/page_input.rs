//! Quick-jumper input of the pager.

use async_trait::async_trait;

use csindex_shared::Result;

use super::AdvanceStrategy;
use crate::page::TablePage;

/// Types the next page index into the jumper and submits it.
pub struct PageInput {
    selector: String,
}

impl PageInput {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
        }
    }
}

#[async_trait]
impl AdvanceStrategy for PageInput {
    fn name(&self) -> &str {
        "page-input"
    }

    async fn attempt(&self, page: &dyn TablePage, current: u32) -> Result<bool> {
        let target = (current + 1).to_string();
        page.set_input_and_submit(&self.selector, &target).await
    }
}
