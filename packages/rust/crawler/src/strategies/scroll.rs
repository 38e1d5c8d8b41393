//! Scroll fallback for lazily loaded tables.

use std::time::Duration;

use async_trait::async_trait;

use csindex_shared::Result;

use super::AdvanceStrategy;
use crate::page::{ScrollTarget, TablePage};

/// Scrolls to the bottom, the top and the bottom again, pausing after each.
///
/// Always reports success; only verification can tell whether new rows
/// arrived.
pub struct Scroll {
    pauses: [Duration; 3],
}

impl Scroll {
    pub fn new(pauses: [Duration; 3]) -> Self {
        Self { pauses }
    }
}

#[async_trait]
impl AdvanceStrategy for Scroll {
    fn name(&self) -> &str {
        "scroll"
    }

    fn settles_itself(&self) -> bool {
        true
    }

    async fn attempt(&self, page: &dyn TablePage, _current: u32) -> Result<bool> {
        let moves = [ScrollTarget::Bottom, ScrollTarget::Top, ScrollTarget::Bottom];
        for (target, pause) in moves.into_iter().zip(self.pauses) {
            page.scroll(target).await?;
            page.wait(pause).await;
        }
        Ok(true)
    }
}
