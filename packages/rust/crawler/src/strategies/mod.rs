//! Page-advance strategies and the ordered chain that tries them.
//!
//! Each strategy is one way of making the table show its next page. The
//! paginator walks the chain in order until one of them succeeds.

mod next_button;
mod next_text;
mod page_input;
mod page_number;
mod scroll;

use async_trait::async_trait;

use csindex_shared::{CrawlConfig, CsIndexError, Result, STRATEGY_NAMES};

use crate::page::TablePage;

pub use next_button::NextButton;
pub use next_text::NextText;
pub use page_input::PageInput;
pub use page_number::PageNumber;
pub use scroll::Scroll;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// One method of advancing the paginated table.
#[async_trait]
pub trait AdvanceStrategy: Send + Sync {
    /// Configuration name, also used for tracing.
    fn name(&self) -> &str;

    /// Try to move from page `current` (1-based) to the next one.
    ///
    /// `Ok(false)` means the control was absent or unusable.
    async fn attempt(&self, page: &dyn TablePage, current: u32) -> Result<bool>;

    /// The strategy waits on its own, so the paginator skips its settle time.
    fn settles_itself(&self) -> bool {
        false
    }
}

// ---------------------------------------------------------------------------
// Chain
// ---------------------------------------------------------------------------

/// Strategies in the order they are tried.
pub struct StrategyChain {
    strategies: Vec<Box<dyn AdvanceStrategy>>,
}

impl StrategyChain {
    /// Build the chain named by `config.strategies`.
    pub fn from_config(config: &CrawlConfig) -> Result<Self> {
        if config.strategies.is_empty() {
            return Err(CsIndexError::config("no advance strategy configured"));
        }

        let selectors = &config.selectors;
        let strategies = config
            .strategies
            .iter()
            .map(|name| -> Result<Box<dyn AdvanceStrategy>> {
                let strategy: Box<dyn AdvanceStrategy> = match name.as_str() {
                    "next-button" => Box::new(NextButton::new(&selectors.next_button)),
                    "next-text" => Box::new(NextText::new(
                        &selectors.text_button,
                        &selectors.next_text,
                    )),
                    "page-number" => Box::new(PageNumber::new(&selectors.page_items)),
                    "page-input" => Box::new(PageInput::new(&selectors.page_input)),
                    "scroll" => Box::new(Scroll::new(config.scroll_pauses)),
                    other => {
                        return Err(CsIndexError::config(format!(
                            "unknown advance strategy '{other}' (expected one of: {})",
                            STRATEGY_NAMES.join(", ")
                        )));
                    }
                };
                Ok(strategy)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { strategies })
    }

    /// Chain over an explicit list.
    pub fn new(strategies: Vec<Box<dyn AdvanceStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn AdvanceStrategy> {
        self.strategies.iter().map(|s| s.as_ref())
    }

    pub fn names(&self) -> Vec<&str> {
        self.iter().map(|s| s.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}
