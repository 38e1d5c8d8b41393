//! The slice of a rendered page the paginator needs.

use std::time::Duration;

use async_trait::async_trait;

use csindex_shared::Result;

/// Scroll destination of [`TablePage::scroll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollTarget {
    Top,
    Bottom,
}

/// A live page showing the paginated index table.
///
/// Element lookups take CSS selectors. Methods returning `bool` report
/// whether the target element was found and acted on; `Err` is reserved for
/// transport failures.
#[async_trait]
pub trait TablePage: Send + Sync {
    /// Serialized DOM of the current document.
    async fn rendered_html(&self) -> Result<String>;

    /// First match exists, is visible and is not disabled.
    async fn is_actionable(&self, selector: &str) -> Result<bool>;

    /// Number of elements matching `selector`.
    async fn count(&self, selector: &str) -> Result<usize>;

    /// Click the `index`-th (0-based) match.
    async fn click_nth(&self, selector: &str, index: usize) -> Result<bool>;

    /// Click the first visible, enabled match whose text contains `text`.
    async fn click_by_text(&self, selector: &str, text: &str) -> Result<bool>;

    /// Set the first matching input to `value`, then fire `input` and an
    /// Enter `keydown`.
    async fn set_input_and_submit(&self, selector: &str, value: &str) -> Result<bool>;

    async fn scroll(&self, target: ScrollTarget) -> Result<()>;

    /// Fixed settle time.
    async fn wait(&self, duration: Duration);
}
