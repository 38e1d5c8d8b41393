//! In-memory [`TablePage`] used by the pagination tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use csindex_shared::{CsIndexError, RawRow, Result, SelectorsConfig};

use crate::page::{ScrollTarget, TablePage};

/// A full 10-cell row whose label is `label`.
pub(crate) fn row(label: &str) -> RawRow {
    let mut cells = vec![label.to_string()];
    cells.extend(
        ["50", "1000.00", "0.50", "股票", "", "人民币", "否", "规模", "2020-01-01"]
            .iter()
            .map(|s| s.to_string()),
    );
    cells
}

/// Render rows the way the list page lays out its table.
pub(crate) fn table_html(rows: &[RawRow]) -> String {
    let body: String = rows
        .iter()
        .map(|r| {
            let cells: String = r
                .iter()
                .map(|c| format!("<td><div class=\"ivu-table-cell\">{c}</div></td>"))
                .collect();
            format!("<tr class=\"ivu-table-row\">{cells}</tr>")
        })
        .collect();
    format!(
        "<html><body><div class=\"ivu-table\"><div class=\"ivu-table-body\">\
         <table><tbody>{body}</tbody></table></div></div></body></html>"
    )
}

/// Which advance controls the fake page answers to.
#[derive(Debug, Clone, Default)]
pub(crate) struct Controls {
    pub next_button: bool,
    pub next_text: bool,
    pub page_items: usize,
    pub page_input: bool,
    /// The next button reports a click but the table never changes.
    pub stuck: bool,
    /// Every DOM read fails.
    pub broken: bool,
}

pub(crate) struct FakePage {
    pages: Vec<String>,
    current: AtomicUsize,
    controls: Controls,
    selectors: SelectorsConfig,
    actions: Mutex<Vec<String>>,
}

impl FakePage {
    pub fn new(pages: Vec<Vec<RawRow>>, controls: Controls) -> Self {
        Self {
            pages: pages.iter().map(|rows| table_html(rows)).collect(),
            current: AtomicUsize::new(0),
            controls,
            selectors: SelectorsConfig::default(),
            actions: Mutex::new(Vec::new()),
        }
    }

    /// Pages served when only the next button works.
    pub fn with_next_button(pages: Vec<Vec<RawRow>>) -> Self {
        Self::new(
            pages,
            Controls {
                next_button: true,
                ..Controls::default()
            },
        )
    }

    pub fn actions(&self) -> Vec<String> {
        self.actions.lock().unwrap().clone()
    }

    pub fn current(&self) -> usize {
        self.current.load(Ordering::SeqCst)
    }

    fn record(&self, action: impl Into<String>) {
        self.actions.lock().unwrap().push(action.into());
    }

    fn has_next(&self) -> bool {
        self.current() + 1 < self.pages.len()
    }

    fn go_to(&self, index: usize) -> bool {
        if index < self.pages.len() {
            self.current.store(index, Ordering::SeqCst);
            true
        } else {
            false
        }
    }

    fn check(&self) -> Result<()> {
        if self.controls.broken {
            Err(CsIndexError::Browser("target closed".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl TablePage for FakePage {
    async fn rendered_html(&self) -> Result<String> {
        self.check()?;
        Ok(self.pages.get(self.current()).cloned().unwrap_or_default())
    }

    async fn is_actionable(&self, selector: &str) -> Result<bool> {
        self.check()?;
        Ok(selector == self.selectors.next_button
            && self.controls.next_button
            && (self.has_next() || self.controls.stuck))
    }

    async fn count(&self, selector: &str) -> Result<usize> {
        self.check()?;
        if selector == self.selectors.page_items {
            Ok(self.controls.page_items)
        } else {
            Ok(0)
        }
    }

    async fn click_nth(&self, selector: &str, index: usize) -> Result<bool> {
        self.check()?;
        self.record(format!("click_nth {selector} {index}"));
        if selector == self.selectors.next_button {
            if !self.controls.stuck {
                self.go_to(self.current() + 1);
            }
            return Ok(true);
        }
        if selector == self.selectors.page_items && index < self.controls.page_items {
            return Ok(self.go_to(index));
        }
        Ok(false)
    }

    async fn click_by_text(&self, _selector: &str, text: &str) -> Result<bool> {
        self.check()?;
        self.record(format!("click_by_text {text}"));
        Ok(self.controls.next_text && self.go_to(self.current() + 1))
    }

    async fn set_input_and_submit(&self, _selector: &str, value: &str) -> Result<bool> {
        self.check()?;
        self.record(format!("set_input {value}"));
        if !self.controls.page_input {
            return Ok(false);
        }
        let target: usize = value.parse().unwrap_or(0);
        self.go_to(target.saturating_sub(1));
        Ok(true)
    }

    async fn scroll(&self, target: ScrollTarget) -> Result<()> {
        self.check()?;
        self.record(format!("scroll {target:?}"));
        Ok(())
    }

    async fn wait(&self, duration: Duration) {
        self.record(format!("wait {}", duration.as_millis()));
    }
}
