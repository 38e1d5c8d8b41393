//! Row extraction from the rendered table.

use scraper::{Html, Selector};
use tracing::debug;

use csindex_shared::{CsIndexError, RawRow, Result, SelectorsConfig};

/// Pulls cell texts out of the table's body rows.
#[derive(Debug, Clone)]
pub struct RowExtractor {
    rows: Selector,
    cells: Selector,
    min_cells: usize,
}

impl RowExtractor {
    /// Rows are selected with `"<table> <rows>"`; rows with fewer than
    /// `min_cells` cells are dropped.
    pub fn new(selectors: &SelectorsConfig, min_cells: usize) -> Result<Self> {
        let row_selector = format!("{} {}", selectors.table, selectors.rows);
        let rows = Selector::parse(&row_selector).map_err(|e| {
            CsIndexError::config(format!("invalid row selector '{row_selector}': {e}"))
        })?;
        let cells = Selector::parse("td")
            .map_err(|e| CsIndexError::config(format!("invalid cell selector: {e}")))?;

        Ok(Self {
            rows,
            cells,
            min_cells,
        })
    }

    /// Extract rows from a full HTML document, in display order.
    pub fn extract(&self, html: &str) -> Vec<RawRow> {
        let doc = Html::parse_document(html);
        let mut dropped = 0usize;

        let rows: Vec<RawRow> = doc
            .select(&self.rows)
            .filter_map(|row| {
                let cells: RawRow = row
                    .select(&self.cells)
                    .map(|td| td.text().collect::<String>().trim().to_string())
                    .collect();
                if cells.len() < self.min_cells {
                    dropped += 1;
                    None
                } else {
                    Some(cells)
                }
            })
            .collect();

        if dropped > 0 {
            debug!(dropped, kept = rows.len(), "short rows discarded");
        }
        rows
    }
}
