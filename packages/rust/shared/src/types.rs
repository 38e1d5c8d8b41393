//! Core domain types for the index list.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Column names of the rendered index table, in display order.
pub const TABLE_COLUMNS: [&str; 10] = [
    "指数代码名称",
    "样本数量",
    "最新收盘",
    "近1个月收益率(%)",
    "资产类别",
    "指数热点",
    "指数币种",
    "合作指数",
    "指数类别",
    "发布时间",
];

/// Derived column holding the split-out index code.
pub const CODE_COLUMN: &str = "指数代码";

/// Derived column holding the split-out index name.
pub const NAME_COLUMN: &str = "指数名称";

/// Cell texts of one table row, before any field mapping.
pub type RawRow = Vec<String>;

// ---------------------------------------------------------------------------
// PageBatch
// ---------------------------------------------------------------------------

/// Rows extracted from one rendered page of the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageBatch {
    /// 1-based page counter at extraction time.
    pub page: u32,
    /// Rows in display order.
    pub rows: Vec<RawRow>,
}

// ---------------------------------------------------------------------------
// IndexRecord
// ---------------------------------------------------------------------------

/// One structured row of the index list.
///
/// Serialized with the table's own column names so the structured dump
/// reads like the source page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRecord {
    /// Raw "code+name" label as scraped; the deduplication key.
    #[serde(rename = "指数代码名称")]
    pub label: String,
    #[serde(rename = "样本数量")]
    pub sample_count: String,
    #[serde(rename = "最新收盘")]
    pub latest_close: String,
    #[serde(rename = "近1个月收益率(%)")]
    pub one_month_return: String,
    #[serde(rename = "资产类别")]
    pub asset_class: String,
    #[serde(rename = "指数热点")]
    pub hotspot: String,
    #[serde(rename = "指数币种")]
    pub currency: String,
    #[serde(rename = "合作指数")]
    pub cooperation: String,
    #[serde(rename = "指数类别")]
    pub classification: String,
    #[serde(rename = "发布时间")]
    pub publish_date: String,
    /// Leading digit run of the label (at least 6 digits).
    #[serde(rename = "指数代码")]
    pub code: String,
    /// Remainder of the label, trimmed.
    #[serde(rename = "指数名称")]
    pub name: String,
}

impl IndexRecord {
    /// Field values in [`IndexRecord::headers`] order.
    pub fn values(&self) -> [&str; 12] {
        [
            self.label.as_str(),
            self.sample_count.as_str(),
            self.latest_close.as_str(),
            self.one_month_return.as_str(),
            self.asset_class.as_str(),
            self.hotspot.as_str(),
            self.currency.as_str(),
            self.cooperation.as_str(),
            self.classification.as_str(),
            self.publish_date.as_str(),
            self.code.as_str(),
            self.name.as_str(),
        ]
    }

    /// The table columns followed by the derived code and name columns.
    pub fn headers() -> Vec<String> {
        TABLE_COLUMNS
            .iter()
            .chain([CODE_COLUMN, NAME_COLUMN].iter())
            .map(|s| s.to_string())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// CrawlResult
// ---------------------------------------------------------------------------

/// Why the pagination loop stopped. Callers treat every variant alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrawlStop {
    /// No advance strategy succeeded.
    Exhausted,
    /// The new batch equals the previous one.
    RepeatDetected,
    /// The page counter passed the configured cap.
    MaxPagesReached,
}

impl std::fmt::Display for CrawlStop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Exhausted => "exhausted",
            Self::RepeatDetected => "repeat detected",
            Self::MaxPagesReached => "max pages reached",
        };
        f.write_str(s)
    }
}

/// Accumulated output of a browser crawl.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlResult {
    /// Every accumulated row, including rows dropped from `records`.
    pub raw_rows: Vec<RawRow>,
    /// Structured, deduplicated records in first-seen order.
    pub records: Vec<IndexRecord>,
    /// Page counter when crawling stopped.
    pub pages_reached: u32,
    /// Terminal state of the pagination loop.
    pub stop: CrawlStop,
}

impl CrawlResult {
    /// An empty result, used when the crawl could not run at all.
    pub fn empty() -> Self {
        Self {
            raw_rows: Vec::new(),
            records: Vec::new(),
            pages_reached: 0,
            stop: CrawlStop::Exhausted,
        }
    }

    pub fn raw_count(&self) -> usize {
        self.raw_rows.len()
    }

    pub fn structured_count(&self) -> usize {
        self.records.len()
    }
}

// ---------------------------------------------------------------------------
// Sheet
// ---------------------------------------------------------------------------

/// One spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl Cell {
    /// Text as it appears in the rendered sheet; empty for [`Cell::Empty`].
    pub fn render(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => n.to_string(),
            Cell::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.is_empty(),
            _ => false,
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

/// A rectangular table with one header row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Position of a header, if present.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cells of one column, top to bottom (missing cells read as empty).
    pub fn column(&self, index: usize) -> impl Iterator<Item = &Cell> {
        static EMPTY: Cell = Cell::Empty;
        self.rows
            .iter()
            .map(move |row| row.get(index).unwrap_or(&EMPTY))
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl From<&[IndexRecord]> for Sheet {
    fn from(records: &[IndexRecord]) -> Self {
        let mut sheet = Sheet::new(IndexRecord::headers());
        sheet.rows = records
            .iter()
            .map(|r| r.values().iter().map(|v| Cell::from(*v)).collect())
            .collect();
        sheet
    }
}
