//! Mapping of raw table rows to structured index records.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use csindex_shared::{IndexRecord, RawRow, TABLE_COLUMNS};

/// Leading run of at least six digits, then the name.
static CODE_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{6,})(.*)").expect("valid regex"));

/// Split a `"<code><name>"` label. The name is trimmed.
pub fn split_code_name(label: &str) -> Option<(String, String)> {
    CODE_NAME_RE.captures(label).map(|caps| {
        (
            caps[1].to_string(),
            caps.get(2)
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_default(),
        )
    })
}

/// Map one row; `None` unless it has exactly the table's columns and a
/// splittable label.
pub fn to_record(row: &RawRow) -> Option<IndexRecord> {
    let [
        label,
        sample_count,
        latest_close,
        one_month_return,
        asset_class,
        hotspot,
        currency,
        cooperation,
        classification,
        publish_date,
    ] = <&[String; TABLE_COLUMNS.len()]>::try_from(row.as_slice()).ok()?;

    let (code, name) = split_code_name(label)?;

    Some(IndexRecord {
        label: label.clone(),
        sample_count: sample_count.clone(),
        latest_close: latest_close.clone(),
        one_month_return: one_month_return.clone(),
        asset_class: asset_class.clone(),
        hotspot: hotspot.clone(),
        currency: currency.clone(),
        cooperation: cooperation.clone(),
        classification: classification.clone(),
        publish_date: publish_date.clone(),
        code,
        name,
    })
}

/// Map every convertible row, dropping the rest.
pub fn structure_rows(rows: &[RawRow]) -> Vec<IndexRecord> {
    let records: Vec<IndexRecord> = rows.iter().filter_map(to_record).collect();
    let dropped = rows.len() - records.len();
    if dropped > 0 {
        debug!(dropped, "rows without a code/name label left out of records");
    }
    records
}

/// Keep the first record for each raw label, preserving order.
pub fn dedup_by_label(records: Vec<IndexRecord>) -> Vec<IndexRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|r| seen.insert(r.label.clone()))
        .collect()
}
