//! Parsing and column normalization of the exported index workbook.

use std::io::Cursor;

use calamine::{Data, Reader, Xlsx, open_workbook_from_rs};
use chrono::{NaiveDate, NaiveDateTime};
use tracing::debug;

use csindex_shared::{CODE_COLUMN, Cell, CsIndexError, Result, Sheet};

/// Columns converted to calendar dates.
pub const DATE_COLUMNS: [&str; 2] = ["基日", "发布时间"];

/// Width the index code is left-padded to.
pub const CODE_WIDTH: usize = 6;

/// Read the first worksheet of an `.xlsx` payload. The first row is the header.
pub fn parse_workbook(bytes: &[u8]) -> Result<Sheet> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))
        .map_err(|e| CsIndexError::parse(format!("response is not a readable workbook: {e}")))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| CsIndexError::parse("workbook has no worksheet"))?
        .map_err(|e| CsIndexError::parse(format!("failed to read worksheet: {e}")))?;

    let mut rows = range.rows();
    let header_row = rows
        .next()
        .ok_or_else(|| CsIndexError::parse("worksheet is empty"))?;

    let mut sheet = Sheet::new(
        header_row
            .iter()
            .map(|c| c.to_string().trim().to_string())
            .collect(),
    );
    sheet.rows = rows.map(|row| row.iter().map(cell_from_data).collect()).collect();

    debug!(
        rows = sheet.rows.len(),
        columns = sheet.headers.len(),
        "workbook parsed"
    );
    Ok(sheet)
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(d) => Cell::Date(d.date()),
            None => Cell::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        other => {
            debug!(value = ?other, "unsupported cell value read as empty");
            Cell::Empty
        }
    }
}

/// Type the date columns and pad the code column.
///
/// A date cell that cannot be parsed becomes empty; a missing column is an error.
pub fn normalize(mut sheet: Sheet) -> Result<Sheet> {
    for name in DATE_COLUMNS {
        let idx = require_column(&sheet, name)?;
        let mut unparsed = 0usize;
        for row in &mut sheet.rows {
            if let Some(cell) = row.get_mut(idx) {
                let was_empty = cell.is_empty();
                *cell = to_date(cell);
                if !was_empty && cell.is_empty() {
                    unparsed += 1;
                }
            }
        }
        if unparsed > 0 {
            debug!(column = name, unparsed, "unparseable dates set to empty");
        }
    }

    let idx = require_column(&sheet, CODE_COLUMN)?;
    for row in &mut sheet.rows {
        if let Some(cell) = row.get_mut(idx) {
            *cell = pad_code(cell);
        }
    }

    Ok(sheet)
}

fn require_column(sheet: &Sheet, name: &str) -> Result<usize> {
    sheet
        .column_index(name)
        .ok_or_else(|| CsIndexError::validation(format!("workbook has no '{name}' column")))
}

fn to_date(cell: &Cell) -> Cell {
    match cell {
        Cell::Date(d) => Cell::Date(*d),
        Cell::Text(s) => parse_date(s).map(Cell::Date).unwrap_or(Cell::Empty),
        _ => Cell::Empty,
    }
}

/// Parse `YYYY-MM-DD`, also accepting an ISO datetime with a zero-padded date part.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
                .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
                .ok()
                .map(|dt| dt.date())
        })
}

fn pad_code(cell: &Cell) -> Cell {
    let raw = match cell {
        Cell::Empty => return Cell::Empty,
        Cell::Number(n) if n.fract() == 0.0 => format!("{}", *n as i64),
        other => other.render().trim().to_string(),
    };
    Cell::Text(zero_pad(&raw))
}

/// Left-pad with `0` to [`CODE_WIDTH`] characters.
pub fn zero_pad(code: &str) -> String {
    format!("{code:0>width$}", width = CODE_WIDTH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};

    /// Build a payload shaped like the provider's export.
    fn export_payload() -> Vec<u8> {
        let mut workbook = Workbook::new();
        let ws = workbook.add_worksheet();
        let date_format = Format::new().set_num_format("yyyy-mm-dd");

        for (col, h) in ["指数代码", "指数简称", "基日", "发布时间", "样本数量"]
            .iter()
            .enumerate()
        {
            ws.write_string(0, col as u16, *h).unwrap();
        }

        ws.write_number(1, 0, 1).unwrap();
        ws.write_string(1, 1, "上证指数").unwrap();
        ws.write_string(1, 2, "1990-12-19").unwrap();
        let published = ExcelDateTime::from_ymd(1991, 7, 15).unwrap();
        ws.write_datetime_with_format(1, 3, &published, &date_format)
            .unwrap();
        ws.write_number(1, 4, 1700).unwrap();

        ws.write_string(2, 0, "931234").unwrap();
        ws.write_string(2, 1, "中证新指数").unwrap();
        ws.write_string(2, 2, "--").unwrap();
        ws.write_string(2, 3, "2024-02-30").unwrap();
        ws.write_number(2, 4, 50).unwrap();

        workbook.save_to_buffer().unwrap()
    }

    #[test]
    fn parses_header_and_rows() {
        let sheet = parse_workbook(&export_payload()).expect("parse");
        assert_eq!(sheet.headers[0], "指数代码");
        assert_eq!(sheet.headers.len(), 5);
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[0][1], Cell::Text("上证指数".into()));
        assert_eq!(sheet.rows[0][4], Cell::Number(1700.0));
    }

    #[test]
    fn normalizes_dates_and_codes() {
        let sheet = normalize(parse_workbook(&export_payload()).unwrap()).expect("normalize");

        assert_eq!(sheet.rows[0][0], Cell::Text("000001".into()));
        assert_eq!(sheet.rows[1][0], Cell::Text("931234".into()));

        assert_eq!(
            sheet.rows[0][2],
            Cell::Date(NaiveDate::from_ymd_opt(1990, 12, 19).unwrap())
        );
        assert_eq!(
            sheet.rows[0][3],
            Cell::Date(NaiveDate::from_ymd_opt(1991, 7, 15).unwrap())
        );

        // Unparseable dates become empty instead of failing the parse
        assert_eq!(sheet.rows[1][2], Cell::Empty);
        assert_eq!(sheet.rows[1][3], Cell::Empty);
    }

    #[test]
    fn missing_column_is_an_error() {
        let mut sheet = Sheet::new(vec!["指数代码".into(), "基日".into()]);
        sheet.rows.push(vec![Cell::from("1"), Cell::from("2020-01-01")]);
        let err = normalize(sheet).unwrap_err();
        assert!(err.to_string().contains("发布时间"));
    }

    #[test]
    fn garbage_payload_is_a_parse_error() {
        let err = parse_workbook(b"<html>maintenance</html>").unwrap_err();
        assert!(matches!(err, CsIndexError::Parse { .. }));
    }

    #[test]
    fn zero_pad_codes() {
        assert_eq!(zero_pad("1"), "000001");
        assert_eq!(zero_pad("000300"), "000300");
        assert_eq!(zero_pad("H30533"), "H30533");
        assert_eq!(zero_pad("9312345"), "9312345");
        assert_eq!(pad_code(&Cell::Number(905.0)), Cell::Text("000905".into()));
        assert_eq!(pad_code(&Cell::Empty), Cell::Empty);
    }

    #[test]
    fn parse_date_forms() {
        let d = NaiveDate::from_ymd_opt(2004, 12, 31).unwrap();
        assert_eq!(parse_date("2004-12-31"), Some(d));
        assert_eq!(parse_date(" 2004-12-31 "), Some(d));
        assert_eq!(parse_date("2004-12-31T00:00:00"), Some(d));
        assert_eq!(parse_date("2004/12/31"), None);
        assert_eq!(parse_date(""), None);
    }
}
