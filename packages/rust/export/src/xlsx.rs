//! Spreadsheet writer with content-fitted column widths.
//!
//! Every sheet is written with a bold, frozen header row and left-aligned
//! body cells. Column widths follow the widest rendered cell, counting
//! non-ASCII characters as double width.

use std::path::{Path, PathBuf};

use chrono::{Datelike, Local, NaiveDate};
use rust_xlsxwriter::{ExcelDateTime, Format, FormatAlign, Workbook, Worksheet, XlsxError};
use tracing::{error, info, instrument};

use csindex_shared::{Cell, CsIndexError, ExportConfig, IndexRecord, Result, Sheet};

/// Margin and cap applied to computed column widths.
#[derive(Debug, Clone, Copy)]
pub struct WidthOptions {
    /// Added to the widest cell.
    pub margin: f64,
    /// Hard upper bound.
    pub cap: f64,
}

impl Default for WidthOptions {
    fn default() -> Self {
        Self {
            margin: 3.0,
            cap: 80.0,
        }
    }
}

impl From<&ExportConfig> for WidthOptions {
    fn from(config: &ExportConfig) -> Self {
        Self {
            margin: config.width_margin,
            cap: config.max_column_width,
        }
    }
}

/// Rendered width of `text`: 2 per non-ASCII character, 1 otherwise.
pub fn display_width(text: &str) -> usize {
    text.chars()
        .map(|c| if (c as u32) > 127 { 2 } else { 1 })
        .sum()
}

/// Width of every column, header included.
pub fn column_widths(sheet: &Sheet, opts: &WidthOptions) -> Vec<f64> {
    sheet
        .headers
        .iter()
        .enumerate()
        .map(|(i, header)| {
            let widest = sheet
                .column(i)
                .filter(|cell| !cell.is_empty())
                .map(|cell| display_width(&cell.render()))
                .chain(std::iter::once(display_width(header)))
                .max()
                .unwrap_or(0);
            (widest as f64 + opts.margin).min(opts.cap)
        })
        .collect()
}

/// Structured records as a sheet: the table columns, then code and name.
pub fn records_to_sheet(records: &[IndexRecord]) -> Sheet {
    Sheet::from(records)
}

/// `<prefix>_<YYYY-MM-DD>.xlsx`.
pub fn default_filename(prefix: &str, date: NaiveDate) -> String {
    format!("{prefix}_{}.xlsx", date.format("%Y-%m-%d"))
}

/// Write `sheet` to `path`, replacing any existing file.
#[instrument(skip_all, fields(path = %path.display(), rows = sheet.rows.len()))]
pub fn write_xlsx(sheet: &Sheet, path: &Path, opts: &WidthOptions) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| CsIndexError::io(parent, e))?;
    }

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    fill_worksheet(worksheet, sheet, opts).map_err(xlsx_error)?;

    workbook.save(path).map_err(xlsx_error)?;
    Ok(())
}

fn fill_worksheet(
    worksheet: &mut Worksheet,
    sheet: &Sheet,
    opts: &WidthOptions,
) -> std::result::Result<(), XlsxError> {
    let header_format = Format::new().set_bold();
    let body_format = Format::new().set_align(FormatAlign::Left);
    let date_format = Format::new()
        .set_align(FormatAlign::Left)
        .set_num_format("yyyy-mm-dd");

    for (col, header) in sheet.headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, header, &header_format)?;
    }

    for (r, row) in sheet.rows.iter().enumerate() {
        let row_num = (r + 1) as u32;
        for (c, cell) in row.iter().enumerate() {
            let col = c as u16;
            match cell {
                Cell::Empty => {
                    worksheet.write_blank(row_num, col, &body_format)?;
                }
                Cell::Text(s) => {
                    worksheet.write_string_with_format(row_num, col, s, &body_format)?;
                }
                Cell::Number(n) => {
                    worksheet.write_number_with_format(row_num, col, *n, &body_format)?;
                }
                Cell::Date(d) => {
                    let date =
                        ExcelDateTime::from_ymd(d.year() as u16, d.month() as u8, d.day() as u8)?;
                    worksheet.write_datetime_with_format(row_num, col, &date, &date_format)?;
                }
            }
        }
    }

    for (col, width) in column_widths(sheet, opts).into_iter().enumerate() {
        worksheet.set_column_width(col as u16, width)?;
    }

    worksheet.set_freeze_panes(1, 0)?;
    Ok(())
}

fn xlsx_error(e: XlsxError) -> CsIndexError {
    CsIndexError::Export(e.to_string())
}

/// Export `sheet` to a spreadsheet and return the written path.
///
/// Without `filename` the file is named after `prefix` and today's date and
/// placed in the configured output directory. An empty sheet writes nothing.
/// Failures are logged and reported as `None`.
pub fn export_sheet(
    sheet: &Sheet,
    filename: Option<&Path>,
    prefix: &str,
    config: &ExportConfig,
) -> Option<PathBuf> {
    info!(rows = sheet.rows.len(), columns = sheet.headers.len(), "exporting spreadsheet");

    if sheet.is_empty() {
        info!("no data to export");
        return None;
    }

    let path = match filename {
        Some(p) => p.to_path_buf(),
        None => config.path_for(&default_filename(prefix, Local::now().date_naive())),
    };

    match write_xlsx(sheet, &path, &WidthOptions::from(config)) {
        Ok(()) => {
            info!(
                path = %path.display(),
                rows = sheet.rows.len(),
                columns = sheet.headers.len(),
                "spreadsheet exported"
            );
            Some(path)
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "spreadsheet export failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    use calamine::{Data, Reader, Xlsx, open_workbook};
    use uuid::Uuid;

    fn temp_dir(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("csindex-{tag}-{}", Uuid::now_v7()))
    }

    fn archive_part(path: &Path, name: &str) -> String {
        let file = std::fs::File::open(path).expect("open archive");
        let mut archive = zip::ZipArchive::new(file).expect("read archive");
        let mut part = archive.by_name(name).expect("archive part");
        let mut xml = String::new();
        part.read_to_string(&mut xml).expect("utf-8 part");
        xml
    }

    fn sample_sheet() -> Sheet {
        let mut sheet = Sheet::new(vec!["指数代码".into(), "指数简称".into(), "基日".into()]);
        sheet.rows.push(vec![
            Cell::from("000001"),
            Cell::from("上证指数"),
            Cell::Date(NaiveDate::from_ymd_opt(1990, 12, 19).unwrap()),
        ]);
        sheet.rows.push(vec![Cell::from("000300"), Cell::from("沪深300"), Cell::Empty]);
        sheet
    }

    #[test]
    fn display_width_counts_cjk_double() {
        assert_eq!(display_width("abc"), 3);
        assert_eq!(display_width("沪深"), 4);
        assert_eq!(display_width("沪深300"), 7);
        assert_eq!(display_width(""), 0);
    }

    #[test]
    fn cjk_header_width() {
        let sheet = Sheet::new(vec!["指数名称".into()]);
        let widths = column_widths(&sheet, &WidthOptions::default());
        assert_eq!(widths, vec![11.0]);
    }

    #[test]
    fn widths_follow_widest_cell_and_cap() {
        let mut sheet = Sheet::new(vec!["a".into(), "b".into()]);
        sheet.rows.push(vec![Cell::from("中证全指"), Cell::from("x".repeat(200).as_str())]);
        let widths = column_widths(&sheet, &WidthOptions::default());
        assert_eq!(widths[0], 11.0);
        assert_eq!(widths[1], 80.0);

        let narrow = WidthOptions { margin: 1.0, cap: 5.0 };
        assert_eq!(column_widths(&sheet, &narrow), vec![5.0, 5.0]);
    }

    #[test]
    fn record_sheet_layout() {
        let sheet = records_to_sheet(&[]);
        assert_eq!(sheet.headers.len(), 12);
        assert_eq!(sheet.headers[11], "指数名称");

        // Mixed-width header: 6 CJK characters plus "1(%)"
        let widths = column_widths(&sheet, &WidthOptions::default());
        assert_eq!(widths[3], 19.0);
    }

    #[test]
    fn default_filename_embeds_date() {
        let date = NaiveDate::from_ymd_opt(2025, 8, 4).unwrap();
        assert_eq!(
            default_filename("1_中证指数列表", date),
            "1_中证指数列表_2025-08-04.xlsx"
        );
    }

    #[test]
    fn write_and_read_back() {
        let dir = temp_dir("xlsx");
        let path = dir.join("nested").join("out.xlsx");
        write_xlsx(&sample_sheet(), &path, &WidthOptions::default()).expect("write xlsx");

        let mut workbook: Xlsx<_> = open_workbook(&path).expect("open written workbook");
        let range = workbook
            .worksheet_range_at(0)
            .expect("first sheet")
            .expect("readable sheet");

        assert_eq!(range.get_size(), (3, 3));
        assert_eq!(range.get((0, 1)), Some(&Data::String("指数简称".into())));
        assert_eq!(range.get((2, 0)), Some(&Data::String("000300".into())));
        assert!(matches!(range.get((1, 2)), Some(Data::DateTime(_))));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn written_layout_freezes_header_and_aligns_body() {
        let dir = temp_dir("layout");
        let path = dir.join("layout.xlsx");
        // Widths 9, 11 and 13 keep the columns from merging into one range
        let mut sheet = Sheet::new(vec!["a".into(), "指数简称".into(), "基日".into()]);
        sheet.rows.push(vec![
            Cell::from("000001"),
            Cell::from("上证指数"),
            Cell::Date(NaiveDate::from_ymd_opt(1990, 12, 19).unwrap()),
        ]);
        assert_eq!(
            column_widths(&sheet, &WidthOptions::default()),
            vec![9.0, 11.0, 13.0]
        );
        write_xlsx(&sheet, &path, &WidthOptions::default()).expect("write xlsx");

        let sheet_xml = archive_part(&path, "xl/worksheets/sheet1.xml");
        assert!(sheet_xml.contains(r#"ySplit="1""#));
        assert!(sheet_xml.contains(r#"state="frozen""#));
        assert_eq!(sheet_xml.matches("<col ").count(), 3);
        assert_eq!(sheet_xml.matches(r#"customWidth="1""#).count(), 3);

        let styles_xml = archive_part(&path, "xl/styles.xml");
        assert!(styles_xml.contains(r#"<alignment horizontal="left"/>"#));
        assert!(styles_xml.contains("<b/>"));

        // Header and body cells use different styles
        let header_style = cell_style(&sheet_xml, "A1");
        let body_style = cell_style(&sheet_xml, "A2");
        assert_ne!(header_style, body_style);
        assert_eq!(body_style, cell_style(&sheet_xml, "B2"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    fn cell_style(sheet_xml: &str, cell: &str) -> Option<String> {
        let start = sheet_xml.find(&format!(r#"<c r="{cell}""#))?;
        let tag = &sheet_xml[start..start + sheet_xml[start..].find('>')?];
        let s = tag.find(r#" s=""#)? + 4;
        let len = tag[s..].find('"')?;
        Some(tag[s..s + len].to_string())
    }

    #[test]
    fn export_empty_sheet_returns_none() {
        let dir = temp_dir("empty");
        let config = ExportConfig {
            output_dir: dir.to_string_lossy().to_string(),
            ..ExportConfig::default()
        };
        let sheet = Sheet::new(vec!["指数代码".into()]);

        assert_eq!(export_sheet(&sheet, None, "prefix", &config), None);
        assert!(!dir.exists());
    }

    #[test]
    fn export_uses_dated_default_name() {
        let dir = temp_dir("named");
        let config = ExportConfig {
            output_dir: dir.to_string_lossy().to_string(),
            ..ExportConfig::default()
        };

        let path = export_sheet(&sample_sheet(), None, "2_test", &config).expect("exported");
        let expected = default_filename("2_test", Local::now().date_naive());
        assert_eq!(path.file_name().unwrap().to_string_lossy(), expected);
        assert!(path.exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn export_failure_is_swallowed() {
        let dir = temp_dir("blocked");
        std::fs::create_dir_all(&dir).unwrap();
        // A directory where the file should go makes the save fail.
        let target = dir.join("taken.xlsx");
        std::fs::create_dir_all(&target).unwrap();

        let result = export_sheet(&sample_sheet(), Some(&target), "p", &ExportConfig::default());
        assert_eq!(result, None);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
