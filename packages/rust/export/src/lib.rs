//! Flat-file outputs: spreadsheets and JSON dumps.
//!
//! This crate provides:
//! - [`xlsx`]: spreadsheet writer with auto-sized columns and a frozen header
//! - [`json`]: raw row and structured record dumps

pub mod json;
pub mod xlsx;

pub use json::{read_records, write_raw_rows, write_records};
pub use xlsx::{
    WidthOptions, column_widths, default_filename, display_width, export_sheet, records_to_sheet,
    write_xlsx,
};
