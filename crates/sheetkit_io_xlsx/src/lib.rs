//! `sheetkit_io_xlsx` v1:
//! Spreadsheet IO kernel for the layout pipelines.
//!
//! Modules:
//! - `conf`   : constants and default presets
//! - `spec`   : specs/models/options/errors
//! - `util`   : pure helper functions
//! - `reader` : source table loading (calamine -> polars)
//! - `grid`   : buffered output sheet model
//! - `writer` : pure-Rust writer kernel (rust_xlsxwriter)
pub mod conf;
pub mod grid;
pub mod reader;
pub mod spec;
pub mod util;
pub mod writer;

pub use conf::{
    C_SHEET_NAME_DEFAULT, N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX,
    N_PAGE_BREAKS_EXCEL_MAX, N_PAPER_SIZE_A4, TUP_EXCEL_ILLEGAL,
};
pub use grid::{SheetGrid, SpecGridRow};
pub use reader::{SourceTable, load_table};
pub use spec::{
    EnumCellValue, EnumRowKind, SpecAutofitCellsPolicy, SpecCellFormat, SpecPageMargins,
    SpecPageSetup, SpecReadOptions, SpecSheetHorizontalMerge, SpecXlsxReport, XlsxIoError,
};
pub use util::{calculate_column_width, sanitize_sheet_name, validate_unique_columns};
pub use writer::XlsxWriter;
