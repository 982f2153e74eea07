//! Shared XLSX specification models, options and errors.

use std::path::PathBuf;

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::conf::{C_FMT_DATETIME_RENDER, N_WIDTH_EXCEL_COLUMN_MAX, TUP_NA_VALUES_DEFAULT};

////////////////////////////////////////////////////////////////////////////////
// #region CellFormatSpecification

/// Style record applied to one output cell.
///
/// Unset fields fall back to the Excel default, so partial records can be
/// layered with [`SpecCellFormat::merge`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SpecCellFormat {
    pub font_name: Option<String>,
    /// Points.
    pub font_size: Option<i64>,
    /// Horizontal alignment name (`left`, `center`, `right`, ...).
    pub align: Option<String>,
    /// Vertical alignment name (`top`, `vcenter`, `bottom`).
    pub valign: Option<String>,
    /// Reading order: 0 = context, 1 = left-to-right, 2 = right-to-left.
    pub reading_order: Option<i64>,

    /// Excel border style code applied to all four sides.
    pub border: Option<i64>,
    pub border_top: Option<i64>,
    pub border_bottom: Option<i64>,
    pub border_left: Option<i64>,
    pub border_right: Option<i64>,
    /// `#RRGGBB`, applied to every side that has a border.
    pub border_color: Option<String>,

    /// Excel number format code, e.g. `yyyy-mm-dd hh:mm:ss`.
    pub num_format: Option<String>,
}

impl SpecCellFormat {
    /// Overlay `patch` onto `self`.
    pub fn with_(&self, patch: SpecCellFormat) -> SpecCellFormat {
        self.merge(&patch)
    }

    /// Fields set on `other` win; unset ones keep `self`.
    pub fn merge(&self, other: &SpecCellFormat) -> SpecCellFormat {
        fn pick<T: Clone>(ours: &Option<T>, theirs: &Option<T>) -> Option<T> {
            theirs.clone().or_else(|| ours.clone())
        }

        SpecCellFormat {
            font_name: pick(&self.font_name, &other.font_name),
            font_size: pick(&self.font_size, &other.font_size),
            align: pick(&self.align, &other.align),
            valign: pick(&self.valign, &other.valign),
            reading_order: pick(&self.reading_order, &other.reading_order),
            border: pick(&self.border, &other.border),
            border_top: pick(&self.border_top, &other.border_top),
            border_bottom: pick(&self.border_bottom, &other.border_bottom),
            border_left: pick(&self.border_left, &other.border_left),
            border_right: pick(&self.border_right, &other.border_right),
            border_color: pick(&self.border_color, &other.border_color),
            num_format: pick(&self.num_format, &other.num_format),
        }
    }

    /// True when any side carries a visible border.
    pub fn has_border(&self) -> bool {
        [
            self.border,
            self.border_top,
            self.border_bottom,
            self.border_left,
            self.border_right,
        ]
        .iter()
        .any(|side| side.is_some_and(|code| code > 0))
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CellValue

/// Normalized cell value during the read/transform/write pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumCellValue {
    /// Missing/blank value.
    None,
    /// Text value.
    String(String),
    /// Numeric value.
    Number(f64),
    /// Boolean value.
    Bool(bool),
    /// Date/time value, written as an Excel serial with a date format.
    DateTime(NaiveDateTime),
}

impl EnumCellValue {
    /// True for the missing value.
    pub fn is_none(&self) -> bool {
        matches!(self, EnumCellValue::None)
    }

    /// Text shown for this value; missing renders as the empty string.
    ///
    /// Integral numbers render without a fractional part (`3` not `3.0`),
    /// booleans as `True`/`False`.
    pub fn render(&self) -> String {
        match self {
            EnumCellValue::None => String::new(),
            EnumCellValue::String(val) => val.clone(),
            EnumCellValue::Number(val) => render_number(*val),
            EnumCellValue::Bool(true) => "True".to_string(),
            EnumCellValue::Bool(false) => "False".to_string(),
            EnumCellValue::DateTime(val) => val.format(C_FMT_DATETIME_RENDER).to_string(),
        }
    }
}

impl From<&str> for EnumCellValue {
    fn from(value: &str) -> Self {
        EnumCellValue::String(value.to_string())
    }
}

impl From<String> for EnumCellValue {
    fn from(value: String) -> Self {
        EnumCellValue::String(value)
    }
}

impl From<f64> for EnumCellValue {
    fn from(value: f64) -> Self {
        EnumCellValue::Number(value)
    }
}

impl From<bool> for EnumCellValue {
    fn from(value: bool) -> Self {
        EnumCellValue::Bool(value)
    }
}

impl From<NaiveDateTime> for EnumCellValue {
    fn from(value: NaiveDateTime) -> Self {
        EnumCellValue::DateTime(value)
    }
}

impl<T> From<Option<T>> for EnumCellValue
where
    T: Into<EnumCellValue>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(EnumCellValue::None, Into::into)
    }
}

pub(crate) fn render_number(val: f64) -> String {
    if val.is_finite() && val.fract() == 0.0 && val.abs() < 1e15 {
        format!("{}", val as i64)
    } else {
        val.to_string()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetGridSpecification

/// Role of an output row, recorded when the row is appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumRowKind {
    /// Banner row merged across the table width.
    Banner,
    /// Column header row.
    Header,
    /// Source data row.
    Data,
    /// Label/value row of a pivoted record.
    Field,
    /// Link row preceding a pivoted record.
    Link,
    /// Blank separator row.
    #[default]
    Blank,
}

/// Horizontal merge plan item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSheetHorizontalMerge {
    /// Row index where merge is applied.
    pub row_idx_start: usize,
    /// Start column index (inclusive).
    pub col_idx_start: usize,
    /// End column index (inclusive).
    pub col_idx_end: usize,
    /// Merge display text.
    pub text: String,
}

/// Page margins in inches.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecPageMargins {
    /// Left margin.
    pub left: f64,
    /// Right margin.
    pub right: f64,
    /// Top margin.
    pub top: f64,
    /// Bottom margin.
    pub bottom: f64,
    /// Header margin.
    pub header: f64,
    /// Footer margin.
    pub footer: f64,
}

/// Print and view setup of one worksheet.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecPageSetup {
    /// Display the sheet right-to-left.
    pub if_right_to_left: bool,
    /// Excel paper size code (9 = A4). `None` keeps the printer default.
    pub paper_size: Option<u8>,
    /// Page margins. `None` keeps the Excel defaults.
    pub margins: Option<SpecPageMargins>,
}

/// Autofit policy for column width inference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecAutofitCellsPolicy {
    /// Minimum final width.
    pub width_cell_min: usize,
    /// Maximum final width.
    pub width_cell_max: usize,
    /// Width padding added after inference.
    pub width_cell_padding: usize,
}

impl Default for SpecAutofitCellsPolicy {
    fn default() -> Self {
        Self {
            width_cell_min: 0,
            width_cell_max: N_WIDTH_EXCEL_COLUMN_MAX,
            width_cell_padding: 2,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReadOptions

/// Options for loading a source table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecReadOptions {
    /// Worksheet to read; the first worksheet when `None`.
    pub sheet_name: Option<String>,
    /// Text values treated as missing.
    pub na_values: Vec<String>,
    /// Drop rows that are empty across every source column.
    pub if_drop_blank_rows: bool,
}

impl Default for SpecReadOptions {
    fn default() -> Self {
        Self {
            sheet_name: None,
            na_values: TUP_NA_VALUES_DEFAULT
                .iter()
                .map(ToString::to_string)
                .collect(),
            if_drop_blank_rows: true,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportSpecification

/// Per-write call report.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecXlsxReport {
    /// Sheet names produced by the write call.
    pub sheets: Vec<String>,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
}

impl SpecXlsxReport {
    /// Add a warning message.
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        let c_msg = msg.as_ref().to_string();
        log::warn!("{c_msg}");
        self.warnings.push(c_msg);
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Errors raised by the reader, grid and writer.
#[derive(Debug, Error)]
pub enum XlsxIoError {
    /// Source workbook could not be opened or parsed.
    #[error("Failed to open workbook {}: {message}", path.display())]
    Open {
        /// Source path.
        path: PathBuf,
        /// Underlying reader error text.
        message: String,
    },
    /// Requested worksheet does not exist.
    #[error("Sheet not found: {0:?}")]
    SheetNotFound(String),
    /// Source worksheet has no header row.
    #[error("Sheet {0:?} is empty (no header row)")]
    EmptySheet(String),
    /// Requested column is missing from the header row.
    #[error("Column not found: {0:?}")]
    ColumnNotFound(String),
    /// Requested column list repeats a name.
    #[error("Duplicate column names detected: {0}")]
    DuplicateColumns(String),
    /// Caller options are inconsistent.
    #[error("{0}")]
    InvalidOptions(String),
    /// In-memory table construction failed.
    #[error("table error: {0}")]
    Table(#[from] polars::prelude::PolarsError),
    /// Workbook serialization failed.
    #[error("xlsx write error: {0}")]
    Write(#[from] rust_xlsxwriter::XlsxError),
    /// Row or column index does not fit the Excel coordinate types.
    #[error("{axis} index overflow: {value}")]
    IndexOverflow {
        /// `row` or `column`.
        axis: &'static str,
        /// Offending index.
        value: usize,
    },
    /// Writer was used after `close()`.
    #[error("Cannot write after close().")]
    Closed,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
