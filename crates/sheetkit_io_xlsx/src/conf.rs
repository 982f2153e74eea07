//! XLSX constants and default preset factories.

use crate::spec::{SpecCellFormat, SpecPageMargins};

/// Excel worksheet maximum row count.
pub const N_NROWS_EXCEL_MAX: usize = 1_048_576;
/// Excel worksheet maximum column count.
pub const N_NCOLS_EXCEL_MAX: usize = 16_384;
/// Excel sheet name maximum length.
pub const N_LEN_EXCEL_SHEET_NAME_MAX: usize = 31;
/// Excel column width maximum (character units).
pub const N_WIDTH_EXCEL_COLUMN_MAX: usize = 255;
/// Excel maximum number of manual horizontal page breaks per sheet.
pub const N_PAGE_BREAKS_EXCEL_MAX: usize = 1_023;
/// Characters not allowed in sheet names.
pub const TUP_EXCEL_ILLEGAL: [&str; 7] = ["*", ":", "?", "/", "\\", "[", "]"];

/// Excel paper size code for A4.
pub const N_PAPER_SIZE_A4: u8 = 9;

/// Default output worksheet name.
pub const C_SHEET_NAME_DEFAULT: &str = "Sheet1";

/// Text values read as missing (pandas `read_excel` defaults).
pub const TUP_NA_VALUES_DEFAULT: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Text rendering of date/time cells.
pub const C_FMT_DATETIME_RENDER: &str = "%Y-%m-%d %H:%M:%S";
/// Excel number format written on date/time cells.
pub const C_NUM_FORMAT_DATETIME: &str = "yyyy-mm-dd hh:mm:ss";
/// Excel serial of 1970-01-01.
pub const N_SERIAL_EXCEL_UNIX_EPOCH: f64 = 25_569.0;

/// Thin continuous border (Excel border style code).
pub const N_BORDER_THIN: i64 = 1;
/// Dash-dot border.
pub const N_BORDER_DASH_DOT: i64 = 9;

/// Build a font-only base format.
pub fn derive_font_format(font_name: &str, font_size: i64) -> SpecCellFormat {
    SpecCellFormat {
        font_name: Some(font_name.to_string()),
        font_size: Some(font_size),
        ..Default::default()
    }
}

/// Thin border on all four sides.
pub fn derive_box_border_format() -> SpecCellFormat {
    SpecCellFormat {
        border: Some(N_BORDER_THIN),
        ..Default::default()
    }
}

/// Narrow print margins: 0.15" around the page, no header/footer band.
pub fn derive_narrow_page_margins() -> SpecPageMargins {
    SpecPageMargins {
        left: 0.15,
        right: 0.15,
        top: 0.15,
        bottom: 0.15,
        header: 0.0,
        footer: 0.0,
    }
}

/// Number format overlay for date/time cells.
pub fn derive_datetime_format() -> SpecCellFormat {
    SpecCellFormat {
        num_format: Some(C_NUM_FORMAT_DATETIME.to_string()),
        ..Default::default()
    }
}
