//! Style catalog and layout presets.

use sheetkit_io_xlsx::conf::{
    N_BORDER_DASH_DOT, N_PAPER_SIZE_A4, derive_box_border_format, derive_font_format,
    derive_narrow_page_margins,
};
use sheetkit_io_xlsx::{SpecCellFormat, SpecPageSetup};

use crate::spec::SpecStyleOptions;

/// Default font family.
pub const C_FONT_NAME_DEFAULT: &str = "Calibri";
/// Default font size in points.
pub const N_FONT_SIZE_DEFAULT: i64 = 14;
/// Default label of the pivot link row.
pub const C_LINK_LABEL_DEFAULT: &str = "Link:";
/// Default number of blank-row spacers between two pivot page breaks.
pub const N_BLOCK_SPACING_DEFAULT: usize = 6;
/// Blank rows appended by one pivot spacer.
pub const N_BLANK_ROWS_PER_SPACER: usize = 2;
/// Color of the pivot value-cell border.
pub const C_BORDER_COLOR_VALUE: &str = "#000000";

/// Reading order code for right-to-left text.
const N_READING_ORDER_RTL: i64 = 2;

/// Formats used by the reflow pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecReflowStyles {
    /// Font + centered alignment; blank separator rows.
    pub fmt_base: SpecCellFormat,
    /// `fmt_base` with a thin box border; every other cell.
    pub fmt_boxed: SpecCellFormat,
}

/// Formats used by the pivot pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecPivotStyles {
    /// Font + right alignment + right-to-left reading order.
    pub fmt_label: SpecCellFormat,
    /// `fmt_label` with a dash-dot right border.
    pub fmt_value: SpecCellFormat,
}

/// Build the reflow formats once per run.
pub fn derive_reflow_styles(style_options: &SpecStyleOptions) -> SpecReflowStyles {
    let fmt_base = derive_font_format(&style_options.font_name, style_options.font_size).with_(
        SpecCellFormat {
            align: Some("center".to_string()),
            valign: Some("vcenter".to_string()),
            ..Default::default()
        },
    );
    let fmt_boxed = fmt_base.merge(&derive_box_border_format());

    SpecReflowStyles {
        fmt_base,
        fmt_boxed,
    }
}

/// Build the pivot formats once per run.
pub fn derive_pivot_styles(style_options: &SpecStyleOptions) -> SpecPivotStyles {
    let fmt_label = derive_font_format(&style_options.font_name, style_options.font_size).with_(
        SpecCellFormat {
            align: Some("right".to_string()),
            valign: Some("vcenter".to_string()),
            reading_order: Some(N_READING_ORDER_RTL),
            ..Default::default()
        },
    );
    let fmt_value = fmt_label.with_(SpecCellFormat {
        border_right: Some(N_BORDER_DASH_DOT),
        border_color: Some(C_BORDER_COLOR_VALUE.to_string()),
        ..Default::default()
    });

    SpecPivotStyles {
        fmt_label,
        fmt_value,
    }
}

/// Right-to-left A4 sheet with narrow margins.
pub fn derive_pivot_page_setup() -> SpecPageSetup {
    SpecPageSetup {
        if_right_to_left: true,
        paper_size: Some(N_PAPER_SIZE_A4),
        margins: Some(derive_narrow_page_margins()),
    }
}
