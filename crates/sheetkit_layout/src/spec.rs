//! Pipeline options, row emptiness rules and top-level errors.

use thiserror::Error;

use sheetkit_io_xlsx::{
    C_SHEET_NAME_DEFAULT, EnumCellValue, SpecAutofitCellsPolicy, SpecPageSetup, SpecReadOptions,
    XlsxIoError,
};

use crate::conf::{
    C_FONT_NAME_DEFAULT, C_LINK_LABEL_DEFAULT, N_BLOCK_SPACING_DEFAULT, N_FONT_SIZE_DEFAULT,
    derive_pivot_page_setup,
};

////////////////////////////////////////////////////////////////////////////////
// #region EnumsInit

/// Threshold at which a row counts as empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumRowEmptiness {
    /// Every retained value is missing.
    All,
    /// At least one retained value is missing.
    Any,
}

impl EnumRowEmptiness {
    /// True when `row` is empty under this rule.
    ///
    /// A row without values is empty under both rules.
    pub fn is_empty_row(&self, row: &[EnumCellValue]) -> bool {
        match self {
            Self::All => row.iter().all(EnumCellValue::is_none),
            Self::Any => row.is_empty() || row.iter().any(EnumCellValue::is_none),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Options

/// Font shared by every styled cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecStyleOptions {
    /// Font family name.
    pub font_name: String,
    /// Font size in points.
    pub font_size: i64,
}

impl Default for SpecStyleOptions {
    fn default() -> Self {
        Self {
            font_name: C_FONT_NAME_DEFAULT.to_string(),
            font_size: N_FONT_SIZE_DEFAULT,
        }
    }
}

/// Input options for [`crate::reflow`].
#[derive(Debug, Clone, PartialEq)]
pub struct SpecReflowOptions {
    /// Retained columns, in output order.
    pub columns: Vec<String>,
    /// Text of the banner row emitted above every header; empty disables it.
    pub banner_text: Option<String>,
    /// Rows dropped before layout.
    pub rule_row_drop: EnumRowEmptiness,
    /// Output worksheet name.
    pub sheet_name_out: String,
    /// Source loading options.
    pub read_options: SpecReadOptions,
    /// Font options.
    pub style_options: SpecStyleOptions,
    /// Column width policy.
    pub policy_autofit: SpecAutofitCellsPolicy,
}

impl Default for SpecReflowOptions {
    fn default() -> Self {
        Self {
            columns: Vec::new(),
            banner_text: None,
            rule_row_drop: EnumRowEmptiness::All,
            sheet_name_out: C_SHEET_NAME_DEFAULT.to_string(),
            read_options: SpecReadOptions::default(),
            style_options: SpecStyleOptions::default(),
            policy_autofit: SpecAutofitCellsPolicy::default(),
        }
    }
}

impl SpecReflowOptions {
    /// Options retaining `columns`, defaults elsewhere.
    pub fn with_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Banner text when set and non-empty.
    pub fn banner(&self) -> Option<&str> {
        self.banner_text.as_deref().filter(|text| !text.is_empty())
    }
}

/// Input options for [`crate::pivot`].
#[derive(Debug, Clone, PartialEq)]
pub struct SpecPivotOptions {
    /// Retained columns, in output order.
    pub columns: Vec<String>,
    /// Value of the link row emitted above every record; empty disables it.
    pub link_text: Option<String>,
    /// Label cell of the link row.
    pub link_label: String,
    /// Spacers between page breaks: after this many blank-row spacers the
    /// next spacer is a page break instead.
    pub block_spacing: usize,
    /// Rows dropped silently before layout.
    pub rule_row_drop: EnumRowEmptiness,
    /// Rows skipped with a diagnostic during layout.
    pub rule_row_skip: EnumRowEmptiness,
    /// Output worksheet name.
    pub sheet_name_out: String,
    /// Source loading options.
    pub read_options: SpecReadOptions,
    /// Font options.
    pub style_options: SpecStyleOptions,
    /// Column width policy.
    pub policy_autofit: SpecAutofitCellsPolicy,
    /// Print/view setup of the output sheet.
    pub page_setup: SpecPageSetup,
}

impl Default for SpecPivotOptions {
    fn default() -> Self {
        Self {
            columns: Vec::new(),
            link_text: None,
            link_label: C_LINK_LABEL_DEFAULT.to_string(),
            block_spacing: N_BLOCK_SPACING_DEFAULT,
            rule_row_drop: EnumRowEmptiness::All,
            rule_row_skip: EnumRowEmptiness::Any,
            sheet_name_out: C_SHEET_NAME_DEFAULT.to_string(),
            read_options: SpecReadOptions::default(),
            style_options: SpecStyleOptions::default(),
            policy_autofit: SpecAutofitCellsPolicy::default(),
            page_setup: derive_pivot_page_setup(),
        }
    }
}

impl SpecPivotOptions {
    /// Options retaining `columns`, defaults elsewhere.
    pub fn with_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Link text when set and non-empty.
    pub fn link(&self) -> Option<&str> {
        self.link_text.as_deref().filter(|text| !text.is_empty())
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// "Pipeline run failed" errors.
#[derive(Debug, Error)]
pub enum LayoutError {
    /// Reading, buffering or writing the workbook failed.
    #[error(transparent)]
    Xlsx(#[from] XlsxIoError),
    /// Pipeline options are invalid.
    #[error("{0}")]
    InvalidOptions(String),
}

/// Validate font options shared by both pipelines.
pub fn validate_style_options(style_options: &SpecStyleOptions) -> Result<(), LayoutError> {
    if style_options.font_name.trim().is_empty() {
        return Err(LayoutError::InvalidOptions(
            "style_options.font_name must not be empty.".to_string(),
        ));
    }
    if style_options.font_size <= 0 {
        return Err(LayoutError::InvalidOptions(
            "style_options.font_size must be >= 1.".to_string(),
        ));
    }
    Ok(())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_emptiness_rules_differ_on_partial_rows() {
        let row_partial = vec![EnumCellValue::None, "y".into()];
        let row_blank = vec![EnumCellValue::None, EnumCellValue::None];
        let row_full = vec![1.0.into(), "x".into()];

        assert!(!EnumRowEmptiness::All.is_empty_row(&row_partial));
        assert!(EnumRowEmptiness::Any.is_empty_row(&row_partial));
        assert!(EnumRowEmptiness::All.is_empty_row(&row_blank));
        assert!(EnumRowEmptiness::Any.is_empty_row(&row_blank));
        assert!(!EnumRowEmptiness::All.is_empty_row(&row_full));
        assert!(!EnumRowEmptiness::Any.is_empty_row(&row_full));
    }

    #[test]
    fn test_empty_banner_and_link_are_disabled() {
        let mut reflow_options = SpecReflowOptions::with_columns(["A"]);
        reflow_options.banner_text = Some(String::new());
        assert_eq!(reflow_options.banner(), None);

        let mut pivot_options = SpecPivotOptions::with_columns(["A"]);
        assert_eq!(pivot_options.block_spacing, 6);
        assert_eq!(pivot_options.link_label, "Link:");
        pivot_options.link_text = Some("example.org".to_string());
        assert_eq!(pivot_options.link(), Some("example.org"));
    }

    #[test]
    fn test_validate_style_options() {
        assert!(validate_style_options(&SpecStyleOptions::default()).is_ok());
        assert!(
            validate_style_options(&SpecStyleOptions {
                font_name: "Calibri".to_string(),
                font_size: 0,
            })
            .is_err()
        );
    }
}
