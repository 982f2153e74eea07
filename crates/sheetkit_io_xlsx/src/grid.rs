//! In-memory output sheet: rows, per-cell formats, merges, widths and print setup.
//!
//! A grid is built append-only, styled in a separate pass, then handed to
//! [`crate::writer::XlsxWriter::write_sheet_grid`].

use crate::spec::{
    EnumCellValue, EnumRowKind, SpecAutofitCellsPolicy, SpecCellFormat, SpecPageSetup,
    SpecSheetHorizontalMerge, XlsxIoError,
};
use crate::util::{calculate_column_width, estimate_text_len, validate_policy_autofit};

static VALUE_NONE: EnumCellValue = EnumCellValue::None;

/// One output row.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecGridRow {
    /// Role recorded when the row was appended.
    pub kind: EnumRowKind,
    /// Cell values; may be shorter than the grid width.
    pub values: Vec<EnumCellValue>,
    /// Per-cell formats aligned with `values`; `None` leaves the cell unstyled.
    pub formats: Vec<Option<SpecCellFormat>>,
}

impl SpecGridRow {
    /// True when every value is missing (rows without cells included).
    pub fn is_blank(&self) -> bool {
        self.values.iter().all(EnumCellValue::is_none)
    }

    fn ensure_len(&mut self, n_len: usize) {
        if self.values.len() < n_len {
            self.values.resize(n_len, EnumCellValue::None);
        }
        if self.formats.len() < self.values.len() {
            self.formats.resize(self.values.len(), None);
        }
    }
}

/// Buffered worksheet model.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SheetGrid {
    rows: Vec<SpecGridRow>,
    merges: Vec<SpecSheetHorizontalMerge>,
    widths_by_col: Vec<usize>,
    rows_page_break: Vec<usize>,
    page_setup: SpecPageSetup,
}

impl SheetGrid {
    /// Create an empty grid.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one row and return its index.
    pub fn append_row(&mut self, kind: EnumRowKind, values: Vec<EnumCellValue>) -> usize {
        let formats = vec![None; values.len()];
        self.rows.push(SpecGridRow {
            kind,
            values,
            formats,
        });
        self.rows.len() - 1
    }

    /// All rows in order.
    pub fn rows(&self) -> &[SpecGridRow] {
        &self.rows
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Widest row length.
    pub fn width(&self) -> usize {
        self.rows.iter().map(|row| row.values.len()).max().unwrap_or(0)
    }

    /// Indices of rows appended with `kind`.
    pub fn rows_of_kind(&self, kind: EnumRowKind) -> Vec<usize> {
        self.rows
            .iter()
            .enumerate()
            .filter_map(|(n_idx, row)| if row.kind == kind { Some(n_idx) } else { None })
            .collect()
    }

    /// Value at `(row_idx, col_idx)`; missing when outside the row.
    pub fn value(&self, row_idx: usize, col_idx: usize) -> &EnumCellValue {
        self.rows
            .get(row_idx)
            .and_then(|row| row.values.get(col_idx))
            .unwrap_or(&VALUE_NONE)
    }

    /// Format at `(row_idx, col_idx)`.
    pub fn format(&self, row_idx: usize, col_idx: usize) -> Option<&SpecCellFormat> {
        self.rows
            .get(row_idx)
            .and_then(|row| row.formats.get(col_idx))
            .and_then(Option::as_ref)
    }

    /// Set the format of one cell, materializing a blank cell if needed.
    pub fn set_format(
        &mut self,
        row_idx: usize,
        col_idx: usize,
        format: SpecCellFormat,
    ) -> Result<(), XlsxIoError> {
        let n_height = self.rows.len();
        let row = self.rows.get_mut(row_idx).ok_or_else(|| {
            XlsxIoError::InvalidOptions(format!(
                "Row {row_idx} out of range (height {n_height})."
            ))
        })?;
        row.ensure_len(col_idx + 1);
        row.formats[col_idx] = Some(format);
        Ok(())
    }

    /// Set the same format on every existing cell of a row.
    pub fn set_row_format(
        &mut self,
        row_idx: usize,
        format: &SpecCellFormat,
    ) -> Result<(), XlsxIoError> {
        let n_len = self.rows.get(row_idx).map_or(0, |row| row.values.len());
        for col_idx in 0..n_len {
            self.set_format(row_idx, col_idx, format.clone())?;
        }
        Ok(())
    }

    /// Merge columns `col_idx_start..=col_idx_end` of one row.
    ///
    /// The anchor cell keeps its value and format; a merge of a single cell
    /// is ignored.
    pub fn merge_row(
        &mut self,
        row_idx: usize,
        col_idx_start: usize,
        col_idx_end: usize,
    ) -> Result<(), XlsxIoError> {
        if row_idx >= self.rows.len() {
            return Err(XlsxIoError::InvalidOptions(format!(
                "Row {row_idx} out of range (height {}).",
                self.rows.len()
            )));
        }
        if col_idx_end < col_idx_start {
            return Err(XlsxIoError::InvalidOptions(format!(
                "Merge end column {col_idx_end} precedes start column {col_idx_start}."
            )));
        }
        if col_idx_end == col_idx_start {
            return Ok(());
        }
        if self.merges.iter().any(|merge| {
            merge.row_idx_start == row_idx
                && merge.col_idx_start <= col_idx_end
                && col_idx_start <= merge.col_idx_end
        }) {
            return Err(XlsxIoError::InvalidOptions(format!(
                "Merge on row {row_idx} overlaps an existing merge."
            )));
        }

        self.rows[row_idx].ensure_len(col_idx_end + 1);
        let text = self.value(row_idx, col_idx_start).render();
        self.merges.push(SpecSheetHorizontalMerge {
            row_idx_start: row_idx,
            col_idx_start,
            col_idx_end,
            text,
        });
        Ok(())
    }

    /// Planned merges.
    pub fn merges(&self) -> &[SpecSheetHorizontalMerge] {
        &self.merges
    }

    /// Start a new printed page at `row_idx`.
    pub fn set_page_break_before(&mut self, row_idx: usize) {
        self.rows_page_break.push(row_idx);
    }

    /// Rows that start a new printed page.
    pub fn page_breaks(&self) -> &[usize] {
        &self.rows_page_break
    }

    /// Replace the page setup.
    pub fn set_page_setup(&mut self, page_setup: SpecPageSetup) {
        self.page_setup = page_setup;
    }

    /// Page setup.
    pub fn page_setup(&self) -> &SpecPageSetup {
        &self.page_setup
    }

    /// Size every column to its longest rendered value plus padding.
    pub fn autofit_columns(&mut self, policy: &SpecAutofitCellsPolicy) -> Result<(), XlsxIoError> {
        validate_policy_autofit(policy)?;

        let mut l_len_by_col = vec![0usize; self.width()];
        for row in &self.rows {
            for (n_idx_col, value) in row.values.iter().enumerate() {
                l_len_by_col[n_idx_col] =
                    usize::max(l_len_by_col[n_idx_col], estimate_text_len(&value.render()));
            }
        }

        self.widths_by_col = l_len_by_col
            .into_iter()
            .map(|n_len| calculate_column_width(n_len, policy))
            .collect();
        Ok(())
    }

    /// Column widths set by [`Self::autofit_columns`]; empty when never fitted.
    pub fn column_widths(&self) -> &[usize] {
        &self.widths_by_col
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_query_rows() {
        let mut grid = SheetGrid::new();
        grid.append_row(EnumRowKind::Header, vec!["a".into(), "b".into()]);
        grid.append_row(EnumRowKind::Blank, vec![]);
        grid.append_row(EnumRowKind::Data, vec![1.0.into()]);

        assert_eq!(grid.height(), 3);
        assert_eq!(grid.width(), 2);
        assert_eq!(grid.rows_of_kind(EnumRowKind::Blank), vec![1]);
        assert!(grid.rows()[1].is_blank());
        assert_eq!(grid.value(2, 1), &EnumCellValue::None);
    }

    #[test]
    fn test_set_format_materializes_cell() {
        let mut grid = SheetGrid::new();
        grid.append_row(EnumRowKind::Blank, vec![]);
        let fmt = SpecCellFormat {
            font_size: Some(11),
            ..Default::default()
        };
        grid.set_format(0, 2, fmt.clone()).unwrap();

        assert_eq!(grid.rows()[0].values.len(), 3);
        assert_eq!(grid.format(0, 2), Some(&fmt));
        assert_eq!(grid.format(0, 0), None);
        assert!(grid.set_format(5, 0, fmt).is_err());
    }

    #[test]
    fn test_merge_row_rules() {
        let mut grid = SheetGrid::new();
        grid.append_row(EnumRowKind::Banner, vec!["hello".into(), EnumCellValue::None]);

        grid.merge_row(0, 0, 0).unwrap();
        assert!(grid.merges().is_empty());

        grid.merge_row(0, 0, 2).unwrap();
        assert_eq!(
            grid.merges(),
            &[SpecSheetHorizontalMerge {
                row_idx_start: 0,
                col_idx_start: 0,
                col_idx_end: 2,
                text: "hello".to_string(),
            }]
        );
        assert!(grid.merge_row(0, 1, 2).is_err());
        assert!(grid.merge_row(3, 0, 1).is_err());
    }

    #[test]
    fn test_autofit_columns_uses_longest_rendered_value() {
        let mut grid = SheetGrid::new();
        grid.append_row(EnumRowKind::Header, vec!["id".into(), "name".into()]);
        grid.append_row(EnumRowKind::Data, vec![12345.0.into(), EnumCellValue::None]);

        grid.autofit_columns(&SpecAutofitCellsPolicy::default())
            .unwrap();
        assert_eq!(grid.column_widths(), &[7, 6]);
    }
}
