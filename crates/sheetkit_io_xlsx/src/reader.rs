//! Table reader: loads the retained columns of one worksheet into a `DataFrame`.

use std::collections::BTreeMap;
use std::path::Path;

use calamine::{Data, Reader, Sheets, open_workbook_auto};
use polars::prelude::{AnyValue, BooleanChunked, Column, DataFrame, NewChunkedArray, PlSmallStr};

use crate::spec::{EnumCellValue, SpecReadOptions, XlsxIoError};
use crate::util::{is_na_text, select_column_indices, validate_unique_columns};

/// In-memory source table restricted to the retained columns.
///
/// Column order follows the caller's column list; row order follows the
/// worksheet. Every row remembers its 1-based worksheet row number.
///
/// Columns of one value kind are typed dataframe columns. Columns that mix
/// kinds, or hold dates, keep their typed cells beside the dataframe so the
/// writer sees the source type of every cell.
#[derive(Debug, Clone)]
pub struct SourceTable {
    df: DataFrame,
    dict_cells_by_col: BTreeMap<usize, Vec<EnumCellValue>>,
    row_numbers: Vec<usize>,
    cnt_rows_blank: usize,
}

impl SourceTable {
    /// Build a table from already materialized rows.
    ///
    /// Rows are numbered as if the header sat on worksheet row 1.
    pub fn from_rows(
        columns: &[String],
        rows: Vec<Vec<EnumCellValue>>,
    ) -> Result<Self, XlsxIoError> {
        validate_columns_requested(columns)?;

        let mut l_values_by_col: Vec<Vec<EnumCellValue>> =
            vec![Vec::with_capacity(rows.len()); columns.len()];
        for (n_idx_row, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(XlsxIoError::InvalidOptions(format!(
                    "Row {n_idx_row} has {} values, expected {}.",
                    row.len(),
                    columns.len()
                )));
            }
            for (n_idx_col, value) in row.iter().enumerate() {
                l_values_by_col[n_idx_col].push(value.clone());
            }
        }

        let row_numbers = (0..rows.len()).map(|n_idx| n_idx + 2).collect();
        Self::from_columns(columns, l_values_by_col, row_numbers, 0)
    }

    fn from_columns(
        columns: &[String],
        values_by_col: Vec<Vec<EnumCellValue>>,
        row_numbers: Vec<usize>,
        cnt_rows_blank: usize,
    ) -> Result<Self, XlsxIoError> {
        let mut l_cols = Vec::with_capacity(columns.len());
        let mut dict_cells_by_col = BTreeMap::new();
        for (n_idx_col, (c_name, l_values)) in columns.iter().zip(values_by_col).enumerate() {
            let (col, cells) = derive_typed_column(c_name, l_values);
            l_cols.push(col);
            if let Some(l_cells) = cells {
                dict_cells_by_col.insert(n_idx_col, l_cells);
            }
        }
        let df = DataFrame::new(l_cols)?;

        Ok(Self {
            df,
            dict_cells_by_col,
            row_numbers,
            cnt_rows_blank,
        })
    }

    /// Underlying dataframe.
    ///
    /// Mixed-kind and date columns appear here as their rendered text;
    /// [`Self::row`] returns their typed cells.
    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    /// Retained column names in output order.
    pub fn columns(&self) -> Vec<String> {
        self.df
            .get_column_names_str()
            .into_iter()
            .map(ToString::to_string)
            .collect()
    }

    /// Number of data rows.
    pub fn height(&self) -> usize {
        self.df.height()
    }

    /// 1-based worksheet row number of data row `idx`.
    pub fn row_number(&self, idx: usize) -> usize {
        self.row_numbers.get(idx).copied().unwrap_or(idx + 2)
    }

    /// Rows dropped at load time because every source column was empty.
    pub fn cnt_rows_blank(&self) -> usize {
        self.cnt_rows_blank
    }

    /// Values of data row `idx` in column order.
    pub fn row(&self, idx: usize) -> Result<Vec<EnumCellValue>, XlsxIoError> {
        self.df
            .get_columns()
            .iter()
            .enumerate()
            .map(|(n_idx_col, col)| match self.dict_cells_by_col.get(&n_idx_col) {
                Some(l_cells) => l_cells.get(idx).cloned().ok_or_else(|| {
                    XlsxIoError::InvalidOptions(format!(
                        "Row {idx} is out of bounds for height {}.",
                        self.height()
                    ))
                }),
                None => Ok(derive_cell_value_from_any_value(col.get(idx)?)),
            })
            .collect()
    }

    /// Keep rows whose `mask` entry is true.
    pub fn filter_rows(&self, mask: &[bool]) -> Result<SourceTable, XlsxIoError> {
        if mask.len() != self.height() {
            return Err(XlsxIoError::InvalidOptions(format!(
                "Row mask has {} entries, expected {}.",
                mask.len(),
                self.height()
            )));
        }

        let mask_rows = BooleanChunked::from_slice(PlSmallStr::from_static("mask"), mask);
        let df = self.df.filter(&mask_rows)?;
        let row_numbers = self
            .row_numbers
            .iter()
            .zip(mask)
            .filter_map(|(n_row, if_keep)| if *if_keep { Some(*n_row) } else { None })
            .collect();
        let dict_cells_by_col = self
            .dict_cells_by_col
            .iter()
            .map(|(n_idx_col, l_cells)| {
                let l_kept = l_cells
                    .iter()
                    .zip(mask)
                    .filter(|(_, if_keep)| **if_keep)
                    .map(|(value, _)| value.clone())
                    .collect();
                (*n_idx_col, l_kept)
            })
            .collect();

        Ok(SourceTable {
            df,
            dict_cells_by_col,
            row_numbers,
            cnt_rows_blank: self.cnt_rows_blank,
        })
    }
}

/// Load `columns` from a worksheet of `path`.
///
/// The first row of the used range is the header row; requested names must
/// match header text exactly.
pub fn load_table(
    path: &Path,
    columns: &[String],
    options: &SpecReadOptions,
) -> Result<SourceTable, XlsxIoError> {
    validate_columns_requested(columns)?;

    let mut workbook: Sheets<_> = open_workbook_auto(path).map_err(|err| XlsxIoError::Open {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;

    let l_sheet_names = workbook.sheet_names().to_vec();
    let c_sheet_name = match &options.sheet_name {
        Some(name) => {
            if !l_sheet_names.contains(name) {
                return Err(XlsxIoError::SheetNotFound(name.clone()));
            }
            name.clone()
        }
        None => l_sheet_names
            .first()
            .cloned()
            .ok_or_else(|| XlsxIoError::SheetNotFound("<first sheet>".to_string()))?,
    };

    let range = workbook
        .worksheet_range(&c_sheet_name)
        .map_err(|err| XlsxIoError::Open {
            path: path.to_path_buf(),
            message: format!("Failed to read sheet {c_sheet_name:?}: {err}"),
        })?;
    let n_row_start = range.start().map_or(0, |(n_row, _)| n_row as usize);

    let mut iter_rows = range.rows();
    let Some(row_header) = iter_rows.next() else {
        return Err(XlsxIoError::EmptySheet(c_sheet_name));
    };
    let l_header: Vec<String> = row_header.iter().map(derive_header_text).collect();
    let l_cols_idx = select_column_indices(&l_header, columns)?;

    let mut l_values_by_col: Vec<Vec<EnumCellValue>> = vec![Vec::new(); columns.len()];
    let mut l_row_numbers = Vec::new();
    let mut n_rows_blank = 0usize;

    for (n_idx_row, row) in iter_rows.enumerate() {
        let l_row_values: Vec<EnumCellValue> = row
            .iter()
            .map(|cell| derive_cell_value_from_data(cell, &options.na_values))
            .collect();

        if options.if_drop_blank_rows && l_row_values.iter().all(EnumCellValue::is_none) {
            n_rows_blank += 1;
            continue;
        }

        for (n_idx_out, n_idx_src) in l_cols_idx.iter().enumerate() {
            let value = l_row_values
                .get(*n_idx_src)
                .cloned()
                .unwrap_or(EnumCellValue::None);
            l_values_by_col[n_idx_out].push(value);
        }
        // header occupies the first row of the range
        l_row_numbers.push(n_row_start + n_idx_row + 2);
    }

    log::debug!(
        "Loaded {} rows x {} columns from {} [{c_sheet_name}] ({n_rows_blank} blank rows dropped)",
        l_row_numbers.len(),
        columns.len(),
        path.display()
    );

    SourceTable::from_columns(columns, l_values_by_col, l_row_numbers, n_rows_blank)
}

fn validate_columns_requested(columns: &[String]) -> Result<(), XlsxIoError> {
    if columns.is_empty() {
        return Err(XlsxIoError::InvalidOptions(
            "At least one column must be requested.".to_string(),
        ));
    }
    validate_unique_columns(columns)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnumColumnStorage {
    Text,
    Number,
    Bool,
    /// Typed cells kept beside a text rendering.
    Cells,
}

fn derive_column_storage(values: &[EnumCellValue]) -> EnumColumnStorage {
    let mut storage_seen = None;
    for value in values {
        let storage = match value {
            EnumCellValue::None => continue,
            EnumCellValue::String(_) => EnumColumnStorage::Text,
            EnumCellValue::Number(_) => EnumColumnStorage::Number,
            EnumCellValue::Bool(_) => EnumColumnStorage::Bool,
            EnumCellValue::DateTime(_) => return EnumColumnStorage::Cells,
        };
        match storage_seen {
            None => storage_seen = Some(storage),
            Some(seen) if seen != storage => return EnumColumnStorage::Cells,
            Some(_) => {}
        }
    }
    storage_seen.unwrap_or(EnumColumnStorage::Text)
}

/// Typed column for single-kind data; mixed-kind columns also return their cells.
fn derive_typed_column(
    name: &str,
    values: Vec<EnumCellValue>,
) -> (Column, Option<Vec<EnumCellValue>>) {
    match derive_column_storage(&values) {
        EnumColumnStorage::Number => {
            let l_numbers: Vec<Option<f64>> = values
                .iter()
                .map(|value| match value {
                    EnumCellValue::Number(val) => Some(*val),
                    _ => None,
                })
                .collect();
            (Column::new(name.into(), l_numbers), None)
        }
        EnumColumnStorage::Bool => {
            let l_bools: Vec<Option<bool>> = values
                .iter()
                .map(|value| match value {
                    EnumCellValue::Bool(val) => Some(*val),
                    _ => None,
                })
                .collect();
            (Column::new(name.into(), l_bools), None)
        }
        EnumColumnStorage::Text => (derive_text_column(name, &values), None),
        EnumColumnStorage::Cells => (derive_text_column(name, &values), Some(values)),
    }
}

fn derive_text_column(name: &str, values: &[EnumCellValue]) -> Column {
    let l_texts: Vec<Option<String>> = values
        .iter()
        .map(|value| match value {
            EnumCellValue::None => None,
            other => Some(other.render()),
        })
        .collect();
    Column::new(name.into(), l_texts)
}

fn derive_header_text(cell: &Data) -> String {
    match cell {
        Data::String(val) => val.clone(),
        Data::Empty => String::new(),
        other => derive_cell_value_from_data(other, &[]).render(),
    }
}

fn derive_cell_value_from_data(cell: &Data, na_values: &[String]) -> EnumCellValue {
    match cell {
        Data::Empty | Data::Error(_) => EnumCellValue::None,
        Data::String(val) | Data::DateTimeIso(val) | Data::DurationIso(val) => {
            if is_na_text(val, na_values) {
                EnumCellValue::None
            } else {
                EnumCellValue::String(val.clone())
            }
        }
        Data::Float(val) => EnumCellValue::Number(*val),
        Data::Int(val) => EnumCellValue::Number(*val as f64),
        Data::Bool(val) => EnumCellValue::Bool(*val),
        // serials outside the calendar range stay numeric
        Data::DateTime(val) => match val.as_datetime() {
            Some(dt) => EnumCellValue::DateTime(dt),
            None => EnumCellValue::Number(val.as_f64()),
        },
    }
}

fn derive_cell_value_from_any_value(value: AnyValue<'_>) -> EnumCellValue {
    match value {
        AnyValue::Null => EnumCellValue::None,
        AnyValue::String(val) => EnumCellValue::String(val.to_string()),
        AnyValue::StringOwned(val) => EnumCellValue::String(val.to_string()),
        AnyValue::Boolean(val) => EnumCellValue::Bool(val),
        AnyValue::Int32(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int64(val) => EnumCellValue::Number(val as f64),
        AnyValue::Float32(val) => EnumCellValue::Number(val as f64),
        AnyValue::Float64(val) => EnumCellValue::Number(val),
        _ => EnumCellValue::String(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use polars::prelude::DataType;

    use super::*;

    fn names(vals: &[&str]) -> Vec<String> {
        vals.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_from_rows_types_columns_and_keeps_nulls() {
        let table = SourceTable::from_rows(
            &names(&["A", "B"]),
            vec![
                vec![1.0.into(), "x".into()],
                vec![EnumCellValue::None, "y".into()],
                vec![2.0.into(), EnumCellValue::None],
            ],
        )
        .unwrap();

        assert_eq!(table.height(), 3);
        assert_eq!(table.columns(), names(&["A", "B"]));
        assert_eq!(
            table.row(0).unwrap(),
            vec![EnumCellValue::Number(1.0), "x".into()]
        );
        assert_eq!(
            table.row(1).unwrap(),
            vec![EnumCellValue::None, "y".into()]
        );
        assert_eq!(
            table.row(2).unwrap(),
            vec![EnumCellValue::Number(2.0), EnumCellValue::None]
        );
        assert_eq!(table.row_number(2), 4);
        assert_eq!(
            table.dataframe().column("A").unwrap().dtype(),
            &DataType::Float64
        );
    }

    #[test]
    fn test_mixed_column_keeps_cell_types() {
        let table = SourceTable::from_rows(
            &names(&["A", "B", "C"]),
            vec![
                vec![7.0.into(), true.into(), false.into()],
                vec!["seven".into(), "y".into(), EnumCellValue::None],
            ],
        )
        .unwrap();

        assert_eq!(
            table.row(0).unwrap(),
            vec![
                EnumCellValue::Number(7.0),
                EnumCellValue::Bool(true),
                EnumCellValue::Bool(false)
            ]
        );
        assert_eq!(
            table.row(1).unwrap(),
            vec!["seven".into(), "y".into(), EnumCellValue::None]
        );
        let df = table.dataframe();
        assert_eq!(df.column("A").unwrap().dtype(), &DataType::String);
        assert_eq!(df.column("C").unwrap().dtype(), &DataType::Boolean);
        assert!(table.row(2).is_err());
    }

    #[test]
    fn test_datetime_column_keeps_cells() {
        let dt = chrono::NaiveDate::from_ymd_opt(2024, 3, 5)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap();
        let table = SourceTable::from_rows(
            &names(&["D"]),
            vec![vec![dt.into()], vec![EnumCellValue::None], vec![dt.into()]],
        )
        .unwrap();

        let table_kept = table.filter_rows(&[false, true, true]).unwrap();
        assert_eq!(table_kept.row(0).unwrap(), vec![EnumCellValue::None]);
        assert_eq!(table_kept.row(1).unwrap(), vec![EnumCellValue::DateTime(dt)]);
        assert_eq!(table_kept.row_number(1), 4);
    }

    #[test]
    fn test_filter_rows_keeps_row_numbers_aligned() {
        let table = SourceTable::from_rows(
            &names(&["A"]),
            vec![vec!["a".into()], vec!["b".into()], vec!["c".into()]],
        )
        .unwrap();

        let table_kept = table.filter_rows(&[true, false, true]).unwrap();
        assert_eq!(table_kept.height(), 2);
        assert_eq!(table_kept.row(1).unwrap(), vec!["c".into()]);
        assert_eq!(table_kept.row_number(1), 4);
    }

    #[test]
    fn test_from_rows_rejects_bad_input() {
        assert!(matches!(
            SourceTable::from_rows(&[], vec![]),
            Err(XlsxIoError::InvalidOptions(_))
        ));
        assert!(matches!(
            SourceTable::from_rows(&names(&["A", "A"]), vec![]),
            Err(XlsxIoError::DuplicateColumns(_))
        ));
        assert!(matches!(
            SourceTable::from_rows(&names(&["A", "B"]), vec![vec!["x".into()]]),
            Err(XlsxIoError::InvalidOptions(_))
        ));
    }

    #[test]
    fn test_cell_conversion_applies_na_values() {
        let na = names(&["", "N/A"]);
        assert_eq!(
            derive_cell_value_from_data(&Data::String("N/A".to_string()), &na),
            EnumCellValue::None
        );
        assert_eq!(
            derive_cell_value_from_data(&Data::String("NA".to_string()), &na),
            EnumCellValue::String("NA".to_string())
        );
        assert_eq!(
            derive_cell_value_from_data(&Data::Int(4), &na),
            EnumCellValue::Number(4.0)
        );
        assert_eq!(
            derive_cell_value_from_data(&Data::Bool(true), &na),
            EnumCellValue::Bool(true)
        );
        assert_eq!(
            derive_cell_value_from_any_value(AnyValue::Boolean(false)),
            EnumCellValue::Bool(false)
        );
        assert_eq!(derive_cell_value_from_data(&Data::Empty, &na), EnumCellValue::None);
    }
}
