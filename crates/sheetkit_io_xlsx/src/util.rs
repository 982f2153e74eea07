//! Stateless helper utilities shared by the reader, grid and writer.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDateTime;

use crate::conf::{
    N_LEN_EXCEL_SHEET_NAME_MAX, N_PAGE_BREAKS_EXCEL_MAX, N_SERIAL_EXCEL_UNIX_EPOCH,
    TUP_EXCEL_ILLEGAL,
};
use crate::spec::{
    SpecAutofitCellsPolicy, SpecSheetHorizontalMerge, SpecXlsxReport, XlsxIoError,
};

////////////////////////////////////////////////////////////////////////////////
// #region ColumnSelection

/// Validate that `columns` has no duplicated names.
pub fn validate_unique_columns(columns: &[String]) -> Result<(), XlsxIoError> {
    if columns.len() == columns.iter().collect::<BTreeSet<_>>().len() {
        return Ok(());
    }

    let mut dict_pos: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (n_idx, c_name) in columns.iter().enumerate() {
        dict_pos.entry(c_name).or_default().push(n_idx);
    }

    let c_msg = dict_pos
        .iter()
        .filter_map(|(c_name, l_pos)| {
            if l_pos.len() > 1 {
                Some(format!(
                    "{c_name:?} x{} at indices {:?}",
                    l_pos.len(),
                    l_pos
                ))
            } else {
                None
            }
        })
        .collect::<Vec<_>>()
        .join("; ");

    Err(XlsxIoError::DuplicateColumns(c_msg))
}

/// Resolve requested column names against a header row.
///
/// Returns source indices in the order of `refs`. The first header cell with
/// an exactly equal text wins when the header repeats a name.
pub fn select_column_indices(header: &[String], refs: &[String]) -> Result<Vec<usize>, XlsxIoError> {
    refs.iter()
        .map(|ref_col| {
            header
                .iter()
                .position(|c_name| c_name == ref_col)
                .ok_or_else(|| XlsxIoError::ColumnNotFound(ref_col.clone()))
        })
        .collect()
}

/// True when `text` should be read as a missing value.
pub fn is_na_text(text: &str, na_values: &[String]) -> bool {
    na_values.iter().any(|c_na| c_na == text)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetNormalization

/// Replace invalid chars and trim to valid Excel sheet name.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    c_name = c_name.trim().to_string();
    if c_name.is_empty() {
        c_name = "Sheet".to_string();
    }

    c_name.chars().take(N_LEN_EXCEL_SHEET_NAME_MAX).collect()
}

/// Keep the first breaks Excel accepts and warn about the rest.
pub fn plan_page_breaks(rows_break: &[usize], report: &mut SpecXlsxReport) -> Vec<usize> {
    let mut l_breaks: Vec<usize> = rows_break
        .iter()
        .copied()
        .filter(|n_row| *n_row > 0)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    if l_breaks.len() > N_PAGE_BREAKS_EXCEL_MAX {
        report.warn(format!(
            "Excel limit overflow: {} page breaks requested, keeping the first {}.",
            l_breaks.len(),
            N_PAGE_BREAKS_EXCEL_MAX
        ));
        l_breaks.truncate(N_PAGE_BREAKS_EXCEL_MAX);
    }
    l_breaks
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region MergeUtils

/// Group merges by row index.
pub fn derive_horizontal_merges_by_row(
    merges: &[SpecSheetHorizontalMerge],
) -> BTreeMap<usize, Vec<&SpecSheetHorizontalMerge>> {
    let mut dict_merges_by_row: BTreeMap<usize, Vec<&SpecSheetHorizontalMerge>> = BTreeMap::new();
    for merge in merges {
        dict_merges_by_row
            .entry(merge.row_idx_start)
            .or_default()
            .push(merge);
    }
    dict_merges_by_row
}

/// Build lookup set for cells covered by a horizontal merge (excluding anchor).
pub fn derive_horizontal_merge_tracker(
    merges: &[SpecSheetHorizontalMerge],
) -> BTreeSet<(usize, usize)> {
    let mut set_merged_cells = BTreeSet::new();
    for merge in merges {
        for col_idx in (merge.col_idx_start + 1)..=merge.col_idx_end {
            set_merged_cells.insert((merge.row_idx_start, col_idx));
        }
    }
    set_merged_cells
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ColumnWidth

/// Displayed length of `text` in characters.
pub fn estimate_text_len(text: &str) -> usize {
    text.chars().count()
}

/// Final column width for the longest text length seen in a column.
pub fn calculate_column_width(len_text_max: usize, policy: &SpecAutofitCellsPolicy) -> usize {
    let n_width = len_text_max + policy.width_cell_padding;
    usize::min(
        policy.width_cell_max,
        usize::max(policy.width_cell_min, n_width),
    )
}

/// Excel serial date (1900 system) of `dt`.
pub fn derive_excel_serial(dt: &NaiveDateTime) -> f64 {
    N_SERIAL_EXCEL_UNIX_EPOCH + dt.and_utc().timestamp_millis() as f64 / 86_400_000.0
}

/// Validate autofit bounds.
pub fn validate_policy_autofit(policy_autofit: &SpecAutofitCellsPolicy) -> Result<(), XlsxIoError> {
    if policy_autofit.width_cell_max < policy_autofit.width_cell_min {
        return Err(XlsxIoError::InvalidOptions(
            "policy_autofit.width_cell_max must be >= policy_autofit.width_cell_min.".to_string(),
        ));
    }
    Ok(())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    fn names(vals: &[&str]) -> Vec<String> {
        vals.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_excel_serial_of_datetime() {
        let dt = chrono::NaiveDate::from_ymd_opt(2024, 3, 5)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .unwrap();
        assert_eq!(derive_excel_serial(&dt), 45_356.5);
        assert_eq!(derive_excel_serial(&NaiveDateTime::UNIX_EPOCH), 25_569.0);
    }

    #[test]
    fn test_select_column_indices_keeps_request_order() {
        let header = names(&["id", "ئيمەیڵ", "role", "id"]);
        let l_idx = select_column_indices(&header, &names(&["role", "id", "ئيمەیڵ"])).unwrap();
        assert_eq!(l_idx, vec![2, 0, 1]);
    }

    #[test]
    fn test_select_column_indices_reports_missing_column() {
        let header = names(&["id", "role"]);
        let err = select_column_indices(&header, &names(&["id", "Role"])).unwrap_err();
        assert!(matches!(err, XlsxIoError::ColumnNotFound(ref c) if c == "Role"));
    }

    #[test]
    fn test_validate_unique_columns_lists_positions() {
        let err = validate_unique_columns(&names(&["a", "b", "a"])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Duplicate column names detected: \"a\" x2 at indices [0, 2]"
        );
    }

    #[test]
    fn test_sanitize_sheet_name() {
        assert_eq!(sanitize_sheet_name(" a/b:c ", "_"), "a_b_c");
        assert_eq!(sanitize_sheet_name("  ", "_"), "Sheet");
        assert_eq!(sanitize_sheet_name(&"x".repeat(40), "_").len(), 31);
    }

    #[test]
    fn test_calculate_column_width_pads_and_caps() {
        let policy = SpecAutofitCellsPolicy::default();
        assert_eq!(calculate_column_width(0, &policy), 2);
        assert_eq!(calculate_column_width(10, &policy), 12);
        assert_eq!(calculate_column_width(400, &policy), 255);
        assert_eq!(estimate_text_len("ڕۆڵ"), 3);
    }

    #[test]
    fn test_merge_tracker_excludes_anchor() {
        let merges = vec![
            SpecSheetHorizontalMerge {
                row_idx_start: 0,
                col_idx_start: 0,
                col_idx_end: 2,
                text: "t".to_string(),
            },
            SpecSheetHorizontalMerge {
                row_idx_start: 4,
                col_idx_start: 1,
                col_idx_end: 2,
                text: "t".to_string(),
            },
        ];

        let set_merged = derive_horizontal_merge_tracker(&merges);
        assert_eq!(
            set_merged.into_iter().collect::<Vec<_>>(),
            vec![(0, 1), (0, 2), (4, 2)]
        );
        let dict_by_row = derive_horizontal_merges_by_row(&merges);
        assert_eq!(dict_by_row.keys().copied().collect::<Vec<_>>(), vec![0, 4]);
    }

    #[test]
    fn test_plan_page_breaks_dedups_and_caps() {
        let mut report = SpecXlsxReport::default();
        assert_eq!(plan_page_breaks(&[5, 0, 5, 2], &mut report), vec![2, 5]);
        assert!(report.warnings.is_empty());

        let l_many: Vec<usize> = (1..=1_100).collect();
        let l_breaks = plan_page_breaks(&l_many, &mut report);
        assert_eq!(l_breaks.len(), N_PAGE_BREAKS_EXCEL_MAX);
        assert_eq!(report.warnings.len(), 1);
    }
}
