//! Pivot pipeline: every complete source row becomes a vertical list of
//! `"{column}:"` / value pairs, separated by blank spacers or page breaks.

use std::path::Path;

use sheetkit_io_xlsx::{EnumCellValue, EnumRowKind, SheetGrid, SourceTable, load_table};

use crate::conf::{N_BLANK_ROWS_PER_SPACER, SpecPivotStyles, derive_pivot_styles};
use crate::report::{ReportLayout, ReportLayoutBuilder};
use crate::spec::{LayoutError, SpecPivotOptions, validate_style_options};
use crate::util::{drop_empty_rows, find_empty_columns, save_grid};

/// Pivot `path_file_in` into `path_file_out`.
///
/// Rows with a missing retained value are skipped and listed in the report;
/// any other failure aborts the run before the output file is created.
pub fn pivot(
    path_file_in: &Path,
    path_file_out: &Path,
    options: &SpecPivotOptions,
) -> Result<ReportLayout, LayoutError> {
    validate_pivot_options(options)?;

    let table = load_table(path_file_in, &options.columns, &options.read_options)?;
    let (grid, builder) = build_pivot_grid_with_builder(&table, options)?;
    let report = save_grid(&grid, path_file_out, &options.sheet_name_out, builder)?;

    log::info!("{} -> {}", report.format("[PIVOT]"), path_file_out.display());
    Ok(report)
}

/// Lay out `table` as pivot blocks without touching the filesystem.
pub fn build_pivot_grid(
    table: &SourceTable,
    options: &SpecPivotOptions,
) -> Result<(SheetGrid, ReportLayout), LayoutError> {
    validate_pivot_options(options)?;

    let (grid, mut builder) = build_pivot_grid_with_builder(table, options)?;
    builder.cnt_rows_written = grid.height() as u64;
    Ok((grid, builder.build()))
}

fn validate_pivot_options(options: &SpecPivotOptions) -> Result<(), LayoutError> {
    validate_style_options(&options.style_options)?;
    if options.block_spacing == 0 {
        return Err(LayoutError::InvalidOptions(
            "block_spacing must be >= 1.".to_string(),
        ));
    }
    Ok(())
}

fn build_pivot_grid_with_builder(
    table: &SourceTable,
    options: &SpecPivotOptions,
) -> Result<(SheetGrid, ReportLayoutBuilder), LayoutError> {
    let mut builder = ReportLayoutBuilder {
        cnt_rows_read: table.height() as u64,
        cnt_rows_blank: table.cnt_rows_blank() as u64,
        ..Default::default()
    };
    let table_kept = drop_empty_rows(table, options.rule_row_drop, &mut builder)?;
    let l_columns = table_kept.columns();
    let l_labels: Vec<EnumCellValue> = l_columns
        .iter()
        .map(|c_name| EnumCellValue::from(format!("{c_name}:")))
        .collect();

    let mut grid = SheetGrid::new();
    let mut n_spacers = 0usize;
    for n_idx_row in 0..table_kept.height() {
        let l_values = table_kept.row(n_idx_row)?;
        if options.rule_row_skip.is_empty_row(&l_values) {
            builder.add_skipped(
                table_kept.row_number(n_idx_row),
                find_empty_columns(&l_columns, &l_values),
            );
            continue;
        }

        if let Some(c_link) = options.link() {
            grid.append_row(
                EnumRowKind::Link,
                vec![options.link_label.as_str().into(), c_link.into()],
            );
        }
        for (label, value) in l_labels.iter().zip(l_values) {
            grid.append_row(EnumRowKind::Field, vec![label.clone(), value]);
        }
        builder.add_block();

        if n_spacers == options.block_spacing {
            grid.set_page_break_before(grid.height());
            n_spacers = 0;
        } else {
            for _ in 0..N_BLANK_ROWS_PER_SPACER {
                grid.append_row(EnumRowKind::Blank, vec![]);
            }
            n_spacers += 1;
        }
    }

    let styles = derive_pivot_styles(&options.style_options);
    apply_pivot_styles(&mut grid, &styles)?;
    grid.autofit_columns(&options.policy_autofit)?;
    grid.set_page_setup(options.page_setup.clone());

    log::debug!(
        "Pivot laid out {} blocks ({} skipped, {} page breaks)",
        builder.cnt_blocks,
        builder.rows_skipped.len(),
        grid.page_breaks().len()
    );
    Ok((grid, builder))
}

/// Label cells get the plain format, value cells the bordered one.
fn apply_pivot_styles(grid: &mut SheetGrid, styles: &SpecPivotStyles) -> Result<(), LayoutError> {
    let l_rows_styled: Vec<usize> = [EnumRowKind::Link, EnumRowKind::Field]
        .into_iter()
        .flat_map(|kind| grid.rows_of_kind(kind))
        .collect();
    for n_idx_row in l_rows_styled {
        grid.set_format(n_idx_row, 0, styles.fmt_label.clone())?;
        grid.set_format(n_idx_row, 1, styles.fmt_value.clone())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn table_complete(n_rows: usize) -> SourceTable {
        let rows = (0..n_rows)
            .map(|n_idx| vec![(n_idx as f64).into(), format!("r{n_idx}").into()])
            .collect();
        SourceTable::from_rows(&["A".to_string(), "B".to_string()], rows).unwrap()
    }

    #[test]
    fn test_partial_rows_are_skipped_with_diagnostics() {
        let table = SourceTable::from_rows(
            &["A".to_string(), "B".to_string()],
            vec![
                vec![1.0.into(), "x".into()],
                vec![EnumCellValue::None, "y".into()],
                vec![2.0.into(), EnumCellValue::None],
            ],
        )
        .unwrap();
        let (grid, report) =
            build_pivot_grid(&table, &SpecPivotOptions::with_columns(["A", "B"])).unwrap();

        assert_eq!(report.cnt_blocks, 1);
        assert_eq!(report.cnt_rows_skipped, 2);
        assert_eq!(report.rows_skipped[0].row_number, 3);
        assert_eq!(report.rows_skipped[0].columns_empty, vec!["A".to_string()]);
        assert_eq!(report.rows_skipped[1].row_number, 4);
        assert_eq!(report.rows_skipped[1].columns_empty, vec!["B".to_string()]);

        assert_eq!(grid.rows_of_kind(EnumRowKind::Field), vec![0, 1]);
        assert_eq!(grid.rows()[0].values, vec!["A:".into(), 1.0.into()]);
        assert_eq!(grid.rows()[1].values, vec!["B:".into(), "x".into()]);
        assert_eq!(grid.rows_of_kind(EnumRowKind::Blank), vec![2, 3]);
    }

    #[test]
    fn test_link_row_precedes_every_block() {
        let mut options = SpecPivotOptions::with_columns(["A", "B"]);
        options.link_text = Some("https://example.org/form".to_string());
        let (grid, _) = build_pivot_grid(&table_complete(2), &options).unwrap();

        assert_eq!(grid.rows_of_kind(EnumRowKind::Link), vec![0, 5]);
        assert_eq!(
            grid.rows()[5].values,
            vec!["Link:".into(), "https://example.org/form".into()]
        );
    }

    #[test]
    fn test_empty_link_text_emits_no_link_row() {
        let mut options = SpecPivotOptions::with_columns(["A", "B"]);
        options.link_text = Some(String::new());
        let (grid, _) = build_pivot_grid(&table_complete(1), &options).unwrap();
        assert!(grid.rows_of_kind(EnumRowKind::Link).is_empty());
        assert_eq!(grid.height(), 4);
    }

    #[test]
    fn test_page_break_replaces_every_seventh_spacer() {
        let (grid, report) =
            build_pivot_grid(&table_complete(8), &SpecPivotOptions::with_columns(["A", "B"]))
                .unwrap();

        // six blocks of 2 fields + 2 blanks, then the seventh block ends on a break
        assert_eq!(report.cnt_blocks, 8);
        assert_eq!(grid.page_breaks(), &[26]);
        assert_eq!(grid.rows_of_kind(EnumRowKind::Blank).len(), 2 * 7);
        assert_eq!(grid.height(), 8 * 2 + 2 * 7);
        assert_eq!(grid.rows()[26].values, vec!["A:".into(), 7.0.into()]);
    }

    #[test]
    fn test_block_spacing_of_one_alternates() {
        let mut options = SpecPivotOptions::with_columns(["A", "B"]);
        options.block_spacing = 1;
        let (grid, _) = build_pivot_grid(&table_complete(4), &options).unwrap();

        assert_eq!(grid.page_breaks(), &[6, 12]);
        assert_eq!(grid.height(), 12);
    }

    #[test]
    fn test_zero_block_spacing_is_rejected() {
        let mut options = SpecPivotOptions::with_columns(["A", "B"]);
        options.block_spacing = 0;
        assert!(matches!(
            build_pivot_grid(&table_complete(1), &options),
            Err(LayoutError::InvalidOptions(_))
        ));
    }

    #[test]
    fn test_styles_and_page_setup() {
        let mut options = SpecPivotOptions::with_columns(["A", "B"]);
        options.link_text = Some("l".to_string());
        let styles = derive_pivot_styles(&options.style_options);
        let (grid, _) = build_pivot_grid(&table_complete(1), &options).unwrap();

        assert_eq!(grid.format(0, 0), Some(&styles.fmt_label));
        assert_eq!(grid.format(0, 1), Some(&styles.fmt_value));
        assert_eq!(grid.format(2, 1), Some(&styles.fmt_value));
        assert_eq!(grid.format(3, 0), None);
        assert!(grid.page_setup().if_right_to_left);
        assert_eq!(grid.page_setup().paper_size, Some(9));
    }

    #[test]
    fn test_column_widths_cover_labels_and_values() {
        let mut options = SpecPivotOptions::with_columns(["A", "B"]);
        options.link_text = Some("abcdefgh".to_string());
        let (grid, _) = build_pivot_grid(&table_complete(1), &options).unwrap();

        assert_eq!(grid.column_widths(), &[7, 10]);
    }
}
