//! Reflow pipeline: every source row becomes a banner/header/data/blank block.

use std::path::Path;

use sheetkit_io_xlsx::{EnumCellValue, EnumRowKind, SheetGrid, SourceTable, load_table};

use crate::conf::{SpecReflowStyles, derive_reflow_styles};
use crate::report::{ReportLayout, ReportLayoutBuilder};
use crate::spec::{LayoutError, SpecReflowOptions, validate_style_options};
use crate::util::{drop_empty_rows, save_grid};

/// Reflow `path_file_in` into `path_file_out`.
///
/// Nothing is written when loading or layout fails.
pub fn reflow(
    path_file_in: &Path,
    path_file_out: &Path,
    options: &SpecReflowOptions,
) -> Result<ReportLayout, LayoutError> {
    validate_style_options(&options.style_options)?;

    let table = load_table(path_file_in, &options.columns, &options.read_options)?;
    let (grid, builder) = build_reflow_grid_with_builder(&table, options)?;
    let report = save_grid(&grid, path_file_out, &options.sheet_name_out, builder)?;

    log::info!("{} -> {}", report.format("[REFLOW]"), path_file_out.display());
    Ok(report)
}

/// Lay out `table` as reflow blocks without touching the filesystem.
pub fn build_reflow_grid(
    table: &SourceTable,
    options: &SpecReflowOptions,
) -> Result<(SheetGrid, ReportLayout), LayoutError> {
    validate_style_options(&options.style_options)?;

    let (grid, mut builder) = build_reflow_grid_with_builder(table, options)?;
    builder.cnt_rows_written = grid.height() as u64;
    Ok((grid, builder.build()))
}

fn build_reflow_grid_with_builder(
    table: &SourceTable,
    options: &SpecReflowOptions,
) -> Result<(SheetGrid, ReportLayoutBuilder), LayoutError> {
    let mut builder = ReportLayoutBuilder {
        cnt_rows_read: table.height() as u64,
        cnt_rows_blank: table.cnt_rows_blank() as u64,
        ..Default::default()
    };
    let table_kept = drop_empty_rows(table, options.rule_row_drop, &mut builder)?;

    let l_headers = table_kept.columns();
    let n_width = l_headers.len();
    let l_header_values: Vec<EnumCellValue> = l_headers
        .iter()
        .map(|c_name| EnumCellValue::from(c_name.as_str()))
        .collect();

    let mut grid = SheetGrid::new();
    for n_idx_row in 0..table_kept.height() {
        if let Some(c_banner) = options.banner() {
            let mut l_banner_values = vec![EnumCellValue::None; n_width];
            l_banner_values[0] = EnumCellValue::from(c_banner);
            grid.append_row(EnumRowKind::Banner, l_banner_values);
        }
        grid.append_row(EnumRowKind::Header, l_header_values.clone());
        grid.append_row(EnumRowKind::Data, table_kept.row(n_idx_row)?);
        grid.append_row(EnumRowKind::Blank, vec![EnumCellValue::None; n_width]);
        builder.add_block();
    }

    let styles = derive_reflow_styles(&options.style_options);
    apply_reflow_styles(&mut grid, &styles)?;
    grid.autofit_columns(&options.policy_autofit)?;
    merge_banner_rows(&mut grid, n_width, &styles)?;

    log::debug!(
        "Reflow laid out {} blocks ({} rows dropped)",
        builder.cnt_blocks,
        builder.cnt_rows_dropped
    );
    Ok((grid, builder))
}

/// Style every constructed cell: boxed unless the whole row is blank.
fn apply_reflow_styles(grid: &mut SheetGrid, styles: &SpecReflowStyles) -> Result<(), LayoutError> {
    let l_if_blank: Vec<bool> = grid.rows().iter().map(|row| row.is_blank()).collect();
    for (n_idx_row, if_blank) in l_if_blank.into_iter().enumerate() {
        let fmt = if if_blank {
            &styles.fmt_base
        } else {
            &styles.fmt_boxed
        };
        grid.set_row_format(n_idx_row, fmt)?;
    }
    Ok(())
}

fn merge_banner_rows(
    grid: &mut SheetGrid,
    n_width: usize,
    styles: &SpecReflowStyles,
) -> Result<(), LayoutError> {
    if n_width == 0 {
        return Ok(());
    }
    for n_idx_row in grid.rows_of_kind(EnumRowKind::Banner) {
        grid.merge_row(n_idx_row, 0, n_width - 1)?;
        grid.set_format(n_idx_row, 0, styles.fmt_boxed.clone())?;
    }
    Ok(())
}
