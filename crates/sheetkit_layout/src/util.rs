//! Helpers shared by the reflow and pivot pipelines.

use std::path::Path;

use sheetkit_io_xlsx::{EnumCellValue, SheetGrid, SourceTable, XlsxWriter};

use crate::report::{ReportLayout, ReportLayoutBuilder};
use crate::spec::{EnumRowEmptiness, LayoutError};

/// Drop rows that are empty under `rule`, counting them on `builder`.
pub(crate) fn drop_empty_rows(
    table: &SourceTable,
    rule: EnumRowEmptiness,
    builder: &mut ReportLayoutBuilder,
) -> Result<SourceTable, LayoutError> {
    let mut l_mask = Vec::with_capacity(table.height());
    for n_idx_row in 0..table.height() {
        l_mask.push(!rule.is_empty_row(&table.row(n_idx_row)?));
    }

    let n_rows_dropped = l_mask.iter().filter(|if_keep| !**if_keep).count();
    builder.cnt_rows_dropped += n_rows_dropped as u64;
    if n_rows_dropped == 0 {
        return Ok(table.clone());
    }
    Ok(table.filter_rows(&l_mask)?)
}

/// Names of the columns whose value is missing in `row`.
pub(crate) fn find_empty_columns(columns: &[String], row: &[EnumCellValue]) -> Vec<String> {
    columns
        .iter()
        .zip(row)
        .filter_map(|(c_name, value)| {
            if value.is_none() {
                Some(c_name.clone())
            } else {
                None
            }
        })
        .collect()
}

/// Write `grid` as the only sheet of `path_file_out` and finish the report.
pub(crate) fn save_grid(
    grid: &SheetGrid,
    path_file_out: &Path,
    sheet_name: &str,
    mut builder: ReportLayoutBuilder,
) -> Result<ReportLayout, LayoutError> {
    let mut writer = XlsxWriter::new(path_file_out.to_path_buf());
    writer.write_sheet_grid(grid, sheet_name)?;
    writer.close()?;

    for report_xlsx in writer.report() {
        for c_warning in report_xlsx.warnings {
            builder.add_warning(c_warning);
        }
    }
    builder.cnt_rows_written = grid.height() as u64;
    Ok(builder.build())
}
