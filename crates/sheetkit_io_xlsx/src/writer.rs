//! XLSX writer kernel that serializes buffered [`SheetGrid`]s into a workbook.

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, Worksheet};

use crate::conf::{
    N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX, derive_datetime_format,
};
use crate::grid::SheetGrid;
use crate::spec::{EnumCellValue, SpecCellFormat, SpecPageSetup, SpecXlsxReport, XlsxIoError};
use crate::util::{
    derive_excel_serial, derive_horizontal_merge_tracker, derive_horizontal_merges_by_row,
    plan_page_breaks, sanitize_sheet_name,
};

/// Buffers sheets into one workbook and saves it on [`XlsxWriter::close`].
pub struct XlsxWriter {
    path_file_out: PathBuf,
    workbook: Workbook,
    set_sheet_names_existing: BTreeSet<String>,
    l_reports: Vec<SpecXlsxReport>,
    if_closed: bool,
}

impl XlsxWriter {
    /// Create writer bound to an output path.
    ///
    /// The workbook is buffered in memory until [`Self::close`] is called.
    pub fn new(path_file_out: PathBuf) -> Self {
        Self {
            path_file_out,
            workbook: Workbook::new(),
            set_sheet_names_existing: BTreeSet::new(),
            l_reports: Vec::new(),
            if_closed: false,
        }
    }

    /// Reports of the sheets written so far, in write order.
    pub fn report(&self) -> Vec<SpecXlsxReport> {
        self.l_reports.clone()
    }

    /// Save the workbook; later calls are no-ops.
    pub fn close(&mut self) -> Result<(), XlsxIoError> {
        if self.if_closed {
            return Ok(());
        }
        self.workbook.save(&self.path_file_out)?;
        self.if_closed = true;
        log::debug!("Saved workbook {}", self.path_file_out.display());
        Ok(())
    }

    /// Write one buffered sheet.
    pub fn write_sheet_grid(&mut self, grid: &SheetGrid, sheet_name: &str) -> Result<(), XlsxIoError> {
        if self.if_closed {
            return Err(XlsxIoError::Closed);
        }
        if grid.height() > N_NROWS_EXCEL_MAX {
            return Err(XlsxIoError::InvalidOptions(format!(
                "Sheet has {} rows; Excel allows at most {N_NROWS_EXCEL_MAX}.",
                grid.height()
            )));
        }
        if grid.width() > N_NCOLS_EXCEL_MAX {
            return Err(XlsxIoError::InvalidOptions(format!(
                "Sheet has {} columns; Excel allows at most {N_NCOLS_EXCEL_MAX}.",
                grid.width()
            )));
        }

        let mut report = SpecXlsxReport::default();
        let sheet_name_unique = self.derive_unique_sheet_name(&sanitize_sheet_name(sheet_name, "_"));
        let l_page_breaks = plan_page_breaks(grid.page_breaks(), &mut report);

        let worksheet = self.workbook.add_worksheet();
        worksheet.set_name(&sheet_name_unique)?;
        apply_page_setup(worksheet, grid.page_setup());

        let set_merged_cells = derive_horizontal_merge_tracker(grid.merges());
        let dict_merges_by_row = derive_horizontal_merges_by_row(grid.merges());
        let mut dict_fmt_cache: HashMap<SpecCellFormat, Format> = HashMap::new();

        for (row_idx, row) in grid.rows().iter().enumerate() {
            for (col_idx, value) in row.values.iter().enumerate() {
                if set_merged_cells.contains(&(row_idx, col_idx)) {
                    continue;
                }
                let format = match (value, grid.format(row_idx, col_idx)) {
                    (EnumCellValue::DateTime(_), spec) => {
                        let spec_dt = spec
                            .cloned()
                            .unwrap_or_default()
                            .with_(derive_datetime_format());
                        Some(derive_cached_format(&mut dict_fmt_cache, &spec_dt))
                    }
                    (_, spec) => spec.map(|spec| derive_cached_format(&mut dict_fmt_cache, spec)),
                };
                write_cell_with_format(worksheet, row_idx, col_idx, value, format.as_ref())?;
            }

            if let Some(l_merges) = dict_merges_by_row.get(&row_idx) {
                for merge in l_merges {
                    let format = grid
                        .format(row_idx, merge.col_idx_start)
                        .map_or_else(Format::new, |spec| {
                            derive_cached_format(&mut dict_fmt_cache, spec)
                        });
                    worksheet.merge_range(
                        cast_row_num(row_idx)?,
                        cast_col_num(merge.col_idx_start)?,
                        cast_row_num(row_idx)?,
                        cast_col_num(merge.col_idx_end)?,
                        &merge.text,
                        &format,
                    )?;
                }
            }
        }

        for (col_idx, n_width) in grid.column_widths().iter().enumerate() {
            worksheet.set_column_width(cast_col_num(col_idx)?, *n_width as f64)?;
        }

        if !l_page_breaks.is_empty() {
            let l_rows_break = l_page_breaks
                .iter()
                .map(|n_row| cast_row_num(*n_row))
                .collect::<Result<Vec<_>, _>>()?;
            worksheet.set_page_breaks(&l_rows_break)?;
        }

        log::debug!(
            "Wrote sheet {sheet_name_unique:?}: {} rows, {} merges, {} page breaks",
            grid.height(),
            grid.merges().len(),
            l_page_breaks.len()
        );
        report.sheets.push(sheet_name_unique);
        self.l_reports.push(report);
        Ok(())
    }

    fn derive_unique_sheet_name(&mut self, name: &str) -> String {
        if !self.set_sheet_names_existing.contains(name) {
            self.set_sheet_names_existing.insert(name.to_string());
            return name.to_string();
        }

        let base_name: String = name
            .chars()
            .take(usize::max(1, N_LEN_EXCEL_SHEET_NAME_MAX - 3))
            .collect();

        let mut n_idx = 2usize;
        loop {
            let candidate: String = format!("{base_name}__{n_idx}")
                .chars()
                .take(N_LEN_EXCEL_SHEET_NAME_MAX)
                .collect();
            if !self.set_sheet_names_existing.contains(&candidate) {
                self.set_sheet_names_existing.insert(candidate.clone());
                return candidate;
            }
            n_idx += 1;
        }
    }
}

fn apply_page_setup(worksheet: &mut Worksheet, page_setup: &SpecPageSetup) {
    if page_setup.if_right_to_left {
        worksheet.set_right_to_left(true);
    }
    if let Some(n_paper_size) = page_setup.paper_size {
        worksheet.set_paper_size(n_paper_size);
    }
    if let Some(margins) = &page_setup.margins {
        worksheet.set_margins(
            margins.left,
            margins.right,
            margins.top,
            margins.bottom,
            margins.header,
            margins.footer,
        );
    }
}

fn derive_cached_format(
    dict_fmt_cache: &mut HashMap<SpecCellFormat, Format>,
    spec: &SpecCellFormat,
) -> Format {
    dict_fmt_cache
        .entry(spec.clone())
        .or_insert_with(|| derive_rust_xlsx_format(spec))
        .clone()
}

fn write_cell_with_format(
    worksheet: &mut Worksheet,
    row_idx: usize,
    col_idx: usize,
    value: &EnumCellValue,
    format: Option<&Format>,
) -> Result<(), XlsxIoError> {
    let n_row = cast_row_num(row_idx)?;
    let n_col = cast_col_num(col_idx)?;
    match (value, format) {
        (EnumCellValue::None, Some(format)) => {
            worksheet.write_blank(n_row, n_col, format)?;
        }
        (EnumCellValue::None, None) => {}
        (EnumCellValue::String(val), Some(format)) => {
            worksheet.write_string_with_format(n_row, n_col, val, format)?;
        }
        (EnumCellValue::String(val), None) => {
            worksheet.write_string(n_row, n_col, val)?;
        }
        (EnumCellValue::Number(val), Some(format)) => {
            worksheet.write_number_with_format(n_row, n_col, *val, format)?;
        }
        (EnumCellValue::Number(val), None) => {
            worksheet.write_number(n_row, n_col, *val)?;
        }
        (EnumCellValue::Bool(val), Some(format)) => {
            worksheet.write_boolean_with_format(n_row, n_col, *val, format)?;
        }
        (EnumCellValue::Bool(val), None) => {
            worksheet.write_boolean(n_row, n_col, *val)?;
        }
        // dates need a date number format or Excel shows the bare serial
        (EnumCellValue::DateTime(val), Some(format)) => {
            worksheet.write_number_with_format(n_row, n_col, derive_excel_serial(val), format)?;
        }
        (EnumCellValue::DateTime(val), None) => {
            let format = derive_rust_xlsx_format(&derive_datetime_format());
            worksheet.write_number_with_format(n_row, n_col, derive_excel_serial(val), &format)?;
        }
    }
    Ok(())
}

/// Translate a style record into a `rust_xlsxwriter` format.
///
/// Unknown alignment names and border codes are ignored.
pub fn derive_rust_xlsx_format(spec: &SpecCellFormat) -> Format {
    let mut format = Format::new();

    if let Some(c_font_name) = &spec.font_name {
        format = format.set_font_name(c_font_name.as_str());
    }
    if let Some(n_font_size) = spec.font_size {
        format = format.set_font_size(n_font_size as f64);
    }
    for c_align in [&spec.align, &spec.valign].into_iter().flatten() {
        if let Some(align) = derive_format_align(c_align) {
            format = format.set_align(align);
        }
    }
    if let Some(n_order) = spec.reading_order
        && (0..=2).contains(&n_order)
    {
        format = format.set_reading_direction(n_order as u8);
    }

    if let Some(border) = spec.border.and_then(derive_format_border) {
        format = format.set_border(border);
    }
    if let Some(border) = spec.border_top.and_then(derive_format_border) {
        format = format.set_border_top(border);
    }
    if let Some(border) = spec.border_bottom.and_then(derive_format_border) {
        format = format.set_border_bottom(border);
    }
    if let Some(border) = spec.border_left.and_then(derive_format_border) {
        format = format.set_border_left(border);
    }
    if let Some(border) = spec.border_right.and_then(derive_format_border) {
        format = format.set_border_right(border);
    }
    if spec.has_border()
        && let Some(c_color) = &spec.border_color
    {
        format = format.set_border_color(c_color.as_str());
    }
    if let Some(c_num_format) = &spec.num_format {
        format = format.set_num_format(c_num_format.as_str());
    }

    format
}

/// Excel border style code (0..=13) to `FormatBorder`.
fn derive_format_border(code: i64) -> Option<FormatBorder> {
    let border = match code {
        0 => FormatBorder::None,
        1 => FormatBorder::Thin,
        2 => FormatBorder::Medium,
        3 => FormatBorder::Dashed,
        4 => FormatBorder::Dotted,
        5 => FormatBorder::Thick,
        6 => FormatBorder::Double,
        7 => FormatBorder::Hair,
        8 => FormatBorder::MediumDashed,
        9 => FormatBorder::DashDot,
        10 => FormatBorder::MediumDashDot,
        11 => FormatBorder::DashDotDot,
        12 => FormatBorder::MediumDashDotDot,
        13 => FormatBorder::SlantDashDot,
        _ => return None,
    };
    Some(border)
}

fn derive_format_align(name: &str) -> Option<FormatAlign> {
    match name.trim().to_ascii_lowercase().as_str() {
        "general" => Some(FormatAlign::General),
        "left" => Some(FormatAlign::Left),
        "center" => Some(FormatAlign::Center),
        "right" => Some(FormatAlign::Right),
        "top" => Some(FormatAlign::Top),
        "bottom" => Some(FormatAlign::Bottom),
        "vcenter" => Some(FormatAlign::VerticalCenter),
        _ => None,
    }
}

fn cast_row_num(value: usize) -> Result<u32, XlsxIoError> {
    u32::try_from(value).map_err(|_| XlsxIoError::IndexOverflow { axis: "row", value })
}

fn cast_col_num(value: usize) -> Result<u16, XlsxIoError> {
    u16::try_from(value).map_err(|_| XlsxIoError::IndexOverflow {
        axis: "column",
        value,
    })
}
