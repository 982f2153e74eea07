//! Layout run report models and mutable report builder.

use std::collections::BTreeMap;
use std::fmt;

/// One source row skipped by the pivot pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecRowSkip {
    /// 1-based worksheet row number.
    pub row_number: usize,
    /// Retained columns that were empty.
    pub columns_empty: Vec<String>,
}

impl fmt::Display for SpecRowSkip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Row {} contains empty cells in columns: {}, skipping...",
            self.row_number,
            self.columns_empty.join(", ")
        )
    }
}

/// Aggregate counters and diagnostics for one pipeline run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReportLayout {
    /// Data rows loaded from the source sheet.
    pub cnt_rows_read: u64,
    /// Rows dropped at load time (empty across every source column).
    pub cnt_rows_blank: u64,
    /// Rows dropped silently by the pipeline's drop rule.
    pub cnt_rows_dropped: u64,
    /// Rows skipped with a diagnostic.
    pub cnt_rows_skipped: u64,
    /// Output blocks emitted (one per kept source row).
    pub cnt_blocks: u64,
    /// Output rows written.
    pub cnt_rows_written: u64,
    /// Details of skipped rows.
    pub rows_skipped: Vec<SpecRowSkip>,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
}

impl ReportLayout {
    /// Number of collected warnings.
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_rows_read".to_string(), self.cnt_rows_read);
        dict_counts.insert("cnt_rows_blank".to_string(), self.cnt_rows_blank);
        dict_counts.insert("cnt_rows_dropped".to_string(), self.cnt_rows_dropped);
        dict_counts.insert("cnt_rows_skipped".to_string(), self.cnt_rows_skipped);
        dict_counts.insert("cnt_blocks".to_string(), self.cnt_blocks);
        dict_counts.insert("cnt_rows_written".to_string(), self.cnt_rows_written);
        dict_counts.insert("cnt_warnings".to_string(), self.warning_count() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        let dict_counts = self.to_dict();
        format!(
            "{prefix} read={} blank={} dropped={} skipped={} blocks={} rows={} warnings={}",
            dict_counts["cnt_rows_read"],
            dict_counts["cnt_rows_blank"],
            dict_counts["cnt_rows_dropped"],
            dict_counts["cnt_rows_skipped"],
            dict_counts["cnt_blocks"],
            dict_counts["cnt_rows_written"],
            dict_counts["cnt_warnings"]
        )
    }
}

impl fmt::Display for ReportLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[LAYOUT]"))
    }
}

/// Mutable accumulator for layout statistics.
#[derive(Debug, Default, Clone)]
pub struct ReportLayoutBuilder {
    /// See [`ReportLayout::cnt_rows_read`].
    pub cnt_rows_read: u64,
    /// See [`ReportLayout::cnt_rows_blank`].
    pub cnt_rows_blank: u64,
    /// See [`ReportLayout::cnt_rows_dropped`].
    pub cnt_rows_dropped: u64,
    /// See [`ReportLayout::cnt_blocks`].
    pub cnt_blocks: u64,
    /// See [`ReportLayout::cnt_rows_written`].
    pub cnt_rows_written: u64,
    /// See [`ReportLayout::rows_skipped`].
    pub rows_skipped: Vec<SpecRowSkip>,
    /// See [`ReportLayout::warnings`].
    pub warnings: Vec<String>,
}

impl ReportLayoutBuilder {
    /// Increment emitted block count by one.
    pub fn add_block(&mut self) {
        self.cnt_blocks += 1;
    }

    /// Record one skipped row and log it.
    pub fn add_skipped(&mut self, row_number: usize, columns_empty: Vec<String>) {
        let row_skip = SpecRowSkip {
            row_number,
            columns_empty,
        };
        log::warn!("{row_skip}");
        self.rows_skipped.push(row_skip);
    }

    /// Add warning message.
    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    /// Finalize builder into immutable report.
    pub fn build(self) -> ReportLayout {
        ReportLayout {
            cnt_rows_read: self.cnt_rows_read,
            cnt_rows_blank: self.cnt_rows_blank,
            cnt_rows_dropped: self.cnt_rows_dropped,
            cnt_rows_skipped: self.rows_skipped.len() as u64,
            cnt_blocks: self.cnt_blocks,
            cnt_rows_written: self.cnt_rows_written,
            rows_skipped: self.rows_skipped,
            warnings: self.warnings,
        }
    }
}
