//! `sheetkit_layout` v1:
//! Batch spreadsheet layout pipelines.
//!
//! Modules:
//! - `conf`   : style catalog and layout presets
//! - `spec`   : pipeline options and errors
//! - `report` : run counters and row diagnostics
//! - `reflow` : banner/header/data/blank blocks
//! - `pivot`  : vertical label/value blocks for printing
pub mod conf;
pub mod pivot;
pub mod reflow;
pub mod report;
pub mod spec;
mod util;

pub use pivot::{build_pivot_grid, pivot};
pub use reflow::{build_reflow_grid, reflow};
pub use report::{ReportLayout, ReportLayoutBuilder, SpecRowSkip};
pub use spec::{
    EnumRowEmptiness, LayoutError, SpecPivotOptions, SpecReflowOptions, SpecStyleOptions,
};
