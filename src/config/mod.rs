//! Report Configuration Module
//!
//! Provides per-site configuration loaded from TOML files: CSV layout,
//! channel names, the short-segment threshold and the gas limit table.
//!
//! ## Loading Order
//!
//! 1. `TBM_REPORT_CONFIG` environment variable (path to TOML file)
//! 2. `tbm_report.toml` in the current working directory
//! 3. Built-in defaults
//!
//! ## Usage
//!
//! The config is loaded once and passed explicitly to the analyses:
//!
//! ```ignore
//! let config = ReportConfig::load();
//! let report = ShiftReport::build(&log, &config)?;
//! ```

mod report_config;
pub mod validation;

pub use report_config::*;
