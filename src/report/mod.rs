//! League exports.
//!
//! This module provides:
//! - Summary and per-race detail CSV files
//! - A PNG league table drawn with plotters
//! - A pretty-printed JSON snapshot
//! - Table styling loaded from chart_config.json

pub mod charts;
pub mod config;
pub mod csv_writer;
pub mod export;

pub use config::ChartConfig;
pub use export::{export_detail_csv, export_json, export_summary_csv, export_table_png};
