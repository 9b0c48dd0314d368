//! Concrete adapter implementations for ports.

pub mod chart_svg;
pub mod csv_adapter;
pub mod file_config_adapter;
pub mod format;
pub mod html_report_adapter;
pub mod pages;
#[cfg(feature = "web")]
pub mod web;
