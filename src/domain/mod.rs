//! Core domain types and analytics.

pub mod error;
pub mod sentiment;
pub mod trade;
pub mod dataset;
pub mod filter;
pub mod stats;
pub mod aggregate;
pub mod timeseries;
pub mod streaks;
pub mod hypothesis;
pub mod risk;
pub mod metrics;
pub mod explorer;
pub mod config;
pub mod cache;
