//! Runtime layer for Field Insights.
//!
//! Runs ingestion batches over uploaded files, holds the session's records
//! and drives the dashboard state.

pub mod dashboard;
pub mod pipeline;
pub mod store;

pub use insights_core as core;
pub use insights_data as data;
