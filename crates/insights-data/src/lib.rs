//! Ingestion and analytics layer for Field Insights.
//!
//! Tokenizes spreadsheet exports, sniffs which schema each file follows,
//! normalizes rows into canonical records and derives the dashboard
//! aggregates from them.

pub mod aggregator;
pub mod normalizer;
pub mod schema;
pub mod tokenizer;

pub use insights_core as core;
