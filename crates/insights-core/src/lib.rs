//! Domain types and value coercion shared by the field insights crates.
//!
//! Holds the canonical visit and inventory records, the sentinel values used
//! when exports omit a field, the best-effort cell coercions, static
//! reference data, CLI settings and the common error type.

pub mod coercion;
pub mod error;
pub mod models;
pub mod reference;
pub mod settings;
