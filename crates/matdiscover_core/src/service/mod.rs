//! Discovery use-case services.
//!
//! # Responsibility
//! - Turn resolved material records into figure, table, detail and export
//!   projections.
//! - Keep the optimized-vs-original fallback in one place.

pub mod detail;
pub mod discover_service;
pub mod energy;
pub mod export;
pub mod figure;
pub mod source_policy;
pub mod table;
