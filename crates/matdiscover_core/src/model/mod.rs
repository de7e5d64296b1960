//! Read models projected from the provenance store.
//!
//! # Responsibility
//! - Define the node record shared by every lookup.
//! - Define the per-material tag → node record and the tag vocabulary.
//!
//! # Invariants
//! - Every node is identified by a stable `NodeId`.
//! - Records are read-only views; nothing here writes back to the store.

pub mod material;
pub mod node;
