//! Core domain logic for materials discovery over a provenance store.
//! This crate owns tag resolution, the quantity catalog and every
//! projection rendered from them.

pub mod allowlist;
pub mod config;
pub mod db;
pub mod index;
pub mod links;
pub mod logging;
pub mod model;
pub mod quantity;
pub mod service;
pub mod store;

pub use allowlist::{AllowlistError, MaterialAllowlist, MaterialInfo};
pub use config::{ConfigError, DiscoverConfig};
pub use index::{CachePolicy, CacheStats, IndexError, IndexResult, IsothermMap, TagIndex};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::material::{gas_species, KnownTag, MaterialRecord};
pub use model::node::{NodeId, NodeType, StoreNode};
pub use quantity::{CatalogError, Quantity, QuantityCatalog, Scale};
pub use service::detail::DetailView;
pub use service::discover_service::{DiscoverService, OpenError};
pub use service::export::{ExportError, ExportedCif};
pub use service::figure::{
    figure_values, FigureData, FigureError, FigureRow, FigureSelection, FigureValue,
};
pub use service::source_policy::SourcePolicy;
pub use service::table::{elements_from_formula, MaterialTableRow};
pub use store::{ProvenanceStore, SqliteProvenanceStore, StoreError, StoreResult};

