//! Discovery use-case facade.
//!
//! # Responsibility
//! - Bundle the tag index, quantity catalog and explorer URL behind the
//!   read operations consumers render: figure, table, detail, isotherms.
//! - Bootstrap the SQLite-backed stack from `DiscoverConfig`.
//!
//! # Invariants
//! - Every consumer reads records through the one `TagIndex`, so all of them
//!   share its cache and invalidation.

use crate::allowlist::{AllowlistError, MaterialAllowlist};
use crate::config::DiscoverConfig;
use crate::index::{IndexResult, IsothermMap, TagIndex};
use crate::quantity::{CatalogError, QuantityCatalog};
use crate::service::detail::DetailView;
use crate::service::export::{export_optimized_cifs, ExportError, ExportedCif};
use crate::service::figure::{figure_values, FigureData, FigureError, FigureRow, FigureSelection};
use crate::service::table::{material_table, MaterialTableRow};
use crate::store::{ProvenanceStore, SqliteProvenanceStore, StoreError, StoreResult};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

/// Failure to assemble the service from configuration.
#[derive(Debug)]
pub enum OpenError {
    Allowlist(AllowlistError),
    Catalog(CatalogError),
    Store(StoreError),
}

impl Display for OpenError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Allowlist(err) => write!(f, "{err}"),
            Self::Catalog(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for OpenError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Allowlist(err) => Some(err),
            Self::Catalog(err) => Some(err),
            Self::Store(err) => Some(err),
        }
    }
}

impl From<AllowlistError> for OpenError {
    fn from(value: AllowlistError) -> Self {
        Self::Allowlist(value)
    }
}

impl From<CatalogError> for OpenError {
    fn from(value: CatalogError) -> Self {
        Self::Catalog(value)
    }
}

impl From<StoreError> for OpenError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Discovery facade over any provenance store implementation.
pub struct DiscoverService<S: ProvenanceStore> {
    index: TagIndex<S>,
    catalog: QuantityCatalog,
    explore_url: String,
}

impl DiscoverService<SqliteProvenanceStore> {
    /// Loads allowlist and quantities, then opens the SQLite store.
    pub fn open(config: &DiscoverConfig) -> Result<Self, OpenError> {
        let allowlist = MaterialAllowlist::load(&config.allowlist_path)?;
        let catalog = match &config.quantities_path {
            Some(path) => QuantityCatalog::load(path)?,
            None => QuantityCatalog::builtin()?,
        };
        let store = SqliteProvenanceStore::open(&config.db_path, config.query_timeout)?;

        info!(
            "event=service_open module=service status=ok materials={} quantities={} group_prefix={}",
            allowlist.len(),
            catalog.len(),
            config.group_prefix
        );

        let index = TagIndex::new(store, allowlist)
            .with_group_prefix(config.group_prefix.clone())
            .with_cache_policy(config.cache_policy);
        Ok(Self::new(index, catalog, config.explore_url.clone()))
    }

    /// Closes the underlying connection.
    pub fn close(self) -> StoreResult<()> {
        self.index.into_store().close()
    }
}

impl<S: ProvenanceStore> DiscoverService<S> {
    pub fn new(index: TagIndex<S>, catalog: QuantityCatalog, explore_url: impl Into<String>) -> Self {
        Self {
            index,
            catalog,
            explore_url: explore_url.into(),
        }
    }

    pub fn index(&self) -> &TagIndex<S> {
        &self.index
    }

    pub fn catalog(&self) -> &QuantityCatalog {
        &self.catalog
    }

    pub fn explore_url(&self) -> &str {
        &self.explore_url
    }

    /// Plottable x/y/color data over every allowlisted material.
    pub fn figure(&self, x: &str, y: &str, color: &str) -> Result<FigureData, FigureError> {
        let selection = FigureSelection::new(&self.catalog, x, y, color)?;
        let records = self.index.resolve_all_materials()?;
        Ok(selection.build(&records))
    }

    /// Raw value rows for any list of catalog labels.
    pub fn figure_rows(&self, labels: &[&str]) -> Result<Vec<FigureRow>, FigureError> {
        let quantities = labels
            .iter()
            .map(|label| {
                self.catalog
                    .get(label)
                    .ok_or_else(|| FigureError::UnknownQuantity(label.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let records = self.index.resolve_all_materials()?;
        Ok(figure_values(&records, &quantities))
    }

    pub fn material_table(&self) -> IndexResult<Vec<MaterialTableRow>> {
        let records = self.index.resolve_all_materials()?;
        Ok(material_table(self.index.allowlist(), &records))
    }

    /// Detail page of one material; `Ok(None)` when the store has no group
    /// for it.
    pub fn detail(&self, material_id: &str) -> IndexResult<Option<DetailView>> {
        Ok(self
            .index
            .resolve_material(material_id)?
            .map(|record| DetailView::for_record(&record, &self.explore_url)))
    }

    pub fn isotherms(&self, material_id: &str) -> IndexResult<IsothermMap> {
        self.index.resolve_isotherms(material_id)
    }

    /// Writes every optimized structure into the new directory `dir`.
    pub fn export_optimized_cifs(&self, dir: &Path) -> Result<Vec<ExportedCif>, ExportError> {
        let records = self.index.resolve_all_materials()?;
        export_optimized_cifs(&records, dir)
    }
}
