//! Tag index: material id → tagged provenance nodes.
//!
//! # Responsibility
//! - Resolve one material, or every allowlisted material, into a
//!   `MaterialRecord` built from its curated group.
//! - Resolve a material's isotherm outputs per gas species.
//! - Memoize results behind an explicit invalidation hook.
//!
//! Only allowlisted ids are memoized, so the memo stays as small as the
//! allowlist; other ids are answered straight from the store every time.
//!
//! # Invariants
//! - When several group versions match a material, only the latest group
//!   (see `compare_group_labels`) contributes nodes.
//! - "No such material" is `Ok(None)` or an absent key; store failures are
//!   always `Err`.
//! - Isotherm lists merge direct outputs first, then multi-temperature
//!   outputs; no ordering beyond that is promised.

mod cache;
mod groups;

pub use cache::{CachePolicy, CacheStats, IsothermMap, ISOTHERM_CACHE_CAPACITY};
pub use groups::{compare_group_labels, group_version};

use crate::allowlist::MaterialAllowlist;
use crate::config::DEFAULT_GROUP_PREFIX;
use crate::model::material::{gas_species, MaterialRecord};
use crate::store::{GroupedNode, ProvenanceStore, StoreError, TaggedNodeQuery};
use cache::RecordCache;
use groups::{all_groups_pattern, material_groups_pattern};
use log::{debug, info, warn};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

const DIRECT_ISOTHERM_TAG_PATTERN: &str = "isot\\_%";

pub type IndexResult<T> = Result<T, IndexError>;

#[derive(Debug)]
pub enum IndexError {
    /// The provenance store could not answer.
    Store(StoreError),
    /// Material ids must be non-blank.
    InvalidMaterialId(String),
}

impl IndexError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Store(err) if err.is_unavailable())
    }
}

impl Display for IndexError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::InvalidMaterialId(value) => write!(f, "invalid material id: `{value}`"),
        }
    }
}

impl Error for IndexError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::InvalidMaterialId(_) => None,
        }
    }
}

impl From<StoreError> for IndexError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Tag index over one provenance store and one allowlist.
///
/// Single-threaded: the memo uses interior mutability without locking.
pub struct TagIndex<S: ProvenanceStore> {
    store: S,
    allowlist: MaterialAllowlist,
    group_prefix: String,
    policy: CachePolicy,
    cache: RefCell<RecordCache>,
}

impl<S: ProvenanceStore> TagIndex<S> {
    /// Creates an index with the default group prefix and revision tracking.
    pub fn new(store: S, allowlist: MaterialAllowlist) -> Self {
        Self {
            store,
            allowlist,
            group_prefix: DEFAULT_GROUP_PREFIX.to_string(),
            policy: CachePolicy::default(),
            cache: RefCell::new(RecordCache::default()),
        }
    }

    pub fn with_group_prefix(mut self, group_prefix: impl Into<String>) -> Self {
        self.group_prefix = group_prefix.into();
        self
    }

    pub fn with_cache_policy(mut self, policy: CachePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn allowlist(&self) -> &MaterialAllowlist {
        &self.allowlist
    }

    pub fn group_prefix(&self) -> &str {
        &self.group_prefix
    }

    /// Consumes the index, handing the store back for closing.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Drops every memoized result.
    pub fn invalidate(&self) {
        self.cache.borrow_mut().clear();
        info!("event=index_invalidate module=index status=ok reason=explicit");
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.borrow().stats()
    }

    /// Records for every allowlisted material that has tagged nodes.
    ///
    /// Allowlisted materials without any tagged node are absent from the map.
    pub fn resolve_all_materials(&self) -> IndexResult<BTreeMap<String, MaterialRecord>> {
        self.sync_cache()?;
        if let Some(records) = self.cache.borrow_mut().all_materials() {
            return Ok(records);
        }

        let started_at = Instant::now();
        let query = TaggedNodeQuery::in_groups(all_groups_pattern(&self.group_prefix))
            .for_materials(self.allowlist.material_ids());
        let rows = self.store.tagged_nodes(&query)?;

        let mut by_material: BTreeMap<String, Vec<GroupedNode>> = BTreeMap::new();
        for row in rows {
            let Some(material_id) = row.material_id.clone() else {
                continue;
            };
            by_material.entry(material_id).or_default().push(row);
        }

        let records: BTreeMap<String, MaterialRecord> = by_material
            .into_iter()
            .map(|(material_id, rows)| {
                let record = build_record(&material_id, rows);
                (material_id, record)
            })
            .collect();

        info!(
            "event=index_resolve_all module=index status=ok allowlisted={} resolved={} duration_ms={}",
            self.allowlist.len(),
            records.len(),
            started_at.elapsed().as_millis()
        );
        self.cache.borrow_mut().store_all_materials(records.clone());
        Ok(records)
    }

    /// Record for one material; `Ok(None)` when no tagged node matches.
    pub fn resolve_material(&self, material_id: &str) -> IndexResult<Option<MaterialRecord>> {
        let material_id = validate_material_id(material_id)?;
        let memoize = self.allowlist.contains(material_id);
        if memoize {
            self.sync_cache()?;
            if let Some(cached) = self.cache.borrow_mut().material(material_id) {
                return Ok(cached);
            }
        }

        let query = TaggedNodeQuery::in_groups(material_groups_pattern(
            &self.group_prefix,
            material_id,
        ));
        let rows = self.store.tagged_nodes(&query)?;
        let record = if rows.is_empty() {
            debug!(
                "event=index_resolve module=index status=not_found material_id={}",
                material_id
            );
            None
        } else {
            Some(build_record(material_id, rows))
        };

        if memoize {
            self.cache
                .borrow_mut()
                .store_material(material_id, record.clone());
        }
        Ok(record)
    }

    /// Isotherm outputs of one material keyed by gas species.
    ///
    /// Direct `isot_<gas>` outputs come first, followed by outputs reached
    /// through `isotmt_<gas>` multi-temperature workflows.
    pub fn resolve_isotherms(&self, material_id: &str) -> IndexResult<IsothermMap> {
        let material_id = validate_material_id(material_id)?;
        let memoize = self.allowlist.contains(material_id);
        if memoize {
            self.sync_cache()?;
            if let Some(cached) = self.cache.borrow_mut().isotherms(material_id) {
                return Ok(cached);
            }
        }

        let pattern = material_groups_pattern(&self.group_prefix, material_id);
        let direct = self.store.tagged_nodes(
            &TaggedNodeQuery::in_groups(pattern.clone()).with_tag_pattern(DIRECT_ISOTHERM_TAG_PATTERN),
        )?;
        let multi_temperature = self.store.multi_temperature_outputs(&pattern)?;

        let mut isotherms = IsothermMap::new();
        let direct_nodes = direct.into_iter().map(|row| {
            let tag = row.node.tag.clone().unwrap_or_default();
            (tag, row.node)
        });
        let linked_nodes = multi_temperature
            .into_iter()
            .map(|output| (output.origin_tag, output.node));

        for (tag, node) in direct_nodes.chain(linked_nodes) {
            match gas_species(&tag) {
                Some(gas) => isotherms.entry(gas.to_string()).or_default().push(node),
                None => warn!(
                    "event=index_isotherms module=index status=skipped material_id={} tag={}",
                    material_id, tag
                ),
            }
        }

        debug!(
            "event=index_isotherms module=index status=ok material_id={} gases={}",
            material_id,
            isotherms.len()
        );
        if memoize {
            self.cache
                .borrow_mut()
                .store_isotherms(material_id, isotherms.clone());
        }
        Ok(isotherms)
    }

    fn sync_cache(&self) -> IndexResult<()> {
        let mut cache = self.cache.borrow_mut();
        if self.policy == CachePolicy::Pinned && cache.is_stamped() {
            return Ok(());
        }

        let revision = self.store.revision()?;
        if cache.sync_revision(revision) {
            info!(
                "event=index_invalidate module=index status=ok reason=store_revision revision={}",
                revision
            );
        }
        Ok(())
    }
}

fn validate_material_id(material_id: &str) -> IndexResult<&str> {
    let trimmed = material_id.trim();
    if trimmed.is_empty() {
        return Err(IndexError::InvalidMaterialId(material_id.to_string()));
    }
    Ok(trimmed)
}

/// Builds a record from the latest matching group only.
fn build_record(material_id: &str, rows: Vec<GroupedNode>) -> MaterialRecord {
    let mut group_labels: Vec<&str> = rows.iter().map(|row| row.group_label.as_str()).collect();
    group_labels.sort_by(|left, right| compare_group_labels(left, right));
    group_labels.dedup();

    let mut record = MaterialRecord::new(material_id);
    let Some(winner) = group_labels.last().map(|label| label.to_string()) else {
        return record;
    };

    if group_labels.len() > 1 {
        warn!(
            "event=index_ambiguous_group module=index status=resolved material_id={} groups={} chosen={}",
            material_id,
            group_labels.join(","),
            winner
        );
    }

    for row in rows.into_iter().filter(|row| row.group_label == winner) {
        let Some(tag) = row.node.tag.clone() else {
            continue;
        };
        if record.insert(tag.clone(), row.node).is_some() {
            warn!(
                "event=index_duplicate_tag module=index status=replaced material_id={} group={} tag={}",
                material_id, winner, tag
            );
        }
    }
    record
}
