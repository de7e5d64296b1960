//! Revision-stamped memo of resolved material records.
//!
//! # Invariants
//! - Every cached entry was computed at `revision`.
//! - `CachePolicy::Pinned` never consults the store revision again.
//! - Per-material entries exist only for allowlisted ids (the caller
//!   checks); isotherm entries are further capped at
//!   `ISOTHERM_CACHE_CAPACITY`.

use crate::model::material::MaterialRecord;
use crate::model::node::StoreNode;
use moka::sync::Cache;
use std::collections::{BTreeMap, HashMap};

/// Most isotherm maps kept at once; each can hold many output records.
pub const ISOTHERM_CACHE_CAPACITY: u64 = 8;

/// Gas species → isotherm output records.
pub type IsothermMap = BTreeMap<String, Vec<StoreNode>>;

/// How long resolved records stay valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CachePolicy {
    /// Re-validate against the store revision on every lookup.
    #[default]
    TrackRevision,
    /// Keep entries for the index lifetime; only `invalidate()` clears them.
    Pinned,
}

/// Cache counters, mostly for diagnostics and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub invalidations: u64,
    /// Memoized single-material lookups, found or not.
    pub material_entries: u64,
    /// Memoized isotherm maps.
    pub isotherm_entries: u64,
}

#[derive(Debug)]
pub(crate) struct RecordCache {
    revision: Option<i64>,
    all_materials: Option<BTreeMap<String, MaterialRecord>>,
    materials: HashMap<String, Option<MaterialRecord>>,
    isotherms: Cache<String, IsothermMap>,
    stats: CacheStats,
}

impl Default for RecordCache {
    fn default() -> Self {
        Self {
            revision: None,
            all_materials: None,
            materials: HashMap::new(),
            isotherms: Cache::new(ISOTHERM_CACHE_CAPACITY),
            stats: CacheStats::default(),
        }
    }
}

impl RecordCache {
    /// Drops all entries when `revision` differs from the stamp they carry.
    /// Returns whether anything was dropped.
    pub(crate) fn sync_revision(&mut self, revision: i64) -> bool {
        match self.revision {
            Some(current) if current == revision => false,
            Some(_) => {
                self.clear();
                self.revision = Some(revision);
                true
            }
            None => {
                self.revision = Some(revision);
                false
            }
        }
    }

    pub(crate) fn is_stamped(&self) -> bool {
        self.revision.is_some()
    }

    pub(crate) fn clear(&mut self) {
        self.all_materials = None;
        self.materials.clear();
        self.isotherms.invalidate_all();
        self.revision = None;
        self.stats.invalidations += 1;
    }

    pub(crate) fn all_materials(&mut self) -> Option<BTreeMap<String, MaterialRecord>> {
        let found = self.all_materials.clone();
        self.count(found.is_some());
        found
    }

    pub(crate) fn store_all_materials(&mut self, records: BTreeMap<String, MaterialRecord>) {
        self.all_materials = Some(records);
    }

    /// Outer `None` is a miss; `Some(None)` is a cached "not found".
    pub(crate) fn material(&mut self, material_id: &str) -> Option<Option<MaterialRecord>> {
        let found = self.materials.get(material_id).cloned();
        self.count(found.is_some());
        found
    }

    pub(crate) fn store_material(&mut self, material_id: &str, record: Option<MaterialRecord>) {
        self.materials.insert(material_id.to_string(), record);
    }

    pub(crate) fn isotherms(&mut self, material_id: &str) -> Option<IsothermMap> {
        let found = self.isotherms.get(material_id);
        self.count(found.is_some());
        found
    }

    pub(crate) fn store_isotherms(&mut self, material_id: &str, isotherms: IsothermMap) {
        self.isotherms.insert(material_id.to_string(), isotherms);
    }

    /// Counters plus current entry counts, with pending evictions applied.
    pub(crate) fn stats(&self) -> CacheStats {
        self.isotherms.run_pending_tasks();
        CacheStats {
            material_entries: self.materials.len() as u64,
            isotherm_entries: self.isotherms.entry_count(),
            ..self.stats
        }
    }

    fn count(&mut self, hit: bool) {
        if hit {
            self.stats.hits += 1;
        } else {
            self.stats.misses += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{IsothermMap, RecordCache, ISOTHERM_CACHE_CAPACITY};
    use crate::model::material::MaterialRecord;

    #[test]
    fn revision_change_drops_entries() {
        let mut cache = RecordCache::default();
        assert!(!cache.sync_revision(3));
        cache.store_material("BOLZIN", Some(MaterialRecord::new("BOLZIN")));
        assert!(cache.material("BOLZIN").is_some());

        assert!(!cache.sync_revision(3));
        assert!(cache.material("BOLZIN").is_some());

        assert!(cache.sync_revision(4));
        assert!(cache.material("BOLZIN").is_none());
        assert_eq!(cache.stats().invalidations, 1);
    }

    #[test]
    fn remembers_confirmed_absence() {
        let mut cache = RecordCache::default();
        cache.store_material("NOPE", None);
        assert_eq!(cache.material("NOPE"), Some(None));
        assert_eq!(cache.material("OTHER"), None);
        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses), (1, 1));
    }

    #[test]
    fn isotherm_memo_is_bounded() {
        let mut cache = RecordCache::default();
        for position in 0..64 {
            cache.store_isotherms(&format!("MAT{position:03}"), IsothermMap::new());
        }
        assert!(cache.stats().isotherm_entries <= ISOTHERM_CACHE_CAPACITY);
    }

    #[test]
    fn clear_drops_isotherms() {
        let mut cache = RecordCache::default();
        cache.store_isotherms("BOLZIN", IsothermMap::new());
        assert!(cache.isotherms("BOLZIN").is_some());

        cache.clear();
        assert!(cache.isotherms("BOLZIN").is_none());
    }
}
