//! Optimized-vs-original source selection.
//!
//! # Responsibility
//! - Decide, per material, which tagged node answers for a declared tag.
//!
//! # Invariants
//! - Figures, the material table and the detail view all go through
//!   [`SourcePolicy`]; no consumer re-implements the fallback.
//! - Optimized materials (holding `opt_cif_ddec`) use the optimized partner
//!   of a tag when it exists and fall back to the original otherwise.
//! - Tags without a partner always resolve to themselves.

use crate::model::material::{
    MaterialRecord, TAG_OPT_CIF_DDEC, TAG_OPT_ZEOPP, TAG_ORIG_CIF, TAG_ORIG_ZEOPP,
};
use crate::model::node::StoreNode;

/// (original tag, optimized partner) pairs.
const OPTIMIZED_PARTNERS: &[(&str, &str)] = &[
    (TAG_ORIG_ZEOPP, TAG_OPT_ZEOPP),
    (TAG_ORIG_CIF, TAG_OPT_CIF_DDEC),
];

/// Optimized-vs-original fallback rule.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourcePolicy;

impl SourcePolicy {
    /// Tag whose node should answer for `declared_tag` in `record`.
    ///
    /// Returns `None` when neither the declared tag nor its partner is present.
    pub fn resolve<'a>(record: &MaterialRecord, declared_tag: &'a str) -> Option<&'a str> {
        let pair = OPTIMIZED_PARTNERS
            .iter()
            .find(|(original, optimized)| *original == declared_tag || *optimized == declared_tag);

        let Some(&(original, optimized)) = pair else {
            return record.contains(declared_tag).then_some(declared_tag);
        };

        if record.is_optimized() && record.contains(optimized) {
            return Some(optimized);
        }
        if record.contains(original) {
            return Some(original);
        }
        None
    }

    /// Node selected by [`SourcePolicy::resolve`].
    pub fn source_node<'r>(record: &'r MaterialRecord, declared_tag: &str) -> Option<&'r StoreNode> {
        Self::resolve(record, declared_tag).and_then(|tag| record.get(tag))
    }
}

#[cfg(test)]
mod tests {
    use super::SourcePolicy;
    use crate::model::material::MaterialRecord;
    use crate::model::node::{NodeType, StoreNode};

    fn record_with(tags: &[&str]) -> MaterialRecord {
        let mut record = MaterialRecord::new("MAT");
        for tag in tags {
            record.insert(*tag, StoreNode::new(NodeType::Record, "MAT").tagged(*tag));
        }
        record
    }

    #[test]
    fn original_materials_read_original_geometry() {
        let record = record_with(&["orig_cif", "orig_zeopp"]);
        assert_eq!(SourcePolicy::resolve(&record, "orig_zeopp"), Some("orig_zeopp"));
        assert_eq!(SourcePolicy::resolve(&record, "opt_zeopp"), Some("orig_zeopp"));
        assert_eq!(SourcePolicy::resolve(&record, "orig_cif"), Some("orig_cif"));
    }

    #[test]
    fn optimized_materials_prefer_optimized_geometry() {
        let record = record_with(&["orig_cif", "orig_zeopp", "opt_cif_ddec", "opt_zeopp"]);
        assert_eq!(SourcePolicy::resolve(&record, "orig_zeopp"), Some("opt_zeopp"));
        assert_eq!(SourcePolicy::resolve(&record, "orig_cif"), Some("opt_cif_ddec"));
    }

    #[test]
    fn optimized_material_without_optimized_geometry_falls_back() {
        let record = record_with(&["orig_zeopp", "opt_cif_ddec"]);
        assert_eq!(SourcePolicy::resolve(&record, "orig_zeopp"), Some("orig_zeopp"));
    }

    #[test]
    fn unpaired_tags_resolve_to_themselves() {
        let record = record_with(&["isot_co2"]);
        assert_eq!(SourcePolicy::resolve(&record, "isot_co2"), Some("isot_co2"));
        assert_eq!(SourcePolicy::resolve(&record, "appl_pecoal"), None);
        assert_eq!(SourcePolicy::resolve(&record, "orig_zeopp"), None);
    }
}
