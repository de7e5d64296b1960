//! Per-material tag record and the tag vocabulary.
//!
//! # Responsibility
//! - Hold the tag → node mapping rebuilt for every material lookup.
//! - Classify raw tag strings into the known vocabulary.
//!
//! # Invariants
//! - A record holds at most one node per tag; later inserts replace earlier ones.
//! - Absence of a tag is a valid state, never an error.

use crate::model::node::StoreNode;
use serde::Serialize;
use std::collections::BTreeMap;

pub const TAG_ORIG_CIF: &str = "orig_cif";
pub const TAG_ORIG_ZEOPP: &str = "orig_zeopp";
pub const TAG_DFTOPT: &str = "dftopt";
pub const TAG_OPT_CIF_DDEC: &str = "opt_cif_ddec";
pub const TAG_OPT_ZEOPP: &str = "opt_zeopp";

const ISOTHERM_PREFIX: &str = "isot_";
const MULTI_TEMP_ISOTHERM_PREFIX: &str = "isotmt_";
const APPLICATION_PREFIX: &str = "appl_";

/// Known semantic roles of tagged nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KnownTag {
    /// Structure as published.
    OrigCif,
    /// Pore geometry of the published structure.
    OrigZeopp,
    /// DFT cell optimization output.
    Dftopt,
    /// DFT-optimized structure with DDEC charges.
    OptCifDdec,
    /// Pore geometry of the optimized structure.
    OptZeopp,
    /// Application performance record, e.g. `appl_pecoal`.
    Application(String),
    /// Single isotherm output for one gas, e.g. `isot_co2`.
    Isotherm(String),
    /// Multi-temperature isotherm batch output, e.g. `isotmt_co2`.
    MultiTempIsotherm(String),
}

impl KnownTag {
    /// Classifies a raw tag; returns `None` for tags outside the vocabulary.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            TAG_ORIG_CIF => return Some(Self::OrigCif),
            TAG_ORIG_ZEOPP => return Some(Self::OrigZeopp),
            TAG_DFTOPT => return Some(Self::Dftopt),
            TAG_OPT_CIF_DDEC => return Some(Self::OptCifDdec),
            TAG_OPT_ZEOPP => return Some(Self::OptZeopp),
            _ => {}
        }

        if let Some(rest) = tag.strip_prefix(MULTI_TEMP_ISOTHERM_PREFIX) {
            return non_empty_suffix(rest).map(Self::MultiTempIsotherm);
        }
        if let Some(rest) = tag.strip_prefix(ISOTHERM_PREFIX) {
            return non_empty_suffix(rest).map(Self::Isotherm);
        }
        if let Some(rest) = tag.strip_prefix(APPLICATION_PREFIX) {
            return non_empty_suffix(rest).map(Self::Application);
        }
        None
    }

    /// Canonical tag spelling.
    pub fn as_tag(&self) -> String {
        match self {
            Self::OrigCif => TAG_ORIG_CIF.to_string(),
            Self::OrigZeopp => TAG_ORIG_ZEOPP.to_string(),
            Self::Dftopt => TAG_DFTOPT.to_string(),
            Self::OptCifDdec => TAG_OPT_CIF_DDEC.to_string(),
            Self::OptZeopp => TAG_OPT_ZEOPP.to_string(),
            Self::Application(name) => format!("{APPLICATION_PREFIX}{name}"),
            Self::Isotherm(suffix) => format!("{ISOTHERM_PREFIX}{suffix}"),
            Self::MultiTempIsotherm(suffix) => format!("{MULTI_TEMP_ISOTHERM_PREFIX}{suffix}"),
        }
    }
}

fn non_empty_suffix(rest: &str) -> Option<String> {
    if rest.is_empty() {
        None
    } else {
        Some(rest.to_string())
    }
}

/// Gas species encoded in an `isot_<gas>` or `isotmt_<gas>` tag.
///
/// The species is the second `_`-separated field, so `isot_co2_298K`
/// yields `co2`.
pub fn gas_species(tag: &str) -> Option<&str> {
    if !tag.starts_with(ISOTHERM_PREFIX) && !tag.starts_with(MULTI_TEMP_ISOTHERM_PREFIX) {
        return None;
    }
    tag.split('_').nth(1).filter(|gas| !gas.is_empty())
}

/// Tag → node mapping for one material.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialRecord {
    material_id: String,
    nodes: BTreeMap<String, StoreNode>,
}

impl MaterialRecord {
    pub fn new(material_id: impl Into<String>) -> Self {
        Self {
            material_id: material_id.into(),
            nodes: BTreeMap::new(),
        }
    }

    pub fn material_id(&self) -> &str {
        &self.material_id
    }

    /// Inserts a node under `tag`, returning the node it replaced.
    pub fn insert(&mut self, tag: impl Into<String>, node: StoreNode) -> Option<StoreNode> {
        self.nodes.insert(tag.into(), node)
    }

    pub fn get(&self, tag: &str) -> Option<&StoreNode> {
        self.nodes.get(tag)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.nodes.contains_key(tag)
    }

    /// Tags held by this record, sorted.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (&str, &StoreNode)> {
        self.nodes.iter().map(|(tag, node)| (tag.as_str(), node))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// A material counts as DFT-optimized iff it holds an `opt_cif_ddec` node.
    pub fn is_optimized(&self) -> bool {
        self.contains(TAG_OPT_CIF_DDEC)
    }
}
