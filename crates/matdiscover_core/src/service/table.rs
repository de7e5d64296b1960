//! Material selection table.
//!
//! # Responsibility
//! - Build one display row per allowlisted material.
//!
//! # Invariants
//! - Rows follow the allowlist `idx` order; positions are 1-based.
//! - Allowlisted materials missing from the store still get a row with
//!   empty store-derived fields.

use crate::allowlist::{MaterialAllowlist, MaterialInfo};
use crate::links::{detail_url, doi_url};
use crate::model::material::{MaterialRecord, TAG_ORIG_CIF, TAG_ORIG_ZEOPP};
use crate::service::source_policy::SourcePolicy;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;

pub const SURFACE_AREA_KEY: &str = "ASA_m^2/g";
const NAME_EXTRA: &str = "name_conventional";
const DOI_EXTRA: &str = "doi_ref";
const FORMULA_ATTRIBUTE: &str = "formula";

static FORMULA_COUNTS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+").expect("formula count regex must compile"));

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialTableRow {
    pub position: usize,
    pub material_id: String,
    pub name: String,
    pub doi: Option<String>,
    pub doi_url: Option<String>,
    pub elements: String,
    /// Accessible surface area in m²/g, truncated.
    pub surface_area: Option<i64>,
    pub ligand: String,
    pub detail_url: String,
}

/// `"C16H10O4Zn"` → `"C,H,O,Zn"`.
pub fn elements_from_formula(formula: &str) -> String {
    FORMULA_COUNTS
        .split(formula.trim())
        .filter(|element| !element.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}

/// Rows for every allowlisted material in display order.
pub fn material_table(
    allowlist: &MaterialAllowlist,
    records: &BTreeMap<String, MaterialRecord>,
) -> Vec<MaterialTableRow> {
    allowlist
        .in_display_order()
        .into_iter()
        .enumerate()
        .map(|(offset, info)| table_row(offset + 1, info, records.get(&info.refcode)))
        .collect()
}

fn table_row(position: usize, info: &MaterialInfo, record: Option<&MaterialRecord>) -> MaterialTableRow {
    let structure = record.and_then(|record| record.get(TAG_ORIG_CIF));

    let name = structure
        .and_then(|node| node.extra_string(NAME_EXTRA))
        .unwrap_or_else(|| info.name.clone());
    let doi = structure.and_then(|node| node.extra_string(DOI_EXTRA));
    let elements = if info.elements.trim().is_empty() {
        structure
            .and_then(|node| node.attribute(FORMULA_ATTRIBUTE))
            .and_then(|value| value.as_str())
            .map(elements_from_formula)
            .unwrap_or_default()
    } else {
        info.elements.clone()
    };
    let surface_area = record
        .and_then(|record| SourcePolicy::source_node(record, TAG_ORIG_ZEOPP))
        .and_then(|node| node.attribute_f64(SURFACE_AREA_KEY))
        .filter(|value| value.is_finite())
        .map(|value| value.trunc() as i64);

    MaterialTableRow {
        position,
        material_id: info.refcode.clone(),
        name,
        doi_url: doi.as_deref().and_then(doi_url),
        doi,
        elements,
        surface_area,
        ligand: info.ligand.clone(),
        detail_url: detail_url(&info.refcode),
    }
}
