//! Material detail view.
//!
//! # Responsibility
//! - Assemble the title and ordered sections of one material's detail page.
//!
//! # Invariants
//! - Materials holding `opt_cif_ddec` render the optimized branch; all others
//!   render the "not optimized" branch with an explanatory note.
//! - Structure and geometry nodes are chosen through [`SourcePolicy`].
//! - Every section backed by a node links to its provenance page.

use crate::links::provenance_url;
use crate::model::material::{
    MaterialRecord, TAG_DFTOPT, TAG_OPT_CIF_DDEC, TAG_OPT_ZEOPP, TAG_ORIG_CIF, TAG_ORIG_ZEOPP,
};
use crate::model::node::{NodeId, StoreNode};
use crate::service::energy::{energy_profile, EnergyProfile};
use crate::service::source_policy::SourcePolicy;
use serde::Serialize;

pub const NOT_OPTIMIZED_NOTE: &str =
    "This MOF was not optimized because the framework is charged or DFT failed.";
const MISSING_VALUE: &str = "***";
const DECIMALS: usize = 2;

/// (caption, attribute key, gravimetric unit, volumetric unit)
const GEOMETRY_ROWS: &[(&str, &str, &str, Option<&str>)] = &[
    ("Density", "Density", "g/cm³", None),
    ("Access. Surface Area", "ASA_m^2/g", "m²/g", Some("m²/cm³")),
    ("Non-Access. Surface Area", "NASA_m^2/g", "m²/g", Some("m²/cm³")),
    ("Access. Geom. Pore Volume", "AV_cm^3/g", "cm³/g", Some("cm³/cm³")),
    ("Access. Occup. Pore Volume", "POAV_cm^3/g", "cm³/g", Some("cm³/cm³")),
    ("Non-Access. Occup. Pore Volume", "PONAV_cm^3/g", "cm³/g", Some("cm³/cm³")),
    ("Largest Free Sphere", "Largest_free_sphere", "Å", None),
    ("Largest Included Sphere", "Largest_included_sphere", "Å", None),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SectionBody {
    /// CIF text of the structure.
    Structure { cif: Option<String> },
    Markdown { text: String },
    EnergyProfile { profile: EnergyProfile },
    /// The section's node is absent or unreadable.
    Unavailable { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailSection {
    pub heading: String,
    pub node_uuid: Option<NodeId>,
    pub provenance_url: Option<String>,
    pub body: SectionBody,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailView {
    pub material_id: String,
    pub title: Option<String>,
    pub optimized: bool,
    pub sections: Vec<DetailSection>,
}

impl DetailView {
    pub fn for_record(record: &MaterialRecord, explore_url: &str) -> Self {
        let optimized = record.is_optimized();
        let section = |heading: &str, node: Option<&StoreNode>, body: SectionBody| DetailSection {
            heading: heading.to_string(),
            node_uuid: node.map(|node| node.uuid),
            provenance_url: node.map(|node| provenance_url(explore_url, node.uuid)),
            body,
        };

        let structure = SourcePolicy::resolve(record, TAG_ORIG_CIF)
            .and_then(|tag| record.get(tag).map(|node| (tag, node)));
        let geometry = SourcePolicy::resolve(record, TAG_ORIG_ZEOPP)
            .and_then(|tag| record.get(tag).map(|node| (tag, node)));

        let mut sections = Vec::new();

        let structure_heading = match structure {
            Some((TAG_OPT_CIF_DDEC, _)) => "Cell optimized structure",
            _ => "Cell structure (not DFT optimized)",
        };
        let structure_node = structure.map(|(_, node)| node);
        sections.push(section(
            structure_heading,
            structure_node,
            structure_node.map_or_else(
                || unavailable(TAG_ORIG_CIF),
                |node| SectionBody::Structure {
                    cif: node.content.clone(),
                },
            ),
        ));

        if !optimized {
            sections.push(section(
                "Note",
                None,
                SectionBody::Markdown {
                    text: format!("### NOTE:\n{NOT_OPTIMIZED_NOTE}"),
                },
            ));
        }

        let geometry_heading = match geometry {
            Some((TAG_OPT_ZEOPP, _)) => "Geometric properties",
            _ => "Geometric properties (cell not optimized)",
        };
        let geometry_node = geometry.map(|(_, node)| node);
        sections.push(section(
            geometry_heading,
            geometry_node,
            geometry_node.map_or_else(
                || unavailable(TAG_ORIG_ZEOPP),
                |node| SectionBody::Markdown {
                    text: geometry_table(node),
                },
            ),
        ));

        if optimized {
            let dftopt = record.get(TAG_DFTOPT);
            let body = match dftopt.map(energy_profile) {
                Some(Ok(profile)) => SectionBody::EnergyProfile { profile },
                Some(Err(err)) => SectionBody::Unavailable {
                    reason: err.to_string(),
                },
                None => unavailable(TAG_DFTOPT),
            };
            sections.push(section(
                "Energy profile during cell optimization",
                dftopt,
                body,
            ));
        }

        Self {
            material_id: record.material_id().to_string(),
            title: record.get(TAG_ORIG_CIF).map(detail_title),
            optimized,
            sections,
        }
    }
}

/// `"Detail section for <name> (<CLASS> <label>) v<workflow_version>"`
pub fn detail_title(structure: &StoreNode) -> String {
    let name = structure
        .extra_string("name_conventional")
        .unwrap_or_else(|| structure.label.clone());
    let kind = match structure.extra_string("class_material") {
        Some(class) => format!("{} {}", class.to_uppercase(), structure.label),
        None => structure.label.clone(),
    };
    let mut title = format!("Detail section for {name} ({kind})");
    if let Some(version) = structure.extra_string("workflow_version") {
        title.push_str(&format!(" v{version}"));
    }
    title
}

/// Markdown table of geometric properties; volumetric values are
/// gravimetric values divided by density.
pub fn geometry_table(zeopp: &StoreNode) -> String {
    let density = zeopp.attribute_f64("Density").filter(|value| *value > 0.0);
    let mut table = String::from("| Property | Value | Volumetric |\n|---|---|---|\n");
    for (caption, key, unit, volumetric_unit) in GEOMETRY_ROWS {
        let value = zeopp.attribute_f64(key);
        let volumetric = match volumetric_unit {
            Some(volumetric_unit) => {
                let per_volume = value.zip(density).map(|(value, density)| value / density);
                format!("{} {volumetric_unit}", rounded(per_volume))
            }
            None => String::new(),
        };
        table.push_str(&format!(
            "| {caption} | {} {unit} | {volumetric} |\n",
            rounded(value)
        ));
    }
    table
}

fn rounded(value: Option<f64>) -> String {
    value
        .filter(|value| value.is_finite())
        .map_or_else(
            || MISSING_VALUE.to_string(),
            |value| format!("{value:.precision$}", precision = DECIMALS),
        )
}

fn unavailable(tag: &str) -> SectionBody {
    SectionBody::Unavailable {
        reason: format!("no `{tag}` node for this material"),
    }
}

#[cfg(test)]
mod tests {
    use super::{detail_title, geometry_table};
    use crate::model::node::{NodeType, StoreNode};
    use serde_json::json;

    #[test]
    fn title_uses_curation_extras() {
        let mut node = StoreNode::new(NodeType::Structure, "BOLZIN").tagged("orig_cif");
        node.extras.insert("name_conventional".to_string(), json!("Zn-PTC"));
        node.extras.insert("class_material".to_string(), json!("mof"));
        node.extras.insert("workflow_version".to_string(), json!(2));
        assert_eq!(detail_title(&node), "Detail section for Zn-PTC (MOF BOLZIN) v2");
    }

    #[test]
    fn title_degrades_without_extras() {
        let node = StoreNode::new(NodeType::Structure, "BOLZIN");
        assert_eq!(detail_title(&node), "Detail section for BOLZIN (BOLZIN)");
    }

    #[test]
    fn geometry_table_rounds_and_divides_by_density() {
        let mut node = StoreNode::new(NodeType::Record, "zeopp");
        node.attributes.insert("Density".to_string(), json!(2.0));
        node.attributes.insert("ASA_m^2/g".to_string(), json!(1000.456));

        let table = geometry_table(&node);
        assert!(table.contains("| Density | 2.00 g/cm³ |  |"));
        assert!(table.contains("| Access. Surface Area | 1000.46 m²/g | 500.23 m²/cm³ |"));
        assert!(table.contains("| Largest Free Sphere | *** Å |  |"));
    }
}
