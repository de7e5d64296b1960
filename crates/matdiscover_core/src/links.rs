//! Outbound link builders for provenance, article and detail pages.

use crate::model::node::NodeId;

/// Relative path of the material detail page.
pub const DETAIL_PAGE: &str = "detail";
const DOI_RESOLVER: &str = "https://doi.org";

/// `<explore_url>/details/<uuid>`
pub fn provenance_url(explore_url: &str, uuid: NodeId) -> String {
    format!("{}/details/{uuid}", explore_url.trim_end_matches('/'))
}

/// Article link for a DOI; `None` for blank DOIs.
pub fn doi_url(doi: &str) -> Option<String> {
    let doi = doi.trim();
    if doi.is_empty() {
        return None;
    }
    Some(format!("{DOI_RESOLVER}/{doi}"))
}

/// Detail page link for one material.
pub fn detail_url(material_id: &str) -> String {
    format!("{DETAIL_PAGE}?mat_id={material_id}")
}
