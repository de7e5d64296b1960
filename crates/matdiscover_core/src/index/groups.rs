//! Curated group naming convention: `<prefix>_<material id>_v<N>`.

use crate::store::escape_like;
use std::cmp::Ordering;

/// `LIKE` pattern matching every curated group under `prefix`.
pub(crate) fn all_groups_pattern(prefix: &str) -> String {
    format!("{}\\_%", escape_like(prefix))
}

/// `LIKE` pattern matching every version of one material's group.
pub(crate) fn material_groups_pattern(prefix: &str, material_id: &str) -> String {
    format!(
        "{}\\_{}\\_v%",
        escape_like(prefix),
        escape_like(material_id)
    )
}

/// Dataset version encoded after the last `_v` of a group label.
pub fn group_version(label: &str) -> Option<u32> {
    label
        .rsplit_once("_v")
        .and_then(|(_, version)| version.parse::<u32>().ok())
}

/// Orders group labels so the latest dataset version sorts last.
///
/// Numeric versions compare numerically (`v10` after `v9`); labels without a
/// parseable version sort before versioned ones; remaining ties fall back to
/// plain label order.
pub fn compare_group_labels(left: &str, right: &str) -> Ordering {
    group_version(left)
        .cmp(&group_version(right))
        .then_with(|| left.cmp(right))
}

#[cfg(test)]
mod tests {
    use super::{
        all_groups_pattern, compare_group_labels, group_version, material_groups_pattern,
    };
    use std::cmp::Ordering;

    #[test]
    fn patterns_escape_like_wildcards() {
        assert_eq!(all_groups_pattern("curated-mof"), "curated-mof\\_%");
        assert_eq!(
            material_groups_pattern("curated-mof", "AB_1"),
            "curated-mof\\_AB\\_1\\_v%"
        );
    }

    #[test]
    fn parses_trailing_version() {
        assert_eq!(group_version("curated-mof_ABCDEF_v2"), Some(2));
        assert_eq!(group_version("curated-mof_ABCDEF_v12"), Some(12));
        assert_eq!(group_version("curated-mof_ABCDEF_vX"), None);
        assert_eq!(group_version("curated-mof_ABCDEF"), None);
    }

    #[test]
    fn later_versions_sort_last() {
        assert_eq!(
            compare_group_labels("curated-mof_A_v1", "curated-mof_A_v2"),
            Ordering::Less
        );
        assert_eq!(
            compare_group_labels("curated-mof_A_v10", "curated-mof_A_v9"),
            Ordering::Greater
        );
        assert_eq!(
            compare_group_labels("curated-mof_A_vX", "curated-mof_A_v1"),
            Ordering::Less
        );
    }
}
