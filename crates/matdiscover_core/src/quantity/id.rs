//! Machine ids for quantities.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

static SEPARATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ /:,?()\.\-]").expect("valid separator regex"));
static QUOTE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"['’]").expect("valid quote regex"));
static UNDERSCORE_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_+").expect("valid underscore regex"));

/// Normalizes a free-form string into a machine id.
///
/// Rules, in order: strip accents, lowercase, turn each of
/// `space / : , ? ( ) . -` into `_`, drop apostrophes, collapse `_` runs.
pub fn clean_id(raw: &str) -> String {
    let stripped: String = raw.nfd().filter(|c| !is_combining_mark(*c)).collect();
    let lowered = stripped.to_lowercase();
    let separated = SEPARATOR_RE.replace_all(&lowered, "_");
    let unquoted = QUOTE_RE.replace_all(&separated, "");
    UNDERSCORE_RUN_RE.replace_all(&unquoted, "_").into_owned()
}

/// Id of a quantity stored under `key` in the `source_tag` node.
pub fn quantity_id(key: &str, source_tag: &str, unit: &str) -> String {
    clean_id(&format!("{key}_{source_tag}_{unit}"))
}
