//! Provenance store boundary.
//!
//! # Responsibility
//! - Define the read contract the tag index consumes (`ProvenanceStore`).
//! - Separate "could not ask" (`StoreError`) from "asked, nothing there"
//!   (empty results).
//!
//! # Invariants
//! - Stores are read-only from the point of view of this crate.
//! - Transport failures are never reported as empty results.

use crate::db::DbError;
use crate::model::node::StoreNode;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod sqlite_store;

pub use sqlite_store::SqliteProvenanceStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure to obtain an answer from the provenance store.
#[derive(Debug)]
pub enum StoreError {
    /// Connection, schema or query failure: the answer is unknown.
    Unavailable(DbError),
    /// The store stayed locked longer than the configured query timeout.
    Timeout,
    /// The store answered with a row this crate cannot decode.
    InvalidData(String),
}

impl StoreError {
    /// Whether the failure means the store could not be reached or queried.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout)
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(err) => write!(f, "provenance store unavailable: {err}"),
            Self::Timeout => write!(f, "provenance store query timed out"),
            Self::InvalidData(message) => write!(f, "invalid provenance data: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Unavailable(err) => Some(err),
            Self::Timeout | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::Sqlite(err) => Self::from(err),
            other => Self::Unavailable(other),
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        match &value {
            rusqlite::Error::SqliteFailure(code, _)
                if code.code == rusqlite::ErrorCode::DatabaseBusy
                    || code.code == rusqlite::ErrorCode::DatabaseLocked =>
            {
                Self::Timeout
            }
            _ => Self::Unavailable(DbError::Sqlite(value)),
        }
    }
}

/// Filter for tagged nodes held by groups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaggedNodeQuery {
    /// SQL `LIKE` pattern over group labels, `\` as escape character.
    pub group_pattern: String,
    /// Restrict to groups that own a structure node labelled with one of
    /// these material ids. `None` means no restriction.
    pub material_ids: Option<Vec<String>>,
    /// Optional SQL `LIKE` pattern over node tags, `\` as escape character.
    pub tag_pattern: Option<String>,
}

impl TaggedNodeQuery {
    pub fn in_groups(group_pattern: impl Into<String>) -> Self {
        Self {
            group_pattern: group_pattern.into(),
            material_ids: None,
            tag_pattern: None,
        }
    }

    pub fn for_materials(mut self, material_ids: Vec<String>) -> Self {
        self.material_ids = Some(material_ids);
        self
    }

    pub fn with_tag_pattern(mut self, tag_pattern: impl Into<String>) -> Self {
        self.tag_pattern = Some(tag_pattern.into());
        self
    }
}

/// Tagged node together with the group it was found in.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedNode {
    pub group_label: String,
    /// Owning material, set only when the query was material-restricted.
    pub material_id: Option<String>,
    pub node: StoreNode,
}

/// Output record reached through a multi-temperature isotherm workflow.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkedOutput {
    /// Tag of the batch output the walk started from, e.g. `isotmt_co2`.
    pub origin_tag: String,
    pub group_label: String,
    pub node: StoreNode,
}

/// Read contract over the provenance graph.
pub trait ProvenanceStore {
    /// Tagged nodes in matching groups, ordered by group label then node label.
    fn tagged_nodes(&self, query: &TaggedNodeQuery) -> StoreResult<Vec<GroupedNode>>;

    /// Walks batch output ← batch workchain → child workchain → output record
    /// for every `isotmt_*` node in groups matching `group_pattern`.
    fn multi_temperature_outputs(&self, group_pattern: &str) -> StoreResult<Vec<LinkedOutput>>;

    /// Monotonic stamp that changes whenever the store content changes.
    fn revision(&self) -> StoreResult<i64>;
}

impl<S: ProvenanceStore + ?Sized> ProvenanceStore for &S {
    fn tagged_nodes(&self, query: &TaggedNodeQuery) -> StoreResult<Vec<GroupedNode>> {
        (**self).tagged_nodes(query)
    }

    fn multi_temperature_outputs(&self, group_pattern: &str) -> StoreResult<Vec<LinkedOutput>> {
        (**self).multi_temperature_outputs(group_pattern)
    }

    fn revision(&self) -> StoreResult<i64> {
        (**self).revision()
    }
}

/// Escapes `%`, `_` and `\` so `value` matches literally inside a `LIKE`
/// pattern that uses `\` as escape character.
pub fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
