//! Static material allowlist.
//!
//! # Responsibility
//! - Load the curated material table (`refcode`, `idx`, `ligand`,
//!   `elements`, `name`) once.
//! - Answer membership and display-order questions.
//!
//! # Invariants
//! - Refcodes are unique and non-empty.
//! - File order is preserved; display order is the `idx` column.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::Read;
use std::path::Path;

/// One curated material row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialInfo {
    /// Material id; labels the material's structure nodes in the store.
    pub refcode: String,
    /// Display order in the material table.
    pub idx: i64,
    #[serde(default)]
    pub ligand: String,
    /// Comma separated element symbols.
    #[serde(default)]
    pub elements: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug)]
pub enum AllowlistError {
    Io(std::io::Error),
    Csv(csv::Error),
    EmptyMaterialId { line: u64 },
    DuplicateMaterial(String),
}

impl Display for AllowlistError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "cannot read material allowlist: {err}"),
            Self::Csv(err) => write!(f, "malformed material allowlist: {err}"),
            Self::EmptyMaterialId { line } => {
                write!(f, "material allowlist line {line} has an empty refcode")
            }
            Self::DuplicateMaterial(refcode) => {
                write!(f, "material allowlist lists `{refcode}` more than once")
            }
        }
    }
}

impl Error for AllowlistError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Csv(err) => Some(err),
            Self::EmptyMaterialId { .. } | Self::DuplicateMaterial(_) => None,
        }
    }
}

impl From<std::io::Error> for AllowlistError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<csv::Error> for AllowlistError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

/// Curated materials, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterialAllowlist {
    entries: Vec<MaterialInfo>,
    positions: HashMap<String, usize>,
}

impl MaterialAllowlist {
    /// Reads the allowlist CSV file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AllowlistError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Parses allowlist CSV text with a header row.
    pub fn from_reader(reader: impl Read) -> Result<Self, AllowlistError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let entries = csv_reader
            .deserialize::<MaterialInfo>()
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_entries(entries)
    }

    /// Builds an allowlist from rows, rejecting empty or repeated refcodes.
    ///
    /// Reported line numbers assume one header row.
    pub fn from_entries(entries: Vec<MaterialInfo>) -> Result<Self, AllowlistError> {
        let mut positions = HashMap::with_capacity(entries.len());
        for (position, info) in entries.iter().enumerate() {
            if info.refcode.trim().is_empty() {
                return Err(AllowlistError::EmptyMaterialId {
                    line: position as u64 + 2,
                });
            }
            if positions.insert(info.refcode.clone(), position).is_some() {
                return Err(AllowlistError::DuplicateMaterial(info.refcode.clone()));
            }
        }
        Ok(Self { entries, positions })
    }

    pub fn contains(&self, refcode: &str) -> bool {
        self.positions.contains_key(refcode)
    }

    pub fn get(&self, refcode: &str) -> Option<&MaterialInfo> {
        self.positions
            .get(refcode)
            .and_then(|position| self.entries.get(*position))
    }

    /// Refcodes in file order.
    pub fn material_ids(&self) -> Vec<String> {
        self.entries.iter().map(|info| info.refcode.clone()).collect()
    }

    /// Rows in file order.
    pub fn entries(&self) -> &[MaterialInfo] {
        &self.entries
    }

    /// Rows sorted by `idx`; ties keep file order.
    pub fn in_display_order(&self) -> Vec<&MaterialInfo> {
        let mut rows: Vec<&MaterialInfo> = self.entries.iter().collect();
        rows.sort_by_key(|info| info.idx);
        rows
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
