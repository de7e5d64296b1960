//! Quantity catalog: human-facing quantity names → storage location.
//!
//! # Responsibility
//! - Load quantity declarations once, fill defaults, derive machine ids.
//! - Resolve labels to descriptors for figure, table and detail consumers.
//!
//! # Invariants
//! - Iteration order equals declaration order.
//! - Labels and derived ids are unique across the catalog; a collision is a
//!   load error, never a runtime condition.

mod id;

pub use id::{clean_id, quantity_id};

use indexmap::IndexMap;
use log::info;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

pub const DEFAULT_DESCRIPTION: &str = "Description to be added!";

/// Key of the pseudo-quantity answered from the record shape instead of an
/// attribute.
pub const IS_OPTIMIZED_KEY: &str = "is_optimized";

const BUILTIN_DECLARATIONS: &str = include_str!("../../static/quantities.yml");

/// Axis scale used when plotting a quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scale {
    #[default]
    Linear,
    Log,
}

impl Scale {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Log => "log",
        }
    }
}

/// One declaration entry as written in the YAML source.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QuantityDeclaration {
    pub label: String,
    pub dict: String,
    pub key: String,
    pub unit: String,
    #[serde(default)]
    pub descr: Option<String>,
    #[serde(default)]
    pub scale: Option<String>,
}

/// Resolved quantity descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quantity {
    /// Stable machine id, see [`quantity_id`].
    pub id: String,
    /// Display name; unique catalog key.
    pub label: String,
    /// Tag of the node holding the value.
    pub source_tag: String,
    /// Attribute name inside that node.
    pub key: String,
    pub unit: String,
    pub description: String,
    pub scale: Scale,
}

impl Quantity {
    /// `"<label> [<unit>]"`, used for axis titles and table headers.
    pub fn axis_title(&self) -> String {
        format!("{} [{}]", self.label, self.unit)
    }

    pub fn is_optimization_flag(&self) -> bool {
        self.key == IS_OPTIMIZED_KEY
    }
}

#[derive(Debug)]
pub enum CatalogError {
    Io(std::io::Error),
    Parse(serde_yaml::Error),
    EmptyField {
        position: usize,
        field: &'static str,
    },
    InvalidScale {
        label: String,
        scale: String,
    },
    DuplicateLabel(String),
    DuplicateId {
        id: String,
        first: String,
        second: String,
    },
    UnknownQuantity(String),
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "cannot read quantity declarations: {err}"),
            Self::Parse(err) => write!(f, "malformed quantity declarations: {err}"),
            Self::EmptyField { position, field } => {
                write!(f, "quantity declaration #{position} has an empty `{field}`")
            }
            Self::InvalidScale { label, scale } => write!(
                f,
                "quantity `{label}` has unsupported scale `{scale}` (expected linear|log)"
            ),
            Self::DuplicateLabel(label) => write!(f, "quantity label `{label}` is declared twice"),
            Self::DuplicateId { id, first, second } => write!(
                f,
                "quantities `{first}` and `{second}` derive the same id `{id}`"
            ),
            Self::UnknownQuantity(label) => write!(f, "unknown quantity: `{label}`"),
        }
    }
}

impl Error for CatalogError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CatalogError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_yaml::Error> for CatalogError {
    fn from(value: serde_yaml::Error) -> Self {
        Self::Parse(value)
    }
}

/// Declaration-ordered registry of quantities keyed by label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuantityCatalog {
    quantities: IndexMap<String, Quantity>,
}

impl QuantityCatalog {
    /// Catalog built from the declarations shipped with the crate.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_yaml_str(BUILTIN_DECLARATIONS)
    }

    /// Reads declarations from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Parses a YAML list of declarations.
    pub fn from_yaml_str(text: &str) -> Result<Self, CatalogError> {
        let declarations: Vec<QuantityDeclaration> = serde_yaml::from_str(text)?;
        Self::from_declarations(declarations)
    }

    /// Validates declarations, fills defaults and derives ids.
    pub fn from_declarations(declarations: Vec<QuantityDeclaration>) -> Result<Self, CatalogError> {
        let mut quantities: IndexMap<String, Quantity> = IndexMap::with_capacity(declarations.len());
        let mut owners_by_id: IndexMap<String, String> = IndexMap::with_capacity(declarations.len());

        for (position, declaration) in declarations.into_iter().enumerate() {
            let quantity = resolve_declaration(position + 1, declaration)?;

            if quantities.contains_key(&quantity.label) {
                return Err(CatalogError::DuplicateLabel(quantity.label));
            }
            if let Some(first) = owners_by_id.get(&quantity.id) {
                return Err(CatalogError::DuplicateId {
                    id: quantity.id.clone(),
                    first: first.clone(),
                    second: quantity.label,
                });
            }

            owners_by_id.insert(quantity.id.clone(), quantity.label.clone());
            quantities.insert(quantity.label.clone(), quantity);
        }

        info!(
            "event=catalog_load module=quantity status=ok quantities={}",
            quantities.len()
        );
        Ok(Self { quantities })
    }

    /// Descriptor for `label`; `None` when the label is not declared.
    pub fn get(&self, label: &str) -> Option<&Quantity> {
        self.quantities.get(label)
    }

    /// Like [`QuantityCatalog::get`], but reports the miss as an error.
    pub fn require(&self, label: &str) -> Result<&Quantity, CatalogError> {
        self.get(label)
            .ok_or_else(|| CatalogError::UnknownQuantity(label.to_string()))
    }

    /// Descriptor whose machine id is `id`.
    pub fn by_id(&self, id: &str) -> Option<&Quantity> {
        self.quantities.values().find(|quantity| quantity.id == id)
    }

    /// Labels in declaration order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.quantities.keys().map(String::as_str)
    }

    /// Machine ids in declaration order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.quantities.values().map(|quantity| quantity.id.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Quantity> {
        self.quantities.values()
    }

    pub fn len(&self) -> usize {
        self.quantities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quantities.is_empty()
    }
}

fn resolve_declaration(
    position: usize,
    declaration: QuantityDeclaration,
) -> Result<Quantity, CatalogError> {
    let QuantityDeclaration {
        label,
        dict,
        key,
        unit,
        descr,
        scale,
    } = declaration;

    for (field, value) in [("label", &label), ("dict", &dict), ("key", &key)] {
        if value.trim().is_empty() {
            return Err(CatalogError::EmptyField { position, field });
        }
    }

    let scale = match scale.as_deref().map(str::trim) {
        None | Some("linear") => Scale::Linear,
        Some("log") => Scale::Log,
        Some(other) => {
            return Err(CatalogError::InvalidScale {
                label,
                scale: other.to_string(),
            })
        }
    };

    let description = descr
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string());

    Ok(Quantity {
        id: quantity_id(&key, &dict, &unit),
        label,
        source_tag: dict,
        key,
        unit,
        description,
        scale,
    })
}

#[cfg(test)]
mod tests {
    use super::{CatalogError, QuantityCatalog, Scale, DEFAULT_DESCRIPTION};

    #[test]
    fn fills_defaults_for_missing_description_and_scale() {
        let catalog = QuantityCatalog::from_yaml_str(
            "- {label: Density, dict: orig_zeopp, key: Density, unit: g/cm^3}\n",
        )
        .unwrap();
        let density = catalog.get("Density").unwrap();
        assert_eq!(density.description, DEFAULT_DESCRIPTION);
        assert_eq!(density.scale, Scale::Linear);
        assert_eq!(density.id, "density_orig_zeopp_g_cm^3");
    }

    #[test]
    fn rejects_unknown_scale() {
        let err = QuantityCatalog::from_yaml_str(
            "- {label: A, dict: orig_zeopp, key: A, unit: x, scale: sqrt}\n",
        )
        .unwrap_err();
        assert!(matches!(err, CatalogError::InvalidScale { .. }));
    }

    #[test]
    fn rejects_blank_key() {
        let err =
            QuantityCatalog::from_yaml_str("- {label: A, dict: orig_zeopp, key: ' ', unit: x}\n")
                .unwrap_err();
        assert!(matches!(
            err,
            CatalogError::EmptyField {
                position: 1,
                field: "key"
            }
        ));
    }

    #[test]
    fn require_reports_unknown_label() {
        let catalog = QuantityCatalog::default();
        assert!(catalog.get("Density").is_none());
        assert!(matches!(
            catalog.require("Density"),
            Err(CatalogError::UnknownQuantity(_))
        ));
    }
}
