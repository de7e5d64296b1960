//! Figure value extraction and x/y/color selection.
//!
//! # Responsibility
//! - Turn material records plus quantity descriptors into value rows.
//! - Validate a three-quantity selection and shape plottable columns.
//!
//! # Invariants
//! - A material missing the resolved source node yields
//!   [`FigureValue::Missing`], never an error.
//! - Source tags are resolved through [`SourcePolicy`] only.
//! - Rows are ordered by material id.

use crate::index::IndexError;
use crate::links::detail_url;
use crate::model::material::MaterialRecord;
use crate::quantity::{Quantity, QuantityCatalog, Scale};
use crate::service::source_policy::SourcePolicy;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// One extracted value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FigureValue {
    Bool(bool),
    Number(f64),
    Text(String),
    Missing,
}

impl FigureValue {
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// Plot coordinate: booleans map to 0/1 and numeric text is parsed.
    ///
    /// Non-finite numbers count as missing.
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            Self::Bool(flag) => f64::from(u8::from(*flag)),
            Self::Number(number) => *number,
            Self::Text(text) => text.trim().parse::<f64>().ok()?,
            Self::Missing => return None,
        };
        value.is_finite().then_some(value)
    }

    fn from_attribute(value: &Value) -> Self {
        match value {
            Value::Null => Self::Missing,
            Value::Bool(flag) => Self::Bool(*flag),
            Value::Number(number) => number.as_f64().map_or(Self::Missing, Self::Number),
            Value::String(text) => Self::Text(text.clone()),
            other => Self::Text(other.to_string()),
        }
    }
}

/// `[material_id, value_for_q1, value_for_q2, ...]`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FigureRow {
    pub material_id: String,
    pub values: Vec<FigureValue>,
}

/// Value of one quantity for one material.
pub fn value_for(record: &MaterialRecord, quantity: &Quantity) -> FigureValue {
    if quantity.is_optimization_flag() {
        return FigureValue::Bool(record.is_optimized());
    }
    SourcePolicy::source_node(record, &quantity.source_tag)
        .and_then(|node| node.attribute(&quantity.key))
        .map_or(FigureValue::Missing, FigureValue::from_attribute)
}

/// One row per material, values in `quantities` order.
pub fn figure_values(
    records: &BTreeMap<String, MaterialRecord>,
    quantities: &[&Quantity],
) -> Vec<FigureRow> {
    records
        .iter()
        .map(|(material_id, record)| FigureRow {
            material_id: material_id.clone(),
            values: quantities
                .iter()
                .map(|quantity| value_for(record, quantity))
                .collect(),
        })
        .collect()
}

#[derive(Debug)]
pub enum FigureError {
    UnknownQuantity(String),
    /// The same quantity was picked for two roles.
    RepeatedQuantity(String),
    Index(IndexError),
}

impl FigureError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Index(err) if err.is_unavailable())
    }
}

impl Display for FigureError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownQuantity(label) => write!(f, "unknown quantity: `{label}`"),
            Self::RepeatedQuantity(label) => {
                write!(f, "quantity `{label}` is selected more than once")
            }
            Self::Index(err) => write!(f, "{err}"),
        }
    }
}

impl Error for FigureError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Index(err) => Some(err),
            _ => None,
        }
    }
}

impl From<IndexError> for FigureError {
    fn from(value: IndexError) -> Self {
        Self::Index(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FigureAxis {
    pub quantity_id: String,
    /// `"<label> [<unit>]"`
    pub title: String,
    pub scale: Scale,
}

impl FigureAxis {
    fn of(quantity: &Quantity) -> Self {
        Self {
            quantity_id: quantity.id.clone(),
            title: quantity.axis_title(),
            scale: quantity.scale,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FigurePoint {
    pub material_id: String,
    pub x: f64,
    pub y: f64,
    pub color: f64,
    pub detail_url: String,
}

/// Plottable columns for one selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FigureData {
    pub x: FigureAxis,
    pub y: FigureAxis,
    pub color: FigureAxis,
    pub points: Vec<FigurePoint>,
    /// Materials dropped because one of the three values is missing.
    pub dropped: Vec<String>,
    /// `"<n> MOFs found."`
    pub message: String,
}

/// Three distinct catalog quantities for the x, y and color roles.
#[derive(Debug, Clone, Copy)]
pub struct FigureSelection<'c> {
    x: &'c Quantity,
    y: &'c Quantity,
    color: &'c Quantity,
}

impl<'c> FigureSelection<'c> {
    /// Validates the three labels against `catalog`.
    ///
    /// # Errors
    /// - `RepeatedQuantity` when two roles share a label.
    /// - `UnknownQuantity` when a label is not in the catalog.
    pub fn new(
        catalog: &'c QuantityCatalog,
        x: &str,
        y: &str,
        color: &str,
    ) -> Result<Self, FigureError> {
        if x == y || x == color {
            return Err(FigureError::RepeatedQuantity(x.to_string()));
        }
        if y == color {
            return Err(FigureError::RepeatedQuantity(y.to_string()));
        }
        let lookup = move |label: &str| {
            catalog
                .get(label)
                .ok_or_else(|| FigureError::UnknownQuantity(label.to_string()))
        };
        Ok(Self {
            x: lookup(x)?,
            y: lookup(y)?,
            color: lookup(color)?,
        })
    }

    pub fn quantities(&self) -> [&'c Quantity; 3] {
        [self.x, self.y, self.color]
    }

    /// Extracts values and keeps materials with all three coordinates.
    pub fn build(&self, records: &BTreeMap<String, MaterialRecord>) -> FigureData {
        let mut points = Vec::new();
        let mut dropped = Vec::new();

        for row in figure_values(records, &self.quantities()) {
            let coords = row
                .values
                .iter()
                .map(FigureValue::as_f64)
                .collect::<Option<Vec<_>>>();
            match coords.as_deref() {
                Some(&[x, y, color]) => points.push(FigurePoint {
                    detail_url: detail_url(&row.material_id),
                    material_id: row.material_id,
                    x,
                    y,
                    color,
                }),
                _ => dropped.push(row.material_id),
            }
        }

        FigureData {
            x: FigureAxis::of(self.x),
            y: FigureAxis::of(self.y),
            color: FigureAxis::of(self.color),
            message: format!("{} MOFs found.", points.len()),
            points,
            dropped,
        }
    }
}
