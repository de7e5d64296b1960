//! Energy profile of a cell optimization run.
//!
//! Energies are reported per atom in eV and shifted so that the lowest step
//! sits at zero.

use crate::model::node::StoreNode;
use serde::Serialize;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const HARTREE_TO_EV: f64 = 27.211399;
pub const ENERGY_UNIT: &str = "eV/atom";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnergyProfileError {
    MissingField(&'static str),
    InvalidField(&'static str),
    NoAtoms,
}

impl Display for EnergyProfileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "optimization output lacks `{field}`"),
            Self::InvalidField(field) => write!(f, "optimization output has malformed `{field}`"),
            Self::NoAtoms => write!(f, "optimization output reports no atoms"),
        }
    }
}

impl Error for EnergyProfileError {}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnergyPoint {
    /// Position in the whole run.
    pub index: usize,
    /// Step counter within the current stage.
    pub step: Option<i64>,
    pub energy: f64,
}

/// Half-open `[start, end)` range of run indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StageSpan {
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnergyProfile {
    pub unit: &'static str,
    pub points: Vec<EnergyPoint>,
    pub stages: Vec<StageSpan>,
}

/// Splits a run where the step counter stops increasing.
///
/// The result starts with `0` and ends with `steps.len()`.
pub fn stage_start_indices(steps: &[i64]) -> Vec<usize> {
    let mut starts = vec![0];
    starts.extend(
        steps
            .windows(2)
            .enumerate()
            .filter(|(_, pair)| pair[1] <= pair[0])
            .map(|(offset, _)| offset + 1),
    );
    starts.push(steps.len());
    starts
}

/// Builds the profile from a `dftopt` output node.
///
/// Stage boundaries come from `stage_info.nsteps`; without it they are
/// derived from the step counters.
pub fn energy_profile(node: &StoreNode) -> Result<EnergyProfile, EnergyProfileError> {
    let natoms = node
        .attribute_f64("natoms")
        .ok_or(EnergyProfileError::MissingField("natoms"))?;
    if natoms <= 0.0 {
        return Err(EnergyProfileError::NoAtoms);
    }

    let step_info = node
        .attribute("step_info")
        .ok_or(EnergyProfileError::MissingField("step_info"))?;
    let energies_au = number_list(step_info.get("energy_au"), "step_info.energy_au")?
        .ok_or(EnergyProfileError::MissingField("step_info.energy_au"))?;
    let steps = integer_list(step_info.get("step"), "step_info.step")?;

    let per_atom = energies_au
        .iter()
        .map(|energy| energy / natoms * HARTREE_TO_EV)
        .collect::<Vec<_>>();
    let minimum = per_atom.iter().copied().fold(f64::INFINITY, f64::min);

    let points = per_atom
        .iter()
        .enumerate()
        .map(|(index, energy)| EnergyPoint {
            index,
            step: steps.as_ref().and_then(|steps| steps.get(index).copied()),
            energy: energy - minimum,
        })
        .collect::<Vec<_>>();

    let stage_lengths = integer_list(
        node.attribute("stage_info").and_then(|info| info.get("nsteps")),
        "stage_info.nsteps",
    )?;
    let stages = match (stage_lengths, steps) {
        (Some(lengths), _) => spans_from_lengths(&lengths, points.len())?,
        (None, Some(steps)) => spans_from_starts(&stage_start_indices(&steps)),
        (None, None) => Vec::new(),
    };

    Ok(EnergyProfile {
        unit: ENERGY_UNIT,
        points,
        stages,
    })
}

/// Consecutive spans from per-stage step counts; together they must fit
/// inside the `total` recorded points.
fn spans_from_lengths(lengths: &[i64], total: usize) -> Result<Vec<StageSpan>, EnergyProfileError> {
    let invalid = || EnergyProfileError::InvalidField("stage_info.nsteps");
    let mut start = 0usize;
    let mut spans = Vec::with_capacity(lengths.len());
    for length in lengths {
        let length = usize::try_from(*length).map_err(|_| invalid())?;
        let end = start
            .checked_add(length)
            .filter(|end| *end <= total)
            .ok_or_else(invalid)?;
        spans.push(StageSpan { start, end });
        start = end;
    }
    Ok(spans)
}

fn spans_from_starts(starts: &[usize]) -> Vec<StageSpan> {
    starts
        .windows(2)
        .filter(|pair| pair[1] > pair[0])
        .map(|pair| StageSpan {
            start: pair[0],
            end: pair[1],
        })
        .collect()
}

fn number_list(
    value: Option<&Value>,
    field: &'static str,
) -> Result<Option<Vec<f64>>, EnergyProfileError> {
    let Some(value) = value else {
        return Ok(None);
    };
    value
        .as_array()
        .ok_or(EnergyProfileError::InvalidField(field))?
        .iter()
        .map(|item| item.as_f64().ok_or(EnergyProfileError::InvalidField(field)))
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

fn integer_list(
    value: Option<&Value>,
    field: &'static str,
) -> Result<Option<Vec<i64>>, EnergyProfileError> {
    let Some(value) = value else {
        return Ok(None);
    };
    value
        .as_array()
        .ok_or(EnergyProfileError::InvalidField(field))?
        .iter()
        .map(|item| item.as_i64().ok_or(EnergyProfileError::InvalidField(field)))
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}
