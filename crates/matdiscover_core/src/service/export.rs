//! Optimized CIF export.
//!
//! # Invariants
//! - The target directory must not exist yet; nothing is overwritten.
//! - Files are staged in a hidden sibling directory that is renamed into
//!   place only once every file is written; a failed export leaves no
//!   directory behind.
//! - Files are named `<material_id>_ddec.cif` and written in material id
//!   order.

use crate::index::IndexError;
use crate::model::material::{MaterialRecord, TAG_OPT_CIF_DDEC};
use crate::model::node::NodeId;
use log::{info, warn};
use serde::Serialize;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Debug)]
pub enum ExportError {
    Index(IndexError),
    Io(std::io::Error),
    DirectoryExists(PathBuf),
}

impl Display for ExportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Index(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "cannot write export: {err}"),
            Self::DirectoryExists(path) => {
                write!(f, "export directory `{}` already exists", path.display())
            }
        }
    }
}

impl Error for ExportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Index(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::DirectoryExists(_) => None,
        }
    }
}

impl From<IndexError> for ExportError {
    fn from(value: IndexError) -> Self {
        Self::Index(value)
    }
}

impl From<std::io::Error> for ExportError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportedCif {
    pub material_id: String,
    pub node_uuid: NodeId,
    pub path: PathBuf,
}

/// File name of one material's optimized structure.
pub fn optimized_cif_file_name(material_id: &str) -> String {
    format!("{material_id}_ddec.cif")
}

/// Writes every optimized structure in `records` into a new `dir`.
///
/// Materials without an optimized structure, or whose structure carries no
/// CIF content, are skipped.
pub fn export_optimized_cifs(
    records: &BTreeMap<String, MaterialRecord>,
    dir: &Path,
) -> Result<Vec<ExportedCif>, ExportError> {
    if dir.exists() {
        return Err(ExportError::DirectoryExists(dir.to_path_buf()));
    }
    let staging = staging_dir(dir)?;
    if let Some(parent) = staging.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::create_dir(&staging)?;

    let exported = match write_cifs(records, &staging, dir)
        .and_then(|exported| publish(&staging, dir).map(|()| exported))
    {
        Ok(exported) => exported,
        Err(err) => {
            if let Err(cleanup) = fs::remove_dir_all(&staging) {
                warn!(
                    "event=cif_export module=service status=cleanup_failed dir={} error={}",
                    staging.display(),
                    cleanup
                );
            }
            warn!(
                "event=cif_export module=service status=error dir={} error={}",
                dir.display(),
                err
            );
            return Err(err);
        }
    };

    info!(
        "event=cif_export module=service status=ok count={} dir={}",
        exported.len(),
        dir.display()
    );
    Ok(exported)
}

/// Hidden, uniquely named sibling of `dir` used while files are written.
fn staging_dir(dir: &Path) -> Result<PathBuf, ExportError> {
    let name = dir.file_name().ok_or_else(|| {
        ExportError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("export directory `{}` has no final component", dir.display()),
        ))
    })?;
    Ok(dir.with_file_name(format!(
        ".{}.partial-{}",
        name.to_string_lossy(),
        Uuid::new_v4().simple()
    )))
}

/// Writes each optimized structure into `staging`; reported paths point
/// into `target`, where the files live once published.
fn write_cifs(
    records: &BTreeMap<String, MaterialRecord>,
    staging: &Path,
    target: &Path,
) -> Result<Vec<ExportedCif>, ExportError> {
    let mut exported = Vec::new();
    for (material_id, record) in records {
        let Some(node) = record.get(TAG_OPT_CIF_DDEC) else {
            continue;
        };
        let Some(content) = node.content.as_deref() else {
            warn!(
                "event=cif_export module=service status=skipped material_id={} reason=no_content",
                material_id
            );
            continue;
        };

        let file_name = optimized_cif_file_name(material_id);
        let mut text = content.to_string();
        if !text.ends_with('\n') {
            text.push('\n');
        }
        fs::write(staging.join(&file_name), text)?;
        exported.push(ExportedCif {
            material_id: material_id.clone(),
            node_uuid: node.uuid,
            path: target.join(file_name),
        });
    }
    Ok(exported)
}

fn publish(staging: &Path, target: &Path) -> Result<(), ExportError> {
    if target.exists() {
        return Err(ExportError::DirectoryExists(target.to_path_buf()));
    }
    fs::rename(staging, target)?;
    Ok(())
}
