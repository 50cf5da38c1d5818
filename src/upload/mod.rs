//! Local file upload: selection checks, progress tracking and uploaders.

mod tracker;
mod uploader;

pub use tracker::UploadTracker;
pub use uploader::{run_batch, ApiUploader, BatchReport, SimulatedUploader, Uploader};

use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::resolver::FileLimits;

/// A file the user picked for upload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectedFile {
    pub name: String,
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Path relative to the picked folder, e.g. `reports/q1.pdf`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relative_path: Option<String>,
    /// Local path to read bytes from. Absent for in-memory selections.
    #[serde(skip)]
    pub path: Option<PathBuf>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
            mime_type: None,
            relative_path: None,
            path: None,
        }
    }

    /// Describe a file on disk.
    pub async fn from_path(path: &Path) -> Result<Self> {
        let metadata = tokio::fs::metadata(path)
            .await
            .with_context(|| format!("Failed to stat {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .with_context(|| format!("Not a file path: {}", path.display()))?;
        Ok(Self {
            name,
            size: metadata.len(),
            mime_type: None,
            relative_path: None,
            path: Some(path.to_path_buf()),
        })
    }

    /// Lowercase extension without the dot.
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }
}

/// Reasons a selection is refused before any upload starts.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionError {
    Empty,
    TooManyFiles { selected: usize, max: u32 },
    FileTooLarge { name: String, size: u64, max: u64 },
    UnsupportedType { name: String },
}

impl fmt::Display for SelectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionError::Empty => write!(f, "Please select at least one file."),
            SelectionError::TooManyFiles { max, .. } => {
                write!(f, "You can upload a maximum of {} files at a time.", max)
            }
            SelectionError::FileTooLarge { name, max, .. } => write!(
                f,
                "{} exceeds the maximum file size of {}.",
                name,
                human_size(*max)
            ),
            SelectionError::UnsupportedType { name } => {
                write!(f, "{} is not a supported file type.", name)
            }
        }
    }
}

impl std::error::Error for SelectionError {}

/// Decimal units, whole numbers only.
fn human_size(bytes: u64) -> String {
    match bytes {
        b if b >= 1_000_000 => format!("{} MB", b / 1_000_000),
        b if b >= 1_000 => format!("{} KB", b / 1_000),
        b => format!("{} bytes", b),
    }
}

/// Check `files` against `limits`.
pub fn validate_selection(files: &[SelectedFile], limits: &FileLimits) -> Result<(), SelectionError> {
    if files.is_empty() {
        return Err(SelectionError::Empty);
    }
    if files.len() > limits.max_files_count as usize {
        return Err(SelectionError::TooManyFiles {
            selected: files.len(),
            max: limits.max_files_count,
        });
    }
    for file in files {
        if file.size > limits.max_file_size {
            return Err(SelectionError::FileTooLarge {
                name: file.name.clone(),
                size: file.size,
                max: limits.max_file_size,
            });
        }
        if !limits.allowed_extensions.is_empty() {
            let allowed = file
                .extension()
                .map_or(false, |ext| limits.allowed_extensions.contains(&ext));
            if !allowed {
                return Err(SelectionError::UnsupportedType {
                    name: file.name.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Folder the selection came from, when a whole folder was picked.
///
/// Only the first file is inspected.
pub fn folder_name(files: &[SelectedFile]) -> Option<String> {
    let relative = files.first()?.relative_path.as_deref()?;
    let mut parts = relative.split('/');
    let first = parts.next()?;
    parts.next()?;
    if first.is_empty() {
        None
    } else {
        Some(first.to_string())
    }
}
