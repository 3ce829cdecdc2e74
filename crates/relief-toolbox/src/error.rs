//! Error types for the toolbox and project document.

use relief_dem::DemError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by raster toolbox operations.
#[derive(Debug, Error)]
pub enum ToolboxError {
    /// Raster read/write or decoding error.
    #[error(transparent)]
    Dem(#[from] DemError),

    /// I/O error inside the store.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Source file for an import does not exist.
    #[error("Source raster not found: {0}")]
    SourceNotFound(PathBuf),

    /// An object with this name is already in the store.
    #[error("Object '{0}' already exists")]
    ObjectExists(String),

    /// No object with this name is in the store.
    #[error("Object '{0}' not found")]
    ObjectNotFound(String),

    /// A raster container with this name already exists.
    #[error("Raster container '{0}' already exists")]
    ContainerExists(String),

    /// No raster container with this name exists.
    #[error("Raster container '{0}' not found")]
    ContainerNotFound(String),

    /// Container exists but no raster has been mosaicked into it yet.
    #[error("Raster container '{0}' is empty")]
    EmptyContainer(String),

    /// Malformed object reference or input list.
    #[error("Invalid object reference '{0}' (expected <store>.gdb/<name>)")]
    InvalidReference(String),

    /// Operation parameter out of range.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Errors raised by the project document.
#[derive(Debug, Error)]
pub enum ProjectError {
    /// I/O error reading or writing the document.
    #[error("I/O error on project {path}: {source}")]
    Io {
        /// Document path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The document is not valid JSON for a project.
    #[error("Project document error: {0}")]
    Json(#[from] serde_json::Error),

    /// No map with this name.
    #[error("Map '{0}' not found")]
    MapNotFound(String),

    /// No layer with this name in the map.
    #[error("Layer '{layer}' not found in map '{map}'")]
    LayerNotFound {
        /// Map searched.
        map: String,
        /// Layer requested.
        layer: String,
    },

    /// No colour ramp with this name in the catalogue.
    #[error("Color ramp '{0}' not found")]
    RampNotFound(String),

    /// Symbology value out of range.
    #[error("Invalid symbology: {0}")]
    InvalidSymbology(String),
}
