//! Filesystem raster store.
//!
//! A store named `Automated_Map` lives at `<root>/Automated_Map.gdb/`. Each
//! raster object is a GeoTIFF `<name>.tif` inside it. A raster container is
//! marked by an empty `<name>.container` file until something is mosaicked
//! into it, after which its raster sits next to the marker as `<name>.tif`.

use crate::{Result, ToolboxError};
use relief_dem::{Raster, RasterHeader, RASTER_EXTENSION};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Directory suffix of a store.
pub const STORE_SUFFIX: &str = ".gdb";

const CONTAINER_EXTENSION: &str = "container";

/// A `<store>.gdb/<name>` reference to an object in a store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    /// Store name, without the `.gdb` suffix.
    pub store: String,
    /// Object name within the store.
    pub name: String,
}

impl ObjectRef {
    /// Build a reference from its parts.
    pub fn new(store: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            store: store.into(),
            name: name.into(),
        }
    }

    /// Parse a semicolon-separated input list.
    ///
    /// Empty entries (e.g. from a trailing separator) are rejected.
    pub fn parse_list(list: &str) -> Result<Vec<ObjectRef>> {
        list.split(';').map(str::parse::<ObjectRef>).collect()
    }
}

impl FromStr for ObjectRef {
    type Err = ToolboxError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || ToolboxError::InvalidReference(s.to_string());
        let (store, name) = s.trim().split_once('/').ok_or_else(invalid)?;
        let store = store.strip_suffix(STORE_SUFFIX).ok_or_else(invalid)?;
        if store.is_empty() || name.is_empty() || name.contains('/') {
            return Err(invalid());
        }
        Ok(Self::new(store, name))
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}/{}", self.store, STORE_SUFFIX, self.name)
    }
}

/// Rasters and containers kept under a root directory.
#[derive(Debug, Clone)]
pub struct RasterStore {
    root: PathBuf,
}

impl RasterStore {
    /// Open a store rooted at `root`. Nothing is created until first write.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root directory (the project workspace).
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of a named store.
    pub fn store_dir(&self, store: &str) -> PathBuf {
        self.root.join(format!("{}{}", store, STORE_SUFFIX))
    }

    /// Path of an object's raster file.
    pub fn raster_path(&self, object: &ObjectRef) -> PathBuf {
        self.store_dir(&object.store)
            .join(format!("{}.{}", object.name, RASTER_EXTENSION))
    }

    fn container_marker(&self, object: &ObjectRef) -> PathBuf {
        self.store_dir(&object.store)
            .join(format!("{}.{}", object.name, CONTAINER_EXTENSION))
    }

    /// Whether a raster object (or non-empty container) is present.
    pub fn contains(&self, object: &ObjectRef) -> bool {
        self.raster_path(object).is_file()
    }

    /// Whether a raster container is present.
    pub fn is_container(&self, object: &ObjectRef) -> bool {
        self.container_marker(object).is_file()
    }

    /// Add a new raster object. Fails if the name is already taken.
    pub fn insert(&self, object: &ObjectRef, raster: &Raster) -> Result<PathBuf> {
        if self.contains(object) || self.is_container(object) {
            return Err(ToolboxError::ObjectExists(object.to_string()));
        }
        let path = self.raster_path(object);
        raster.save(&path)?;
        debug!(object = %object, path = %path.display(), "Stored raster");
        Ok(path)
    }

    /// Load a raster object.
    pub fn load(&self, object: &ObjectRef) -> Result<Raster> {
        if !self.contains(object) {
            return Err(ToolboxError::ObjectNotFound(object.to_string()));
        }
        Ok(Raster::from_file(self.raster_path(object))?)
    }

    /// Size and placement of a stored raster without loading its pixels.
    pub fn header(&self, object: &ObjectRef) -> Result<RasterHeader> {
        if !self.contains(object) {
            return Err(ToolboxError::ObjectNotFound(object.to_string()));
        }
        Ok(RasterHeader::read(self.raster_path(object))?)
    }

    /// Create an empty raster container. Fails if the name is already taken.
    pub fn create_container(&self, object: &ObjectRef) -> Result<PathBuf> {
        if self.is_container(object) {
            return Err(ToolboxError::ContainerExists(object.to_string()));
        }
        if self.contains(object) {
            return Err(ToolboxError::ObjectExists(object.to_string()));
        }
        fs::create_dir_all(self.store_dir(&object.store))?;
        fs::File::create(self.container_marker(object))?;
        Ok(self.store_dir(&object.store).join(&object.name))
    }

    /// Current contents of a container: `None` while it is still empty.
    pub fn load_container(&self, object: &ObjectRef) -> Result<Option<Raster>> {
        if !self.is_container(object) {
            return Err(ToolboxError::ContainerNotFound(object.to_string()));
        }
        if self.contains(object) {
            Ok(Some(Raster::from_file(self.raster_path(object))?))
        } else {
            Ok(None)
        }
    }

    /// Replace a container's contents.
    pub fn write_container(&self, object: &ObjectRef, raster: &Raster) -> Result<()> {
        if !self.is_container(object) {
            return Err(ToolboxError::ContainerNotFound(object.to_string()));
        }
        raster.save(self.raster_path(object))?;
        Ok(())
    }

    /// Names of all raster objects and containers in a store, sorted.
    pub fn list(&self, store: &str) -> Result<Vec<String>> {
        let dir = self.store_dir(store);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            let ext = path.extension().and_then(|e| e.to_str());
            if !matches!(ext, Some(e) if e == RASTER_EXTENSION || e == CONTAINER_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        names.dedup();
        Ok(names)
    }

    /// Delete a whole store. A missing store is not an error.
    pub fn remove_store(&self, store: &str) -> Result<()> {
        let dir = self.store_dir(store);
        if dir.exists() {
            fs::remove_dir_all(&dir)?;
        }
        Ok(())
    }
}
