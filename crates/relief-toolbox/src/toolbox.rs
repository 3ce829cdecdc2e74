//! The raster toolbox interface and its filesystem implementation.

use crate::focal::{focal_statistics, FocalParams};
use crate::mosaic::{mosaic_canvas, paint};
use crate::store::{ObjectRef, RasterStore};
use crate::terrain::{hillshade, HillshadeParams};
use crate::{Result, ToolboxError};
use relief_dem::Raster;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Raster operations the pipeline drives.
///
/// Objects are addressed as `<store>.gdb/<name>` relative to the toolbox's
/// workspace.
pub trait RasterToolbox {
    /// Copy a GeoTIFF into the store under `object`.
    fn import_raster(&mut self, source: &Path, store: &str, object: &str) -> Result<()>;

    /// Compute a hillshade from a stored elevation raster.
    fn hillshade(&self, object: &ObjectRef, params: &HillshadeParams) -> Result<Raster>;

    /// Create an empty raster container and return its dataset path.
    fn create_raster_container(&mut self, store: &str, name: &str) -> Result<PathBuf>;

    /// Mosaic a semicolon-separated list of objects into a container.
    fn mosaic(&mut self, inputs: &str, container: &ObjectRef) -> Result<()>;

    /// Apply a focal statistic to a container in place.
    fn focal_statistics(&mut self, container: &ObjectRef, params: &FocalParams) -> Result<()>;

    /// Remove a store and everything in it. A missing store is not an error.
    fn clear_store(&mut self, store: &str) -> Result<()>;
}

/// [`RasterToolbox`] backed by a [`RasterStore`] on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalToolbox {
    store: RasterStore,
}

impl LocalToolbox {
    /// Toolbox whose stores live under `workspace`.
    pub fn new<P: AsRef<Path>>(workspace: P) -> Self {
        Self {
            store: RasterStore::new(workspace),
        }
    }

    pub fn store(&self) -> &RasterStore {
        &self.store
    }
}

impl RasterToolbox for LocalToolbox {
    fn import_raster(&mut self, source: &Path, store: &str, object: &str) -> Result<()> {
        if !source.is_file() {
            return Err(ToolboxError::SourceNotFound(source.to_path_buf()));
        }
        let target = ObjectRef::new(store, object);
        if self.store.contains(&target) {
            return Err(ToolboxError::ObjectExists(target.to_string()));
        }

        let raster = Raster::from_file(source)?;
        let (width, height) = raster.dimensions();
        self.store.insert(&target, &raster)?;
        info!(object = %target, source = %source.display(), width, height, "Imported raster");
        Ok(())
    }

    fn hillshade(&self, object: &ObjectRef, params: &HillshadeParams) -> Result<Raster> {
        let dem = self.store.load(object)?;
        debug!(object = %object, azimuth = params.azimuth, altitude = params.altitude, "Computing hillshade");
        hillshade(&dem, params)
    }

    fn create_raster_container(&mut self, store: &str, name: &str) -> Result<PathBuf> {
        let container = ObjectRef::new(store, name);
        let path = self.store.create_container(&container)?;
        info!(container = %container, "Created raster container");
        Ok(path)
    }

    fn mosaic(&mut self, inputs: &str, container: &ObjectRef) -> Result<()> {
        let objects = ObjectRef::parse_list(inputs)?;
        let headers = objects
            .iter()
            .map(|object| self.store.header(object))
            .collect::<Result<Vec<_>>>()?;

        let mut merged = {
            let existing = self.store.load_container(container)?;
            mosaic_canvas(existing.as_ref(), &headers)?
        };
        // One input in memory at a time.
        for object in &objects {
            let raster = self.store.load(object)?;
            paint(&mut merged, &raster);
        }

        let (width, height) = merged.dimensions();
        self.store.write_container(container, &merged)?;
        info!(container = %container, inputs = objects.len(), width, height, "Mosaicked rasters");
        Ok(())
    }

    fn focal_statistics(&mut self, container: &ObjectRef, params: &FocalParams) -> Result<()> {
        let raster = self
            .store
            .load_container(container)?
            .ok_or_else(|| ToolboxError::EmptyContainer(container.to_string()))?;
        let smoothed = focal_statistics(&raster, params)?;
        self.store.write_container(container, &smoothed)?;
        info!(
            container = %container,
            statistic = %params.statistic,
            window = params.window_size(),
            "Applied focal statistics"
        );
        Ok(())
    }

    fn clear_store(&mut self, store: &str) -> Result<()> {
        self.store.remove_store(store)?;
        info!(store, "Cleared raster store");
        Ok(())
    }
}
