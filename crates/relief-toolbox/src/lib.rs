//! # relief-toolbox
//!
//! Raster processing and project bookkeeping for relief maps.
//!
//! - [`RasterToolbox`] is the set of raster operations a pipeline needs:
//!   import into a store, hillshade, raster containers, mosaic and focal
//!   statistics. [`LocalToolbox`] implements it over a directory of GeoTIFFs
//!   laid out as `<workspace>/<store>.gdb/<name>.tif`.
//! - [`Project`] is the map document: maps, layers, a colour ramp catalogue
//!   and layer symbology. [`ProjectDocument`] keeps it in a JSON file.
//!
//! ```no_run
//! use relief_toolbox::{FocalParams, LocalToolbox, ObjectRef, RasterToolbox};
//! use std::path::Path;
//!
//! let mut toolbox = LocalToolbox::new("workspace");
//! toolbox.import_raster(Path::new("downloads/USGS_1_n29w082.tif"), "Automated_Map", "USGS_1_n29w082")?;
//! toolbox.create_raster_container("Automated_Map", "Auto_El_Dataset")?;
//!
//! let container = ObjectRef::new("Automated_Map", "Auto_El_Dataset");
//! toolbox.mosaic("Automated_Map.gdb/USGS_1_n29w082", &container)?;
//! toolbox.focal_statistics(&container, &FocalParams::default())?;
//! # Ok::<(), relief_toolbox::ToolboxError>(())
//! ```

mod error;
pub mod focal;
pub mod mosaic;
pub mod project;
pub mod ramp;
pub mod store;
pub mod terrain;
mod toolbox;

pub use error::{ProjectError, ToolboxError};
pub use focal::{FocalParams, FocalStatistic};
pub use project::{ClassificationMethod, Colorizer, Project, ProjectDocument, Symbology};
pub use ramp::{builtin_ramps, ColorRamp, ColorStop, Rgb};
pub use store::{ObjectRef, RasterStore, STORE_SUFFIX};
pub use terrain::HillshadeParams;
pub use toolbox::{LocalToolbox, RasterToolbox};

/// Result type for toolbox operations.
pub type Result<T> = std::result::Result<T, ToolboxError>;
