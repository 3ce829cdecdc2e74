//! Dry-run view of a pipeline: every name and path a run would use.

use crate::catalog::RegionCatalog;
use crate::config::PipelineConfig;
use crate::error::ConfigError;
use crate::stages::dataset_name;
use relief_dem::RasterKind;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Names and paths for one region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionPlan {
    pub region: String,
    pub url: String,
    pub local_path: PathBuf,
    pub elevation_object: String,
    pub hillshade_object: String,
    pub hillshade_output: PathBuf,
}

/// Everything a run would touch, computed without I/O.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Plan {
    pub store: String,
    pub regions: Vec<RegionPlan>,
    pub elevation_dataset: String,
    pub hillshade_dataset: String,
    pub elevation_mosaic_inputs: String,
    pub hillshade_mosaic_inputs: String,
}

impl Plan {
    /// Validate `config` and derive the plan.
    pub fn build(config: &PipelineConfig) -> Result<Self, ConfigError> {
        let catalog = config.validate()?;
        Self::for_catalog(config, &catalog)
    }

    fn for_catalog(config: &PipelineConfig, catalog: &RegionCatalog) -> Result<Self, ConfigError> {
        let download_dir = config.download_dir();
        let regions = catalog
            .iter()
            .map(|region| RegionPlan {
                region: region.to_string(),
                url: region.download_url(&config.archive_base_url),
                local_path: region.local_path(&download_dir),
                elevation_object: region.object_name(RasterKind::Elevation),
                hillshade_object: region.object_name(RasterKind::Hillshade),
                hillshade_output: config.hillshade_output(region),
            })
            .collect();

        Ok(Self {
            store: config.store.clone(),
            regions,
            elevation_dataset: dataset_name(RasterKind::Elevation).to_string(),
            hillshade_dataset: dataset_name(RasterKind::Hillshade).to_string(),
            elevation_mosaic_inputs: catalog.object_list(&config.store, RasterKind::Elevation)?,
            hillshade_mosaic_inputs: catalog.object_list(&config.store, RasterKind::Hillshade)?,
        })
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Store: {}.gdb", self.store)?;
        for entry in &self.regions {
            writeln!(f, "{}", entry.region)?;
            writeln!(f, "  url:       {}", entry.url)?;
            writeln!(f, "  download:  {}", entry.local_path.display())?;
            writeln!(f, "  elevation: {}", entry.elevation_object)?;
            writeln!(f, "  hillshade: {} ({})", entry.hillshade_object, entry.hillshade_output.display())?;
        }
        writeln!(f, "{} <- {}", self.hillshade_dataset, self.hillshade_mosaic_inputs)?;
        write!(f, "{} <- {}", self.elevation_dataset, self.elevation_mosaic_inputs)
    }
}
