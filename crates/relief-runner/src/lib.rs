//! Relief pipeline runner.
//!
//! Turns a list of 1 arc-second USGS elevation regions into a styled relief
//! map: download tiles, import them into a raster store, derive hillshades,
//! mosaic both rasters, smooth the mosaics and style the resulting layers.
//!
//! # Example
//!
//! ```no_run
//! use relief_dem::{ReqwestTileSource, TileFetcher};
//! use relief_runner::{operator_for, Pipeline, PipelineConfig, PipelineContext};
//! use relief_toolbox::{LocalToolbox, ProjectDocument};
//!
//! let config = PipelineConfig::load("relief.yaml")?;
//! let toolbox = LocalToolbox::new(&config.project_root);
//! let project = ProjectDocument::open_or_create(config.project_path(), &config.map_name)?;
//! let source = ReqwestTileSource::with_timeout(config.fetch.timeout())?;
//! let fetcher = TileFetcher::new(source, config.fetch.to_options(&config.archive_base_url));
//! let operator = operator_for(config.interactive);
//!
//! let mut pipeline = Pipeline::new(PipelineContext::new(config, toolbox, project, operator), fetcher);
//! let report = pipeline.run()?;
//! println!("{} regions in {:.1}s", report.regions.len(), report.elapsed_secs);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod artifact;
pub mod catalog;
pub mod config;
mod error;
pub mod operator;
mod orchestrator;
pub mod plan;
pub mod stages;

pub use artifact::{ArtifactLedger, ArtifactState, RegionArtifacts, TransitionError};
pub use catalog::{join_object_names, RegionCatalog};
pub use config::{FetchConfig, PipelineConfig, SymbologyConfig};
pub use error::{
    ConfigError, FailurePolicy, PipelineError, StepError, EXIT_CONFIGURATION, EXIT_STAGE_FAILURE,
    EXIT_SUCCESS,
};
pub use operator::{operator_for, AutoAcknowledge, ConsolePrompt, Operator};
pub use orchestrator::{Pipeline, PipelineContext, PipelineFailure, PipelineState, RunReport};
pub use plan::{Plan, RegionPlan};
