//! Import downloaded tiles into the raster store.

use super::for_each_item;
use crate::artifact::ArtifactState;
use crate::catalog::RegionCatalog;
use crate::error::{FailurePolicy, PipelineError, StepError};
use crate::orchestrator::{PipelineContext, PipelineState};
use relief_dem::RasterKind;
use relief_toolbox::{Project, RasterToolbox};
use tracing::info;

/// Import `<download-dir>/USGS_1_<region>.tif` as `USGS_1_<region>` for every
/// region. The first failure halts the stage.
pub fn run<T: RasterToolbox, P: Project>(
    ctx: &mut PipelineContext<T, P>,
    catalog: &RegionCatalog,
) -> Result<(), PipelineError> {
    let download_dir = ctx.config.download_dir();
    let store = ctx.config.store.as_str();
    let toolbox = &mut ctx.toolbox;
    let artifacts = &mut ctx.artifacts;

    for_each_item(
        FailurePolicy::for_stage(PipelineState::Ingesting),
        ctx.operator.as_mut(),
        catalog,
        |region| {
            let object = region.object_name(RasterKind::Elevation);
            toolbox.import_raster(&region.local_path(&download_dir), store, &object)?;
            artifacts.advance(region, RasterKind::Elevation, ArtifactState::Ingested)?;
            Ok::<(), StepError>(())
        },
    )
    .map_err(|(region, source)| PipelineError::Ingest {
        region: region.to_string(),
        source,
    })?;

    info!(regions = catalog.len(), store, "All rasters added to store");
    Ok(())
}
