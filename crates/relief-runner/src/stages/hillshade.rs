//! Derive a hillshade per region and add it to the store.

use super::for_each_item;
use crate::artifact::ArtifactState;
use crate::catalog::RegionCatalog;
use crate::error::{FailurePolicy, PipelineError, StepError};
use crate::orchestrator::{PipelineContext, PipelineState};
use relief_dem::RasterKind;
use relief_toolbox::{ObjectRef, Project, RasterToolbox};
use tracing::{debug, info};

/// For every region: hillshade `USGS_1_<region>`, write it to
/// `<project-root>/output/HS_<region>.tif`, import it as `HS_<region>`.
pub fn run<T: RasterToolbox, P: Project>(
    ctx: &mut PipelineContext<T, P>,
    catalog: &RegionCatalog,
) -> Result<(), PipelineError> {
    let config = &ctx.config;
    let store = config.store.as_str();
    let toolbox = &mut ctx.toolbox;
    let artifacts = &mut ctx.artifacts;

    for_each_item(
        FailurePolicy::for_stage(PipelineState::DerivingHillshade),
        ctx.operator.as_mut(),
        catalog,
        |region| {
            let elevation = ObjectRef::new(store, region.object_name(RasterKind::Elevation));
            let shade = toolbox.hillshade(&elevation, &config.hillshade)?;

            let output = config.hillshade_output(region);
            shade.save(&output)?;
            artifacts.advance(region, RasterKind::Hillshade, ArtifactState::Local)?;
            debug!(region = %region, path = %output.display(), "Wrote hillshade");

            toolbox.import_raster(&output, store, &region.object_name(RasterKind::Hillshade))?;
            artifacts.advance(region, RasterKind::Hillshade, ArtifactState::Ingested)?;
            Ok::<(), StepError>(())
        },
    )
    .map_err(|(region, source)| PipelineError::Derivation {
        region: region.to_string(),
        source,
    })?;

    info!(regions = catalog.len(), "Hillshades created");
    Ok(())
}
