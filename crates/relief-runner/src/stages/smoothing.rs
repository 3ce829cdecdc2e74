//! Focal smoothing of both mosaics.

use super::dataset_name;
use crate::error::PipelineError;
use crate::orchestrator::PipelineContext;
use relief_dem::RasterKind;
use relief_toolbox::{ObjectRef, Project, RasterToolbox};
use tracing::info;

/// Apply the configured focal statistic to the elevation mosaic, then the
/// hillshade mosaic, in place.
pub fn run<T: RasterToolbox, P: Project>(ctx: &mut PipelineContext<T, P>) -> Result<(), PipelineError> {
    for kind in [RasterKind::Elevation, RasterKind::Hillshade] {
        let container = ObjectRef::new(ctx.config.store.as_str(), dataset_name(kind));
        ctx.toolbox
            .focal_statistics(&container, &ctx.config.focal)
            .map_err(|e| PipelineError::Smoothing {
                container: container.to_string(),
                source: e.into(),
            })?;
    }
    ctx.project.save().map_err(|e| PipelineError::Smoothing {
        container: "project".to_string(),
        source: e.into(),
    })?;
    info!(statistic = %ctx.config.focal.statistic, "Focal statistics applied");
    Ok(())
}
