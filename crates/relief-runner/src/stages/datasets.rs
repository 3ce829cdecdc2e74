//! Create the two mosaic containers and mosaic every region into them.

use super::dataset_name;
use crate::catalog::RegionCatalog;
use crate::error::{PipelineError, StepError};
use crate::orchestrator::PipelineContext;
use relief_dem::RasterKind;
use relief_toolbox::{ObjectRef, Project, RasterToolbox};
use tracing::info;

/// Order the containers are mosaicked in.
const MOSAIC_ORDER: [RasterKind; 2] = [RasterKind::Hillshade, RasterKind::Elevation];

fn merge_error(operation: impl Into<String>, source: impl Into<StepError>) -> PipelineError {
    PipelineError::Merge {
        operation: operation.into(),
        source: source.into(),
    }
}

/// Create `Auto_El_Dataset` and `Auto_Hill_Dataset`, add both to the map,
/// then mosaic all hillshades and all elevation rasters into them. Each
/// sub-step is fatal.
pub fn run<T: RasterToolbox, P: Project>(
    ctx: &mut PipelineContext<T, P>,
    catalog: &RegionCatalog,
) -> Result<(), PipelineError> {
    let store = ctx.config.store.clone();
    let map = ctx.config.map_name.clone();

    // Input lists are checked before any container exists.
    let lists = MOSAIC_ORDER
        .iter()
        .map(|kind| catalog.object_list(&store, *kind).map(|list| (*kind, list)))
        .collect::<Result<Vec<_>, _>>()?;

    let mut paths = Vec::with_capacity(2);
    for kind in [RasterKind::Elevation, RasterKind::Hillshade] {
        let name = dataset_name(kind);
        let path = ctx
            .toolbox
            .create_raster_container(&store, name)
            .map_err(|e| merge_error(format!("creating {}", name), e))?;
        paths.push(path);
    }
    for path in paths.iter().rev() {
        let layer = ctx
            .project
            .add_data(&map, path)
            .map_err(|e| merge_error("adding datasets to map", e))?;
        info!(map = %map, layer = %layer, "Added dataset layer");
    }
    ctx.project
        .save()
        .map_err(|e| merge_error("saving project", e))?;
    info!(store = %store, "Datasets have been created");

    for (kind, list) in &lists {
        let container = ObjectRef::new(store.as_str(), dataset_name(*kind));
        ctx.toolbox
            .mosaic(list, &container)
            .map_err(|e| merge_error(format!("mosaicking {}", container), e))?;
        info!(container = %container, inputs = catalog.len(), kind = %kind, "Mosaic built");
    }
    ctx.project
        .save()
        .map_err(|e| merge_error("saving project", e))?;
    info!("Mosaics have been created");
    Ok(())
}
