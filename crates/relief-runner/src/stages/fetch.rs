//! Download every region's elevation tile.

use super::for_each_item;
use crate::artifact::ArtifactState;
use crate::catalog::RegionCatalog;
use crate::error::{FailurePolicy, PipelineError, StepError};
use crate::orchestrator::{PipelineContext, PipelineState};
use relief_dem::{DownloadStats, RasterKind, TileFetcher, TileSource};
use relief_toolbox::{Project, RasterToolbox};
use tracing::info;

/// Fetch every region. Failures are isolated per region; if any region
/// failed the stage fails after the last one. Returns the fetcher's counts.
pub fn run<S, T, P>(
    ctx: &mut PipelineContext<T, P>,
    catalog: &RegionCatalog,
    fetcher: &TileFetcher<S>,
) -> Result<DownloadStats, PipelineError>
where
    S: TileSource,
    T: RasterToolbox,
    P: Project,
{
    let download_dir = ctx.config.download_dir();
    let artifacts = &mut ctx.artifacts;
    info!(regions = catalog.len(), dir = %download_dir.display(), "Downloading tiles");

    let failures = for_each_item(
        FailurePolicy::for_stage(PipelineState::Fetching),
        ctx.operator.as_mut(),
        catalog,
        |region| {
            fetcher.fetch_region(region, &download_dir)?;
            artifacts.advance(region, RasterKind::Elevation, ArtifactState::Local)?;
            Ok::<(), StepError>(())
        },
    )
    .map_err(|(region, source)| PipelineError::Transfer {
        regions: vec![region.to_string()],
        source,
    })?;

    let regions: Vec<String> = failures.iter().map(|(r, _)| r.to_string()).collect();
    if let Some((_, source)) = failures.into_iter().next() {
        return Err(PipelineError::Transfer { regions, source });
    }

    let stats = fetcher.download_stats();
    info!(
        downloaded = stats.tiles_downloaded,
        skipped = stats.tiles_skipped,
        bytes = stats.bytes_downloaded,
        "Downloads completed"
    );
    Ok(stats)
}
