//! Apply layer symbology to the two dataset layers.

use super::{dataset_name, for_each_item};
use crate::config::SymbologyConfig;
use crate::error::{ConfigError, FailurePolicy, PipelineError, StepError};
use crate::orchestrator::{PipelineContext, PipelineState};
use relief_dem::RasterKind;
use relief_toolbox::{ColorRamp, Project, ProjectError, RasterToolbox, Symbology};
use tracing::info;

fn resolve_ramp<P: Project>(project: &P, name: &str) -> Result<ColorRamp, PipelineError> {
    project.color_ramp(name).map_err(|e| match e {
        ProjectError::RampNotFound(name) => ConfigError::MissingRamp(name).into(),
        other => PipelineError::Styling {
            layer: name.to_string(),
            source: other.into(),
        },
    })
}

/// The symbology a dataset layer receives.
pub fn layer_symbology(kind: RasterKind, ramp: ColorRamp, config: &SymbologyConfig) -> Symbology {
    match kind {
        RasterKind::Elevation => Symbology::stretch(ramp)
            .with_classification(config.classification, config.break_count)
            .with_transparency(config.transparency),
        RasterKind::Hillshade => Symbology::stretch(ramp),
    }
}

/// Style the elevation layer, then the hillshade layer, saving after each.
///
/// Both ramps are resolved before any layer changes; a missing ramp is a
/// configuration error. A layer that cannot be styled is skipped with a
/// warning, and the warnings are returned.
pub fn run<T: RasterToolbox, P: Project>(
    ctx: &mut PipelineContext<T, P>,
) -> Result<Vec<String>, PipelineError> {
    let config = &ctx.config.symbology;
    let elevation_ramp = resolve_ramp(&ctx.project, &config.elevation_ramp)?;
    let hillshade_ramp = resolve_ramp(&ctx.project, &config.hillshade_ramp)?;

    let map = ctx.config.map_name.as_str();
    let project = &mut ctx.project;

    let failures = for_each_item(
        FailurePolicy::for_stage(PipelineState::Styling),
        ctx.operator.as_mut(),
        [RasterKind::Elevation, RasterKind::Hillshade],
        |kind| {
            let ramp = match kind {
                RasterKind::Elevation => elevation_ramp.clone(),
                RasterKind::Hillshade => hillshade_ramp.clone(),
            };
            let layer = dataset_name(*kind);
            project.set_layer_symbology(map, layer, layer_symbology(*kind, ramp, config))?;
            project.save()?;
            info!(map, layer, "Symbology applied");
            Ok::<(), StepError>(())
        },
    )
    .map_err(|(kind, source)| PipelineError::Styling {
        layer: dataset_name(kind).to_string(),
        source,
    })?;

    Ok(failures
        .into_iter()
        .map(|(kind, source)| {
            PipelineError::Styling {
                layer: dataset_name(kind).to_string(),
                source,
            }
            .to_string()
        })
        .collect())
}
