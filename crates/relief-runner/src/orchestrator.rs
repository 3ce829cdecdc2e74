//! Pipeline state machine.
//!
//! The pipeline walks a fixed sequence of states, running one stage per
//! state over the whole region catalog:
//!
//! ```text
//! Fetching -> Ingesting -> DerivingHillshade -> BuildingDatasets -> Smoothing -> Styling -> Done
//! ```
//!
//! No state is entered twice. A fatal stage error stops the walk where it
//! happened; nothing already written is rolled back.

use crate::artifact::ArtifactLedger;
use crate::config::PipelineConfig;
use crate::error::{PipelineError, StepError};
use crate::operator::Operator;
use crate::stages;
use chrono::{DateTime, Utc};
use relief_dem::{TileFetcher, TileSource};
use relief_toolbox::{Project, RasterToolbox};
use serde::Serialize;
use std::fmt;
use std::time::Instant;
use tracing::{error, info};

// ============================================================================
// States
// ============================================================================

/// Position of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PipelineState {
    Fetching,
    Ingesting,
    DerivingHillshade,
    BuildingDatasets,
    Smoothing,
    Styling,
    Done,
}

impl PipelineState {
    /// Every state in execution order.
    pub const ALL: [PipelineState; 7] = [
        PipelineState::Fetching,
        PipelineState::Ingesting,
        PipelineState::DerivingHillshade,
        PipelineState::BuildingDatasets,
        PipelineState::Smoothing,
        PipelineState::Styling,
        PipelineState::Done,
    ];

    /// The state that follows this one.
    pub const fn next(self) -> Option<PipelineState> {
        match self {
            PipelineState::Fetching => Some(PipelineState::Ingesting),
            PipelineState::Ingesting => Some(PipelineState::DerivingHillshade),
            PipelineState::DerivingHillshade => Some(PipelineState::BuildingDatasets),
            PipelineState::BuildingDatasets => Some(PipelineState::Smoothing),
            PipelineState::Smoothing => Some(PipelineState::Styling),
            PipelineState::Styling => Some(PipelineState::Done),
            PipelineState::Done => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            PipelineState::Fetching => "fetching",
            PipelineState::Ingesting => "ingesting",
            PipelineState::DerivingHillshade => "deriving hillshade",
            PipelineState::BuildingDatasets => "building datasets",
            PipelineState::Smoothing => "smoothing",
            PipelineState::Styling => "styling",
            PipelineState::Done => "done",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Context, outcome types
// ============================================================================

/// Everything the stages share. Owned by the pipeline and lent to one stage
/// at a time.
pub struct PipelineContext<T, P> {
    pub config: PipelineConfig,
    pub toolbox: T,
    pub project: P,
    pub operator: Box<dyn Operator>,
    pub artifacts: ArtifactLedger,
}

impl<T: RasterToolbox, P: Project> PipelineContext<T, P> {
    pub fn new(config: PipelineConfig, toolbox: T, project: P, operator: Box<dyn Operator>) -> Self {
        Self {
            config,
            toolbox,
            project,
            operator,
            artifacts: ArtifactLedger::default(),
        }
    }
}

/// A halted run: the state it stopped in and why.
#[derive(Debug)]
pub struct PipelineFailure {
    pub state: PipelineState,
    pub error: PipelineError,
}

impl PipelineFailure {
    pub fn exit_code(&self) -> u8 {
        self.error.exit_code()
    }
}

impl fmt::Display for PipelineFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pipeline halted while {}: {}", self.state, self.error)
    }
}

impl std::error::Error for PipelineFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Summary of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub regions: Vec<String>,
    pub tiles_downloaded: usize,
    pub tiles_skipped: usize,
    pub bytes_downloaded: u64,
    pub styling_warnings: Vec<String>,
    pub artifacts: ArtifactLedger,
    pub started_at: DateTime<Utc>,
    pub elapsed_secs: f64,
}

// ============================================================================
// Pipeline
// ============================================================================

/// The pipeline: context, tile fetcher and current state.
pub struct Pipeline<S, T, P> {
    ctx: PipelineContext<T, P>,
    fetcher: TileFetcher<S>,
    state: PipelineState,
    history: Vec<PipelineState>,
}

impl<S: TileSource, T: RasterToolbox, P: Project> Pipeline<S, T, P> {
    pub fn new(ctx: PipelineContext<T, P>, fetcher: TileFetcher<S>) -> Self {
        Self {
            ctx,
            fetcher,
            state: PipelineState::Fetching,
            history: Vec::new(),
        }
    }

    /// Current (or final) state.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// States entered so far, in order.
    pub fn history(&self) -> &[PipelineState] {
        &self.history
    }

    pub fn context(&self) -> &PipelineContext<T, P> {
        &self.ctx
    }

    pub fn into_context(self) -> PipelineContext<T, P> {
        self.ctx
    }

    /// Run every stage in order.
    ///
    /// On a fatal error the operator is asked to acknowledge and the failure
    /// is returned with the state it happened in.
    pub fn run(&mut self) -> Result<RunReport, PipelineFailure> {
        if !self.history.is_empty() {
            return Err(self.halt(PipelineError::Configuration(
                crate::error::ConfigError::InvalidValue("pipeline has already run".into()),
            )));
        }

        let started_at = Utc::now();
        let start = Instant::now();
        self.enter(PipelineState::Fetching);

        let catalog = self
            .ctx
            .config
            .validate()
            .map_err(|e| self.halt(e.into()))?;
        self.ctx.artifacts = ArtifactLedger::new(&catalog);
        info!(regions = catalog.len(), store = %self.ctx.config.store, "Starting pipeline");

        if self.ctx.config.clean_store {
            let store = self.ctx.config.store.clone();
            info!(store = %store, "Removing existing raster store");
            self.ctx
                .toolbox
                .clear_store(&store)
                .map_err(|e| {
                    self.halt(PipelineError::StoreReset {
                        store: store.clone(),
                        source: StepError::Toolbox(e),
                    })
                })?;
        }

        let fetched = stages::fetch::run(&mut self.ctx, &catalog, &self.fetcher)
            .map_err(|e| self.halt(e))?;

        let mut styling_warnings = Vec::new();
        while let Some(next) = self.state.next() {
            self.enter(next);
            let result = match next {
                PipelineState::Ingesting => stages::ingest::run(&mut self.ctx, &catalog),
                PipelineState::DerivingHillshade => stages::hillshade::run(&mut self.ctx, &catalog),
                PipelineState::BuildingDatasets => stages::datasets::run(&mut self.ctx, &catalog),
                PipelineState::Smoothing => stages::smoothing::run(&mut self.ctx),
                PipelineState::Styling => stages::symbology::run(&mut self.ctx).map(|warnings| {
                    styling_warnings = warnings;
                }),
                PipelineState::Fetching | PipelineState::Done => Ok(()),
            };
            result.map_err(|e| self.halt(e))?;
        }

        let elapsed = start.elapsed();
        info!(
            regions = catalog.len(),
            warnings = styling_warnings.len(),
            "All stages completed in {:.1}s",
            elapsed.as_secs_f64()
        );
        self.ctx
            .operator
            .acknowledge("All stages completed successfully.");

        Ok(RunReport {
            regions: catalog.ids().into_iter().map(String::from).collect(),
            tiles_downloaded: fetched.tiles_downloaded,
            tiles_skipped: fetched.tiles_skipped,
            bytes_downloaded: fetched.bytes_downloaded,
            styling_warnings,
            artifacts: self.ctx.artifacts.clone(),
            started_at,
            elapsed_secs: elapsed.as_secs_f64(),
        })
    }

    fn enter(&mut self, state: PipelineState) {
        info!(state = %state, "Entering stage");
        self.state = state;
        self.history.push(state);
    }

    fn halt(&mut self, error: PipelineError) -> PipelineFailure {
        error!(state = %self.state, error = %error, "Pipeline halted");
        self.ctx
            .operator
            .acknowledge(&format!("Pipeline halted while {}: {}", self.state, error));
        PipelineFailure {
            state: self.state,
            error,
        }
    }
}
