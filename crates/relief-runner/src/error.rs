//! Pipeline error taxonomy and the failure policy table.

use crate::artifact::TransitionError;
use crate::orchestrator::PipelineState;
use relief_dem::DemError;
use relief_toolbox::{ProjectError, ToolboxError};
use std::path::PathBuf;
use thiserror::Error;

/// Exit code for a successful run.
pub const EXIT_SUCCESS: u8 = 0;
/// Exit code when a stage halts the pipeline.
pub const EXIT_STAGE_FAILURE: u8 = 1;
/// Exit code for configuration errors.
pub const EXIT_CONFIGURATION: u8 = 2;

/// Errors in the pipeline configuration or its derived inputs.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("Failed to read config {path}: {source}")]
    Io {
        /// Config path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// Configuration file is not valid YAML for the schema.
    #[error("Invalid config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The region list is empty.
    #[error("Region list is empty")]
    EmptyRegions,

    /// One or more region identifiers are malformed.
    #[error("Malformed region identifier(s): {}", .0.join(", "))]
    InvalidRegions(Vec<String>),

    /// A named colour ramp is not in the project's catalogue.
    #[error("Color ramp '{0}' not found in project")]
    MissingRamp(String),

    /// A setting is out of range.
    #[error("Invalid setting: {0}")]
    InvalidValue(String),
}

/// The underlying failure of a single pipeline step.
#[derive(Debug, Error)]
pub enum StepError {
    #[error(transparent)]
    Dem(#[from] DemError),

    #[error(transparent)]
    Toolbox(#[from] ToolboxError),

    #[error(transparent)]
    Project(#[from] ProjectError),

    #[error(transparent)]
    Artifact(#[from] TransitionError),
}

/// A failure that halts (or, for styling, is reported by) the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The raster store could not be removed before the run.
    #[error("Clearing store {store} failed: {source}")]
    StoreReset {
        store: String,
        source: StepError,
    },

    /// One or more tiles could not be downloaded.
    #[error("Download failed for {}: {source}", .regions.join(", "))]
    Transfer {
        /// Every region that failed, in catalog order.
        regions: Vec<String>,
        /// Error of the first failed region.
        source: StepError,
    },

    /// A downloaded tile could not be added to the store.
    #[error("Ingest failed for {region}: {source}")]
    Ingest {
        region: String,
        source: StepError,
    },

    /// Hillshade could not be computed, written or ingested.
    #[error("Hillshade failed for {region}: {source}")]
    Derivation {
        region: String,
        source: StepError,
    },

    /// Container creation or mosaicking failed.
    #[error("{operation} failed: {source}")]
    Merge {
        operation: String,
        source: StepError,
    },

    /// Focal statistics failed on a container.
    #[error("Focal statistics failed on {container}: {source}")]
    Smoothing {
        container: String,
        source: StepError,
    },

    /// Symbology could not be applied to a layer.
    #[error("Styling {layer} failed: {source}")]
    Styling {
        layer: String,
        source: StepError,
    },

    /// Bad configuration.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),
}

impl PipelineError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            PipelineError::Configuration(_) => EXIT_CONFIGURATION,
            _ => EXIT_STAGE_FAILURE,
        }
    }
}

/// What a stage does when one of its items fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Log, acknowledge, continue with the next item; fail the stage at the end.
    IsolateThenFatal,
    /// Stop at the first failure and halt the pipeline.
    Fatal,
    /// Log and continue; the stage succeeds with warnings.
    Recover,
}

impl FailurePolicy {
    /// The policy for each pipeline state.
    ///
    /// `Done` processes no items. It maps to `Fatal` so the table is total
    /// over [`PipelineState`] and callers never handle a missing entry.
    pub const fn for_stage(state: PipelineState) -> Self {
        match state {
            PipelineState::Fetching => FailurePolicy::IsolateThenFatal,
            PipelineState::Ingesting
            | PipelineState::DerivingHillshade
            | PipelineState::BuildingDatasets
            | PipelineState::Smoothing
            | PipelineState::Done => FailurePolicy::Fatal,
            PipelineState::Styling => FailurePolicy::Recover,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(PipelineError::Configuration(ConfigError::EmptyRegions).exit_code(), 2);
        let err = PipelineError::Ingest {
            region: "n29w082".into(),
            source: ToolboxError::ObjectExists("x".into()).into(),
        };
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_policy_table() {
        assert_eq!(
            FailurePolicy::for_stage(PipelineState::Fetching),
            FailurePolicy::IsolateThenFatal
        );
        for state in [
            PipelineState::Ingesting,
            PipelineState::DerivingHillshade,
            PipelineState::BuildingDatasets,
            PipelineState::Smoothing,
        ] {
            assert_eq!(FailurePolicy::for_stage(state), FailurePolicy::Fatal);
        }
        assert_eq!(FailurePolicy::for_stage(PipelineState::Styling), FailurePolicy::Recover);
        assert_eq!(FailurePolicy::for_stage(PipelineState::Done), FailurePolicy::Fatal);
    }

    #[test]
    fn test_store_reset_is_stage_failure() {
        let err = PipelineError::StoreReset {
            store: "Automated_Map".into(),
            source: ToolboxError::InvalidReference("x".into()).into(),
        };
        assert_eq!(err.exit_code(), EXIT_STAGE_FAILURE);
        assert!(err.to_string().starts_with("Clearing store Automated_Map failed"));
    }

    #[test]
    fn test_transfer_message_lists_regions() {
        let err = PipelineError::Transfer {
            regions: vec!["n29w082".into(), "n30w082".into()],
            source: DemError::TransferFailed {
                url: "u".into(),
                reason: "HTTP 404".into(),
            }
            .into(),
        };
        assert!(err.to_string().starts_with("Download failed for n29w082, n30w082"));
    }
}
