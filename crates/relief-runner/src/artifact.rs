//! Per-region artifact tracking.
//!
//! Each region has an elevation and a hillshade artifact. Both only move
//! forward: `Remote -> Local -> Ingested`.

use relief_dem::{RasterKind, Region};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Where an artifact currently lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactState {
    /// Only on the remote archive (or not yet derived).
    #[default]
    Remote,
    /// On the local filesystem.
    Local,
    /// In the raster store.
    Ingested,
}

impl fmt::Display for ArtifactState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ArtifactState::Remote => "remote",
            ArtifactState::Local => "local",
            ArtifactState::Ingested => "ingested",
        })
    }
}

/// Attempted backwards (or skipping) state change.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("artifact cannot move from {from} to {to}")]
pub struct TransitionError {
    pub from: ArtifactState,
    pub to: ArtifactState,
}

impl ArtifactState {
    /// Move to `next`, which must be exactly one step ahead.
    pub fn advance(self, next: ArtifactState) -> Result<ArtifactState, TransitionError> {
        let allowed = matches!(
            (self, next),
            (ArtifactState::Remote, ArtifactState::Local)
                | (ArtifactState::Local, ArtifactState::Ingested)
        );
        if allowed {
            Ok(next)
        } else {
            Err(TransitionError { from: self, to: next })
        }
    }
}

/// State of both artifacts of one region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RegionArtifacts {
    pub elevation: ArtifactState,
    pub hillshade: ArtifactState,
}

/// Artifact states for every region in a run.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ArtifactLedger {
    regions: BTreeMap<String, RegionArtifacts>,
}

impl ArtifactLedger {
    /// Ledger with every region's artifacts `Remote`.
    pub fn new<'a>(regions: impl IntoIterator<Item = &'a Region>) -> Self {
        Self {
            regions: regions
                .into_iter()
                .map(|r| (r.id().to_string(), RegionArtifacts::default()))
                .collect(),
        }
    }

    /// Current state of one artifact.
    pub fn state(&self, region: &Region, kind: RasterKind) -> ArtifactState {
        self.regions
            .get(region.id())
            .map(|a| match kind {
                RasterKind::Elevation => a.elevation,
                RasterKind::Hillshade => a.hillshade,
            })
            .unwrap_or_default()
    }

    /// Advance one artifact.
    pub fn advance(
        &mut self,
        region: &Region,
        kind: RasterKind,
        next: ArtifactState,
    ) -> Result<(), TransitionError> {
        let entry = self.regions.entry(region.id().to_string()).or_default();
        let slot = match kind {
            RasterKind::Elevation => &mut entry.elevation,
            RasterKind::Hillshade => &mut entry.hillshade,
        };
        *slot = slot.advance(next)?;
        Ok(())
    }

    /// Number of regions whose artifacts of `kind` reached `state` or beyond.
    pub fn count_at_least(&self, kind: RasterKind, state: ArtifactState) -> usize {
        self.regions
            .values()
            .filter(|a| match kind {
                RasterKind::Elevation => a.elevation >= state,
                RasterKind::Hillshade => a.hillshade >= state,
            })
            .count()
    }
}
