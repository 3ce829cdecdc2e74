//! Pipeline stages, one module per [`PipelineState`](crate::orchestrator::PipelineState).
//!
//! Each stage processes the whole catalog before returning. Stages talk to
//! each other only through the raster store, the filesystem and the project
//! document held by the [`PipelineContext`](crate::orchestrator::PipelineContext).

pub mod datasets;
pub mod fetch;
pub mod hillshade;
pub mod ingest;
pub mod smoothing;
pub mod symbology;

use crate::error::{FailurePolicy, StepError};
use crate::operator::Operator;
use relief_dem::RasterKind;
use std::fmt::Display;
use tracing::{error, warn};

/// Container name for a raster kind's mosaic.
pub const fn dataset_name(kind: RasterKind) -> &'static str {
    match kind {
        RasterKind::Elevation => "Auto_El_Dataset",
        RasterKind::Hillshade => "Auto_Hill_Dataset",
    }
}

/// Run `step` on every item under `policy`.
///
/// `Fatal` returns the first failure. The other policies log each failure,
/// keep going and return every failure at the end; `IsolateThenFatal` also
/// waits for the operator after each one.
pub(crate) fn for_each_item<I, F>(
    policy: FailurePolicy,
    operator: &mut dyn Operator,
    items: I,
    mut step: F,
) -> Result<Vec<(I::Item, StepError)>, (I::Item, StepError)>
where
    I: IntoIterator,
    I::Item: Display,
    F: FnMut(&I::Item) -> Result<(), StepError>,
{
    let mut failures = Vec::new();
    for item in items {
        let Err(err) = step(&item) else {
            continue;
        };
        match policy {
            FailurePolicy::Fatal => return Err((item, err)),
            FailurePolicy::IsolateThenFatal => {
                error!(item = %item, error = %err, "Step failed, continuing with next item");
                operator.acknowledge(&format!("{} failed: {}", item, err));
                failures.push((item, err));
            }
            FailurePolicy::Recover => {
                warn!(item = %item, error = %err, "Step failed, continuing");
                failures.push((item, err));
            }
        }
    }
    Ok(failures)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::Operator;
    use relief_dem::DemError;

    #[derive(Default)]
    struct Recorder(Vec<String>);

    impl Operator for Recorder {
        fn acknowledge(&mut self, message: &str) {
            self.0.push(message.to_string());
        }
    }

    fn failing_on(bad: &'static str) -> impl FnMut(&&str) -> Result<(), StepError> {
        move |item| {
            if *item == bad {
                Err(DemError::InvalidRegion(item.to_string()).into())
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_fatal_stops_at_first_failure() {
        let mut op = Recorder::default();
        let mut seen = Vec::new();
        let mut inner = failing_on("b");
        let result = for_each_item(FailurePolicy::Fatal, &mut op, ["a", "b", "c"], |item| {
            seen.push(*item);
            inner(item)
        });
        assert_eq!(result.unwrap_err().0, "b");
        assert_eq!(seen, vec!["a", "b"]);
        assert!(op.0.is_empty());
    }

    #[test]
    fn test_isolate_continues_and_acknowledges() {
        let mut op = Recorder::default();
        let failures =
            for_each_item(FailurePolicy::IsolateThenFatal, &mut op, ["a", "b", "c"], failing_on("b"))
                .unwrap();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, "b");
        assert_eq!(op.0.len(), 1);
    }

    #[test]
    fn test_recover_does_not_prompt() {
        let mut op = Recorder::default();
        let failures =
            for_each_item(FailurePolicy::Recover, &mut op, ["a", "b"], failing_on("a")).unwrap();
        assert_eq!(failures.len(), 1);
        assert!(op.0.is_empty());
    }
}
