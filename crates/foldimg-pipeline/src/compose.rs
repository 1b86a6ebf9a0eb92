//! Merge engine: group an ordered chain of operations into the fewest
//! executor stages.
//!
//! Grouping is a strict left-to-right greedy fold. Each operation's desired
//! stage is folded into the stage being accumulated when the operation's
//! own [`can_merge`](ImageOperation::can_merge) allows it; otherwise the
//! accumulated stage is closed and a new one begins. Operations are never
//! reordered and there is no lookahead.

use std::sync::Arc;

use tracing::trace;

use crate::assets::AssetLoader;
use crate::operation::{DeriveContext, ImageOperation};
use crate::source::SourceImage;
use crate::stage::TransformStage;
use crate::types::FilterError;

/// Accumulates one stage at a time.
///
/// Shared by [`compose_stages`] and the progressive driver in
/// [`crate::transform`], which executes each stage as soon as it closes.
#[derive(Debug, Default)]
pub struct StageComposer {
    current: TransformStage,
}

impl StageComposer {
    /// Start with an empty stage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold `desired` into the current stage if `operation` allows it.
    ///
    /// An empty current stage accepts anything.
    ///
    /// # Errors
    ///
    /// Hands `desired` back untouched when the current stage is non-empty
    /// and the operation refuses the merge. The caller must then
    /// [`flush`](Self::flush) and [`fold_fresh`](Self::fold_fresh).
    pub fn try_fold(
        &mut self,
        operation: &dyn ImageOperation,
        desired: TransformStage,
    ) -> Result<(), TransformStage> {
        if self.current.is_empty() || operation.can_merge(&self.current, &desired) {
            trace!(operation = operation.name(), "folded into current stage");
            operation.merge(&mut self.current, desired);
            Ok(())
        } else {
            trace!(operation = operation.name(), "cannot fold, closing stage");
            Err(desired)
        }
    }

    /// Close and return the current stage, unless it is empty.
    pub fn flush(&mut self) -> Option<TransformStage> {
        if self.current.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.current))
        }
    }

    /// Start a fresh stage from `desired`, returning the stage it replaces
    /// if that one was non-empty.
    pub fn fold_fresh(
        &mut self,
        operation: &dyn ImageOperation,
        desired: TransformStage,
    ) -> Option<TransformStage> {
        let closed = self.flush();
        self.current = TransformStage::default();
        operation.merge(&mut self.current, desired);
        closed
    }
}

/// Group `operations` into the minimal ordered list of stages for
/// `source`.
///
/// Every operation derives its desired stage against `source`. Executing
/// the returned stages in order renders the same result as executing every
/// operation as its own stage.
///
/// # Errors
///
/// Propagates the first derivation error. No stages are returned in that
/// case.
pub fn compose_stages(
    operations: &[Arc<dyn ImageOperation>],
    source: &SourceImage,
    assets: &dyn AssetLoader,
) -> Result<Vec<TransformStage>, FilterError> {
    let ctx = DeriveContext::new(source, assets);
    let mut composer = StageComposer::new();
    let mut stages = Vec::new();

    for operation in operations {
        let desired = operation.desired_stage(&ctx)?;
        if let Err(desired) = composer.try_fold(operation.as_ref(), desired) {
            stages.extend(composer.fold_fresh(operation.as_ref(), desired));
        }
    }
    stages.extend(composer.flush());

    trace!(
        operations = operations.len(),
        stages = stages.len(),
        "composed stages"
    );
    Ok(stages)
}
