//! Response transformation: run a filter chain against one image.
//!
//! Two drivers share the merge engine:
//!
//! - [`apply`] composes every stage up front against the original image,
//!   then executes them in order, feeding each stage's output to the next.
//! - [`apply_progressive`] executes each stage as soon as it closes, and
//!   derives later operations against the image as it stands at that
//!   point. An overlay declared after a crop is then placed relative to
//!   the cropped image instead of the original.
//!
//! Neither driver returns partial output: any error discards the work done
//! so far for this image and leaves the chain untouched.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::assets::AssetLoader;
use crate::compose::{StageComposer, compose_stages};
use crate::operation::{DeriveContext, ImageOperation};
use crate::raster::StageExecutor;
use crate::source::SourceImage;
use crate::stage::TransformStage;
use crate::types::FilterError;

/// Compose `operations` against `image`, then execute the stages in order.
///
/// An empty chain returns `image` unchanged.
///
/// # Errors
///
/// Returns the first derivation error before anything is executed, or the
/// first execution error.
#[instrument(skip_all, fields(operations = operations.len(), bytes = image.len()))]
pub fn apply(
    operations: &[Arc<dyn ImageOperation>],
    image: Vec<u8>,
    assets: &dyn AssetLoader,
    executor: &dyn StageExecutor,
) -> Result<Vec<u8>, FilterError> {
    let source = SourceImage::new(image);
    let stages = compose_stages(operations, &source, assets).inspect_err(|e| {
        warn!(error = %e, "transformation aborted");
    })?;
    execute_stages(&stages, source.into_bytes(), executor)
}

/// Execute `stages` in order, chaining each output into the next input.
///
/// # Errors
///
/// Returns the first execution error.
pub fn execute_stages(
    stages: &[TransformStage],
    mut image: Vec<u8>,
    executor: &dyn StageExecutor,
) -> Result<Vec<u8>, FilterError> {
    for (index, stage) in stages.iter().enumerate() {
        debug!(index, ?stage, "executing stage");
        image = executor.execute(stage, &image).inspect_err(|e| {
            warn!(index, error = %e, "stage execution failed");
        })?;
    }
    Ok(image)
}

/// Apply `operations` to `image`, executing each stage as soon as the next
/// operation refuses to join it.
///
/// An operation that opens a new stage is derived a second time against the
/// freshly executed image.
///
/// # Errors
///
/// Returns the first derivation or execution error.
#[instrument(skip_all, fields(operations = operations.len(), bytes = image.len()))]
pub fn apply_progressive(
    operations: &[Arc<dyn ImageOperation>],
    image: Vec<u8>,
    assets: &dyn AssetLoader,
    executor: &dyn StageExecutor,
) -> Result<Vec<u8>, FilterError> {
    progressive(operations, image, assets, executor).inspect_err(|e| {
        warn!(error = %e, "transformation aborted");
    })
}

fn progressive(
    operations: &[Arc<dyn ImageOperation>],
    image: Vec<u8>,
    assets: &dyn AssetLoader,
    executor: &dyn StageExecutor,
) -> Result<Vec<u8>, FilterError> {
    let mut source = SourceImage::new(image);
    let mut composer = StageComposer::new();
    let mut executed = 0_usize;

    for operation in operations {
        let desired = operation.desired_stage(&DeriveContext::new(&source, assets))?;
        if composer.try_fold(operation.as_ref(), desired).is_err() {
            if let Some(stage) = composer.flush() {
                source = SourceImage::new(executor.execute(&stage, source.bytes())?);
                executed += 1;
            }
            let desired = operation.desired_stage(&DeriveContext::new(&source, assets))?;
            composer.fold_fresh(operation.as_ref(), desired);
        }
    }
    if let Some(stage) = composer.flush() {
        source = SourceImage::new(executor.execute(&stage, source.bytes())?);
        executed += 1;
    }

    debug!(stages = executed, "progressive transformation done");
    Ok(source.into_bytes())
}
