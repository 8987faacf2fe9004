use tote_config::BuildMode;
use tracing::trace;

use super::{TransformInput, TransformRef};
use crate::content::Asset;
use crate::error::TransformError;

/// Build-wide values handed to every transform.
#[derive(Debug, Clone)]
pub struct TransformContext {
    pub public_path: String,
    pub mode: BuildMode,
}

/// Runs a chain over one asset with pipe semantics.
///
/// Chains are declared outer-to-inner: for `[a, b]` the executor runs `b`
/// on the raw source and feeds its output to `a`.
#[derive(Debug, Clone)]
pub struct ChainExecutor {
    context: TransformContext,
}

impl ChainExecutor {
    pub fn new(context: TransformContext) -> Self {
        Self { context }
    }

    pub fn apply(&self, asset: Asset, chain: &[TransformRef]) -> Result<Asset, TransformError> {
        let mut asset = asset;
        for step in chain.iter().rev() {
            trace!(path = %asset.source_path, transform = %step.name, "applying transform");
            let Asset {
                source_path,
                kind,
                content,
            } = asset;

            let input = TransformInput {
                content,
                options: &step.options,
                path: &source_path,
                public_path: &self.context.public_path,
                mode: self.context.mode,
            };

            let content = step
                .transform()
                .apply(input)
                .map_err(|source| TransformError {
                    path: source_path.clone(),
                    transform: step.name.clone(),
                    source,
                })?;

            asset = Asset::new(source_path, kind, content);
        }
        Ok(asset)
    }
}
