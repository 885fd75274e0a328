use std::sync::Arc;

use forge_sdk::{Dtype, InferenceTensor, OpError, OpSet, Theta, ThetaError};

use crate::{DEFAULT_WEIGHT_NAME, Layer, ThetaLayer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenEmbeddingConfig {
    pub weight_name: String,
    /// Element type of the gathered rows.
    pub dtype: Dtype,
}

impl Default for TokenEmbeddingConfig {
    fn default() -> Self {
        Self {
            weight_name: DEFAULT_WEIGHT_NAME.to_string(),
            dtype: Dtype::F32,
        }
    }
}

/// Token ids in, embedding rows out.
#[derive(Debug, Clone)]
pub struct TokenEmbedding<O: OpSet> {
    base: ThetaLayer<O>,
    weight: InferenceTensor,
    dtype: Dtype,
}

impl<O: OpSet> TokenEmbedding<O> {
    pub fn new(theta: Theta, ops: Arc<O>) -> Result<Self, ThetaError> {
        Self::with_config(theta, ops, TokenEmbeddingConfig::default())
    }

    pub fn with_config(theta: Theta, ops: Arc<O>, config: TokenEmbeddingConfig) -> Result<Self, ThetaError> {
        let base = ThetaLayer::new(theta, ops);
        let weight = base.theta_tensor(&config.weight_name)?;
        Ok(Self {
            base,
            weight,
            dtype: config.dtype,
        })
    }

    pub fn weight(&self) -> &InferenceTensor {
        &self.weight
    }

    pub fn dtype(&self) -> Dtype {
        self.dtype
    }
}

impl<O: OpSet> Layer<O> for TokenEmbedding<O> {
    fn forward(&self, input: &O::Value) -> Result<O::Value, OpError> {
        self.base.ops().embedding_lookup(input, &self.weight, self.dtype)
    }
}

#[path = "embedding.test.rs"]
mod tests;
