use std::sync::Arc;

use forge_sdk::{InferenceTensor, OpError, OpSet, Theta, ThetaError};

use crate::{DEFAULT_WEIGHT_NAME, Layer, ThetaLayer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinearConfig {
    pub weight_name: String,
    /// Multiply by the transposed weight, the usual `[out, in]` storage.
    pub transpose_weight: bool,
}

impl Default for LinearConfig {
    fn default() -> Self {
        Self {
            weight_name: DEFAULT_WEIGHT_NAME.to_string(),
            transpose_weight: true,
        }
    }
}

/// `matmul(x, weight^T)`, or `matmul(x, weight)` with `transpose_weight` off.
#[derive(Debug, Clone)]
pub struct LinearLayer<O: OpSet> {
    base: ThetaLayer<O>,
    weight: InferenceTensor,
    transpose_weight: bool,
}

impl<O: OpSet> LinearLayer<O> {
    pub fn new(theta: Theta, ops: Arc<O>) -> Result<Self, ThetaError> {
        Self::with_config(theta, ops, LinearConfig::default())
    }

    pub fn with_config(theta: Theta, ops: Arc<O>, config: LinearConfig) -> Result<Self, ThetaError> {
        let base = ThetaLayer::new(theta, ops);
        let weight = base.theta_tensor(&config.weight_name)?;
        Ok(Self {
            base,
            weight,
            transpose_weight: config.transpose_weight,
        })
    }

    pub fn weight(&self) -> &InferenceTensor {
        &self.weight
    }

    pub fn transpose_weight(&self) -> bool {
        self.transpose_weight
    }

    pub fn theta(&self) -> &Theta {
        self.base.theta()
    }
}

impl<O: OpSet> Layer<O> for LinearLayer<O> {
    fn forward(&self, input: &O::Value) -> Result<O::Value, OpError> {
        self.base.ops().matmul(input, &self.weight, self.transpose_weight)
    }
}

#[path = "linear.test.rs"]
mod tests;
