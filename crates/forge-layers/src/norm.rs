use std::sync::Arc;

use forge_sdk::{InferenceTensor, OpError, OpSet, Theta, ThetaError};

use crate::{DEFAULT_WEIGHT_NAME, Layer, ThetaLayer};

pub const DEFAULT_RMS_EPSILON: f32 = 1e-6;

#[derive(Debug, Clone, PartialEq)]
pub struct RmsNormConfig {
    pub weight_name: String,
    pub epsilon: f32,
}

impl Default for RmsNormConfig {
    fn default() -> Self {
        Self {
            weight_name: DEFAULT_WEIGHT_NAME.to_string(),
            epsilon: DEFAULT_RMS_EPSILON,
        }
    }
}

/// Full (unbiased) RMS normalization scaled by a learned weight.
#[derive(Debug, Clone)]
pub struct RmsNormLayer<O: OpSet> {
    base: ThetaLayer<O>,
    weight: InferenceTensor,
    epsilon: f32,
}

impl<O: OpSet> RmsNormLayer<O> {
    pub fn new(theta: Theta, ops: Arc<O>) -> Result<Self, ThetaError> {
        Self::with_config(theta, ops, RmsNormConfig::default())
    }

    pub fn with_config(theta: Theta, ops: Arc<O>, config: RmsNormConfig) -> Result<Self, ThetaError> {
        let base = ThetaLayer::new(theta, ops);
        let weight = base.theta_tensor(&config.weight_name)?;
        Ok(Self {
            base,
            weight,
            epsilon: config.epsilon,
        })
    }

    pub fn weight(&self) -> &InferenceTensor {
        &self.weight
    }

    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }
}

impl<O: OpSet> Layer<O> for RmsNormLayer<O> {
    fn forward(&self, input: &O::Value) -> Result<O::Value, OpError> {
        self.base.ops().rms_norm(input, &self.weight, self.epsilon)
    }
}

#[path = "norm.test.rs"]
mod tests;
