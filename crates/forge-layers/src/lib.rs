//! Layers pull named tensors out of a [`Theta`] when they are built and hand
//! them to an [`OpSet`] when they run. No arithmetic happens here.

pub use forge_sdk::{Dtype, InferenceTensor, OpError, OpSet, Theta, ThetaError};

mod embedding;
mod linear;
mod norm;
pub mod testing;
mod theta_layer;

pub use embedding::{TokenEmbedding, TokenEmbeddingConfig};
pub use linear::{LinearConfig, LinearLayer};
pub use norm::{RmsNormConfig, RmsNormLayer};
pub use theta_layer::ThetaLayer;

/// Name every layer looks its weight up under unless told otherwise.
pub const DEFAULT_WEIGHT_NAME: &str = "weight";

/// One step of a layer graph.
pub trait Layer<O: OpSet> {
    fn forward(&self, input: &O::Value) -> Result<O::Value, OpError>;
}

impl<O: OpSet, L: Layer<O> + ?Sized> Layer<O> for Box<L> {
    fn forward(&self, input: &O::Value) -> Result<O::Value, OpError> {
        (**self).forward(input)
    }
}

/// Runs `layers` in order, feeding each output to the next layer.
pub fn forward_all<O: OpSet>(layers: &[&dyn Layer<O>], input: &O::Value) -> Result<O::Value, OpError>
where
    O::Value: Clone,
{
    layers.iter().try_fold(input.clone(), |value, layer| layer.forward(&value))
}
