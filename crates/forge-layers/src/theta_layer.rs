use std::{fmt, sync::Arc};

use forge_sdk::{InferenceTensor, OpSet, Theta, ThetaError};

/// Parameters plus the operator set that will consume them.
///
/// Concrete layers wrap one of these and resolve their tensors through
/// [`ThetaLayer::theta_tensor`] while being constructed, so an archive that
/// does not match the model definition fails before anything runs.
pub struct ThetaLayer<O: OpSet> {
    theta: Theta,
    ops: Arc<O>,
}

impl<O: OpSet> ThetaLayer<O> {
    pub fn new(theta: Theta, ops: Arc<O>) -> Self {
        Self { theta, ops }
    }

    pub fn theta(&self) -> &Theta {
        &self.theta
    }

    pub fn ops(&self) -> &O {
        &self.ops
    }

    pub fn ops_handle(&self) -> Arc<O> {
        Arc::clone(&self.ops)
    }

    /// A parameter by name. Missing parameters are an error, never a default.
    pub fn theta_tensor(&self, name: &str) -> Result<InferenceTensor, ThetaError> {
        let tensor = self.theta.tensor(name)?;
        tracing::debug!(
            parameter = name,
            dtype = %tensor.dtype(),
            shape = ?tensor.shape(),
            "resolved layer parameter"
        );
        Ok(tensor.clone())
    }

    /// Builds a layer over the parameters under `prefix`, sharing the operator set.
    pub fn scoped(&self, prefix: &str) -> Result<Self, ThetaError> {
        Ok(Self::new(self.theta.scope(prefix)?, self.ops_handle()))
    }

    /// Emits an intermediate value as a trace event.
    pub fn trace_tensor(&self, key: &str, value: &O::Value)
    where
        O::Value: fmt::Debug,
    {
        tracing::trace!(key, ?value, "layer value");
    }
}

impl<O: OpSet> Clone for ThetaLayer<O> {
    fn clone(&self) -> Self {
        Self::new(self.theta.clone(), self.ops_handle())
    }
}

impl<O: OpSet> fmt::Debug for ThetaLayer<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThetaLayer").field("theta", &self.theta).finish_non_exhaustive()
    }
}

#[path = "theta_layer.test.rs"]
mod tests;
