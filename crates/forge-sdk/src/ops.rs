use crate::{Dtype, InferenceTensor, OpError};

/// Arithmetic a layer can ask of its backend.
///
/// Layers only describe which operation runs on which parameters; the backend
/// decides what a value is (a host array, a graph node, a compiler IR handle)
/// and how weights in any encoding are consumed.
pub trait OpSet: Send + Sync {
    type Value;

    /// `input @ weight`, or `input @ weight^T` when `transpose_rhs` is set.
    fn matmul(&self, input: &Self::Value, weight: &InferenceTensor, transpose_rhs: bool) -> Result<Self::Value, OpError>;

    fn rms_norm(&self, input: &Self::Value, weight: &InferenceTensor, epsilon: f32) -> Result<Self::Value, OpError>;

    /// Gather rows of `table` at `indices`, producing `dtype` values.
    fn embedding_lookup(&self, indices: &Self::Value, table: &InferenceTensor, dtype: Dtype) -> Result<Self::Value, OpError>;
}
