//! An operator set that computes nothing and records everything.
//!
//! Values are symbolic expressions, so running a layer graph over
//! [`RecordingOps`] yields the expression it would build on a real backend
//! plus the ordered list of operator calls. Useful for tests and for dry runs
//! of a graph against a freshly loaded archive.

use std::{
    fmt,
    sync::{Mutex, PoisonError},
};

use forge_sdk::{Dtype, InferenceTensor, OpError, OpSet};

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Input(String),
    MatMul {
        input: Box<Expr>,
        weight: String,
        transpose_rhs: bool,
    },
    RmsNorm {
        input: Box<Expr>,
        weight: String,
        epsilon: f32,
    },
    Embedding {
        indices: Box<Expr>,
        table: String,
        dtype: Dtype,
    },
}

impl Expr {
    pub fn input(name: impl Into<String>) -> Self {
        Self::Input(name.into())
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input(name) => f.write_str(name),
            Self::MatMul {
                input,
                weight,
                transpose_rhs: true,
            } => write!(f, "matmul({input}, {weight}^T)"),
            Self::MatMul { input, weight, .. } => write!(f, "matmul({input}, {weight})"),
            Self::RmsNorm { input, weight, epsilon } => write!(f, "rms_norm({input}, {weight}, eps={epsilon:e})"),
            Self::Embedding { indices, table, dtype } => write!(f, "embedding({indices}, {table}, {dtype})"),
        }
    }
}

/// One operator invocation and the parameter it consumed.
#[derive(Debug, Clone, PartialEq)]
pub struct OpCall {
    pub op: &'static str,
    pub weight: String,
    pub weight_dtype: Dtype,
    pub weight_shape: Vec<usize>,
}

#[derive(Debug, Default)]
pub struct RecordingOps {
    calls: Mutex<Vec<OpCall>>,
    rejected: Option<&'static str>,
}

impl RecordingOps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails every call to `op` with [`OpError::Unsupported`].
    pub fn rejecting(op: &'static str) -> Self {
        Self {
            rejected: Some(op),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<OpCall> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn take_calls(&self) -> Vec<OpCall> {
        std::mem::take(&mut *self.calls.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn record(&self, op: &'static str, weight: &InferenceTensor) -> Result<(), OpError> {
        if self.rejected == Some(op) {
            return Err(OpError::Unsupported(format!("{op} on '{}'", weight.name())));
        }
        tracing::trace!(op, weight = weight.name(), "recorded op");
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).push(OpCall {
            op,
            weight: weight.name().to_string(),
            weight_dtype: weight.dtype(),
            weight_shape: weight.shape().to_vec(),
        });
        Ok(())
    }
}

impl OpSet for RecordingOps {
    type Value = Expr;

    fn matmul(&self, input: &Expr, weight: &InferenceTensor, transpose_rhs: bool) -> Result<Expr, OpError> {
        self.record("matmul", weight)?;
        Ok(Expr::MatMul {
            input: Box::new(input.clone()),
            weight: weight.name().to_string(),
            transpose_rhs,
        })
    }

    fn rms_norm(&self, input: &Expr, weight: &InferenceTensor, epsilon: f32) -> Result<Expr, OpError> {
        if epsilon.is_nan() || epsilon <= 0.0 {
            return Err(OpError::InvalidArgument(format!("rms_norm epsilon must be positive, got {epsilon}")));
        }
        self.record("rms_norm", weight)?;
        Ok(Expr::RmsNorm {
            input: Box::new(input.clone()),
            weight: weight.name().to_string(),
            epsilon,
        })
    }

    fn embedding_lookup(&self, indices: &Expr, table: &InferenceTensor, dtype: Dtype) -> Result<Expr, OpError> {
        self.record("embedding_lookup", table)?;
        Ok(Expr::Embedding {
            indices: Box::new(indices.clone()),
            table: table.name().to_string(),
            dtype,
        })
    }
}

#[path = "testing.test.rs"]
mod tests;
