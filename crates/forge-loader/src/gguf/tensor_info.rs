use std::ops::Range;

use super::{GGUFDataType, GGUFError};

/// One tensor record from the archive directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GGUFTensorInfo {
    pub name: String,
    /// Archive order: fastest-varying dimension first.
    pub dimensions: Vec<u64>,
    pub data_type: GGUFDataType,
    /// Relative to the start of the data section.
    pub offset: u64,
    /// Absolute span in the archive. `None` when the type's storage size is unknown.
    pub byte_range: Option<Range<usize>>,
}

impl GGUFTensorInfo {
    pub fn element_count(&self) -> Option<u64> {
        self.dimensions.iter().try_fold(1u64, |acc, &d| acc.checked_mul(d))
    }

    pub fn byte_len(&self) -> Option<usize> {
        self.byte_range.as_ref().map(|range| range.len())
    }

    /// The declared dimensions reversed, so `[A, B, C]` reads as `[C, B, A]`.
    ///
    /// ggml lists the innermost dimension first and stores weights
    /// pre-transposed for a constant right-hand side; layers see the reversed
    /// order and multiply with a transposed RHS.
    pub fn logical_shape(&self) -> Result<Vec<usize>, GGUFError> {
        self.dimensions
            .iter()
            .rev()
            .map(|&d| usize::try_from(d).map_err(|_| GGUFError::malformed(&self.name, format!("dimension {d} does not fit in usize"))))
            .collect()
    }
}

#[path = "tensor_info.test.rs"]
mod tests;
