use std::fmt;

use bytemuck::Pod;
use half::f16;

use crate::{Dtype, TensorBuffer, TensorError, quant::BlockLayout};

/// Product of `shape`, `None` on overflow. The empty shape is a scalar.
pub fn element_count(shape: &[usize]) -> Option<usize> {
    shape.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
}

fn checked_shape(shape: &[usize]) -> Result<usize, TensorError> {
    match element_count(shape) {
        Some(count) if !shape.contains(&0) => Ok(count),
        _ => Err(TensorError::InvalidShape { shape: shape.to_vec() }),
    }
}

/// Plain IEEE element types a [`PrimitiveTensor`] can be viewed as.
///
/// Views reinterpret stored bytes directly, so they assume a little-endian host.
pub trait Element: Pod + Send + Sync {
    const DTYPE: Dtype;

    fn to_f32(self) -> f32;
}

impl Element for f32 {
    const DTYPE: Dtype = Dtype::F32;

    fn to_f32(self) -> f32 {
        self
    }
}

impl Element for f64 {
    const DTYPE: Dtype = Dtype::F64;

    fn to_f32(self) -> f32 {
        self as f32
    }
}

impl Element for f16 {
    const DTYPE: Dtype = Dtype::F16;

    fn to_f32(self) -> f32 {
        f16::to_f32(self)
    }
}

/// Dense tensor of `f16`, `f32` or `f64` elements over a shared buffer.
#[derive(Clone, Debug)]
pub struct PrimitiveTensor {
    name: String,
    shape: Vec<usize>,
    dtype: Dtype,
    buffer: TensorBuffer,
}

impl PrimitiveTensor {
    pub fn new(name: impl Into<String>, shape: Vec<usize>, dtype: Dtype, buffer: TensorBuffer) -> Result<Self, TensorError> {
        if !dtype.is_plain_float() {
            return Err(TensorError::NotPlain(dtype));
        }
        let elements = checked_shape(&shape)?;
        let element_size = dtype.size_bytes().ok_or(TensorError::NotPlain(dtype))?;
        let expected = elements
            .checked_mul(element_size)
            .ok_or_else(|| TensorError::InvalidShape { shape: shape.clone() })?;
        if buffer.len() != expected {
            return Err(TensorError::SizeMismatch {
                dtype,
                expected,
                actual: buffer.len(),
            });
        }
        Ok(Self {
            name: name.into(),
            shape,
            dtype,
            buffer,
        })
    }

    /// Build a tensor that owns a heap copy of `values`.
    pub fn from_values<T: Element>(name: impl Into<String>, shape: Vec<usize>, values: &[T]) -> Result<Self, TensorError> {
        Self::new(name, shape, T::DTYPE, TensorBuffer::from_pod(values))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn dtype(&self) -> Dtype {
        self.dtype
    }

    pub fn buffer(&self) -> &TensorBuffer {
        &self.buffer
    }

    pub fn raw(&self) -> &[u8] {
        self.buffer.as_bytes()
    }

    pub fn element_count(&self) -> usize {
        self.shape.iter().product()
    }

    /// Zero-copy typed view of the elements.
    pub fn as_slice<T: Element>(&self) -> Result<&[T], TensorError> {
        if T::DTYPE != self.dtype {
            return Err(TensorError::DtypeMismatch {
                requested: T::DTYPE,
                actual: self.dtype,
            });
        }
        bytemuck::try_cast_slice(self.raw()).map_err(|_| TensorError::Misaligned { dtype: self.dtype })
    }

    /// Copy the elements out as `f32`, whatever the stored width.
    ///
    /// Reads element by element so it also works on views that are not
    /// aligned for [`Self::as_slice`].
    pub fn to_f32_vec(&self) -> Vec<f32> {
        match self.dtype {
            Dtype::F16 => widen::<f16>(self.raw()),
            Dtype::F64 => widen::<f64>(self.raw()),
            _ => widen::<f32>(self.raw()),
        }
    }
}

fn widen<T: Element>(raw: &[u8]) -> Vec<f32> {
    raw.chunks_exact(std::mem::size_of::<T>())
        .map(|chunk| bytemuck::pod_read_unaligned::<T>(chunk).to_f32())
        .collect()
}

/// Block-quantized tensor. Keeps the packed blocks; decoding is on demand.
#[derive(Clone)]
pub struct QuantizedTensor {
    name: String,
    shape: Vec<usize>,
    layout: &'static dyn BlockLayout,
    buffer: TensorBuffer,
    blocks: usize,
}

impl QuantizedTensor {
    pub fn new(
        name: impl Into<String>,
        shape: Vec<usize>,
        layout: &'static dyn BlockLayout,
        buffer: TensorBuffer,
    ) -> Result<Self, TensorError> {
        checked_shape(&shape)?;
        let blocks = layout.validate(buffer.len(), &shape)?;
        Ok(Self {
            name: name.into(),
            shape,
            layout,
            buffer,
            blocks,
        })
    }

    /// Like [`Self::new`], resolving the layout from `dtype`.
    pub fn for_dtype(name: impl Into<String>, shape: Vec<usize>, dtype: Dtype, buffer: TensorBuffer) -> Result<Self, TensorError> {
        let layout = crate::quant::layout_for_dtype(dtype).ok_or(TensorError::NoLayout(dtype))?;
        Self::new(name, shape, layout, buffer)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn dtype(&self) -> Dtype {
        self.layout.dtype()
    }

    pub fn layout(&self) -> &'static dyn BlockLayout {
        self.layout
    }

    pub fn buffer(&self) -> &TensorBuffer {
        &self.buffer
    }

    pub fn raw(&self) -> &[u8] {
        self.buffer.as_bytes()
    }

    pub fn block_count(&self) -> usize {
        self.blocks
    }

    pub fn element_count(&self) -> usize {
        self.blocks * self.layout.spec().weights_per_block
    }

    pub fn dequantize(&self) -> Result<Vec<f32>, TensorError> {
        self.layout.dequantize(self.raw(), &self.shape)
    }
}

impl fmt::Debug for QuantizedTensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuantizedTensor")
            .field("name", &self.name)
            .field("shape", &self.shape)
            .field("layout", &self.layout.name())
            .field("blocks", &self.blocks)
            .finish()
    }
}

/// Any tensor a layer may receive, whatever its storage encoding.
#[derive(Clone, Debug)]
pub enum InferenceTensor {
    Primitive(PrimitiveTensor),
    Quantized(QuantizedTensor),
}

impl InferenceTensor {
    pub fn name(&self) -> &str {
        match self {
            Self::Primitive(t) => t.name(),
            Self::Quantized(t) => t.name(),
        }
    }

    pub fn shape(&self) -> &[usize] {
        match self {
            Self::Primitive(t) => t.shape(),
            Self::Quantized(t) => t.shape(),
        }
    }

    pub fn dtype(&self) -> Dtype {
        match self {
            Self::Primitive(t) => t.dtype(),
            Self::Quantized(t) => t.dtype(),
        }
    }

    pub fn raw(&self) -> &[u8] {
        match self {
            Self::Primitive(t) => t.raw(),
            Self::Quantized(t) => t.raw(),
        }
    }

    pub fn buffer(&self) -> &TensorBuffer {
        match self {
            Self::Primitive(t) => t.buffer(),
            Self::Quantized(t) => t.buffer(),
        }
    }

    pub fn byte_len(&self) -> usize {
        self.raw().len()
    }

    pub fn element_count(&self) -> usize {
        match self {
            Self::Primitive(t) => t.element_count(),
            Self::Quantized(t) => t.element_count(),
        }
    }

    pub fn is_quantized(&self) -> bool {
        matches!(self, Self::Quantized(_))
    }

    pub fn as_primitive(&self) -> Option<&PrimitiveTensor> {
        match self {
            Self::Primitive(t) => Some(t),
            Self::Quantized(_) => None,
        }
    }

    pub fn as_quantized(&self) -> Option<&QuantizedTensor> {
        match self {
            Self::Quantized(t) => Some(t),
            Self::Primitive(_) => None,
        }
    }

    /// Values as `f32`, decoding quantized blocks if needed.
    pub fn to_f32_vec(&self) -> Result<Vec<f32>, TensorError> {
        match self {
            Self::Primitive(t) => Ok(t.to_f32_vec()),
            Self::Quantized(t) => t.dequantize(),
        }
    }
}

impl From<PrimitiveTensor> for InferenceTensor {
    fn from(tensor: PrimitiveTensor) -> Self {
        Self::Primitive(tensor)
    }
}

impl From<QuantizedTensor> for InferenceTensor {
    fn from(tensor: QuantizedTensor) -> Self {
        Self::Quantized(tensor)
    }
}

#[path = "tensor.test.rs"]
mod tests;
