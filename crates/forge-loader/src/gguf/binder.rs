use std::{fmt, sync::Arc};

use forge_sdk::{Dtype, InferenceTensor, PrimitiveTensor, QuantizedTensor, TensorBuffer, TensorError};
use rustc_hash::FxHashMap;

use super::{GGUFDataType, GGUFError, tensor_info::GGUFTensorInfo};

/// What a constructor receives for one tensor record.
#[derive(Debug, Clone)]
pub struct BindRequest<'a> {
    pub name: &'a str,
    /// Logical shape, already reversed from the archive order.
    pub shape: Vec<usize>,
    pub data_type: GGUFDataType,
    /// Exactly the record's bytes, sharing the archive's storage.
    pub buffer: TensorBuffer,
}

pub type BindFn = Arc<dyn Fn(BindRequest<'_>) -> Result<InferenceTensor, TensorError> + Send + Sync>;

/// Maps archive tensor types to typed-tensor constructors.
///
/// The reader never decides how a record becomes a tensor; extending the set
/// of loadable types is a `register` call.
#[derive(Clone, Default)]
pub struct TensorBinder {
    constructors: FxHashMap<GGUFDataType, BindFn>,
}

impl TensorBinder {
    /// Empty registry: every tensor is unsupported.
    pub fn new() -> Self {
        Self::default()
    }

    /// F16/F32/F64 as primitive tensors and every quantized type with a
    /// block layout as a quantized tensor.
    pub fn with_defaults() -> Self {
        let mut binder = Self::new();
        for dtype in [Dtype::F16, Dtype::F32, Dtype::F64] {
            binder.register(dtype.into(), primitive(dtype));
        }
        for dtype in [Dtype::Q4_0, Dtype::Q4_1, Dtype::Q5_0, Dtype::Q5_1, Dtype::Q8_0, Dtype::Q8_1] {
            binder.register(dtype.into(), quantized(dtype));
        }
        binder
    }

    /// Add or replace the constructor for `data_type`.
    pub fn register(&mut self, data_type: GGUFDataType, constructor: BindFn) -> &mut Self {
        self.constructors.insert(data_type, constructor);
        self
    }

    pub fn supports(&self, data_type: GGUFDataType) -> bool {
        self.constructors.contains_key(&data_type)
    }

    /// Build the typed tensor for `info` over its slice of `archive`.
    pub fn bind(&self, info: &GGUFTensorInfo, archive: &TensorBuffer) -> Result<InferenceTensor, GGUFError> {
        let constructor = self.constructors.get(&info.data_type).ok_or_else(|| GGUFError::UnsupportedType {
            tensor: info.name.clone(),
            tag: info.data_type.to_string(),
        })?;
        let range = info
            .byte_range
            .clone()
            .ok_or_else(|| GGUFError::malformed(&info.name, format!("storage size of {} is unknown", info.data_type)))?;
        let buffer = archive
            .slice(range.clone())
            .ok_or_else(|| GGUFError::malformed(&info.name, format!("data {range:?} is outside the archive")))?;

        constructor(BindRequest {
            name: &info.name,
            shape: info.logical_shape()?,
            data_type: info.data_type,
            buffer,
        })
        .map_err(|err| GGUFError::malformed(&info.name, err.to_string()))
    }
}

impl fmt::Debug for TensorBinder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<String> = self.constructors.keys().map(ToString::to_string).collect();
        types.sort();
        f.debug_struct("TensorBinder").field("types", &types).finish()
    }
}

fn primitive(dtype: Dtype) -> BindFn {
    Arc::new(move |request: BindRequest<'_>| {
        PrimitiveTensor::new(request.name, request.shape, dtype, request.buffer).map(InferenceTensor::from)
    })
}

fn quantized(dtype: Dtype) -> BindFn {
    Arc::new(move |request: BindRequest<'_>| {
        QuantizedTensor::for_dtype(request.name, request.shape, dtype, request.buffer).map(InferenceTensor::from)
    })
}

#[path = "binder.test.rs"]
mod tests;
