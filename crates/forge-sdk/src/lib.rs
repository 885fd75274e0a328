//! Format-agnostic tensor model shared by the forge loaders and layers.

pub mod dataset;
pub mod dtype;
pub mod error;
pub mod ops;
pub mod quant;
pub mod storage;
pub mod tensor;
pub mod theta;

pub use dataset::{Dataset, OpaqueTable, Properties, PropertyValue, ValueKind};
pub use dtype::Dtype;
pub use error::{LoaderError, OpError, TensorError, ThetaError};
pub use ops::OpSet;
pub use quant::{BlockLayout, QuantBlockSpec, layout_for_dtype};
pub use storage::TensorBuffer;
pub use tensor::{Element, InferenceTensor, PrimitiveTensor, QuantizedTensor};
pub use theta::Theta;
