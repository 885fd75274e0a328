pub use binder::{BindFn, BindRequest, TensorBinder};
pub use dataset::{SCHEMA, SCHEMA_KEY, decode_table, load_gguf_buffer, load_gguf_bytes, load_gguf_file, load_gguf_file_with};
pub use errors::GGUFError;
pub use file::{GGUFArray, GGUFDataType, GGUFField, GGUFFile, GGUFHeader, GGUFValue, GGUFValueType};
pub use options::{GGUFLoadOptions, ReaderLimits};
pub use quant_spec::{GGUFDtypeClass, classify_gguf_dtype, tensor_storage_bytes_for_gguf_dtype};
pub use tensor_info::GGUFTensorInfo;
pub use writer::GGUFWriter;

pub mod binder;
pub mod dataset;
pub mod errors;
pub mod file;
pub mod options;
pub mod quant_spec;
pub mod tensor_info;
pub mod writer;
