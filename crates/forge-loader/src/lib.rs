// Re-export SDK types
pub use forge_sdk::{Dataset, Dtype, InferenceTensor, LoaderError, OpaqueTable, Properties, PropertyValue, Theta};

#[cfg(feature = "gguf")]
pub mod gguf;

mod loader;
pub use loader::ModelLoader;
