use std::path::Path;

use crate::{Dataset, LoaderError};

/// Picks a format reader from the file extension.
pub struct ModelLoader;

impl ModelLoader {
    /// Load a dataset from `path`, detecting the format from its extension.
    /// Reader limits come from the environment.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Dataset, LoaderError> {
        let path = path.as_ref();
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("").to_lowercase();

        match extension.as_str() {
            "gguf" => {
                #[cfg(feature = "gguf")]
                {
                    crate::gguf::load_gguf_file(path)
                }
                #[cfg(not(feature = "gguf"))]
                {
                    Err(LoaderError::FeatureNotEnabled("GGUF support is not enabled".to_string()))
                }
            }
            _ => Err(LoaderError::UnsupportedFormat(format!("unsupported model extension: '{extension}'"))),
        }
    }
}
