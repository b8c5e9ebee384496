use std::env;
use std::path::{Path, PathBuf};

use crate::runtime::RuntimeConfig;

/// Environment variable naming the directory that holds the artifact pair.
pub const ARTIFACTS_ENV: &str = "HATESCAN_ARTIFACTS";
/// Classifier file name looked up inside the artifacts directory.
pub const DEFAULT_MODEL_FILE: &str = "model.onnx";
/// Vectorizer file name looked up inside the artifacts directory.
pub const DEFAULT_VECTORIZER_FILE: &str = "vectorizer.json";

/// Where the classifier/vectorizer pair lives and how to load it.
#[derive(Debug, Clone)]
pub struct ArtifactConfig {
    pub model_path: PathBuf,
    pub vectorizer_path: PathBuf,
    /// Expected hex SHA-256 of the classifier file, checked before parsing
    pub model_sha256: Option<String>,
    /// Expected hex SHA-256 of the vectorizer file, checked before parsing
    pub vectorizer_sha256: Option<String>,
    pub runtime: RuntimeConfig,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self::from_dir(Self::default_dir())
    }
}

impl ArtifactConfig {
    pub fn new(model_path: impl AsRef<Path>, vectorizer_path: impl AsRef<Path>) -> Self {
        Self {
            model_path: model_path.as_ref().to_path_buf(),
            vectorizer_path: vectorizer_path.as_ref().to_path_buf(),
            model_sha256: None,
            vectorizer_sha256: None,
            runtime: RuntimeConfig::default(),
        }
    }

    /// Uses the default file names inside `dir`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new(dir.join(DEFAULT_MODEL_FILE), dir.join(DEFAULT_VECTORIZER_FILE))
    }

    /// Returns the default artifacts directory
    pub fn default_dir() -> PathBuf {
        // 1. Check environment variable
        if let Ok(path) = env::var(ARTIFACTS_ENV) {
            if !path.is_empty() {
                return PathBuf::from(path);
            }
        }

        // 2. Fall back to the working directory
        env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    }

    pub fn with_model_sha256(mut self, hash: impl Into<String>) -> Self {
        self.model_sha256 = Some(hash.into());
        self
    }

    pub fn with_vectorizer_sha256(mut self, hash: impl Into<String>) -> Self {
        self.vectorizer_sha256 = Some(hash.into());
        self
    }

    pub fn with_runtime_config(mut self, runtime: RuntimeConfig) -> Self {
        self.runtime = runtime;
        self
    }
}
