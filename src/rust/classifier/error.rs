use std::fmt;
use std::io;
use std::path::PathBuf;

/// Which half of the artifact pair an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Classifier,
    Vectorizer,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Classifier => write!(f, "classifier"),
            Self::Vectorizer => write!(f, "vectorizer"),
        }
    }
}

/// Errors raised while loading the classifier/vectorizer pair.
///
/// Every variant is fatal at startup: nothing may be analyzed until both
/// artifacts are in memory and known to pair with each other.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactLoadError {
    #[error("{artifact} file not found: {}", .path.display())]
    Missing { artifact: ArtifactKind, path: PathBuf },
    #[error("failed to read {artifact} file {}: {source}", .path.display())]
    Unreadable {
        artifact: ArtifactKind,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("unsupported {artifact} format for {} (expected .json or .onnx)", .path.display())]
    UnsupportedFormat { artifact: ArtifactKind, path: PathBuf },
    #[error("corrupt {artifact} file {}: {reason}", .path.display())]
    Corrupt {
        artifact: ArtifactKind,
        path: PathBuf,
        reason: String,
    },
    #[error("hash mismatch for {artifact} file: expected {expected}, got {actual}")]
    DigestMismatch {
        artifact: ArtifactKind,
        expected: String,
        actual: String,
    },
    #[error("classifier and vectorizer are incompatible: {0}")]
    Incompatible(String),
    #[error("ONNX Runtime error: {0}")]
    Runtime(String),
}

/// Per-request failure inside the inference pipeline.
///
/// Recoverable: the caller reports it and the artifacts stay usable.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InferenceError {
    #[error("vectorization failed: {0}")]
    Vectorization(String),
    #[error("feature vector has {actual} columns, classifier expects {expected}")]
    FeatureShape { expected: usize, actual: usize },
    #[error("model error: {0}")]
    Model(String),
    #[error("invalid class probabilities: {0}")]
    InvalidProbabilities(String),
    #[error("expected a binary classifier, got {0} class probabilities")]
    UnexpectedClassCount(usize),
}

impl From<ort::Error> for InferenceError {
    fn from(err: ort::Error) -> Self {
        InferenceError::Model(err.to_string())
    }
}
