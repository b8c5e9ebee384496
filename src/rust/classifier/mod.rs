use ndarray::{Array1, Array2, ArrayView2};

mod error;
pub mod engine;
pub mod linear;
mod normalize;
pub mod onnx;
mod utils;
pub mod vectorizer;

pub use engine::{AnalysisResult, Confidence, InferenceEngine, Label};
pub use error::{ArtifactKind, ArtifactLoadError, InferenceError};
pub use linear::LinearClassifier;
pub use normalize::normalize;
pub use onnx::OnnxClassifier;
pub use vectorizer::{Norm, TfidfVectorizer};

/// Maps normalized text to a fixed-width feature row.
///
/// Implementations are fitted artifacts: they never change after load and
/// must be safe to share between threads.
pub trait Vectorizer: Send + Sync {
    /// Width of every row produced by [`transform`](Self::transform).
    fn n_features(&self) -> usize;

    /// Vectorizes a single document into a `(1, n_features)` batch.
    fn transform(&self, text: &str) -> Result<Array2<f32>, InferenceError>;
}

/// A frozen probabilistic classifier over feature rows.
pub trait TextClassifier: Send + Sync {
    /// Short name of the serialization backend, for logs and [`ArtifactInfo`].
    fn backend(&self) -> &'static str;

    /// Expected input width, when the artifact declares it.
    fn n_features(&self) -> Option<usize>;

    /// Class values in probability-column order.
    fn classes(&self) -> &[i64];

    /// Predicted class value for each row.
    fn predict(&self, features: ArrayView2<f32>) -> Result<Array1<i64>, InferenceError>;

    /// Class probability distribution for each row.
    fn predict_proba(&self, features: ArrayView2<f32>) -> Result<Array2<f32>, InferenceError>;

    /// Prediction and probabilities together. Backends that produce both
    /// from one model run override this.
    fn predict_with_proba(
        &self,
        features: ArrayView2<f32>,
    ) -> Result<(Array1<i64>, Array2<f32>), InferenceError> {
        Ok((self.predict(features)?, self.predict_proba(features)?))
    }
}

/// Information about the loaded artifact pair
#[derive(Debug, Clone)]
pub struct ArtifactInfo {
    /// Path the classifier was loaded from
    pub model_path: String,
    /// Path the vectorizer was loaded from
    pub vectorizer_path: String,
    /// Classifier backend ("linear" or "onnx")
    pub backend: &'static str,
    /// Width of the shared feature space
    pub n_features: usize,
    /// Class values known to the classifier
    pub classes: Vec<i64>,
}
