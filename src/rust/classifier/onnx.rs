use std::collections::HashMap;
use std::path::Path;

use log::{debug, info};
use ndarray::{Array1, Array2, ArrayView2, Ix2};
use ort::session::Session;
use ort::value::{Tensor, ValueType};

use super::error::{ArtifactKind, ArtifactLoadError, InferenceError};
use super::TextClassifier;
use crate::runtime::{create_session_builder, RuntimeConfig};

const BINARY_CLASSES: [i64; 2] = [0, 1];

/// A classifier exported to ONNX and executed with ONNX Runtime.
///
/// The graph is expected to follow the layout produced by `skl2onnx` with
/// `zipmap=False`:
/// - one input: float features `[batch_size, n_features]`
/// - output 0: predicted labels `i64[batch_size]`
/// - output 1: class probabilities `f32[batch_size, n_classes]`
///
/// Labels are taken from the graph as-is, so the positive class must be
/// encoded as `1`.
#[derive(Debug)]
pub struct OnnxClassifier {
    session: Session,
    input_name: String,
    n_features: Option<usize>,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<OnnxClassifier>();
    }
};

impl OnnxClassifier {
    /// Builds a session from serialized model bytes read from `path`.
    pub fn from_memory(
        bytes: &[u8],
        path: &Path,
        config: &RuntimeConfig,
    ) -> Result<Self, ArtifactLoadError> {
        let corrupt = |reason: String| ArtifactLoadError::Corrupt {
            artifact: ArtifactKind::Classifier,
            path: path.to_path_buf(),
            reason,
        };

        let session = create_session_builder(config)?
            .commit_from_memory(bytes)
            .map_err(|e| corrupt(e.to_string()))?;
        Self::validate_model(&session).map_err(corrupt)?;

        let input_name = session.inputs[0].name.clone();
        let n_features = Self::declared_width(&session);
        info!(
            "ONNX classifier loaded from {:?} (input: '{}', width: {:?})",
            path, input_name, n_features
        );
        Ok(Self {
            session,
            input_name,
            n_features,
        })
    }

    /// Feature width from the input shape `[batch, n]`, when `n` is fixed.
    fn declared_width(session: &Session) -> Option<usize> {
        match &session.inputs[0].input_type {
            ValueType::Tensor { dimensions, .. } if dimensions.len() == 2 => {
                usize::try_from(dimensions[1]).ok().filter(|&n| n > 0)
            }
            _ => None,
        }
    }

    /// Validates that the model has the expected input/output structure
    fn validate_model(session: &Session) -> Result<(), String> {
        if session.inputs.len() != 1 {
            return Err(format!(
                "model must have exactly 1 input (feature matrix), found {}",
                session.inputs.len()
            ));
        }
        if session.outputs.len() < 2 {
            return Err(format!(
                "model must have 2 outputs (labels and probabilities), found {}",
                session.outputs.len()
            ));
        }
        Ok(())
    }

    fn run(&self, features: ArrayView2<f32>) -> Result<(Array1<i64>, Array2<f32>), InferenceError> {
        let input_dyn = features.to_owned().into_dyn();
        let input = input_dyn.as_standard_layout();

        let mut input_tensors = HashMap::new();
        input_tensors.insert(self.input_name.as_str(), Tensor::from_array(&input)
            .map_err(|e| InferenceError::Model(format!("Failed to create input tensor: {}", e)))?);

        let outputs = self.session.run(input_tensors)
            .map_err(|e| InferenceError::Model(format!("Failed to run model: {}", e)))?;

        let labels = outputs[0].try_extract_tensor::<i64>()
            .map_err(|e| InferenceError::Model(format!("Failed to extract label tensor: {}", e)))?;
        let labels: Array1<i64> = labels.iter().copied().collect();

        let proba = outputs[1].try_extract_tensor::<f32>()
            .map_err(|e| InferenceError::Model(format!("Failed to extract probability tensor: {}", e)))?
            .into_dimensionality::<Ix2>()
            .map_err(|e| InferenceError::Model(format!("Unexpected probability shape: {}", e)))?
            .to_owned();

        if labels.len() != proba.nrows() {
            return Err(InferenceError::Model(format!(
                "model returned {} labels for {} probability rows",
                labels.len(),
                proba.nrows()
            )));
        }
        debug!("ONNX run produced {} row(s)", labels.len());
        Ok((labels, proba))
    }
}

impl TextClassifier for OnnxClassifier {
    fn backend(&self) -> &'static str {
        "onnx"
    }

    fn n_features(&self) -> Option<usize> {
        self.n_features
    }

    fn classes(&self) -> &[i64] {
        &BINARY_CLASSES
    }

    fn predict(&self, features: ArrayView2<f32>) -> Result<Array1<i64>, InferenceError> {
        self.run(features).map(|(labels, _)| labels)
    }

    fn predict_proba(&self, features: ArrayView2<f32>) -> Result<Array2<f32>, InferenceError> {
        self.run(features).map(|(_, proba)| proba)
    }

    fn predict_with_proba(
        &self,
        features: ArrayView2<f32>,
    ) -> Result<(Array1<i64>, Array2<f32>), InferenceError> {
        self.run(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    const LOGREG_ONNX: &[u8] = include_bytes!("../../../tests/fixtures/model.onnx");

    fn logreg() -> OnnxClassifier {
        OnnxClassifier::from_memory(LOGREG_ONNX, Path::new("model.onnx"), &RuntimeConfig::default())
            .unwrap()
    }

    #[test]
    fn test_declared_width_is_reported() {
        let model = logreg();
        assert_eq!(model.n_features(), Some(2));
        assert_eq!(model.classes(), &[0, 1]);
        assert_eq!(model.backend(), "onnx");
    }

    #[test]
    fn test_run_returns_labels_and_probabilities() {
        let model = logreg();
        let x = array![[1.0f32, 0.0], [0.0, 1.0], [0.0, 0.0]];
        let (labels, proba) = model.predict_with_proba(x.view()).unwrap();

        assert_eq!(labels, array![1, 0, 0]);
        assert_eq!(proba.shape(), &[3, 2]);
        assert!((proba[[0, 1]] - 0.9).abs() < 1e-5);
        assert!((proba[[1, 0]] - 0.9).abs() < 1e-5);
        assert!((proba[[2, 0]] - 0.5).abs() < 1e-6);

        assert_eq!(model.predict(x.view()).unwrap(), labels);
        assert_eq!(model.predict_proba(x.view()).unwrap(), proba);
    }

    #[test]
    fn test_wrong_width_fails_at_runtime() {
        let model = logreg();
        let err = model.predict_proba(array![[1.0f32, 0.0, 0.0]].view()).unwrap_err();
        assert!(matches!(err, InferenceError::Model(_)));
    }

    #[test]
    fn test_garbage_bytes_are_rejected() {
        let err = OnnxClassifier::from_memory(
            b"corrupted data",
            Path::new("model.onnx"),
            &RuntimeConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ArtifactLoadError::Corrupt { artifact: ArtifactKind::Classifier, .. }
        ));
    }
}
