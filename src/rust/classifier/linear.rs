use ndarray::{Array1, Array2, ArrayView2};
use serde::Deserialize;

use super::error::InferenceError;
use super::utils::{argmax, sigmoid, softmax};
use super::TextClassifier;

/// On-disk layout of a linear model, as exported from a fitted
/// scikit-learn `LogisticRegression` (`classes_`, `coef_`, `intercept_`).
#[derive(Debug, Deserialize)]
struct LinearModelFile {
    classes: Vec<i64>,
    coef: Vec<Vec<f32>>,
    intercept: Vec<f32>,
}

/// Logistic regression over dense feature rows.
///
/// A single coefficient row is the binary case: the positive class is
/// `classes[1]` and its probability is the logistic of the decision score.
/// One row per class is treated as multinomial and uses softmax.
#[derive(Debug, Clone)]
pub struct LinearClassifier {
    classes: Vec<i64>,
    coef: Array2<f32>,
    intercept: Array1<f32>,
}

impl LinearClassifier {
    pub fn new(classes: Vec<i64>, coef: Array2<f32>, intercept: Array1<f32>) -> Result<Self, String> {
        if classes.len() < 2 {
            return Err(format!("need at least 2 classes, found {}", classes.len()));
        }
        let expected_rows = if classes.len() == 2 { 1 } else { classes.len() };
        if coef.nrows() != expected_rows && coef.nrows() != classes.len() {
            return Err(format!(
                "coef has {} rows for {} classes",
                coef.nrows(),
                classes.len()
            ));
        }
        if coef.ncols() == 0 {
            return Err("coef has no feature columns".into());
        }
        if intercept.len() != coef.nrows() {
            return Err(format!(
                "intercept has {} entries for {} coef rows",
                intercept.len(),
                coef.nrows()
            ));
        }
        if coef.iter().chain(intercept.iter()).any(|w| !w.is_finite()) {
            return Err("model contains non-finite weights".into());
        }
        Ok(Self { classes, coef, intercept })
    }

    /// Parses and validates a serialized linear model.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, String> {
        let file: LinearModelFile = serde_json::from_slice(bytes).map_err(|e| e.to_string())?;

        let rows = file.coef.len();
        let cols = file.coef.first().map(Vec::len).unwrap_or(0);
        if file.coef.iter().any(|row| row.len() != cols) {
            return Err("coef rows have different lengths".into());
        }
        let flat: Vec<f32> = file.coef.into_iter().flatten().collect();
        let coef = Array2::from_shape_vec((rows, cols), flat).map_err(|e| e.to_string())?;

        Self::new(file.classes, coef, Array1::from(file.intercept))
    }

    fn decision_function(&self, features: ArrayView2<f32>) -> Result<Array2<f32>, InferenceError> {
        if features.ncols() != self.coef.ncols() {
            return Err(InferenceError::FeatureShape {
                expected: self.coef.ncols(),
                actual: features.ncols(),
            });
        }
        Ok(features.dot(&self.coef.t()) + &self.intercept)
    }

    /// Most probable class per row; ties resolve to the earlier class.
    fn labels(&self, proba: &Array2<f32>) -> Result<Array1<i64>, InferenceError> {
        proba
            .rows()
            .into_iter()
            .map(|row| {
                argmax(row)
                    .map(|idx| self.classes[idx])
                    .ok_or_else(|| InferenceError::Model("empty probability row".into()))
            })
            .collect()
    }
}

impl TextClassifier for LinearClassifier {
    fn backend(&self) -> &'static str {
        "linear"
    }

    fn n_features(&self) -> Option<usize> {
        Some(self.coef.ncols())
    }

    fn classes(&self) -> &[i64] {
        &self.classes
    }

    fn predict(&self, features: ArrayView2<f32>) -> Result<Array1<i64>, InferenceError> {
        let proba = self.predict_proba(features)?;
        self.labels(&proba)
    }

    fn predict_proba(&self, features: ArrayView2<f32>) -> Result<Array2<f32>, InferenceError> {
        let scores = self.decision_function(features)?;
        let mut proba = Array2::<f32>::zeros((scores.nrows(), self.classes.len()));

        if scores.ncols() == 1 {
            for (mut out, score) in proba.rows_mut().into_iter().zip(scores.column(0)) {
                let p = sigmoid(*score);
                out[0] = 1.0 - p;
                out[1] = p;
            }
        } else {
            for (mut out, row) in proba.rows_mut().into_iter().zip(scores.rows()) {
                out.assign(&softmax(row));
            }
        }
        Ok(proba)
    }

    fn predict_with_proba(
        &self,
        features: ArrayView2<f32>,
    ) -> Result<(Array1<i64>, Array2<f32>), InferenceError> {
        let proba = self.predict_proba(features)?;
        Ok((self.labels(&proba)?, proba))
    }
}
