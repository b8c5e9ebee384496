use std::fmt;

use log::debug;

use super::error::{ArtifactLoadError, InferenceError};
use super::normalize::normalize;
use super::ArtifactInfo;
use crate::artifacts::{self, Artifacts};
use crate::config::ArtifactConfig;

/// Class value the classifier uses for hate speech.
pub const POSITIVE_CLASS: i64 = 1;

/// Outcome label of an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    HateSpeech,
    Clean,
}

impl Label {
    /// Maps a predicted class value to a label: `1` is hate speech, anything
    /// else is clean.
    pub fn from_class(class: i64) -> Self {
        if class == POSITIVE_CLASS {
            Label::HateSpeech
        } else {
            Label::Clean
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::HateSpeech => "Hate Speech",
            Label::Clean => "Clean",
        }
    }

    pub fn is_hate_speech(&self) -> bool {
        matches!(self, Label::HateSpeech)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Highest class probability of a prediction, as a percentage in `[0, 100]`.
///
/// Displays with two decimals and a percent sign, e.g. `90.00%`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Confidence(f64);

impl Confidence {
    pub fn from_probability(probability: f64) -> Self {
        Self((probability * 100.0).clamp(0.0, 100.0))
    }

    /// Raw percentage value.
    pub fn percent(&self) -> f64 {
        self.0
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}%", self.0)
    }
}

/// Label and confidence for one analyzed text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisResult {
    pub label: Label,
    pub confidence: Confidence,
}

/// Runs raw text through normalization, vectorization and classification.
///
/// The engine only reads its artifacts, so a single instance can be shared
/// behind an `Arc` by any number of sessions and threads.
pub struct InferenceEngine {
    artifacts: Artifacts,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<InferenceEngine>();
    }
};

impl fmt::Debug for InferenceEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InferenceEngine")
            .field("info", &self.info())
            .finish()
    }
}

impl InferenceEngine {
    pub fn new(artifacts: Artifacts) -> Self {
        Self { artifacts }
    }

    /// Loads the configured artifact pair and wraps it in an engine.
    pub fn load(config: &ArtifactConfig) -> Result<Self, ArtifactLoadError> {
        artifacts::load_with(config).map(Self::new)
    }

    /// Returns information about the loaded artifacts
    pub fn info(&self) -> ArtifactInfo {
        let classifier = self.artifacts.classifier();
        ArtifactInfo {
            model_path: self.artifacts.model_path().to_string_lossy().to_string(),
            vectorizer_path: self.artifacts.vectorizer_path().to_string_lossy().to_string(),
            backend: classifier.backend(),
            n_features: self.artifacts.vectorizer().n_features(),
            classes: classifier.classes().to_vec(),
        }
    }

    /// Classifies `raw` text.
    ///
    /// The text is normalized, vectorized as a single-row batch and fed to the
    /// classifier. The label comes from the predicted class value and the
    /// confidence is the largest class probability, as a percentage.
    ///
    /// # Errors
    /// - `FeatureShape` if the vectorizer output does not fit the classifier
    /// - `Vectorization` / `Model` if either artifact fails at runtime
    /// - `UnexpectedClassCount` if the classifier is not binary
    /// - `InvalidProbabilities` if the distribution is not finite or in `[0, 1]`
    pub fn analyze(&self, raw: &str) -> Result<AnalysisResult, InferenceError> {
        let classifier = self.artifacts.classifier();
        let normalized = normalize(raw);

        let features = self.artifacts.vectorizer().transform(&normalized)?;
        if features.nrows() != 1 {
            return Err(InferenceError::Vectorization(format!(
                "expected a single feature row, got {}",
                features.nrows()
            )));
        }
        if let Some(expected) = classifier.n_features() {
            if features.ncols() != expected {
                return Err(InferenceError::FeatureShape {
                    expected,
                    actual: features.ncols(),
                });
            }
        }

        let (labels, proba) = classifier.predict_with_proba(features.view())?;
        let class = labels
            .first()
            .copied()
            .ok_or_else(|| InferenceError::Model("classifier returned no prediction".into()))?;
        if proba.nrows() == 0 {
            return Err(InferenceError::Model("classifier returned no probabilities".into()));
        }

        let row = proba.row(0);
        if row.len() != 2 {
            return Err(InferenceError::UnexpectedClassCount(row.len()));
        }
        if let Some(p) = row.iter().find(|p| !p.is_finite() || **p < 0.0 || **p > 1.0 + 1e-6) {
            return Err(InferenceError::InvalidProbabilities(format!(
                "probability {} is outside [0, 1]",
                p
            )));
        }

        let max = row.iter().copied().fold(0.0f32, f32::max);
        let result = AnalysisResult {
            label: Label::from_class(class),
            confidence: Confidence::from_probability(f64::from(max)),
        };
        debug!(
            "Analyzed {} chars ({} normalized): class={} label={} confidence={}",
            raw.chars().count(),
            normalized.len(),
            class,
            result.label,
            result.confidence
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_mapping() {
        assert_eq!(Label::from_class(1), Label::HateSpeech);
        assert_eq!(Label::from_class(0), Label::Clean);
        assert_eq!(Label::from_class(-1), Label::Clean);
        assert_eq!(Label::from_class(2), Label::Clean);
        assert_eq!(Label::HateSpeech.to_string(), "Hate Speech");
        assert_eq!(Label::Clean.to_string(), "Clean");
    }

    #[test]
    fn test_confidence_formatting() {
        let c = Confidence::from_probability(0.9);
        assert_eq!(c.to_string(), "90.00%");
        assert_eq!(Confidence::from_probability(0.123456).to_string(), "12.35%");
        assert_eq!(Confidence::from_probability(1.0000001).percent(), 100.0);
    }
}
