use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::{error, info};
use sha2::{Digest, Sha256};

use crate::classifier::{
    ArtifactKind, ArtifactLoadError, LinearClassifier, OnnxClassifier, TextClassifier,
    TfidfVectorizer, Vectorizer,
};
use crate::config::ArtifactConfig;
use crate::runtime::RuntimeConfig;

/// The classifier/vectorizer pair, loaded together and checked to share a
/// feature space.
pub struct Artifacts {
    classifier: Box<dyn TextClassifier>,
    vectorizer: Box<dyn Vectorizer>,
    model_path: PathBuf,
    vectorizer_path: PathBuf,
}

impl fmt::Debug for Artifacts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Artifacts")
            .field("backend", &self.classifier.backend())
            .field("n_features", &self.vectorizer.n_features())
            .field("model_path", &self.model_path)
            .field("vectorizer_path", &self.vectorizer_path)
            .finish()
    }
}

impl Artifacts {
    /// Pairs already-constructed artifacts, e.g. ones built in memory.
    pub fn from_parts(
        classifier: Box<dyn TextClassifier>,
        vectorizer: Box<dyn Vectorizer>,
    ) -> Result<Self, ArtifactLoadError> {
        check_pairing(classifier.as_ref(), vectorizer.as_ref())?;
        Ok(Self {
            classifier,
            vectorizer,
            model_path: PathBuf::from("<memory>"),
            vectorizer_path: PathBuf::from("<memory>"),
        })
    }

    pub fn classifier(&self) -> &dyn TextClassifier {
        self.classifier.as_ref()
    }

    pub fn vectorizer(&self) -> &dyn Vectorizer {
        self.vectorizer.as_ref()
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn vectorizer_path(&self) -> &Path {
        &self.vectorizer_path
    }
}

/// Loads a classifier and vectorizer from the given paths with default
/// runtime options and no digest checks.
pub fn load(
    model_path: impl AsRef<Path>,
    vectorizer_path: impl AsRef<Path>,
) -> Result<Artifacts, ArtifactLoadError> {
    load_with(&ArtifactConfig::new(model_path, vectorizer_path))
}

/// Loads both artifacts described by `config`.
///
/// Either both artifacts come back ready for use or nothing does: a missing,
/// unreadable, corrupt, tampered or mismatched file fails the whole load.
pub fn load_with(config: &ArtifactConfig) -> Result<Artifacts, ArtifactLoadError> {
    info!("Loading artifacts:");
    info!("  Model path: {:?}", config.model_path);
    info!("  Vectorizer path: {:?}", config.vectorizer_path);

    let result = load_pair(config);
    if let Err(e) = &result {
        error!("Failed to load artifacts: {}", e);
    }
    result
}

fn load_pair(config: &ArtifactConfig) -> Result<Artifacts, ArtifactLoadError> {
    let vectorizer_bytes = read_artifact(
        ArtifactKind::Vectorizer,
        &config.vectorizer_path,
        config.vectorizer_sha256.as_deref(),
    )?;
    let model_bytes = read_artifact(
        ArtifactKind::Classifier,
        &config.model_path,
        config.model_sha256.as_deref(),
    )?;

    let vectorizer = parse_vectorizer(&config.vectorizer_path, &vectorizer_bytes)?;
    info!("Vectorizer loaded successfully ({} features)", vectorizer.n_features());

    let classifier = parse_classifier(&config.model_path, &model_bytes, &config.runtime)?;
    info!("Classifier loaded successfully ({} backend)", classifier.backend());

    check_pairing(classifier.as_ref(), vectorizer.as_ref())?;
    info!("Classifier and vectorizer validated as a pair");

    Ok(Artifacts {
        classifier,
        vectorizer,
        model_path: config.model_path.clone(),
        vectorizer_path: config.vectorizer_path.clone(),
    })
}

/// Hex-encoded SHA-256 digest of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

fn read_artifact(
    artifact: ArtifactKind,
    path: &Path,
    expected_hash: Option<&str>,
) -> Result<Vec<u8>, ArtifactLoadError> {
    if !path.exists() {
        return Err(ArtifactLoadError::Missing {
            artifact,
            path: path.to_path_buf(),
        });
    }

    let bytes = fs::read(path).map_err(|source| ArtifactLoadError::Unreadable {
        artifact,
        path: path.to_path_buf(),
        source,
    })?;
    info!("Read {} bytes from {} file", bytes.len(), artifact);

    if let Some(expected) = expected_hash {
        let actual = sha256_hex(&bytes);
        if !actual.eq_ignore_ascii_case(expected.trim()) {
            return Err(ArtifactLoadError::DigestMismatch {
                artifact,
                expected: expected.to_string(),
                actual,
            });
        }
        info!("{} hash verified", artifact);
    }
    Ok(bytes)
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

fn parse_vectorizer(path: &Path, bytes: &[u8]) -> Result<Box<dyn Vectorizer>, ArtifactLoadError> {
    match extension(path).as_deref() {
        Some("json") => TfidfVectorizer::from_json_slice(bytes)
            .map(|v| Box::new(v) as Box<dyn Vectorizer>)
            .map_err(|reason| ArtifactLoadError::Corrupt {
                artifact: ArtifactKind::Vectorizer,
                path: path.to_path_buf(),
                reason,
            }),
        _ => Err(ArtifactLoadError::UnsupportedFormat {
            artifact: ArtifactKind::Vectorizer,
            path: path.to_path_buf(),
        }),
    }
}

fn parse_classifier(
    path: &Path,
    bytes: &[u8],
    runtime: &RuntimeConfig,
) -> Result<Box<dyn TextClassifier>, ArtifactLoadError> {
    match extension(path).as_deref() {
        Some("json") => LinearClassifier::from_json_slice(bytes)
            .map(|c| Box::new(c) as Box<dyn TextClassifier>)
            .map_err(|reason| ArtifactLoadError::Corrupt {
                artifact: ArtifactKind::Classifier,
                path: path.to_path_buf(),
                reason,
            }),
        Some("onnx") => OnnxClassifier::from_memory(bytes, path, runtime)
            .map(|c| Box::new(c) as Box<dyn TextClassifier>),
        _ => Err(ArtifactLoadError::UnsupportedFormat {
            artifact: ArtifactKind::Classifier,
            path: path.to_path_buf(),
        }),
    }
}

/// Verifies the two artifacts belong together: the classifier is binary,
/// widths agree where declared, and the classifier accepts the vectorizer's
/// output for an empty document.
fn check_pairing(
    classifier: &dyn TextClassifier,
    vectorizer: &dyn Vectorizer,
) -> Result<(), ArtifactLoadError> {
    let n_classes = classifier.classes().len();
    if n_classes != 2 {
        return Err(ArtifactLoadError::Incompatible(format!(
            "expected a binary classifier, found {} classes",
            n_classes
        )));
    }

    if let Some(expected) = classifier.n_features() {
        if expected != vectorizer.n_features() {
            return Err(ArtifactLoadError::Incompatible(format!(
                "classifier expects {} features, vectorizer produces {}",
                expected,
                vectorizer.n_features()
            )));
        }
    }

    let probe = vectorizer
        .transform("")
        .map_err(|e| ArtifactLoadError::Incompatible(format!("vectorizer probe failed: {}", e)))?;
    if probe.ncols() != vectorizer.n_features() {
        return Err(ArtifactLoadError::Incompatible(format!(
            "vectorizer declares {} features but produced {}",
            vectorizer.n_features(),
            probe.ncols()
        )));
    }

    let (_, proba) = classifier.predict_with_proba(probe.view()).map_err(|e| {
        ArtifactLoadError::Incompatible(format!("classifier rejected vectorizer output: {}", e))
    })?;
    if proba.ncols() != 2 {
        return Err(ArtifactLoadError::Incompatible(format!(
            "expected 2 class probabilities, classifier produced {}",
            proba.ncols()
        )));
    }
    Ok(())
}
