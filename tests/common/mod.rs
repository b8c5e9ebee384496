#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use hatescan::classifier::{LinearClassifier, TfidfVectorizer};
use hatescan::{Artifacts, Detector, InferenceEngine};
use ndarray::array;
use tempfile::TempDir;

pub const VECTORIZER_JSON: &str = r#"{
    "vocabulary": {"hate": 0, "love": 1},
    "idf": [1.0, 1.0],
    "ngram_range": [1, 1],
    "min_token_len": 2,
    "sublinear_tf": false,
    "norm": "l2"
}"#;

/// "hate" alone scores ln(9), i.e. probability 0.9 for class 1.
pub fn model_json() -> String {
    let w = 9f64.ln();
    format!(
        r#"{{"classes": [0, 1], "coef": [[{}, {}]], "intercept": [0.0]}}"#,
        w, -w
    )
}

/// Directory holding `model.onnx` (binary logistic regression over the two
/// terms of [`VECTORIZER_JSON`], same weights as [`model_json`]) and a
/// matching `vectorizer.json`.
pub fn fixture_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}

pub struct ArtifactDir {
    pub dir: TempDir,
    pub model_path: PathBuf,
    pub vectorizer_path: PathBuf,
}

pub fn write_artifacts(model: &str, vectorizer: &str) -> ArtifactDir {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let model_path = dir.path().join("model.json");
    let vectorizer_path = dir.path().join("vectorizer.json");
    fs::write(&model_path, model).expect("Failed to write model");
    fs::write(&vectorizer_path, vectorizer).expect("Failed to write vectorizer");
    ArtifactDir {
        dir,
        model_path,
        vectorizer_path,
    }
}

pub fn default_artifacts() -> ArtifactDir {
    write_artifacts(&model_json(), VECTORIZER_JSON)
}

pub fn in_memory_engine() -> InferenceEngine {
    let vocab = [("hate".to_string(), 0), ("love".to_string(), 1)]
        .into_iter()
        .collect();
    let w = 9f32.ln();
    let classifier = LinearClassifier::new(vec![0, 1], array![[w, -w]], array![0.0])
        .expect("Failed to build classifier");
    let artifacts = Artifacts::from_parts(
        Box::new(classifier),
        Box::new(TfidfVectorizer::new(vocab, Some(vec![1.0, 1.0]))),
    )
    .expect("Artifacts should pair");
    InferenceEngine::new(artifacts)
}

pub fn in_memory_detector() -> Detector {
    Detector::new(in_memory_engine())
}

pub fn write_text_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("Failed to write text file");
    path
}
