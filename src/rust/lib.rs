//! Hate speech detection over a frozen, pre-trained classifier.
//!
//! A [`Detector`] loads a TF-IDF vectorizer and a binary classifier once at
//! startup and hands out [`AnalysisSession`]s. Each session normalizes and
//! classifies submitted text, and keeps its own append-only [`History`] that
//! can be exported as CSV.
//!
//! # Basic Usage
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use hatescan::{ArtifactConfig, Detector};
//!
//! let detector = Detector::load(&ArtifactConfig::from_dir("artifacts"))?;
//! let session = detector.session();
//!
//! let result = session.submit("I hate this")?;
//! println!("{} ({})", result.label, result.confidence);
//!
//! print!("{}", session.history().export()?);
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! The loaded artifacts are read-only and shared by every session through an
//! `Arc`; each session's history serializes its own appends:
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use hatescan::{ArtifactConfig, Detector};
//! use std::thread;
//!
//! let detector = Detector::load(&ArtifactConfig::default())?;
//!
//! let mut handles = vec![];
//! for _ in 0..3 {
//!     let detector = detector.clone();
//!     handles.push(thread::spawn(move || {
//!         let session = detector.session();
//!         session.submit("test text").unwrap();
//!     }));
//! }
//!
//! for handle in handles {
//!     handle.join().unwrap();
//! }
//! # Ok(())
//! # }
//! ```

pub mod artifacts;
pub mod classifier;
pub mod config;
pub mod history;
mod runtime;
pub mod session;

pub use artifacts::{load, load_with, Artifacts};
pub use classifier::{
    normalize, AnalysisResult, ArtifactInfo, ArtifactKind, ArtifactLoadError, Confidence,
    InferenceEngine, InferenceError, Label, TextClassifier, Vectorizer,
};
pub use config::ArtifactConfig;
pub use history::{AnalysisRecord, ExportError, History};
pub use runtime::{create_session_builder, RuntimeConfig};
pub use session::{AnalysisSession, Detector, SubmissionError, ValidationError};

pub fn init_logger() {
    env_logger::init();
}
