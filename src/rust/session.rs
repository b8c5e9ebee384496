use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{error, info, warn};
use uuid::Uuid;

use crate::classifier::{AnalysisResult, ArtifactLoadError, InferenceEngine, InferenceError};
use crate::config::ArtifactConfig;
use crate::history::{AnalysisRecord, History};

/// File extension accepted by [`AnalysisSession::submit_file`].
pub const TEXT_FILE_EXTENSION: &str = "txt";

/// Input rejected before it reaches the classifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please enter some text to analyze.")]
    EmptyInput,
    #[error("Only .txt files can be analyzed: {}", .0.display())]
    UnsupportedFileType(PathBuf),
}

/// Why a submission produced no analysis. None of these end the session.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("An error occurred during analysis: {0}")]
    Inference(#[from] InferenceError),
    #[error("Error processing file {}: {source}", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Error processing file {}: content is not valid UTF-8", .path.display())]
    Encoding { path: PathBuf },
}

/// Process-wide entry point: owns the shared engine and opens sessions.
#[derive(Debug, Clone)]
pub struct Detector {
    engine: Arc<InferenceEngine>,
}

impl Detector {
    pub fn new(engine: InferenceEngine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }

    /// Loads the artifact pair. Callers must treat an error as fatal.
    pub fn load(config: &ArtifactConfig) -> Result<Self, ArtifactLoadError> {
        InferenceEngine::load(config).map(Self::new)
    }

    pub fn engine(&self) -> &InferenceEngine {
        &self.engine
    }

    /// Opens a new session with its own empty history.
    pub fn session(&self) -> AnalysisSession {
        AnalysisSession::new(Arc::clone(&self.engine))
    }
}

/// One user's interactive lifetime: shares the engine, owns its history.
#[derive(Debug)]
pub struct AnalysisSession {
    id: Uuid,
    engine: Arc<InferenceEngine>,
    history: History,
}

impl AnalysisSession {
    pub fn new(engine: Arc<InferenceEngine>) -> Self {
        let id = Uuid::new_v4();
        info!("Session {} started", id);
        Self {
            id,
            engine,
            history: History::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Analyzes submitted text and records the outcome.
    ///
    /// Blank input is rejected without running the classifier. A record is
    /// appended to the history only when the analysis succeeds.
    pub fn submit(&self, text: &str) -> Result<AnalysisResult, SubmissionError> {
        if text.trim().is_empty() {
            warn!("Session {}: rejected blank submission", self.id);
            return Err(ValidationError::EmptyInput.into());
        }

        match self.engine.analyze(text) {
            Ok(result) => {
                self.history.append(AnalysisRecord::new(text, &result));
                info!(
                    "Session {}: {} ({})",
                    self.id, result.label, result.confidence
                );
                Ok(result)
            }
            Err(e) => {
                error!("Session {}: analysis failed: {}", self.id, e);
                Err(e.into())
            }
        }
    }

    /// Reads a `.txt` file as UTF-8 and submits its content.
    pub fn submit_file(&self, path: impl AsRef<Path>) -> Result<AnalysisResult, SubmissionError> {
        let path = path.as_ref();
        let is_text_file = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case(TEXT_FILE_EXTENSION))
            .unwrap_or(false);
        if !is_text_file {
            warn!("Session {}: rejected non-text file {:?}", self.id, path);
            return Err(ValidationError::UnsupportedFileType(path.to_path_buf()).into());
        }

        let bytes = fs::read(path).map_err(|source| SubmissionError::File {
            path: path.to_path_buf(),
            source,
        })?;
        let content = String::from_utf8(bytes).map_err(|_| SubmissionError::Encoding {
            path: path.to_path_buf(),
        })?;

        info!("Session {}: analyzing file {:?}", self.id, path);
        self.submit(&content)
    }
}
