use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
use ort::session::Session;
use std::sync::OnceLock;

use crate::classifier::ArtifactLoadError;

static INIT: OnceLock<Result<(), String>> = OnceLock::new();

/// ONNX Runtime options for `.onnx` classifier artifacts.
#[derive(Debug)]
pub struct RuntimeConfig {
    pub inter_threads: usize,
    pub intra_threads: usize,
    pub optimization_level: GraphOptimizationLevel,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            inter_threads: 0, // Let ONNX Runtime decide
            intra_threads: 0, // Let ONNX Runtime decide
            optimization_level: GraphOptimizationLevel::Level3,
        }
    }
}

fn copy_level(level: &GraphOptimizationLevel) -> GraphOptimizationLevel {
    match level {
        GraphOptimizationLevel::Level1 => GraphOptimizationLevel::Level1,
        GraphOptimizationLevel::Level2 => GraphOptimizationLevel::Level2,
        GraphOptimizationLevel::Level3 => GraphOptimizationLevel::Level3,
        GraphOptimizationLevel::Disable => GraphOptimizationLevel::Disable,
    }
}

impl Clone for RuntimeConfig {
    fn clone(&self) -> Self {
        Self {
            inter_threads: self.inter_threads,
            intra_threads: self.intra_threads,
            optimization_level: copy_level(&self.optimization_level),
        }
    }
}

/// Initializes the process-wide ONNX Runtime environment once; later calls
/// return the outcome of the first attempt.
pub fn ensure_initialized() -> Result<(), ArtifactLoadError> {
    INIT.get_or_init(|| {
        ort::init()
            .with_name("hatescan")
            .commit()
            .map(|_| ())
            .map_err(|e| e.to_string())
    })
    .clone()
    .map_err(ArtifactLoadError::Runtime)
}

pub fn create_session_builder(config: &RuntimeConfig) -> Result<SessionBuilder, ArtifactLoadError> {
    ensure_initialized()?;
    let runtime_err = |e: ort::Error| ArtifactLoadError::Runtime(e.to_string());

    let mut builder = Session::builder().map_err(runtime_err)?;

    // Configure threading
    if config.inter_threads > 0 {
        builder = builder
            .with_inter_threads(config.inter_threads)
            .map_err(runtime_err)?;
    }
    if config.intra_threads > 0 {
        builder = builder
            .with_intra_threads(config.intra_threads)
            .map_err(runtime_err)?;
    }

    builder
        .with_optimization_level(copy_level(&config.optimization_level))
        .map_err(runtime_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_initialization() {
        assert!(ensure_initialized().is_ok());
        assert!(ensure_initialized().is_ok()); // Second call should be fine
    }

    #[test]
    fn test_session_builder_config() {
        let config = RuntimeConfig {
            inter_threads: 2,
            intra_threads: 2,
            optimization_level: GraphOptimizationLevel::Level1,
        };
        let builder = create_session_builder(&config.clone());
        assert!(builder.is_ok());
    }
}
