use std::path::PathBuf;

use thiserror::Error;

/// Failures raised while loading engine configuration or dialogue scripts.
/// Runtime operations never surface errors; they degrade silently instead.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing {what}: {source}")]
    Json {
        what: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("camera distance bounds inverted: min {min} > max {max}")]
    DistanceBounds { min: f32, max: f32 },
    #[error("initial camera distance {value} outside [{min}, {max}]")]
    InitialDistance { value: f32, min: f32, max: f32 },
    #[error("{name} must be positive (got {value})")]
    NonPositive { name: &'static str, value: f32 },
    #[error("dialogue script is empty")]
    EmptyScript,
    #[error("dialogue entry {index} has zero duration")]
    ZeroDuration { index: usize },
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
