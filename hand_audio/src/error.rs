use std::path::PathBuf;

use sample_engine::EngineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to start detector `{command}`: {source}")]
    DetectorSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("detector `{0}` has no stdout")]
    DetectorStdout(String),

    #[error("landmark source `{0}` is not available in this build")]
    SourceUnavailable(&'static str),

    #[error("window: {0}")]
    Window(String),

    #[error("audio engine: {0}")]
    Engine(#[from] EngineError),

    #[error("server: {0}")]
    Server(#[source] std::io::Error),
}
