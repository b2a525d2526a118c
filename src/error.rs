use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TrainError>;

#[derive(Debug, Error)]
pub enum TrainError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to decode image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("invalid manifest: {0}")]
    Manifest(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid label line {line} in {path}: {message}")]
    Label {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("detection failed for {path}: {message}")]
    Detection { path: PathBuf, message: String },

    #[error("model error: {0}")]
    Model(String),

    #[error("checkpoint '{name}' failed: {message}")]
    Checkpoint { name: String, message: String },

    #[error("failed to plot training curves: {0}")]
    Plot(String),
}
