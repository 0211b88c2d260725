use thiserror::Error;

/// Failures while setting up a visualization session.
#[derive(Debug, Error)]
pub enum VisualizerError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("match log contains no readable states")]
    EmptyMatch,

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Font(#[from] pw_engine::text::FontLoadError),

    #[error("shader `{name}` failed to compile: {message}")]
    Shader { name: String, message: String },

    #[error("missing asset: {0}")]
    MissingAsset(String),
}

pub type VisualizerResult<T> = Result<T, VisualizerError>;
