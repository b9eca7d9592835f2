use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Encoder is not fitted; fit it or load a saved state first")]
    NotFitted,

    #[error("Survey not found: {0}")]
    SurveyNotFound(i64),

    #[error("Recommendation not found: {0}")]
    RecommendationNotFound(i64),

    #[error("Model artifact unavailable: {0}")]
    ArtifactUnavailable(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Image error: {0}")]
    Image(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
