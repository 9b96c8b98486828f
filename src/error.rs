use thiserror::Error;

/// Ошибки генерации и экспорта рельефа
#[derive(Error, Debug)]
pub enum TerrainError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Запрошено больше точек, чем есть подходящих клеток (истоков рек, мест для поселений)
    #[error("Requested {requested} {what}, but only {available} candidate cells exist")]
    InsufficientCandidates {
        requested: usize,
        available: usize,
        what: &'static str,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to create image buffer")]
    ImageBuffer,
}
