//! Error types for Imgcast

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ImgcastError>;

#[derive(Error, Debug)]
pub enum ImgcastError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("Image packing error: {0}")]
    Pack(#[from] PackError),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to write output: {0}")]
    Output(#[from] serde_json::Error),
}

impl ImgcastError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            ImgcastError::InvalidInput(_) => 3,
            ImgcastError::Platform(PlatformError::Authentication(_)) => 2,
            ImgcastError::Platform(_) => 1,
            ImgcastError::Config(_) => 1,
            ImgcastError::Media(_) => 1,
            ImgcastError::Pack(_) => 1,
            ImgcastError::Io(_) => 1,
            ImgcastError::Output(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to read credentials file {path}: {source}")]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },

    #[error("Missing required field: {0}")]
    MissingField(String),
}

#[derive(Error, Debug)]
pub enum MediaError {
    #[error("Failed to read media directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum PackError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to encode JPEG: {0}")]
    Encode(#[from] image::ImageError),

    #[error(
        "Could not fit image under {budget} bytes: {size} bytes at minimum quality {quality}"
    )]
    BudgetUnreachable {
        size: usize,
        budget: usize,
        quality: u8,
    },
}

#[derive(Error, Debug, Clone)]
pub enum PlatformError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Content validation failed: {0}")]
    Validation(String),

    #[error("Posting failed: {0}")]
    Posting(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),
}
