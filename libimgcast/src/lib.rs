//! Imgcast - post local images to Bluesky, Instagram and X
//!
//! The interesting part is the [`packer`], which shrinks images just enough
//! to fit each platform's upload limit. Everything else is the plumbing
//! around it: finding images, loading credentials and talking to each
//! platform's HTTP API.

pub mod config;
pub mod credentials;
pub mod error;
pub mod logging;
pub mod media;
pub mod packer;
pub mod platforms;
pub mod prompt;

// Re-export commonly used types
pub use config::Config;
pub use credentials::CredentialStore;
pub use error::{ImgcastError, Result};
pub use packer::{pack, pack_batch, pack_file, PackOptions, PackStage, PackedImage};
