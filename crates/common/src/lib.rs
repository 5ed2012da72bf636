//! Common types shared by the Twitter CLI tools

pub mod env_file;
mod error;
pub mod keys;
mod secret;
pub mod telemetry;

pub use env_file::EnvFile;
pub use error::{Error, Result};
pub use secret::Secret;
