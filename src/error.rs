//! Error type for the fallible edges of the crate (files, parsing, output).
//!
//! The render pipeline itself never fails: bad input degrades to defaults or
//! empty output.

use std::io;

#[derive(Debug, thiserror::Error)]
pub enum HeatError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Invalid color '{0}'")]
    InvalidColor(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Display error: {0}")]
    Display(String),

    #[error("MQTT error: {0}")]
    Mqtt(String),
}

pub type Result<T> = std::result::Result<T, HeatError>;
