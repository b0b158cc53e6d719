#![forbid(unsafe_code)]

use std::path::PathBuf;

use thiserror::Error;

use quill_runtime::{ConfigError, StorageError};

pub type Result<T> = std::result::Result<T, QuillError>;

#[derive(Debug, Error)]
pub enum QuillError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("not an HTML file: {path}")]
    NotHtml { path: PathBuf },

    #[error("{message}")]
    Exit { code: i32, message: String },
}

impl QuillError {
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Exit { code, .. } => *code,
            Self::Config(_) | Self::InvalidArgument { .. } => 2,
            _ => 1,
        }
    }

    #[must_use]
    pub fn exit(code: i32, message: impl Into<String>) -> Self {
        Self::Exit {
            code,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}
