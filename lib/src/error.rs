use std::backtrace::Backtrace;
use std::fmt::{Display, Formatter};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
    pub backtrace: Backtrace,
}

impl std::error::Error for Error {}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            backtrace: Backtrace::capture(),
        }
    }

    /// Shorthand for the most common validation failure.
    pub fn bad_input(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadInput(msg.into()))
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound(msg.into()))
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)?;
        if self.backtrace.status() == std::backtrace::BacktraceStatus::Captured {
            write!(f, ", {}", self.backtrace)?;
        }
        Ok(())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ErrorKind {
    #[error("io error: {0}")]
    StdIoError(#[from] std::io::Error),

    #[error("config error: {0}")]
    ConfigError(#[from] config::ConfigError),

    #[error("json error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("passwordhash error: {0}")]
    PasswordHashError(#[from] argon2::password_hash::Error),

    #[cfg(feature = "axum")]
    #[error("multipart error: {0}")]
    MultipartError(#[from] axum::extract::multipart::MultipartError),

    /// Request was rejected before any state was changed.
    #[error("{0}")]
    BadInput(String),

    #[error("{0}")]
    NotFound(String),

    #[error("invalid password")]
    InvalidCredentials,

    #[error("other error: {0}")]
    Other(String),
}

impl From<String> for Error {
    fn from(e: String) -> Self {
        Self::new(ErrorKind::Other(e))
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::new(ErrorKind::StdIoError(e))
    }
}

impl From<config::ConfigError> for Error {
    fn from(e: config::ConfigError) -> Self {
        Self::new(ErrorKind::ConfigError(e))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::new(ErrorKind::JsonError(e))
    }
}

impl From<argon2::password_hash::Error> for Error {
    fn from(e: argon2::password_hash::Error) -> Self {
        Self::new(ErrorKind::PasswordHashError(e))
    }
}

#[cfg(feature = "axum")]
impl From<axum::extract::multipart::MultipartError> for Error {
    fn from(e: axum::extract::multipart::MultipartError) -> Self {
        Self::new(ErrorKind::MultipartError(e))
    }
}

impl From<ErrorKind> for Error {
    fn from(k: ErrorKind) -> Self {
        Self::new(k)
    }
}
