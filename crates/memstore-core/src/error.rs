use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Failed to decode key: {0}")]
    Decoding(String),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("{service} request failed: {message}")]
    Service {
        service: &'static str,
        status: Option<u16>,
        message: String,
    },
}

impl Error {
    pub fn service(service: &'static str, message: impl Into<String>) -> Self {
        Self::Service { service, status: None, message: message.into() }
    }

    pub fn service_status(service: &'static str, status: u16, message: impl Into<String>) -> Self {
        Self::Service { service, status: Some(status), message: format!("HTTP {status}: {}", message.into()) }
    }

    /// True for failures reported by a remote collaborator.
    pub fn is_service(&self) -> bool { matches!(self, Self::Service { .. }) }
}

pub type Result<T> = std::result::Result<T, Error>;
