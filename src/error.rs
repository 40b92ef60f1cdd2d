// Error taxonomy shared by the library modules. The UI layer decides which
// variants are shown to the user and which are only logged.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("config file '{0}' does not exist")]
    ConfigMissing(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    /// Non-200 reply without a structured body.
    #[error("failed with status code {status} ({url})")]
    HttpStatus { status: u16, url: String },

    /// 400 reply carrying `{"message": ...}`.
    #[error("failed with status code {status} ({url}): {message}")]
    Application {
        status: u16,
        url: String,
        message: String,
    },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid image payload: {0}")]
    Payload(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not display image: {0}")]
    Display(String),
}

impl ClientError {
    /// URL the failing request was sent to, when there was one.
    pub fn url(&self) -> Option<&str> {
        match self {
            ClientError::HttpStatus { url, .. }
            | ClientError::Application { url, .. }
            | ClientError::Transport { url, .. }
            | ClientError::Decode { url, .. } => Some(url),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
