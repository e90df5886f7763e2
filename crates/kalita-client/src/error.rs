use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with an error envelope.
    #[error("{message}")]
    Api { status: StatusCode, message: String },

    #[error("server returned no data")]
    EmptyResponse,
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(e) => e.status(),
            _ => None,
        }
    }

    /// The requested row does not exist (or is not visible to the caller).
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }
}
