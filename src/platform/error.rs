#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Unexpected HTTP status {status} from {url}.")]
    HttpStatus { status: u16, url: String },

    #[error("Failed to parse API response: {0}")]
    JsonParseFailed(#[from] serde_json::Error),

    #[error("Platform API error: {message}")]
    ApiError { message: String },

    #[error("Platform API rejected the credentials.")]
    Unauthorized,

    #[error("Invalid data from API: missing field `{field}`.")]
    MissingField { field: String },

    #[error("Failed to build HTTP client: {message}")]
    ClientBuild { message: String },
}

impl From<wreq::Error> for PlatformError {
    fn from(e: wreq::Error) -> Self {
        PlatformError::RequestFailed(Box::new(e))
    }
}

impl From<url::ParseError> for PlatformError {
    fn from(e: url::ParseError) -> Self {
        PlatformError::RequestFailed(Box::new(e))
    }
}
