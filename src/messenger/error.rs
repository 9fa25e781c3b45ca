#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum MessengerError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Unexpected HTTP status {status} from {url}.")]
    HttpStatus { status: u16, url: String },

    #[error("Failed to parse response: {0}")]
    JsonParseFailed(#[from] serde_json::Error),

    #[error("VK API error {code}: {message}")]
    ApiError { code: i64, message: String },

    #[error("Unexpected response: {message}")]
    UnexpectedResponse { message: String },

    #[error("Failed to build HTTP client: {message}")]
    ClientBuild { message: String },
}

impl From<wreq::Error> for MessengerError {
    fn from(e: wreq::Error) -> Self {
        MessengerError::RequestFailed(Box::new(e))
    }
}

impl From<url::ParseError> for MessengerError {
    fn from(e: url::ParseError) -> Self {
        MessengerError::RequestFailed(Box::new(e))
    }
}
