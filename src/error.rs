use thiserror::Error;

/// Failures reported by [`ForecastClient`](crate::ForecastClient) and
/// [`parse_forecast`](crate::parse_forecast).
#[derive(Debug, Error)]
pub enum ForecastError {
    /// The request could not be completed
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The response body was not valid JSON or did not have the forecast shape
    #[error("Unable to decode forecast response: {0}")]
    Decode(#[from] serde_json::Error),
    /// The configured base URL cannot be used to build request URLs
    #[error("Invalid base URL {url}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

/// Ways in which the HTTP exchange itself can fail.
#[derive(Debug, Error)]
pub enum TransportError {
    /// DNS resolution, connection refused, TLS handshake, ...
    #[error("Unable to connect to forecast API: {0}")]
    Connect(#[source] reqwest::Error),
    #[error("Forecast API request timed out: {0}")]
    Timeout(#[source] reqwest::Error),
    #[error("Encountered error calling forecast API: {0}")]
    Request(#[source] reqwest::Error),
    #[error("Unable to read forecast API response body: {0}")]
    Body(#[source] reqwest::Error),
    #[error("Forecast API request was cancelled")]
    Cancelled,
    /// The runtime driving a cancellable request could not be started
    #[error("Unable to start forecast API request: {0}")]
    Runtime(#[source] std::io::Error),
}

impl TransportError {
    /// Classify a reqwest failure raised while sending the request
    pub(crate) fn from_send(err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout(err)
        } else if err.is_connect() {
            TransportError::Connect(err)
        } else {
            TransportError::Request(err)
        }
    }

    /// Classify a reqwest failure raised while reading the response body
    pub(crate) fn from_body(err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout(err)
        } else {
            TransportError::Body(err)
        }
    }
}

/// A request parameter that is not one of the values the API accepts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
    #[error("Unknown unit system '{0}'. Supported: ca, si, us, uk, uk2, auto")]
    UnknownUnits(String),
    #[error("Unknown language '{0}'")]
    UnknownLanguage(String),
    #[error("Invalid time '{0}': expected 'now' or a UNIX timestamp")]
    InvalidTime(String),
}
