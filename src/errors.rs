use std::fmt::{Display, Formatter};

pub type ApiResult<T> = Result<T, ApiError>;

/// Failure modes of a call against the MemeFactory API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Credentials were rejected by the login endpoint.
    Unauthorized,
    /// The referenced entity does not exist.
    NotFound,
    /// The server rejected the bearer token on an authenticated call. The stored token
    /// has already been cleared when this is returned.
    SessionExpired,
    /// Any other status, transport or decoding failure.
    Unknown(String),
}

impl ApiError {
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::Unknown(message.into())
    }

    /// Message suitable for showing to the user.
    pub fn user_message(&self) -> &'static str {
        match self {
            ApiError::Unauthorized => "Wrong credentials",
            ApiError::NotFound => "Not found",
            ApiError::SessionExpired => "Your session has expired, please log in again",
            ApiError::Unknown(_) => "An unknown error occured, please try again later",
        }
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Unauthorized => write!(f, "Unauthorized"),
            ApiError::NotFound => write!(f, "Not Found"),
            ApiError::SessionExpired => write!(f, "Session expired"),
            ApiError::Unknown(message) => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(value: reqwest::Error) -> Self {
        Self::Unknown(value.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(value: serde_json::Error) -> Self {
        Self::Unknown(value.to_string())
    }
}

impl From<url::ParseError> for ApiError {
    fn from(value: url::ParseError) -> Self {
        Self::Unknown(value.to_string())
    }
}

pub type MyResult<T> = Result<T, Error>;

#[derive(Debug)]
pub struct Error(pub anyhow::Error);

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

impl<T> From<T> for Error
where
    T: Into<anyhow::Error>,
{
    fn from(t: T) -> Self {
        Error(t.into())
    }
}
