use std::fmt::{Debug, Display};

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;

pub type Result<R> = core::result::Result<R, Error>;

/// Everything that can go wrong while serving an API request.
pub enum Error {
    /// A required query parameter was absent.
    MissingParameter(&'static str),
    /// Batch request with an empty URL list.
    EmptyBatch,
    /// Malformed playlist URL or invalid request value.
    BadRequest(String),
    /// Well-formed playlist id that Spotify could not resolve.
    PlaylistNotFound(String),
    /// Playlist mutation attempted without a Spotify user token.
    MissingToken,
    /// Spotify refused the supplied user token.
    TokenRejected,
    /// Spotify was unreachable or answered with a server error.
    Upstream(eyre::Report),
    Internal(eyre::Report),
}

impl Error {
    /// Message exposed to the client. Internal reports are not leaked.
    pub fn public_message(&self) -> String {
        match self {
            Error::MissingParameter(name) => format!("{name} parameter is required"),
            Error::EmptyBatch => "playlist_urls must not be empty".into(),
            Error::BadRequest(msg) => msg.clone(),
            Error::PlaylistNotFound(id) => format!("playlist not found: {id}"),
            Error::MissingToken => "Spotify token is required".into(),
            Error::TokenRejected => "Spotify token was rejected".into(),
            Error::Upstream(_) => "Spotify is unavailable".into(),
            Error::Internal(_) => "internal server error".into(),
        }
    }
}

impl From<eyre::Report> for Error {
    fn from(error: eyre::Report) -> Self {
        Error::Internal(error)
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Upstream(report) | Error::Internal(report) => Debug::fmt(report, f),
            other => f.write_str(&other.public_message()),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Upstream(report) | Error::Internal(report) => Display::fmt(report, f),
            other => f.write_str(&other.public_message()),
        }
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::MissingParameter(_) | Error::EmptyBatch | Error::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Error::PlaylistNotFound(_) => StatusCode::NOT_FOUND,
            Error::MissingToken | Error::TokenRejected => StatusCode::UNAUTHORIZED,
            Error::Upstream(_) => StatusCode::BAD_GATEWAY,
            Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            Error::Upstream(report) | Error::Internal(report) => log::error!("{report:?}"),
            _ => {}
        }

        HttpResponse::build(self.status_code()).json(json!({ "error": self.public_message() }))
    }
}
