use actix_session::Session;
use actix_utils::future::{ready, Ready};
use actix_web::{http::header, FromRequest, HttpRequest};

use crate::error::Error;

pub const SPOTIFY_TOKEN_SESSION_KEY: &str = "spotify_token";

/// A Spotify user access token supplied by the caller, taken from the
/// `Authorization: Bearer` header or, failing that, the cookie session.
/// Extraction fails with 401 when neither carries a token; handlers that
/// take this never run unauthenticated.
pub struct SpotifyToken(pub String);

impl FromRequest for SpotifyToken {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut actix_web::dev::Payload) -> Self::Future {
        let mut f = || {
            if let Some(token) = bearer_token(req) {
                return Ok(SpotifyToken(token));
            }

            let session = Session::from_request(req, payload)
                .into_inner()
                .map_err(|_| Error::MissingToken)?;

            session
                .get::<String>(SPOTIFY_TOKEN_SESSION_KEY)
                .ok()
                .flatten()
                .map(SpotifyToken)
                .ok_or(Error::MissingToken)
        };

        ready(f())
    }
}

fn bearer_token(req: &HttpRequest) -> Option<String> {
    let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();

    (!token.is_empty()).then(|| token.to_string())
}
