use std::sync::Mutex;
use std::time::{Duration, Instant};

use eyre::eyre;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;

use crate::error::{Error, Result};

/// Playlist ids are 22 base62 characters.
const PLAYLIST_ID_LEN: usize = 22;

/// Refresh the app token a little before Spotify's stated expiry.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(30);

/// Extract the playlist id from any of the accepted shapes: an
/// `open.spotify.com/playlist/<id>` link (query string and trailing path
/// ignored), a `spotify:playlist:<id>` URI, or a bare id.
pub fn parse_playlist_id(url: &str) -> Option<&str> {
    let url = url.trim();

    let id = if let Some(rest) = url.strip_prefix("spotify:playlist:") {
        rest
    } else if let Some(idx) = url.find("/playlist/") {
        let rest = &url[idx + "/playlist/".len()..];
        rest.split(['?', '/', '#']).next().unwrap_or("")
    } else {
        url
    };

    let valid = id.len() == PLAYLIST_ID_LEN && id.chars().all(|c| c.is_ascii_alphanumeric());
    valid.then_some(id)
}

#[derive(Debug, Clone, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    pub tracks: PlaylistTracks,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistTracks {
    pub items: Vec<TrackItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackItem {
    // Local files and removed tracks come back as null.
    pub track: Option<Track>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Track {
    pub id: Option<String>,
    pub name: String,
    pub artists: Vec<Artist>,
    pub uri: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Artist {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatedPlaylistResponse {
    pub id: String,
    pub external_urls: ExternalUrls,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExternalUrls {
    pub spotify: String,
}

#[derive(Debug, Deserialize)]
struct RecommendationsResponse {
    tracks: Vec<Track>,
}

#[derive(Debug, Deserialize)]
struct PrivateUser {
    id: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

struct CachedToken {
    token: String,
    expires_at: Instant,
}

/// Minimal Spotify Web API client. Reads use a cached client-credentials
/// app token; playlist mutations use the caller's user token.
pub struct SpotifyClient {
    http: reqwest::Client,
    api_url: String,
    accounts_url: String,
    client_id: String,
    client_secret: String,
    app_token: Mutex<Option<CachedToken>>,
}

impl SpotifyClient {
    pub fn new(
        api_url: impl Into<String>,
        accounts_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.into(),
            accounts_url: accounts_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            app_token: Mutex::new(None),
        }
    }

    async fn app_token(&self) -> Result<String> {
        {
            // A poisoned lock only means a panic elsewhere; the cached
            // Option is still usable.
            let cached = self.app_token.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(cached) = cached.as_ref() {
                if cached.expires_at > Instant::now() {
                    return Ok(cached.token.clone());
                }
            }
        }

        let url = format!("{}/api/token", self.accounts_url);
        let resp = self
            .http
            .post(&url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(transport)?;

        let status = resp.status();
        if status.is_client_error() {
            return Err(Error::Internal(eyre!(
                "Spotify rejected application credentials: {status}"
            )));
        }
        if !status.is_success() {
            return Err(upstream(status, &url));
        }

        let token: TokenResponse = resp.json().await.map_err(transport)?;
        let ttl = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        let expires_at = Instant::now() + ttl;

        let mut cached = self.app_token.lock().unwrap_or_else(|e| e.into_inner());
        *cached = Some(CachedToken {
            token: token.access_token.clone(),
            expires_at,
        });

        Ok(token.access_token)
    }

    /// Fetch a playlist's name and tracks.
    pub async fn playlist(&self, id: &str) -> Result<Playlist> {
        let token = self.app_token().await?;
        let url = format!("{}/v1/playlists/{id}", self.api_url);
        let resp = self
            .http
            .get(&url)
            .bearer_auth(&token)
            .query(&[(
                "fields",
                "id,name,tracks.items(track(id,name,uri,artists(name)))",
            )])
            .send()
            .await
            .map_err(transport)?;

        match resp.status() {
            StatusCode::OK => resp.json().await.map_err(transport),
            // Spotify answers 400 for ids it can't parse and 404 for
            // unknown ones. Both mean the playlist doesn't resolve.
            StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND => {
                Err(Error::PlaylistNotFound(id.to_string()))
            }
            status => Err(upstream(status, &url)),
        }
    }

    /// Ask Spotify for tracks similar to the given seed tracks.
    pub async fn recommendations(&self, seed_tracks: &[String], limit: usize) -> Result<Vec<Track>> {
        let token = self.app_token().await?;
        let url = format!("{}/v1/recommendations", self.api_url);
        let resp = self
            .http
            .get(&url)
            .bearer_auth(&token)
            .query(&[
                ("seed_tracks", seed_tracks.join(",")),
                ("limit", limit.clamp(1, 100).to_string()),
            ])
            .send()
            .await
            .map_err(transport)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(upstream(status, &url));
        }

        let recs: RecommendationsResponse = resp.json().await.map_err(transport)?;
        Ok(recs.tracks)
    }

    /// Create an empty playlist on the account behind `user_token`.
    pub async fn create_playlist(
        &self,
        user_token: &str,
        name: &str,
        public: bool,
    ) -> Result<CreatedPlaylistResponse> {
        let user_id = self.current_user_id(user_token).await?;
        let url = format!("{}/v1/users/{user_id}/playlists", self.api_url);
        let resp = self
            .http
            .post(&url)
            .bearer_auth(user_token)
            .json(&json!({ "name": name, "public": public }))
            .send()
            .await
            .map_err(transport)?;

        match resp.status() {
            status if status.is_success() => resp.json().await.map_err(transport),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(Error::TokenRejected),
            status => Err(upstream(status, &url)),
        }
    }

    /// Add tracks to a playlist owned by the token's user.
    pub async fn add_tracks(
        &self,
        user_token: &str,
        playlist_id: &str,
        uris: &[String],
    ) -> Result<()> {
        let url = format!("{}/v1/playlists/{playlist_id}/tracks", self.api_url);

        // The endpoint takes at most 100 uris per call.
        for chunk in uris.chunks(100) {
            let resp = self
                .http
                .post(&url)
                .bearer_auth(user_token)
                .json(&json!({ "uris": chunk }))
                .send()
                .await
                .map_err(transport)?;

            match resp.status() {
                status if status.is_success() => {}
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    return Err(Error::TokenRejected)
                }
                status => return Err(upstream(status, &url)),
            }
        }

        Ok(())
    }

    async fn current_user_id(&self, user_token: &str) -> Result<String> {
        let url = format!("{}/v1/me", self.api_url);
        let resp = self
            .http
            .get(&url)
            .bearer_auth(user_token)
            .send()
            .await
            .map_err(transport)?;

        match resp.status() {
            StatusCode::OK => {
                let user: PrivateUser = resp.json().await.map_err(transport)?;
                Ok(user.id)
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(Error::TokenRejected),
            status => Err(upstream(status, &url)),
        }
    }
}

fn transport(error: reqwest::Error) -> Error {
    Error::Upstream(eyre::Report::new(error).wrap_err("request to Spotify failed"))
}

fn upstream(status: StatusCode, url: &str) -> Error {
    Error::Upstream(eyre!("Spotify returned {status} for {url}"))
}
