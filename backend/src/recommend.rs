use std::collections::HashSet;

use async_trait::async_trait;
use rand::seq::SliceRandom;
use soundscout_lib::{CreatePlaylistRequest, CreatedPlaylist, RecommendedTrack};

use crate::error::{Error, Result};
use crate::spotify::{self, SpotifyClient, Track};

/// Spotify caps recommendation requests at five seed tracks.
const MAX_SEED_TRACKS: usize = 5;

/// The collaborator behind the API routes. The binary installs
/// [`SpotifyBackend`]; tests swap in a stub.
#[async_trait]
pub trait RecommendationBackend: Send + Sync {
    /// Recommend at most `limit` tracks based on the given playlist.
    async fn recommend(&self, playlist_url: &str, limit: usize) -> Result<Vec<RecommendedTrack>>;

    /// Create a playlist of recommendations on the token's user account.
    async fn create_playlist(
        &self,
        user_token: &str,
        request: &CreatePlaylistRequest,
        limit: usize,
    ) -> Result<CreatedPlaylist>;
}

pub struct SpotifyBackend {
    client: SpotifyClient,
}

impl SpotifyBackend {
    pub fn new(client: SpotifyClient) -> Self {
        Self { client }
    }

    async fn recommend_for(
        &self,
        playlist_url: &str,
        limit: usize,
    ) -> Result<(spotify::Playlist, Vec<RecommendedTrack>)> {
        let id = spotify::parse_playlist_id(playlist_url)
            .ok_or_else(|| Error::BadRequest(format!("not a Spotify playlist URL: {playlist_url}")))?;

        let playlist = self.client.playlist(id).await?;

        let tracks: Vec<&Track> = playlist
            .tracks
            .items
            .iter()
            .filter_map(|item| item.track.as_ref())
            .collect();

        let known: HashSet<&str> = tracks.iter().filter_map(|t| t.id.as_deref()).collect();
        if known.is_empty() {
            return Err(Error::BadRequest(format!(
                "playlist has no usable tracks: {playlist_url}"
            )));
        }

        let seeds = pick_seeds(&known, MAX_SEED_TRACKS);

        // Over-fetch so that dropping tracks already in the playlist can
        // still fill the cap.
        let candidates = self
            .client
            .recommendations(&seeds, limit + known.len())
            .await?;

        let recommendations = shape(candidates, &known, limit);
        Ok((playlist, recommendations))
    }
}

#[async_trait]
impl RecommendationBackend for SpotifyBackend {
    async fn recommend(&self, playlist_url: &str, limit: usize) -> Result<Vec<RecommendedTrack>> {
        let (_, recommendations) = self.recommend_for(playlist_url, limit).await?;
        Ok(recommendations)
    }

    async fn create_playlist(
        &self,
        user_token: &str,
        request: &CreatePlaylistRequest,
        limit: usize,
    ) -> Result<CreatedPlaylist> {
        let (source, recommendations) = self.recommend_for(&request.playlist_url, limit).await?;

        let name = request
            .name
            .clone()
            .unwrap_or_else(|| format!("{} (recommended)", source.name));

        let created = self
            .client
            .create_playlist(user_token, &name, request.public.unwrap_or(false))
            .await?;

        let uris: Vec<String> = recommendations.iter().map(|t| t.uri.clone()).collect();
        if let Err(e) = self.client.add_tracks(user_token, &created.id, &uris).await {
            // The playlist already exists on the user's account at this
            // point, just without tracks.
            log::warn!("playlist {:?} was created but adding tracks failed", created.id);
            return Err(tag_partial_create(e, &created.id));
        }

        log::info!(
            "created playlist {:?} with {} tracks from {:?}",
            created.id,
            uris.len(),
            source.id,
        );

        Ok(CreatedPlaylist {
            playlist_id: created.id,
            playlist_url: created.external_urls.spotify,
            added_tracks: uris.len(),
        })
    }
}

/// Attach the created playlist id to a failure that happened after the
/// playlist already existed, so the orphan is discoverable in the logs.
fn tag_partial_create(err: Error, playlist_id: &str) -> Error {
    match err {
        Error::Upstream(report) => Error::Upstream(report.wrap_err(format!(
            "playlist {playlist_id} was created but no tracks were added"
        ))),
        other => other,
    }
}

/// Pick up to `n` random seed track ids.
fn pick_seeds(ids: &HashSet<&str>, n: usize) -> Vec<String> {
    let ids: Vec<&str> = ids.iter().copied().collect();
    ids.choose_multiple(&mut rand::thread_rng(), n)
        .map(|id| id.to_string())
        .collect()
}

/// Drop candidates already present in the source playlist, dedupe, and
/// truncate to `limit`.
fn shape(candidates: Vec<Track>, known: &HashSet<&str>, limit: usize) -> Vec<RecommendedTrack> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter_map(|track| {
            let id = track.id?;
            if known.contains(id.as_str()) || !seen.insert(id.clone()) {
                return None;
            }
            Some(RecommendedTrack {
                id,
                name: track.name,
                artists: track.artists.into_iter().map(|a| a.name).collect(),
                uri: track.uri,
            })
        })
        .take(limit)
        .collect()
}
