use std::sync::Arc;

use actix_web::{post, web, HttpResponse};
use soundscout_lib::CreatePlaylistRequest;

use crate::error::Result;
use crate::recommend::RecommendationBackend;
use crate::route::{auth::SpotifyToken, effective_limit};
use crate::Opt;

/// Create a playlist of recommendations on the caller's Spotify account.
/// The [`SpotifyToken`] extractor rejects unauthenticated calls with 401
/// before anything is touched.
#[post("/api/playlist/create")]
pub async fn create_playlist(
    token: SpotifyToken,
    body: web::Json<CreatePlaylistRequest>,
    backend: web::Data<dyn RecommendationBackend>,
    opt: web::Data<Arc<Opt>>,
) -> Result<HttpResponse> {
    let body = body.into_inner();
    let limit = effective_limit(body.number_of_recs, &opt)?;

    let created = backend.create_playlist(&token.0, &body, limit).await?;

    Ok(HttpResponse::Created().json(created))
}
