use std::sync::Arc;

use actix_web::{
    get, post,
    web::{self, Json},
};
use serde::Deserialize;
use soundscout_lib::{BatchEntry, BatchRecommendRequest, ErrorBody, Recommendations};

use crate::error::{Error, Result};
use crate::recommend::RecommendationBackend;
use crate::route::effective_limit;
use crate::Opt;

#[derive(Deserialize)]
pub struct RecommendParams {
    playlist_url: Option<String>,
    number_of_recs: Option<usize>,
}

/// Recommend tracks for a single playlist.
#[get("/api/recommend")]
pub async fn recommend(
    params: web::Query<RecommendParams>,
    backend: web::Data<dyn RecommendationBackend>,
    opt: web::Data<Arc<Opt>>,
) -> Result<Json<Recommendations>> {
    let params = params.into_inner();

    let playlist_url = params
        .playlist_url
        .ok_or(Error::MissingParameter("playlist_url"))?;
    let limit = effective_limit(params.number_of_recs, &opt)?;

    let recommendations = backend.recommend(&playlist_url, limit).await?;

    Ok(Json(Recommendations { recommendations }))
}

/// Recommend tracks for several playlists in one call. Each URL is
/// handled on its own; a bad URL puts an error body at its slot instead
/// of failing the request.
#[post("/api/batch_recommend")]
pub async fn batch_recommend(
    body: Json<BatchRecommendRequest>,
    backend: web::Data<dyn RecommendationBackend>,
    opt: web::Data<Arc<Opt>>,
) -> Result<Json<Vec<BatchEntry>>> {
    let body = body.into_inner();

    if body.playlist_urls.is_empty() {
        return Err(Error::EmptyBatch);
    }
    let limit = effective_limit(body.number_of_recs, &opt)?;

    let mut entries = Vec::with_capacity(body.playlist_urls.len());
    for playlist_url in &body.playlist_urls {
        let entry = match backend.recommend(playlist_url, limit).await {
            Ok(recommendations) => BatchEntry::Recommendations(Recommendations { recommendations }),
            Err(e) => {
                log::warn!("batch item failed for {playlist_url:?}: {e}");
                BatchEntry::Error(ErrorBody {
                    error: e.public_message(),
                })
            }
        };
        entries.push(entry);
    }

    Ok(Json(entries))
}
