use std::sync::Arc;

use actix_session::{storage::CookieSessionStore, Session, SessionMiddleware};
use actix_web::{cookie::Key, http::StatusCode, test, web, App, HttpResponse};
use async_trait::async_trait;
use serde_json::{json, Value};
use soundscout_lib::{CreatePlaylistRequest, CreatedPlaylist, RecommendedTrack};
use soundscout_srv::{
    error::{Error, Result},
    recommend::RecommendationBackend,
    route,
    spotify::parse_playlist_id,
    Opt,
};

const VALID_URL: &str =
    "https://open.spotify.com/playlist/0L8R5SEpmdZLuYAz5WXf4n?si=4b7c01a91d1d4f1f";
const OTHER_VALID_URL: &str =
    "https://open.spotify.com/playlist/7cKhUkOOqRWgmLmVTFL462?si=a124c9a59dbd4b8c";
const MALFORMED_URL: &str = "https://open.spotify.com/playlist/INVALID";
// Well-formed id that the stub treats as unknown to Spotify.
const UNKNOWN_URL: &str = "https://open.spotify.com/playlist/zzzzzzzzzzzzzzzzzzzzzz";

/// Stands in for the Spotify-backed implementation. Knows the two test
/// playlists and can produce up to eight recommendations for them.
struct StubBackend;

impl StubBackend {
    const KNOWN_IDS: [&'static str; 2] = ["0L8R5SEpmdZLuYAz5WXf4n", "7cKhUkOOqRWgmLmVTFL462"];
    const REJECTED_TOKEN: &'static str = "expired-token";
}

#[async_trait]
impl RecommendationBackend for StubBackend {
    async fn recommend(&self, playlist_url: &str, limit: usize) -> Result<Vec<RecommendedTrack>> {
        let id = parse_playlist_id(playlist_url).ok_or_else(|| {
            Error::BadRequest(format!("not a Spotify playlist URL: {playlist_url}"))
        })?;

        if !Self::KNOWN_IDS.iter().any(|known| *known == id) {
            return Err(Error::PlaylistNotFound(id.to_string()));
        }

        Ok((0..limit.min(8))
            .map(|i| RecommendedTrack {
                id: format!("track{i}"),
                name: format!("Track {i}"),
                artists: vec!["Artist".to_string()],
                uri: format!("spotify:track:track{i}"),
            })
            .collect())
    }

    async fn create_playlist(
        &self,
        user_token: &str,
        request: &CreatePlaylistRequest,
        limit: usize,
    ) -> Result<CreatedPlaylist> {
        if user_token == Self::REJECTED_TOKEN {
            return Err(Error::TokenRejected);
        }

        let added_tracks = self.recommend(&request.playlist_url, limit).await?.len();

        // Echo the token into the id so tests can tell which source won.
        Ok(CreatedPlaylist {
            playlist_id: format!("playlist-for-{user_token}"),
            playlist_url: "https://open.spotify.com/playlist/newplaylist".to_string(),
            added_tracks,
        })
    }
}

/// Puts a token into the cookie session, standing in for whatever flow
/// the caller used to obtain one.
async fn seed_session(session: Session) -> HttpResponse {
    session
        .insert(route::auth::SPOTIFY_TOKEN_SESSION_KEY, "session-token")
        .expect("failed to insert token into session");

    HttpResponse::Ok().finish()
}

fn test_opt() -> Arc<Opt> {
    Arc::new(Opt {
        address: "0.0.0.0".to_string(),
        port: 0,
        spotify_client_id: "client".to_string(),
        spotify_client_secret: "secret".to_string(),
        spotify_api_url: "https://api.spotify.invalid".to_string(),
        spotify_accounts_url: "https://accounts.spotify.invalid".to_string(),
        default_recommendation_count: 10,
        cookie_secret_key: "0".repeat(64),
    })
}

macro_rules! spawn_app {
    () => {{
        let opt = test_opt();
        let secret_key = Key::from(opt.cookie_secret_key.as_bytes());

        test::init_service(
            App::new()
                .wrap(SessionMiddleware::new(
                    CookieSessionStore::default(),
                    secret_key,
                ))
                .app_data(web::Data::new(Arc::clone(&opt)))
                .app_data(web::Data::from(
                    Arc::new(StubBackend) as Arc<dyn RecommendationBackend>
                ))
                .service(route::recommend::recommend)
                .service(route::recommend::batch_recommend)
                .service(route::playlist::create_playlist)
                .route("/test/session", web::get().to(seed_session)),
        )
        .await
    }};
}

/// Hit the session-seeding route and hand back the session cookie.
macro_rules! session_cookie {
    ($app:expr) => {{
        let req = test::TestRequest::get().uri("/test/session").to_request();
        let resp = test::call_service($app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        resp.response()
            .cookies()
            .next()
            .expect("session cookie was not set")
            .into_owned()
    }};
}

#[actix_web::test]
async fn recommend_with_valid_playlist() {
    let app = spawn_app!();

    let req = test::TestRequest::get()
        .uri(&format!("/api/recommend?playlist_url={VALID_URL}"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert!(body.get("recommendations").is_some());
}

#[actix_web::test]
async fn recommend_with_malformed_playlist_url() {
    let app = spawn_app!();

    let req = test::TestRequest::get()
        .uri(&format!("/api/recommend?playlist_url={MALFORMED_URL}"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_ne!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert!(body.get("error").is_some());
}

#[actix_web::test]
async fn recommend_with_unknown_playlist() {
    let app = spawn_app!();

    let req = test::TestRequest::get()
        .uri(&format!("/api/recommend?playlist_url={UNKNOWN_URL}"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn recommend_without_playlist() {
    let app = spawn_app!();

    let req = test::TestRequest::get().uri("/api/recommend").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "playlist_url parameter is required");
}

#[actix_web::test]
async fn recommend_rejects_zero_cap() {
    let app = spawn_app!();

    let req = test::TestRequest::get()
        .uri(&format!(
            "/api/recommend?playlist_url={VALID_URL}&number_of_recs=0"
        ))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn recommend_honours_number_of_recs() {
    let app = spawn_app!();

    let req = test::TestRequest::get()
        .uri(&format!(
            "/api/recommend?playlist_url={VALID_URL}&number_of_recs=3"
        ))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["recommendations"].as_array().unwrap().len() <= 3);
}

#[actix_web::test]
async fn batch_recommend_with_valid_urls() {
    let app = spawn_app!();

    let req = test::TestRequest::post()
        .uri("/api/batch_recommend")
        .set_json(json!({
            "playlist_urls": [VALID_URL, OTHER_VALID_URL],
            "number_of_recs": 5,
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    for entry in entries {
        assert!(entry["recommendations"].as_array().unwrap().len() <= 5);
    }
}

#[actix_web::test]
async fn batch_recommend_with_some_invalid_urls() {
    let app = spawn_app!();

    let req = test::TestRequest::post()
        .uri("/api/batch_recommend")
        .set_json(json!({
            "playlist_urls": [VALID_URL, MALFORMED_URL],
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries[0].get("recommendations").is_some());
    assert!(entries[1].get("error").is_some());
}

#[actix_web::test]
async fn batch_recommend_preserves_input_order() {
    let app = spawn_app!();

    let req = test::TestRequest::post()
        .uri("/api/batch_recommend")
        .set_json(json!({
            "playlist_urls": [UNKNOWN_URL, VALID_URL],
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    let entries = body.as_array().unwrap();
    assert!(entries[0].get("error").is_some());
    assert!(entries[1].get("recommendations").is_some());
}

#[actix_web::test]
async fn batch_recommend_without_urls() {
    let app = spawn_app!();

    let req = test::TestRequest::post()
        .uri("/api/batch_recommend")
        .set_json(json!({ "playlist_urls": [] }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn batch_recommend_with_specified_number_of_recs() {
    let app = spawn_app!();

    let req = test::TestRequest::post()
        .uri("/api/batch_recommend")
        .set_json(json!({
            "playlist_urls": [VALID_URL],
            "number_of_recs": 3,
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    for entry in body.as_array().unwrap() {
        assert!(entry["recommendations"].as_array().unwrap().len() <= 3);
    }
}

#[actix_web::test]
async fn create_playlist_without_token() {
    let app = spawn_app!();

    let req = test::TestRequest::post()
        .uri("/api/playlist/create")
        .set_json(json!({ "playlist_url": VALID_URL }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("Spotify token is required"));
}

#[actix_web::test]
async fn create_playlist_with_bearer_token() {
    let app = spawn_app!();

    let req = test::TestRequest::post()
        .uri("/api/playlist/create")
        .insert_header(("Authorization", "Bearer user-token"))
        .set_json(json!({ "playlist_url": VALID_URL }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["playlist_id"], "playlist-for-user-token");
    assert!(body["added_tracks"].as_u64().unwrap() > 0);
}

#[actix_web::test]
async fn create_playlist_with_session_token() {
    let app = spawn_app!();
    let cookie = session_cookie!(&app);

    let req = test::TestRequest::post()
        .uri("/api/playlist/create")
        .cookie(cookie)
        .set_json(json!({ "playlist_url": VALID_URL }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["playlist_id"], "playlist-for-session-token");
}

#[actix_web::test]
async fn bearer_header_wins_over_session_token() {
    let app = spawn_app!();
    let cookie = session_cookie!(&app);

    let req = test::TestRequest::post()
        .uri("/api/playlist/create")
        .cookie(cookie)
        .insert_header(("Authorization", "Bearer header-token"))
        .set_json(json!({ "playlist_url": VALID_URL }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["playlist_id"], "playlist-for-header-token");
}

#[actix_web::test]
async fn create_playlist_with_rejected_token() {
    let app = spawn_app!();

    let req = test::TestRequest::post()
        .uri("/api/playlist/create")
        .insert_header(("Authorization", "Bearer expired-token"))
        .set_json(json!({ "playlist_url": VALID_URL }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Spotify token was rejected");
}
