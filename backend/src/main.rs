use std::sync::Arc;

use actix_session::{storage::CookieSessionStore, SessionMiddleware};
use actix_web::{cookie::Key, middleware::Logger, web, App, HttpServer};
use clap::Parser;
use dotenv::dotenv;

use soundscout_srv::{
    recommend::{RecommendationBackend, SpotifyBackend},
    route,
    spotify::SpotifyClient,
    Opt,
};

#[actix_web::main]
async fn main() -> eyre::Result<()> {
    dotenv().ok();
    let opt = Arc::new(Opt::parse());
    env_logger::init();

    let client = SpotifyClient::new(
        &opt.spotify_api_url,
        &opt.spotify_accounts_url,
        &opt.spotify_client_id,
        &opt.spotify_client_secret,
    );
    let backend: Arc<dyn RecommendationBackend> = Arc::new(SpotifyBackend::new(client));

    let app = {
        let opt = Arc::clone(&opt);
        move || {
            let logger = Logger::default();
            let secret_key = Key::from(opt.cookie_secret_key.as_bytes());

            App::new()
                .wrap(logger)
                .wrap(SessionMiddleware::new(
                    CookieSessionStore::default(),
                    secret_key,
                ))
                .app_data(web::Data::new(Arc::clone(&opt)))
                .app_data(web::Data::from(Arc::clone(&backend)))
                .service(route::recommend::recommend)
                .service(route::recommend::batch_recommend)
                .service(route::playlist::create_playlist)
        }
    };

    log::info!("listening on {}:{}", opt.address, opt.port);

    HttpServer::new(app)
        .bind((opt.address.as_str(), opt.port))?
        .run()
        .await?;

    Ok(())
}
