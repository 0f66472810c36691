pub mod error;
pub mod recommend;
pub mod route;
pub mod spotify;

use clap::Parser;

#[derive(Parser)]
pub struct Opt {
    /// Address to bind to.
    #[clap(short, long, env = "BIND_ADDRESS", default_value = "0.0.0.0")]
    pub address: String,

    /// Port to bind to.
    #[clap(short, long, env = "BIND_PORT", default_value = "8080")]
    pub port: u16,

    /// Client ID of the Spotify application.
    #[clap(long, env = "SPOTIFY_CLIENT_ID")]
    pub spotify_client_id: String,

    /// Client secret of the Spotify application.
    #[clap(long, env = "SPOTIFY_CLIENT_SECRET")]
    pub spotify_client_secret: String,

    /// Base URL of the Spotify Web API.
    #[clap(
        long,
        env = "SPOTIFY_API_URL",
        default_value = "https://api.spotify.com"
    )]
    pub spotify_api_url: String,

    /// Base URL of the Spotify accounts service.
    #[clap(
        long,
        env = "SPOTIFY_ACCOUNTS_URL",
        default_value = "https://accounts.spotify.com"
    )]
    pub spotify_accounts_url: String,

    /// How many tracks to recommend when a request doesn't say.
    #[clap(long, env = "DEFAULT_RECOMMENDATION_COUNT", default_value = "10")]
    pub default_recommendation_count: usize,

    /// The secret key to use when encrypting cookies
    #[clap(long, env = "COOKIE_SECRET_KEY")]
    pub cookie_secret_key: String,
}
