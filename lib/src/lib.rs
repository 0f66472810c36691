use serde::{Deserialize, Serialize};

/// A single track suggested for a playlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendedTrack {
    pub id: String,
    pub name: String,
    pub artists: Vec<String>,
    pub uri: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendations {
    pub recommendations: Vec<RecommendedTrack>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRecommendRequest {
    pub playlist_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_recs: Option<usize>,
}

/// One slot of a batch response. Slots line up with the input URLs; a
/// failed URL turns into an error body without affecting its neighbours.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BatchEntry {
    Recommendations(Recommendations),
    Error(ErrorBody),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePlaylistRequest {
    pub playlist_url: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub public: Option<bool>,
    #[serde(default)]
    pub number_of_recs: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedPlaylist {
    pub playlist_id: String,
    pub playlist_url: String,
    pub added_tracks: usize,
}
