use serde::{Deserialize, Serialize};

/// Request body for `POST /cards`. The owner comes from the bearer token,
/// never from the body.
#[derive(Debug, Deserialize)]
pub struct CreateCardRequest {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub music_url: Option<String>,
    #[serde(default)]
    pub music_file_url: Option<String>,
    /// Optional client-chosen public identifier; generated when absent.
    #[serde(default)]
    pub card_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeleteCardResponse {
    pub success: bool,
}
