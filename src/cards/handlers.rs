use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::{
    auth::jwt::AuthUser,
    cards::{
        dto::{CreateCardRequest, DeleteCardResponse},
        repo::{Card, NewCard},
        services,
    },
    error::ApiError,
    state::AppState,
};

pub fn card_routes() -> Router<AppState> {
    Router::new()
        .route("/cards", get(list_cards).post(create_card))
        // GET takes the public card id, DELETE the internal one
        .route("/cards/:id", get(get_card).delete(delete_card))
}

#[instrument(skip(state))]
pub async fn list_cards(State(state): State<AppState>) -> Result<Json<Vec<Card>>, ApiError> {
    let cards = Card::list_all(&state.db).await?;
    let cards = services::order_for_display(cards, &mut rand::thread_rng());
    Ok(Json(cards))
}

#[instrument(skip(state))]
pub async fn get_card(
    State(state): State<AppState>,
    Path(card_id): Path<String>,
) -> Result<Json<Card>, ApiError> {
    let card = Card::find_by_public_id(&state.db, &card_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Card not found"))?;
    Ok(Json(card))
}

#[instrument(skip(state, auth, payload))]
pub async fn create_card(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateCardRequest>,
) -> Result<(StatusCode, HeaderMap, Json<Card>), ApiError> {
    let new = NewCard {
        user_id: auth.0.sub,
        title: payload.title,
        description: payload.description,
        category: payload.category,
        image_url: payload.image_url.unwrap_or_default(),
        music_url: payload.music_url,
        music_file_url: payload.music_file_url,
    };

    let card = services::create_card(&state.db, new, payload.card_id).await?;

    let mut headers = HeaderMap::new();
    if let Ok(location) = format!("/cards/{}", card.card_id).parse() {
        headers.insert(axum::http::header::LOCATION, location);
    }

    Ok((StatusCode::CREATED, headers, Json(card)))
}

/// Idempotent: deleting an id that is absent, or owned by someone else,
/// is a no-op success. Blob cleanup afterwards is best-effort only.
#[instrument(skip(state, auth))]
pub async fn delete_card(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteCardResponse>, ApiError> {
    let card = Card::find_owned(&state.db, id, auth.0.sub).await?;

    if let Some(card) = card {
        Card::delete_owned(&state.db, id, auth.0.sub).await?;

        let mut blob_urls = vec![card.image_url];
        blob_urls.extend(card.music_file_url);
        for url in blob_urls {
            let Some(key) = state.storage.key_from_url(&url) else {
                continue;
            };
            if let Err(e) = state.storage.delete_object(key).await {
                warn!(error = %e, %key, "blob delete failed after card delete");
            }
        }
    }

    Ok(Json(DeleteCardResponse { success: true }))
}
