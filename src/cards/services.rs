use rand::{seq::SliceRandom, Rng};
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::cards::repo::{Card, NewCard};
use crate::error::ApiError;

/// How many of the newest cards stay pinned at the top of the feed.
pub const PINNED_RECENT: usize = 3;

const CARD_ID_LEN: usize = 6;
const CARD_ID_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const MAX_ID_ATTEMPTS: usize = 3;

/// Short public identifier: 6 characters drawn uniformly from `[0-9A-Z]`.
pub fn generate_card_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..CARD_ID_LEN)
        .map(|_| CARD_ID_ALPHABET[rng.gen_range(0..CARD_ID_ALPHABET.len())] as char)
        .collect()
}

pub fn is_valid_card_id(s: &str) -> bool {
    s.len() == CARD_ID_LEN && s.bytes().all(|b| b.is_ascii_digit() || b.is_ascii_uppercase())
}

/// Display ordering for the feed: the input must already be newest-first.
/// The newest `PINNED_RECENT` cards keep their position; everything after
/// them is shuffled (Fisher-Yates) so returning visitors see variety.
pub fn order_for_display<R: Rng + ?Sized>(mut cards: Vec<Card>, rng: &mut R) -> Vec<Card> {
    if cards.len() > PINNED_RECENT {
        cards[PINNED_RECENT..].shuffle(rng);
    }
    cards
}

/// Persist a new card, assigning a public identifier.
///
/// A client-supplied identifier is used as-is (after a format check) and a
/// collision is the client's problem; a generated identifier is retried a
/// few times against the uniqueness constraint.
pub async fn create_card(
    db: &PgPool,
    new: NewCard,
    requested_card_id: Option<String>,
) -> Result<Card, ApiError> {
    if new.user_id == Uuid::nil() {
        return Err(ApiError::validation("User ID is required"));
    }
    if new.image_url.is_empty() {
        return Err(ApiError::validation("Image URL is required"));
    }
    if let Some(id) = &requested_card_id {
        if !is_valid_card_id(id) {
            return Err(ApiError::validation(
                "Card ID must be 6 characters from 0-9 and A-Z",
            ));
        }
    }

    let client_supplied = requested_card_id.is_some();
    let mut attempts = 0;
    loop {
        let card_id = match &requested_card_id {
            Some(id) => id.clone(),
            None => generate_card_id(&mut rand::thread_rng()),
        };

        match Card::insert(db, &new, &card_id).await {
            Ok(card) => {
                info!(card_id = %card.card_id, user_id = %card.user_id, "card created");
                return Ok(card);
            }
            Err(e) if is_card_id_conflict(&e) => {
                if client_supplied {
                    return Err(ApiError::conflict("Card ID already in use"));
                }
                attempts += 1;
                warn!(%card_id, attempts, "generated card id collided, retrying");
                if attempts >= MAX_ID_ATTEMPTS {
                    return Err(ApiError::Database(e));
                }
            }
            Err(e) => return Err(e.into()),
        }
    }
}

fn is_card_id_conflict(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db) => {
            db.is_unique_violation() && db.constraint() == Some("cards_card_id_key")
        }
        _ => false,
    }
}
