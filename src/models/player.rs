use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::cricket_match::Side;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    #[serde(rename = "_id")]
    pub id: String,

    pub match_id: String,
    pub name: String,

    // Lowercased, trimmed name used to make on-demand creation idempotent
    pub name_key: String,

    pub side: Side,
    pub batting_order: u32,
    pub created_at: DateTime<Utc>,
}

impl Player {
    pub fn new(match_id: &str, name: &str, side: Side, batting_order: u32) -> Self {
        Player {
            id: Uuid::new_v4().to_string(),
            match_id: match_id.to_string(),
            name: name.trim().to_string(),
            name_key: Player::key_for(name),
            side,
            batting_order,
            created_at: Utc::now(),
        }
    }

    pub fn key_for(name: &str) -> String {
        name.trim().to_lowercase()
    }
}
