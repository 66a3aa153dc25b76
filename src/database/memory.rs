use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::database::store::ScoringStore;
use crate::errors::Result;
use crate::models::{cricket_match::CricketMatch, innings::InningsRecord, player::Player};

#[derive(Default)]
struct Tables {
    matches: HashMap<String, CricketMatch>,
    players: Vec<Player>,
    innings: HashMap<String, InningsRecord>,
}

/// Process-local store used by tests and when no database is configured.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ScoringStore for MemoryStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn insert_match(&self, record: &CricketMatch) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.matches.insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn get_match(&self, match_id: &str) -> Result<Option<CricketMatch>> {
        Ok(self.tables.read().await.matches.get(match_id).cloned())
    }

    async fn replace_match(&self, record: &CricketMatch, expected_version: u64) -> Result<bool> {
        let mut tables = self.tables.write().await;
        match tables.matches.get_mut(&record.id) {
            Some(stored) if stored.version == expected_version => {
                *stored = record.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn insert_player(&self, player: &Player) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let duplicate = tables.players.iter().any(|p| {
            p.match_id == player.match_id && p.side == player.side && p.name_key == player.name_key
        });
        if duplicate {
            return Ok(false);
        }
        tables.players.push(player.clone());
        Ok(true)
    }

    async fn players_for_match(&self, match_id: &str) -> Result<Vec<Player>> {
        let tables = self.tables.read().await;
        Ok(tables
            .players
            .iter()
            .filter(|p| p.match_id == match_id)
            .cloned()
            .collect())
    }

    async fn insert_innings(&self, innings: &InningsRecord) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let taken = tables.innings.values().any(|i| {
            i.id == innings.id
                || (i.match_id == innings.match_id && i.innings_number == innings.innings_number)
        });
        if taken {
            return Ok(false);
        }
        tables.innings.insert(innings.id.clone(), innings.clone());
        Ok(true)
    }

    async fn get_innings(&self, innings_id: &str) -> Result<Option<InningsRecord>> {
        Ok(self.tables.read().await.innings.get(innings_id).cloned())
    }

    async fn innings_for_match(&self, match_id: &str) -> Result<Vec<InningsRecord>> {
        let tables = self.tables.read().await;
        let mut innings: Vec<InningsRecord> = tables
            .innings
            .values()
            .filter(|i| i.match_id == match_id)
            .cloned()
            .collect();
        innings.sort_by_key(|i| i.innings_number);
        Ok(innings)
    }

    async fn innings_containing_over(&self, over_id: &str) -> Result<Option<InningsRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .innings
            .values()
            .find(|i| i.overs.iter().any(|o| o.id == over_id))
            .cloned())
    }

    async fn replace_innings(&self, innings: &InningsRecord, expected_version: u64) -> Result<bool> {
        let mut tables = self.tables.write().await;
        match tables.innings.get_mut(&innings.id) {
            Some(stored) if stored.version == expected_version => {
                *stored = innings.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
