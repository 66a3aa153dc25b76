use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::{
    bson::doc,
    error::{ErrorKind, WriteFailure},
    options::IndexOptions,
    Collection, Database, IndexModel,
};

use crate::database::store::ScoringStore;
use crate::errors::Result;
use crate::models::{cricket_match::CricketMatch, innings::InningsRecord, player::Player};

const DUPLICATE_KEY: i32 = 11000;

pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub fn new(db: Database) -> Self {
        MongoStore { db }
    }

    fn matches(&self) -> Collection<CricketMatch> {
        self.db.collection("matches")
    }

    fn players(&self) -> Collection<Player> {
        self.db.collection("players")
    }

    fn innings(&self) -> Collection<InningsRecord> {
        self.db.collection("innings")
    }

    pub async fn ensure_indexes(&self) -> Result<()> {
        let unique = IndexOptions::builder().unique(true).build();

        self.innings()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "match_id": 1, "innings_number": 1 })
                    .options(unique.clone())
                    .build(),
            )
            .await?;
        self.innings()
            .create_index(IndexModel::builder().keys(doc! { "overs.id": 1 }).build())
            .await?;
        self.players()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "match_id": 1, "side": 1, "name_key": 1 })
                    .options(unique)
                    .build(),
            )
            .await?;

        tracing::info!("✅ Scoring indexes ensured");
        Ok(())
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == DUPLICATE_KEY
    )
}

#[async_trait]
impl ScoringStore for MongoStore {
    async fn ping(&self) -> Result<()> {
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }

    async fn insert_match(&self, record: &CricketMatch) -> Result<()> {
        self.matches().insert_one(record).await?;
        Ok(())
    }

    async fn get_match(&self, match_id: &str) -> Result<Option<CricketMatch>> {
        Ok(self.matches().find_one(doc! { "_id": match_id }).await?)
    }

    async fn replace_match(&self, record: &CricketMatch, expected_version: u64) -> Result<bool> {
        let filter = doc! { "_id": record.id.as_str(), "version": expected_version as i64 };
        let result = self.matches().replace_one(filter, record).await?;
        Ok(result.matched_count == 1)
    }

    async fn insert_player(&self, player: &Player) -> Result<bool> {
        match self.players().insert_one(player).await {
            Ok(_) => Ok(true),
            Err(e) if is_duplicate_key(&e) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn players_for_match(&self, match_id: &str) -> Result<Vec<Player>> {
        let cursor = self
            .players()
            .find(doc! { "match_id": match_id })
            .sort(doc! { "batting_order": 1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn insert_innings(&self, innings: &InningsRecord) -> Result<bool> {
        match self.innings().insert_one(innings).await {
            Ok(_) => Ok(true),
            Err(e) if is_duplicate_key(&e) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn get_innings(&self, innings_id: &str) -> Result<Option<InningsRecord>> {
        Ok(self.innings().find_one(doc! { "_id": innings_id }).await?)
    }

    async fn innings_for_match(&self, match_id: &str) -> Result<Vec<InningsRecord>> {
        let cursor = self
            .innings()
            .find(doc! { "match_id": match_id })
            .sort(doc! { "innings_number": 1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn innings_containing_over(&self, over_id: &str) -> Result<Option<InningsRecord>> {
        Ok(self.innings().find_one(doc! { "overs.id": over_id }).await?)
    }

    async fn replace_innings(&self, innings: &InningsRecord, expected_version: u64) -> Result<bool> {
        let filter = doc! { "_id": innings.id.as_str(), "version": expected_version as i64 };
        let result = self.innings().replace_one(filter, innings).await?;
        Ok(result.matched_count == 1)
    }
}
