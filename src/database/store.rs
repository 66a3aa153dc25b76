use async_trait::async_trait;

use crate::errors::Result;
use crate::models::{cricket_match::CricketMatch, innings::InningsRecord, player::Player};

/// Persistence seam for the scoring engine.
///
/// Each innings is one document holding its overs, balls and retirements, so
/// a single version-conditional replace is an atomic mutation.
#[async_trait]
pub trait ScoringStore: Send + Sync {
    async fn ping(&self) -> Result<()>;

    async fn insert_match(&self, record: &CricketMatch) -> Result<()>;
    async fn get_match(&self, match_id: &str) -> Result<Option<CricketMatch>>;

    /// Replaces the match only if its stored version is `expected_version`.
    async fn replace_match(&self, record: &CricketMatch, expected_version: u64) -> Result<bool>;

    /// Returns false when a player with the same name already exists on that side.
    async fn insert_player(&self, player: &Player) -> Result<bool>;
    async fn players_for_match(&self, match_id: &str) -> Result<Vec<Player>>;

    /// Returns false when the match already has an innings with that number.
    async fn insert_innings(&self, innings: &InningsRecord) -> Result<bool>;
    async fn get_innings(&self, innings_id: &str) -> Result<Option<InningsRecord>>;

    /// Innings of a match ordered by innings number.
    async fn innings_for_match(&self, match_id: &str) -> Result<Vec<InningsRecord>>;
    async fn innings_containing_over(&self, over_id: &str) -> Result<Option<InningsRecord>>;

    /// Replaces the innings only if its stored version is `expected_version`.
    async fn replace_innings(&self, innings: &InningsRecord, expected_version: u64) -> Result<bool>;
}
