use serde::Deserialize;
use validator::Validate;

use crate::models::cricket_match::{MatchStatus, Side, TossDecision};
use crate::models::innings::{Delivery, ExtrasType, WicketType};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateMatchRequest {
    #[validate(length(min = 1, max = 80, message = "Team name must be 1-80 characters"))]
    pub team_a: String,

    #[validate(length(min = 1, max = 80, message = "Team name must be 1-80 characters"))]
    pub team_b: String,

    #[validate(range(min = 1, max = 50, message = "Overs per innings must be between 1 and 50"))]
    pub overs_per_innings: u32,
}

#[derive(Debug, Deserialize)]
pub struct RecordTossRequest {
    pub winner: Side,
    pub decision: TossDecision,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: MatchStatus,
}

/// `winner: null` closes the match without a winner.
#[derive(Debug, Deserialize)]
pub struct UpdateWinnerRequest {
    #[serde(default)]
    pub winner: Option<Side>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePlayerRequest {
    #[validate(length(min = 1, max = 60, message = "Player name must be 1-60 characters"))]
    pub name: String,
    pub side: Side,
}

#[derive(Debug, Deserialize)]
pub struct StartInningsRequest {
    pub batting_side: Side,
    #[serde(default)]
    pub bowling_side: Option<Side>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct StartOverRequest {
    #[validate(range(min = 1, message = "Over numbers start at 1"))]
    pub over_number: u32,

    #[validate(length(min = 1, message = "Bowler is required"))]
    pub bowler_id: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RecordBallRequest {
    #[validate(length(min = 1, message = "Over is required"))]
    pub over_id: String,

    #[validate(length(min = 1, message = "Striker is required"))]
    pub striker_id: String,

    #[validate(length(min = 1, message = "Non-striker is required"))]
    pub non_striker_id: String,

    #[serde(default)]
    pub runs_off_bat: u32,
    #[serde(default)]
    pub extras_type: ExtrasType,
    #[serde(default)]
    pub extras_runs: u32,
    #[serde(default)]
    pub wicket_type: WicketType,
    #[serde(default)]
    pub dismissed_player_id: Option<String>,
    #[serde(default)]
    pub fielder_id: Option<String>,
    #[serde(default)]
    pub keeper_id: Option<String>,
}

impl RecordBallRequest {
    /// Splits the target over from the delivery itself.
    pub fn into_parts(self) -> (String, Delivery) {
        let delivery = Delivery {
            striker_id: self.striker_id,
            non_striker_id: self.non_striker_id,
            runs_off_bat: self.runs_off_bat,
            extras_type: self.extras_type,
            extras_runs: self.extras_runs,
            wicket_type: self.wicket_type,
            dismissed_player_id: self.dismissed_player_id,
            fielder_id: self.fielder_id,
            keeper_id: self.keeper_id,
        };
        (self.over_id, delivery)
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct RetireRequest {
    #[validate(length(min = 1, message = "Player is required"))]
    pub player_id: String,

    #[validate(length(min = 1, max = 120, message = "Reason must be 1-120 characters"))]
    pub reason: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateBowlerRequest {
    #[validate(length(min = 1, message = "Bowler is required"))]
    pub bowler_id: String,
}

#[derive(Debug, Deserialize)]
pub struct RecentBallsQuery {
    pub limit: Option<usize>,
}
