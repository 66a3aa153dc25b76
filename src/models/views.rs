// Read-side shapes returned to spectators and the scorer UI
use serde::Serialize;

use crate::models::cricket_match::{ChaseState, CricketMatch, MatchResult, Side};
use crate::models::innings::{
    Ball, ExtrasType, InningsRecord, InningsStatus, Over, Retirement, WicketType,
};
use crate::services::stats::{BattingFigures, BowlingFigures, ExtrasBreakdown, FallOfWicket};

#[derive(Debug, Clone, Serialize)]
pub struct InningsSummary {
    pub id: String,
    pub match_id: String,
    pub innings_number: u32,
    pub status: InningsStatus,
    pub batting_side: Side,
    pub batting_team: String,
    pub bowling_side: Side,
    pub bowling_team: String,
    pub total_runs: u32,
    pub wickets: u32,
    pub balls_bowled: u32,
    pub overs: String,
    pub overs_per_innings: u32,
    pub score: String,
    pub run_rate: String,
    pub current_over_number: u32,
    pub current_over_id: Option<String>,
    pub current_bowler_id: Option<String>,
    pub striker_id: Option<String>,
    pub non_striker_id: Option<String>,
    pub is_free_hit: bool,
    pub target: Option<u32>,
    pub chase: Option<ChaseState>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BallView {
    pub id: String,
    pub sequence: u32,
    pub over_id: String,
    pub over_number: u32,
    pub ball_number: u32,
    pub bowler_id: String,
    pub striker_id: String,
    pub non_striker_id: String,
    pub runs_off_bat: u32,
    pub extras_type: ExtrasType,
    pub extras_runs: u32,
    pub total_runs: u32,
    pub wicket_type: WicketType,
    pub dismissed_player_id: Option<String>,
    pub is_free_hit: bool,
    pub display_token: String,
}

/// A scorecard over: every contiguous segment sharing one over number.
#[derive(Debug, Clone, Serialize)]
pub struct ScorecardOver {
    pub over_number: u32,
    pub segment_ids: Vec<String>,
    pub bowler_ids: Vec<String>,
    pub legal_balls: u32,
    pub runs: u32,
    pub wickets: u32,
    pub is_complete: bool,
    pub tokens: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InningsDetail {
    pub summary: InningsSummary,
    pub overs: Vec<Over>,
    pub scorecard_overs: Vec<ScorecardOver>,
    pub retirements: Vec<Retirement>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Scorecard {
    pub summary: InningsSummary,
    pub batting: Vec<BattingFigures>,
    pub bowling: Vec<BowlingFigures>,
    pub extras: ExtrasBreakdown,
    pub fall_of_wickets: Vec<FallOfWicket>,
    pub yet_to_bat: Vec<String>,
    pub retirements: Vec<Retirement>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchSummary {
    #[serde(rename = "match")]
    pub fixture: CricketMatch,
    pub innings: Vec<InningsSummary>,
    pub current_innings_id: Option<String>,
    pub chase: Option<ChaseState>,
    pub projected_result: Option<MatchResult>,
    pub result_text: Option<String>,
    pub winner: Option<Side>,
    pub winner_team: Option<String>,
}

/// Undo response: the removed delivery and the totals it leaves behind.
#[derive(Debug, Clone, Serialize)]
pub struct DeletedBall {
    pub ball: Ball,
    pub total_runs: u32,
    pub wickets: u32,
    pub balls_bowled: u32,
    pub overs: String,
    pub is_completed: bool,
    pub is_free_hit: bool,
}

impl DeletedBall {
    pub fn new(ball: Ball, innings: &InningsRecord) -> Self {
        DeletedBall {
            ball,
            total_runs: innings.total_runs,
            wickets: innings.wickets,
            balls_bowled: innings.balls_bowled,
            overs: innings.overs_display(),
            is_completed: innings.is_completed,
            is_free_hit: innings.is_free_hit(),
        }
    }
}
