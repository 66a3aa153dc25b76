use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use validator::Validate;

use crate::dtos::scoring_dtos::{
    CreateMatchRequest, CreatePlayerRequest, RecordTossRequest, StartInningsRequest,
    UpdateStatusRequest, UpdateWinnerRequest,
};
use crate::errors::Result;
use crate::models::cricket_match::CricketMatch;
use crate::models::player::Player;
use crate::models::views::{InningsSummary, MatchSummary};
use crate::models::ApiResponse;
use crate::services::read_models;
use crate::state::AppState;

pub async fn create_match(
    State(state): State<AppState>,
    Json(payload): Json<CreateMatchRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CricketMatch>>)> {
    tracing::debug!("POST /api/matches: {} vs {}", payload.team_a, payload.team_b);
    payload.validate()?;

    let record = state
        .matches
        .create_match(&payload.team_a, &payload.team_b, payload.overs_per_innings)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(record))))
}

pub async fn get_match(
    State(state): State<AppState>,
    Path(match_id): Path<String>,
) -> Result<Json<ApiResponse<MatchSummary>>> {
    let summary = state.views.match_summary(&match_id).await?;
    Ok(Json(ApiResponse::ok(summary)))
}

pub async fn record_toss(
    State(state): State<AppState>,
    Path(match_id): Path<String>,
    Json(payload): Json<RecordTossRequest>,
) -> Result<Json<ApiResponse<CricketMatch>>> {
    let record = state
        .matches
        .record_toss(&match_id, payload.winner, payload.decision)
        .await?;
    Ok(Json(ApiResponse::ok(record)))
}

pub async fn update_status(
    State(state): State<AppState>,
    Path(match_id): Path<String>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<ApiResponse<CricketMatch>>> {
    let record = state.matches.update_match_status(&match_id, payload.status).await?;
    Ok(Json(ApiResponse::ok(record)))
}

pub async fn update_winner(
    State(state): State<AppState>,
    Path(match_id): Path<String>,
    Json(payload): Json<UpdateWinnerRequest>,
) -> Result<Json<ApiResponse<CricketMatch>>> {
    let record = state.matches.update_match_winner(&match_id, payload.winner).await?;
    let message = match record.winner {
        Some(side) => format!("{} won", record.team_name(side)),
        None => "Match closed without a winner".to_string(),
    };
    Ok(Json(ApiResponse::with_message(record, message)))
}

pub async fn list_players(
    State(state): State<AppState>,
    Path(match_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<Player>>>> {
    let players = state.matches.list_players(&match_id).await?;
    Ok(Json(ApiResponse::ok(players)))
}

pub async fn add_player(
    State(state): State<AppState>,
    Path(match_id): Path<String>,
    Json(payload): Json<CreatePlayerRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Player>>)> {
    payload.validate()?;
    let player = state.matches.ensure_player(&match_id, &payload.name, payload.side).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(player))))
}

pub async fn list_innings(
    State(state): State<AppState>,
    Path(match_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<InningsSummary>>>> {
    let innings = state.views.all_innings(&match_id).await?;
    Ok(Json(ApiResponse::ok(innings)))
}

pub async fn start_innings(
    State(state): State<AppState>,
    Path(match_id): Path<String>,
    Json(payload): Json<StartInningsRequest>,
) -> Result<(StatusCode, Json<ApiResponse<InningsSummary>>)> {
    let innings = state
        .innings
        .start_innings(&match_id, payload.batting_side, payload.bowling_side)
        .await?;
    let record = state.matches.load_match(&match_id).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(read_models::summarize(&record, &innings)))))
}

/// `data` is null between innings and after the match.
pub async fn current_innings(
    State(state): State<AppState>,
    Path(match_id): Path<String>,
) -> Result<Json<ApiResponse<Option<InningsSummary>>>> {
    let innings = state.views.current_innings(&match_id).await?;
    Ok(Json(ApiResponse::ok(innings)))
}
