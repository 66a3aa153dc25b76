use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use validator::Validate;

use crate::dtos::scoring_dtos::{
    RecentBallsQuery, RecordBallRequest, RetireRequest, StartOverRequest, UpdateBowlerRequest,
};
use crate::errors::Result;
use crate::models::innings::{BallOutcome, Over, Retirement};
use crate::models::views::{BallView, DeletedBall, InningsDetail, Scorecard};
use crate::models::ApiResponse;
use crate::state::AppState;

pub async fn get_innings(
    State(state): State<AppState>,
    Path(innings_id): Path<String>,
) -> Result<Json<ApiResponse<InningsDetail>>> {
    let detail = state.views.innings_detail(&innings_id).await?;
    Ok(Json(ApiResponse::ok(detail)))
}

pub async fn get_scorecard(
    State(state): State<AppState>,
    Path(innings_id): Path<String>,
) -> Result<Json<ApiResponse<Scorecard>>> {
    let scorecard = state.views.scorecard(&innings_id).await?;
    Ok(Json(ApiResponse::ok(scorecard)))
}

pub async fn start_over(
    State(state): State<AppState>,
    Path(innings_id): Path<String>,
    Json(payload): Json<StartOverRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Over>>)> {
    payload.validate()?;
    let over = state
        .innings
        .start_over(&innings_id, payload.over_number, &payload.bowler_id)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(over))))
}

pub async fn record_ball(
    State(state): State<AppState>,
    Path(innings_id): Path<String>,
    Json(payload): Json<RecordBallRequest>,
) -> Result<(StatusCode, Json<ApiResponse<BallOutcome>>)> {
    payload.validate()?;
    let (over_id, delivery) = payload.into_parts();
    let outcome = state.innings.record_ball(&innings_id, &over_id, delivery).await?;

    let message = if outcome.innings_completed {
        Some("Innings completed")
    } else if outcome.over_completed {
        Some("Over completed")
    } else {
        None
    };
    let body = match message {
        Some(message) => ApiResponse::with_message(outcome, message),
        None => ApiResponse::ok(outcome),
    };
    Ok((StatusCode::CREATED, Json(body)))
}

pub async fn delete_last_ball(
    State(state): State<AppState>,
    Path(innings_id): Path<String>,
) -> Result<Json<ApiResponse<DeletedBall>>> {
    let deleted = state.innings.delete_last_ball(&innings_id).await?;
    Ok(Json(ApiResponse::ok(deleted)))
}

pub async fn recent_balls(
    State(state): State<AppState>,
    Path(innings_id): Path<String>,
    Query(query): Query<RecentBallsQuery>,
) -> Result<Json<ApiResponse<Vec<BallView>>>> {
    let balls = state.views.recent_balls(&innings_id, query.limit).await?;
    Ok(Json(ApiResponse::ok(balls)))
}

pub async fn list_retirements(
    State(state): State<AppState>,
    Path(innings_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<Retirement>>>> {
    let retirements = state.views.retirements(&innings_id).await?;
    Ok(Json(ApiResponse::ok(retirements)))
}

pub async fn retire_batsman(
    State(state): State<AppState>,
    Path(innings_id): Path<String>,
    Json(payload): Json<RetireRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Retirement>>)> {
    payload.validate()?;
    let retirement = state
        .innings
        .retire_batsman(&innings_id, &payload.player_id, &payload.reason)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(retirement))))
}

pub async fn update_over_bowler(
    State(state): State<AppState>,
    Path(over_id): Path<String>,
    Json(payload): Json<UpdateBowlerRequest>,
) -> Result<Json<ApiResponse<Over>>> {
    payload.validate()?;
    let over = state.innings.update_over_bowler(&over_id, &payload.bowler_id).await?;
    Ok(Json(ApiResponse::ok(over)))
}
