use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::handlers::innings;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/:innings_id", get(innings::get_innings))
        .route("/:innings_id/scorecard", get(innings::get_scorecard))
        .route("/:innings_id/overs", post(innings::start_over))
        .route("/:innings_id/balls", post(innings::record_ball))
        .route("/:innings_id/balls/last", delete(innings::delete_last_ball))
        .route("/:innings_id/balls/recent", get(innings::recent_balls))
        .route(
            "/:innings_id/retirements",
            get(innings::list_retirements).post(innings::retire_batsman),
        )
}
