use axum::{
    routing::{get, post, put},
    Router,
};

use crate::handlers::matches;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(matches::create_match))
        .route("/:match_id", get(matches::get_match))
        .route("/:match_id/toss", put(matches::record_toss))
        .route("/:match_id/status", put(matches::update_status))
        .route("/:match_id/winner", put(matches::update_winner))
        .route("/:match_id/players", get(matches::list_players).post(matches::add_player))
        .route("/:match_id/innings", get(matches::list_innings).post(matches::start_innings))
        .route("/:match_id/innings/current", get(matches::current_innings))
}
