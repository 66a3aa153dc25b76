use axum::{routing::put, Router};

use crate::handlers::innings;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/:over_id/bowler", put(innings::update_over_bowler))
}
