use axum::{extract::State, routing::get, Json, Router};
use marquee_catalog::MovieListing;
use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/movies", get(list_movies))
}

async fn list_movies(State(state): State<AppState>) -> Result<Json<Vec<MovieListing>>, AppError> {
    Ok(Json(state.engine.list_movies().await?))
}
