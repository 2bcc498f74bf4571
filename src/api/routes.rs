use std::sync::Arc;

use axum::{Router, routing::get};

use crate::api::handlers::{
    AppState,
    survey::{get_predictions, get_questions},
};

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/questions", get(get_questions))
        .route("/predict", get(get_predictions))
        .with_state(state)
}
