use std::collections::HashMap;
use std::sync::Arc;
use std::sync::PoisonError;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use log::{info, warn};
use rand::seq::SliceRandom;

use crate::api::models::{PredictionEntry, PredictionsResponse, QuestionEntry, QuestionsResponse};
use crate::domain::{ItemId, Respondent};
use crate::prediction::classify;

use super::AppState;

/// Open a survey session: sample the items to ask the visitor and return
/// them with their prompt texts.
pub async fn get_questions(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let count = state.config.survey.questions_per_session;
    let items: Vec<ItemId> = {
        let mut rng = rand::thread_rng();
        state
            .engine
            .panel()
            .item_ids()
            .choose_multiple(&mut rng, count)
            .cloned()
            .collect()
    };

    let uid = state.mint_token();
    state
        .sessions
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(uid, items.clone());
    info!("Session {} opened, asking {:?}", uid, items);

    let questions = items
        .into_iter()
        .map(|item| QuestionEntry {
            prompt: state.engine.panel().prompt(&item).unwrap_or("").to_string(),
            item,
        })
        .collect();
    Json(QuestionsResponse { uid, questions }).into_response()
}

/// Predict a handful of unanswered items for a session, given the
/// visitor's answers as numbered query parameters ("0".."n", each 1-5).
pub async fn get_predictions(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let Some(uid) = params.get("uid").and_then(|v| v.parse::<u64>().ok()) else {
        return (StatusCode::BAD_REQUEST, "missing or invalid uid").into_response();
    };
    let session_items = state
        .sessions
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&uid)
        .cloned();
    let Some(session_items) = session_items else {
        return (StatusCode::NOT_FOUND, "unknown session").into_response();
    };

    // Fresh token per request, so the engine's similarity cache never
    // pairs this query respondent with a previous one's entries.
    let token = state.mint_token();
    let mut query = Respondent::session(token);
    for (index, item) in session_items.iter().enumerate() {
        let answer = params
            .get(&index.to_string())
            .and_then(|v| v.parse::<u8>().ok())
            .filter(|a| (1..=5).contains(a));
        let Some(answer) = answer else {
            return (
                StatusCode::BAD_REQUEST,
                format!("missing or invalid answer {index}"),
            )
                .into_response();
        };
        query.add_rating(item.clone(), answer);
    }

    let targets: Vec<ItemId> = {
        let mut rng = rand::thread_rng();
        let unanswered: Vec<&ItemId> = state
            .engine
            .panel()
            .item_ids()
            .iter()
            .filter(|item| !query.has_rating(item.as_str()))
            .collect();
        unanswered
            .choose_multiple(&mut rng, state.config.survey.predictions_per_session)
            .map(|item| (*item).clone())
            .collect()
    };

    let rho = state.config.prediction.rho;
    let mu = state.config.prediction.mu;
    let mut predictions = Vec::new();
    for item in targets {
        let prompt = state.engine.panel().prompt(&item).unwrap_or("").to_string();
        match state.engine.predict(&query, &item, rho, mu) {
            Ok(prediction) => predictions.push(PredictionEntry {
                item,
                prompt,
                prediction: Some(prediction.value),
                confidence: Some(prediction.confidence),
                norm: classify(prediction.value, prediction.confidence)
                    .as_str()
                    .to_string(),
            }),
            Err(e) => {
                warn!("No prediction for {}: {}", item, e);
                predictions.push(PredictionEntry {
                    item,
                    prompt,
                    prediction: None,
                    confidence: None,
                    norm: "unknown".to_string(),
                });
            }
        }
    }

    // The token is never minted again; leaving its entries behind would
    // grow the cache with every request. The session is done too.
    state.engine.forget_respondent(query.id());
    state
        .sessions
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .remove(&uid);

    Json(PredictionsResponse { uid, predictions }).into_response()
}
