/// Rotas do histórico de ações (lista, desfazer, refazer, limpar) e feed de toasts
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::Json,
};
use historico::{HistorySummary, NavigationOutcome, Notification};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::utils::logging::*;
use crate::AppState;

const DEFAULT_RECENT_LIMIT: usize = 20;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> Json<HistorySummary> {
    log_request_received("/historico", "GET");
    let limit = query.limit.unwrap_or(DEFAULT_RECENT_LIMIT);
    Json(state.history.summary(limit).await)
}

pub async fn undo(State(state): State<Arc<AppState>>) -> Json<Value> {
    log_request_received("/historico/desfazer", "POST");
    let outcome = state.history.undo().await;
    navigation_response(&state, outcome).await
}

pub async fn redo(State(state): State<Arc<AppState>>) -> Json<Value> {
    log_request_received("/historico/refazer", "POST");
    let outcome = state.history.redo().await;
    navigation_response(&state, outcome).await
}

pub async fn clear_history(State(state): State<Arc<AppState>>) -> Json<Value> {
    log_request_received("/historico", "DELETE");
    state.history.clear_history().await;
    Json(json!({ "success": true }))
}

/// Entrega e esvazia os toasts pendentes
pub async fn drain_notifications(State(state): State<Arc<AppState>>) -> Json<Vec<Notification>> {
    Json(state.notifications.drain())
}

async fn navigation_response(state: &AppState, outcome: NavigationOutcome) -> Json<Value> {
    Json(json!({
        "outcome": outcome,
        "can_undo": state.history.can_undo().await,
        "can_redo": state.history.can_redo().await,
    }))
}
