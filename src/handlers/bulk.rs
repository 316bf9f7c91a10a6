/// Rotas de operações em massa, genéricas sobre o grupo de entidades
///
/// O front-end envia as entidades selecionadas como estão na tabela; o estado
/// anterior usado para desfazer é capturado a partir delas.
use std::sync::Arc;

use axum::{extract::State, response::Json};
use chrono::NaiveDate;
use historico::{HistoryEntry, OperationKind};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::models::BulkEntity;
use crate::services::bulk::{BulkOperationOrchestrator, BulkResult, RunState};
use crate::utils::logging::*;
use crate::utils::AppResult;
use crate::AppState;

/// Estado que expõe o orquestrador de um tipo de entidade
pub trait OrchestratorFor<E> {
    fn orchestrator(&self) -> &BulkOperationOrchestrator<E>;
}

#[derive(Debug, Deserialize)]
pub struct SelectionRequest<E> {
    pub selecionados: Vec<E>,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest<E> {
    pub selecionados: Vec<E>,
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct TagsRequest<E> {
    pub selecionados: Vec<E>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct OwnerRequest<E> {
    pub selecionados: Vec<E>,
    #[serde(default)]
    pub responsavel: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeadlineRequest<E> {
    pub selecionados: Vec<E>,
    #[serde(default)]
    pub prazo: Option<NaiveDate>,
}

pub async fn bulk_status<E>(
    State(state): State<Arc<AppState>>,
    Json(body): Json<StatusRequest<E>>,
) -> AppResult<Json<HistoryEntry>>
where
    E: BulkEntity + DeserializeOwned + 'static,
    AppState: OrchestratorFor<E>,
{
    let result = orchestrator::<E>(&state)
        .bulk_status_update(&body.selecionados, body.status)
        .await;
    respond::<E>(OperationKind::StatusUpdate, result)
}

pub async fn bulk_delete<E>(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SelectionRequest<E>>,
) -> AppResult<Json<HistoryEntry>>
where
    E: BulkEntity + DeserializeOwned + 'static,
    AppState: OrchestratorFor<E>,
{
    let result = orchestrator::<E>(&state).bulk_delete(&body.selecionados).await;
    respond::<E>(OperationKind::Delete, result)
}

pub async fn bulk_tags<E>(
    State(state): State<Arc<AppState>>,
    Json(body): Json<TagsRequest<E>>,
) -> AppResult<Json<HistoryEntry>>
where
    E: BulkEntity + DeserializeOwned + 'static,
    AppState: OrchestratorFor<E>,
{
    let result = orchestrator::<E>(&state)
        .bulk_tag_assignment(&body.selecionados, body.tags)
        .await;
    respond::<E>(OperationKind::TagAssignment, result)
}

pub async fn bulk_owner<E>(
    State(state): State<Arc<AppState>>,
    Json(body): Json<OwnerRequest<E>>,
) -> AppResult<Json<HistoryEntry>>
where
    E: BulkEntity + DeserializeOwned + 'static,
    AppState: OrchestratorFor<E>,
{
    let result = orchestrator::<E>(&state)
        .bulk_owner_assignment(&body.selecionados, body.responsavel)
        .await;
    respond::<E>(OperationKind::OwnerAssignment, result)
}

pub async fn bulk_deadline<E>(
    State(state): State<Arc<AppState>>,
    Json(body): Json<DeadlineRequest<E>>,
) -> AppResult<Json<HistoryEntry>>
where
    E: BulkEntity + DeserializeOwned + 'static,
    AppState: OrchestratorFor<E>,
{
    let result = orchestrator::<E>(&state)
        .bulk_deadline_update(&body.selecionados, body.prazo)
        .await;
    respond::<E>(OperationKind::DeadlineUpdate, result)
}

pub async fn bulk_archive<E>(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SelectionRequest<E>>,
) -> AppResult<Json<HistoryEntry>>
where
    E: BulkEntity + DeserializeOwned + 'static,
    AppState: OrchestratorFor<E>,
{
    let result = orchestrator::<E>(&state).bulk_archive(&body.selecionados).await;
    respond::<E>(OperationKind::Archive, result)
}

/// `is_loading` e `last_error` do orquestrador
pub async fn run_state<E>(State(state): State<Arc<AppState>>) -> Json<RunState>
where
    E: BulkEntity + 'static,
    AppState: OrchestratorFor<E>,
{
    Json(orchestrator::<E>(&state).run_state().await)
}

fn orchestrator<E>(state: &AppState) -> &BulkOperationOrchestrator<E>
where
    AppState: OrchestratorFor<E>,
{
    <AppState as OrchestratorFor<E>>::orchestrator(state)
}

fn respond<E: BulkEntity>(
    kind: OperationKind,
    result: BulkResult<HistoryEntry>,
) -> AppResult<Json<HistoryEntry>> {
    match result {
        Ok(entry) => {
            log_bulk_operation_done(E::GROUP.as_str(), kind.as_str(), entry.payload.len());
            Ok(Json(entry))
        }
        Err(err) => {
            log_bulk_operation_failed(E::GROUP.as_str(), kind.as_str(), &format!("{:#}", err));
            Err(err.into())
        }
    }
}
