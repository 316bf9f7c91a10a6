//! Orquestrador de operações em massa
//!
//! Fluxo de cada operação:
//! 1. Valida configuração (callback presente) e seleção (não vazia)
//! 2. Captura o estado anterior de cada entidade selecionada
//! 3. Marca `is_loading` e chama o callback de mutação uma única vez
//! 4. Sucesso: registra a entrada no histórico com o necessário para desfazer
//! 5. Falha: guarda `last_error` e devolve o erro original ao chamador

pub mod callbacks;
pub mod error;
mod executor;

use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use historico::{
    ActionExecutor, ActionHistoryStore, ActionPayload, EntityGroup, EntitySnapshot, FieldValue,
    HistoryEntry, HistoryEntryInput, OperationKind,
};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::models::BulkEntity;

pub use callbacks::{
    BulkCallbacks, MutationFuture, MutationRequest, RecordCallback, RecordRequest, UpdateCallback,
};
pub use error::{BulkOperationError, BulkResult, ConfigurationError};

use executor::CallbackExecutor;

/// Estado de execução exposto para a UI (botões desabilitados, banner de erro)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunState {
    pub is_loading: bool,
    pub last_error: Option<String>,
}

pub struct BulkOperationOrchestrator<E> {
    callbacks: BulkCallbacks,
    executor: Arc<dyn ActionExecutor>,
    history: Arc<ActionHistoryStore>,
    /// Mutações em andamento; `is_loading` enquanto for maior que zero
    in_flight: AtomicUsize,
    last_error: RwLock<Option<String>>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: BulkEntity> BulkOperationOrchestrator<E> {
    pub fn new(history: Arc<ActionHistoryStore>, callbacks: BulkCallbacks) -> Self {
        tracing::debug!("Orquestrador de {} configurado: {:?}", E::GROUP, callbacks);
        let executor: Arc<dyn ActionExecutor> =
            Arc::new(CallbackExecutor::new(E::GROUP, callbacks.clone()));

        Self {
            callbacks,
            executor,
            history,
            in_flight: AtomicUsize::new(0),
            last_error: RwLock::new(None),
            _entity: PhantomData,
        }
    }

    pub fn entity_group(&self) -> EntityGroup {
        E::GROUP
    }

    pub fn history(&self) -> &Arc<ActionHistoryStore> {
        &self.history
    }

    pub async fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    pub async fn last_error(&self) -> Option<String> {
        self.last_error.read().await.clone()
    }

    pub async fn run_state(&self) -> RunState {
        RunState {
            is_loading: self.is_loading().await,
            last_error: self.last_error().await,
        }
    }

    pub async fn bulk_status_update(
        &self,
        selected: &[E],
        status: impl Into<String>,
    ) -> BulkResult<HistoryEntry> {
        self.run_field_update(
            OperationKind::StatusUpdate,
            selected,
            FieldValue::Status(status.into()),
            |entity| FieldValue::Status(entity.status().to_string()),
        )
        .await
    }

    pub async fn bulk_tag_assignment(
        &self,
        selected: &[E],
        tags: Vec<String>,
    ) -> BulkResult<HistoryEntry> {
        self.run_field_update(
            OperationKind::TagAssignment,
            selected,
            FieldValue::Tags(tags),
            |entity| FieldValue::Tags(entity.tags().to_vec()),
        )
        .await
    }

    /// `None` remove o responsável
    pub async fn bulk_owner_assignment(
        &self,
        selected: &[E],
        owner: Option<String>,
    ) -> BulkResult<HistoryEntry> {
        self.run_field_update(
            OperationKind::OwnerAssignment,
            selected,
            FieldValue::Owner(owner),
            |entity| FieldValue::Owner(entity.owner().map(str::to_string)),
        )
        .await
    }

    /// `None` remove o prazo
    pub async fn bulk_deadline_update(
        &self,
        selected: &[E],
        deadline: Option<NaiveDate>,
    ) -> BulkResult<HistoryEntry> {
        self.run_field_update(
            OperationKind::DeadlineUpdate,
            selected,
            FieldValue::Deadline(deadline),
            |entity| FieldValue::Deadline(entity.deadline()),
        )
        .await
    }

    pub async fn bulk_delete(&self, selected: &[E]) -> BulkResult<HistoryEntry> {
        let kind = OperationKind::Delete;
        let delete = self.callbacks.delete().cloned().ok_or(self.missing(kind))?;
        if self.callbacks.restore().is_none() {
            return Err(ConfigurationError::MissingRestore { group: E::GROUP }.into());
        }
        ensure_selection(selected)?;

        let previous_states = selected
            .iter()
            .map(|entity| Ok(EntitySnapshot::record(entity.id(), serde_json::to_value(entity)?)))
            .collect::<Result<Vec<_>, serde_json::Error>>()?;

        let request = RecordRequest {
            ids: ids_of(&previous_states),
            previous_states: previous_states.clone(),
        };
        self.execute(kind, delete(request)).await?;

        let payload = ActionPayload::new(E::GROUP, previous_states, None);
        Ok(self.register(kind, None, payload, true).await)
    }

    /// Arquivar é uma transição de status (`arquivado`); só é desfazível se houver
    /// callback de status para devolver o status anterior
    pub async fn bulk_archive(&self, selected: &[E]) -> BulkResult<HistoryEntry> {
        let kind = OperationKind::Archive;
        let archive = self.callbacks.archive().cloned().ok_or(self.missing(kind))?;
        ensure_selection(selected)?;

        let previous_states: Vec<EntitySnapshot> = selected
            .iter()
            .map(|entity| EntitySnapshot::field(entity.id(), FieldValue::Status(entity.status().to_string())))
            .collect();

        let request = RecordRequest {
            ids: ids_of(&previous_states),
            previous_states: previous_states.clone(),
        };
        self.execute(kind, archive(request)).await?;

        let reversible = self.callbacks.status_update().is_some();
        if !reversible {
            tracing::warn!(
                "⚠️ Arquivamento de {} registrado sem desfazer: callback de status não configurado",
                E::GROUP
            );
        }

        let payload = ActionPayload::new(E::GROUP, previous_states, None);
        Ok(self.register(kind, None, payload, reversible).await)
    }

    async fn run_field_update(
        &self,
        kind: OperationKind,
        selected: &[E],
        value: FieldValue,
        snapshot: impl Fn(&E) -> FieldValue,
    ) -> BulkResult<HistoryEntry> {
        let callback = self.callbacks.update_for(kind).cloned().ok_or(self.missing(kind))?;
        ensure_selection(selected)?;

        let previous_states: Vec<EntitySnapshot> = selected
            .iter()
            .map(|entity| EntitySnapshot::field(entity.id(), snapshot(entity)))
            .collect();

        let request = MutationRequest {
            ids: ids_of(&previous_states),
            updates: value.clone(),
            previous_states: previous_states.clone(),
        };
        self.execute(kind, callback(request)).await?;

        let payload = ActionPayload::new(E::GROUP, previous_states, Some(value.clone()));
        Ok(self.register(kind, Some(&value), payload, true).await)
    }

    /// Aguarda a mutação mantendo `is_loading`/`last_error` em dia
    async fn execute(&self, kind: OperationKind, mutation: MutationFuture) -> BulkResult<()> {
        let _in_flight = InFlight::enter(&self.in_flight);
        tracing::info!("⏳ Executando {} em massa ({})", kind, E::GROUP);

        let result = mutation.await;

        let mut last_error = self.last_error.write().await;
        match result {
            Ok(()) => {
                *last_error = None;
                Ok(())
            }
            Err(err) => {
                tracing::error!("❌ Falha em {} de {}: {:#}", kind, E::GROUP, err);
                *last_error = Some(format!("{:#}", err));
                Err(BulkOperationError::Mutation(err))
            }
        }
    }

    async fn register(
        &self,
        kind: OperationKind,
        value: Option<&FieldValue>,
        payload: ActionPayload,
        reversible: bool,
    ) -> HistoryEntry {
        let description = describe(kind, E::GROUP, payload.len(), value);
        self.history
            .add_action(HistoryEntryInput {
                kind,
                description,
                payload,
                reversible,
                executor: self.executor.clone(),
            })
            .await
    }

    fn missing(&self, operation: OperationKind) -> ConfigurationError {
        ConfigurationError::MissingCallback {
            group: E::GROUP,
            operation,
        }
    }
}

/// Conta uma mutação em andamento enquanto vivo; solto também quando a
/// requisição é abandonada no meio
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

fn ensure_selection<E>(selected: &[E]) -> BulkResult<()> {
    if selected.is_empty() {
        return Err(BulkOperationError::EmptySelection);
    }
    Ok(())
}

fn ids_of(snapshots: &[EntitySnapshot]) -> Vec<String> {
    snapshots.iter().map(|s| s.id.clone()).collect()
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

/// Texto do toast e da lista de histórico
pub fn describe(
    kind: OperationKind,
    group: EntityGroup,
    count: usize,
    value: Option<&FieldValue>,
) -> String {
    let noun = group.noun(count);
    match (kind, value) {
        (OperationKind::StatusUpdate, Some(value)) => {
            format!("Status de {} {} alterado para \"{}\"", count, noun, value)
        }
        (OperationKind::TagAssignment, Some(FieldValue::Tags(tags))) if tags.is_empty() => {
            format!("Tags removidas de {} {}", count, noun)
        }
        (OperationKind::TagAssignment, Some(value)) => {
            format!("Tags \"{}\" atribuídas a {} {}", value, count, noun)
        }
        (OperationKind::OwnerAssignment, Some(FieldValue::Owner(None))) => {
            format!("Responsável removido de {} {}", count, noun)
        }
        (OperationKind::OwnerAssignment, Some(value)) => {
            format!("Responsável \"{}\" atribuído a {} {}", value, count, noun)
        }
        (OperationKind::DeadlineUpdate, Some(FieldValue::Deadline(None))) => {
            format!("Prazo removido de {} {}", count, noun)
        }
        (OperationKind::DeadlineUpdate, Some(value)) => {
            format!("Prazo de {} {} alterado para {}", count, noun, value)
        }
        (OperationKind::Delete, _) => format!("{} {} excluído{}", count, noun, plural(count)),
        (OperationKind::Archive, _) => format!("{} {} arquivado{}", count, noun, plural(count)),
        (kind, None) => format!("{} aplicado a {} {}", kind, count, noun),
    }
}

#[cfg(test)]
mod tests;
