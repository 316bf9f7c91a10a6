//! Desfazer/refazer das entradas registradas pelo orquestrador, usando a
//! tabela de callbacks do grupo de entidades.

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use historico::{ActionExecutor, ActionPayload, EntityGroup, EntitySnapshot, OperationKind};

use super::callbacks::{BulkCallbacks, MutationRequest, RecordRequest, UpdateCallback};
use super::error::ConfigurationError;

pub(crate) struct CallbackExecutor {
    group: EntityGroup,
    callbacks: BulkCallbacks,
}

impl CallbackExecutor {
    pub(crate) fn new(group: EntityGroup, callbacks: BulkCallbacks) -> Self {
        Self { group, callbacks }
    }

    fn missing(&self, operation: OperationKind) -> ConfigurationError {
        ConfigurationError::MissingCallback {
            group: self.group,
            operation,
        }
    }

    fn record_request(payload: &ActionPayload) -> RecordRequest {
        RecordRequest {
            ids: payload.entity_ids().to_vec(),
            previous_states: payload.previous_states().to_vec(),
        }
    }

    /// Uma chamada por valor anterior distinto, só com os ids que o compartilhavam
    async fn restore_previous_values(
        callback: &UpdateCallback,
        payload: &ActionPayload,
    ) -> anyhow::Result<()> {
        for (value, ids) in payload.previous_value_groups() {
            tracing::debug!(
                "Restaurando {} {} para {:?}",
                ids.len(),
                payload.entity_group,
                value
            );
            let previous_states = ids
                .iter()
                .map(|id| EntitySnapshot::field(id.clone(), value.clone()))
                .collect();
            callback(MutationRequest {
                ids,
                updates: value,
                previous_states,
            })
            .await?;
        }
        Ok(())
    }
}

impl ActionExecutor for CallbackExecutor {
    fn reverse<'a>(
        &'a self,
        kind: OperationKind,
        payload: &'a ActionPayload,
    ) -> BoxFuture<'a, anyhow::Result<()>> {
        async move {
            match kind {
                OperationKind::StatusUpdate
                | OperationKind::TagAssignment
                | OperationKind::OwnerAssignment
                | OperationKind::DeadlineUpdate => {
                    let callback = self.callbacks.update_for(kind).ok_or_else(|| self.missing(kind))?;
                    Self::restore_previous_values(callback, payload).await
                }
                // arquivar é uma transição de status; desfazer devolve o status anterior
                OperationKind::Archive => {
                    let callback = self
                        .callbacks
                        .status_update()
                        .ok_or_else(|| self.missing(OperationKind::StatusUpdate))?;
                    Self::restore_previous_values(callback, payload).await
                }
                OperationKind::Delete => {
                    let restore = self
                        .callbacks
                        .restore()
                        .ok_or(ConfigurationError::MissingRestore { group: self.group })?;
                    restore(Self::record_request(payload)).await
                }
            }
        }
        .boxed()
    }

    fn replay<'a>(
        &'a self,
        kind: OperationKind,
        payload: &'a ActionPayload,
    ) -> BoxFuture<'a, anyhow::Result<()>> {
        async move {
            match kind {
                OperationKind::StatusUpdate
                | OperationKind::TagAssignment
                | OperationKind::OwnerAssignment
                | OperationKind::DeadlineUpdate => {
                    let callback = self.callbacks.update_for(kind).ok_or_else(|| self.missing(kind))?;
                    let updates = payload
                        .applied
                        .clone()
                        .ok_or_else(|| anyhow::anyhow!("entrada de {} sem valor aplicado", kind))?;
                    callback(MutationRequest {
                        ids: payload.entity_ids().to_vec(),
                        updates,
                        previous_states: payload.previous_states().to_vec(),
                    })
                    .await
                }
                OperationKind::Delete => {
                    let delete = self.callbacks.delete().ok_or_else(|| self.missing(kind))?;
                    delete(Self::record_request(payload)).await
                }
                OperationKind::Archive => {
                    let archive = self.callbacks.archive().ok_or_else(|| self.missing(kind))?;
                    archive(Self::record_request(payload)).await
                }
            }
        }
        .boxed()
    }
}
