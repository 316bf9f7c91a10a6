//! Tabela de callbacks de mutação de um grupo de entidades.
//!
//! Cada callback representa uma chamada ao cliente da API do painel. Todos são
//! opcionais; o orquestrador recusa operações cujo callback não foi configurado.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use historico::{EntitySnapshot, FieldValue, OperationKind};

pub type MutationFuture = BoxFuture<'static, anyhow::Result<()>>;
pub type UpdateCallback = Arc<dyn Fn(MutationRequest) -> MutationFuture + Send + Sync>;
pub type RecordCallback = Arc<dyn Fn(RecordRequest) -> MutationFuture + Send + Sync>;

/// Alteração de um campo em um lote de entidades
#[derive(Debug, Clone, PartialEq)]
pub struct MutationRequest {
    pub ids: Vec<String>,
    pub updates: FieldValue,
    pub previous_states: Vec<EntitySnapshot>,
}

/// Operação sobre registros inteiros (excluir, restaurar, arquivar)
#[derive(Debug, Clone, PartialEq)]
pub struct RecordRequest {
    pub ids: Vec<String>,
    pub previous_states: Vec<EntitySnapshot>,
}

fn update_callback<F, Fut>(f: F) -> UpdateCallback
where
    F: Fn(MutationRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(move |request: MutationRequest| f(request).boxed())
}

fn record_callback<F, Fut>(f: F) -> RecordCallback
where
    F: Fn(RecordRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(move |request: RecordRequest| f(request).boxed())
}

#[derive(Clone, Default)]
pub struct BulkCallbacks {
    status_update: Option<UpdateCallback>,
    tag_assignment: Option<UpdateCallback>,
    owner_assignment: Option<UpdateCallback>,
    deadline_update: Option<UpdateCallback>,
    delete: Option<RecordCallback>,
    restore: Option<RecordCallback>,
    archive: Option<RecordCallback>,
}

impl BulkCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status_update<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(MutationRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.status_update = Some(update_callback(f));
        self
    }

    pub fn with_tag_assignment<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(MutationRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.tag_assignment = Some(update_callback(f));
        self
    }

    pub fn with_owner_assignment<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(MutationRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.owner_assignment = Some(update_callback(f));
        self
    }

    pub fn with_deadline_update<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(MutationRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.deadline_update = Some(update_callback(f));
        self
    }

    /// Exclusão e restauração andam juntas: sem restauração não há desfazer
    pub fn with_delete<F, Fut, R, RFut>(mut self, delete: F, restore: R) -> Self
    where
        F: Fn(RecordRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
        R: Fn(RecordRequest) -> RFut + Send + Sync + 'static,
        RFut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.delete = Some(record_callback(delete));
        self.restore = Some(record_callback(restore));
        self
    }

    pub fn with_archive<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(RecordRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.archive = Some(record_callback(f));
        self
    }

    /// Callback de campo usado pela operação, `None` para operações sobre registros
    pub fn update_for(&self, kind: OperationKind) -> Option<&UpdateCallback> {
        match kind {
            OperationKind::StatusUpdate => self.status_update.as_ref(),
            OperationKind::TagAssignment => self.tag_assignment.as_ref(),
            OperationKind::OwnerAssignment => self.owner_assignment.as_ref(),
            OperationKind::DeadlineUpdate => self.deadline_update.as_ref(),
            OperationKind::Delete | OperationKind::Archive => None,
        }
    }

    pub fn status_update(&self) -> Option<&UpdateCallback> {
        self.status_update.as_ref()
    }

    pub fn delete(&self) -> Option<&RecordCallback> {
        self.delete.as_ref()
    }

    pub fn restore(&self) -> Option<&RecordCallback> {
        self.restore.as_ref()
    }

    pub fn archive(&self) -> Option<&RecordCallback> {
        self.archive.as_ref()
    }
}

impl fmt::Debug for BulkCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BulkCallbacks")
            .field("status_update", &self.status_update.is_some())
            .field("tag_assignment", &self.tag_assignment.is_some())
            .field("owner_assignment", &self.owner_assignment.is_some())
            .field("deadline_update", &self.deadline_update.is_some())
            .field("delete", &self.delete.is_some())
            .field("restore", &self.restore.is_some())
            .field("archive", &self.archive.is_some())
            .finish()
    }
}
