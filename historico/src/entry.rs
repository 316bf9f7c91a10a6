//! Entradas do histórico: o que foi feito, sobre quais entidades e qual era o
//! estado anterior de cada uma.
//!
//! O "como desfazer" não mora aqui: cada entrada carrega apenas dados
//! inspecionáveis (`ActionPayload`) e um `ActionExecutor` injetado por quem
//! registrou a ação.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Grupo de entidades afetado por uma operação
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityGroup {
    Contatos,
    Processos,
}

impl EntityGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityGroup::Contatos => "contatos",
            EntityGroup::Processos => "processos",
        }
    }

    /// Substantivo concordando com a quantidade ("1 contato", "3 contatos")
    pub fn noun(&self, count: usize) -> &'static str {
        match (self, count) {
            (EntityGroup::Contatos, 1) => "contato",
            (EntityGroup::Contatos, _) => "contatos",
            (EntityGroup::Processos, 1) => "processo",
            (EntityGroup::Processos, _) => "processos",
        }
    }
}

impl fmt::Display for EntityGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Família da operação registrada
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    StatusUpdate,
    Delete,
    TagAssignment,
    OwnerAssignment,
    DeadlineUpdate,
    Archive,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::StatusUpdate => "status_update",
            OperationKind::Delete => "delete",
            OperationKind::TagAssignment => "tag_assignment",
            OperationKind::OwnerAssignment => "owner_assignment",
            OperationKind::DeadlineUpdate => "deadline_update",
            OperationKind::Archive => "archive",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Valor de um campo alterado em massa.
///
/// Serializa no formato da API do painel: `{"status": "qualificado"}`,
/// `{"tags": [...]}`, `{"responsavel": null}`, `{"prazo": "2026-11-20"}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldValue {
    Status(String),
    Tags(Vec<String>),
    #[serde(rename = "responsavel")]
    Owner(Option<String>),
    #[serde(rename = "prazo")]
    Deadline(Option<NaiveDate>),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Status(status) => f.write_str(status),
            FieldValue::Tags(tags) if tags.is_empty() => f.write_str("nenhuma tag"),
            FieldValue::Tags(tags) => f.write_str(&tags.join(", ")),
            FieldValue::Owner(Some(owner)) => f.write_str(owner),
            FieldValue::Owner(None) => f.write_str("sem responsável"),
            FieldValue::Deadline(Some(date)) => write!(f, "{}", date.format("%d/%m/%Y")),
            FieldValue::Deadline(None) => f.write_str("sem prazo"),
        }
    }
}

/// Estado anterior de uma entidade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tipo", content = "valor", rename_all = "snake_case")]
pub enum SnapshotState {
    /// Apenas o campo que a operação alterou
    Field(FieldValue),
    /// Registro completo (usado na exclusão)
    Record(Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub id: String,
    pub state: SnapshotState,
}

impl EntitySnapshot {
    pub fn field(id: impl Into<String>, value: FieldValue) -> Self {
        Self {
            id: id.into(),
            state: SnapshotState::Field(value),
        }
    }

    pub fn record(id: impl Into<String>, record: Value) -> Self {
        Self {
            id: id.into(),
            state: SnapshotState::Record(record),
        }
    }

    pub fn field_value(&self) -> Option<&FieldValue> {
        match &self.state {
            SnapshotState::Field(value) => Some(value),
            SnapshotState::Record(_) => None,
        }
    }

    pub fn record_value(&self) -> Option<&Value> {
        match &self.state {
            SnapshotState::Record(record) => Some(record),
            SnapshotState::Field(_) => None,
        }
    }
}

/// Dados de uma ação registrada.
///
/// `entity_ids` é derivado de `previous_states` na construção, então as duas
/// listas têm sempre o mesmo tamanho e a mesma ordem.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionPayload {
    pub entity_group: EntityGroup,
    entity_ids: Vec<String>,
    previous_states: Vec<EntitySnapshot>,
    /// Valor aplicado pela operação original (ausente em exclusão/arquivamento)
    pub applied: Option<FieldValue>,
}

impl ActionPayload {
    pub fn new(
        entity_group: EntityGroup,
        previous_states: Vec<EntitySnapshot>,
        applied: Option<FieldValue>,
    ) -> Self {
        let entity_ids = previous_states.iter().map(|s| s.id.clone()).collect();
        Self {
            entity_group,
            entity_ids,
            previous_states,
            applied,
        }
    }

    pub fn entity_ids(&self) -> &[String] {
        &self.entity_ids
    }

    pub fn previous_states(&self) -> &[EntitySnapshot] {
        &self.previous_states
    }

    pub fn len(&self) -> usize {
        self.entity_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entity_ids.is_empty()
    }

    /// Agrupa os ids pelo valor anterior do campo, na ordem em que cada valor
    /// apareceu pela primeira vez. Snapshots de registro completo são ignorados.
    pub fn previous_value_groups(&self) -> Vec<(FieldValue, Vec<String>)> {
        let mut groups: Vec<(FieldValue, Vec<String>)> = Vec::new();

        for snapshot in &self.previous_states {
            let Some(value) = snapshot.field_value() else {
                continue;
            };

            match groups.iter_mut().find(|(existing, _)| existing == value) {
                Some((_, ids)) => ids.push(snapshot.id.clone()),
                None => groups.push((value.clone(), vec![snapshot.id.clone()])),
            }
        }

        groups
    }
}

/// Capacidade de desfazer e reaplicar uma ação a partir dos seus dados.
///
/// Implementado por quem registra a ação (o orquestrador de operações em
/// massa), que conhece os callbacks de mutação do grupo de entidades.
pub trait ActionExecutor: Send + Sync {
    /// Restaura `payload.previous_states`
    fn reverse<'a>(
        &'a self,
        kind: OperationKind,
        payload: &'a ActionPayload,
    ) -> BoxFuture<'a, anyhow::Result<()>>;

    /// Reaplica a operação original
    fn replay<'a>(
        &'a self,
        kind: OperationKind,
        payload: &'a ActionPayload,
    ) -> BoxFuture<'a, anyhow::Result<()>>;
}

/// Dados fornecidos por quem registra uma ação; id e timestamp são
/// atribuídos pelo histórico.
pub struct HistoryEntryInput {
    pub kind: OperationKind,
    pub description: String,
    pub payload: ActionPayload,
    pub reversible: bool,
    pub executor: Arc<dyn ActionExecutor>,
}

/// Uma unidade desfazível do histórico
#[derive(Clone, Serialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub kind: OperationKind,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    pub payload: ActionPayload,
    pub reversible: bool,
    #[serde(skip)]
    executor: Arc<dyn ActionExecutor>,
}

impl HistoryEntry {
    pub(crate) fn from_input(input: HistoryEntryInput) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: input.kind,
            description: input.description,
            timestamp: Utc::now(),
            payload: input.payload,
            reversible: input.reversible,
            executor: input.executor,
        }
    }

    pub(crate) async fn reverse(&self) -> anyhow::Result<()> {
        self.executor.reverse(self.kind, &self.payload).await
    }

    pub(crate) async fn replay(&self) -> anyhow::Result<()> {
        self.executor.replay(self.kind, &self.payload).await
    }
}

impl fmt::Debug for HistoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryEntry")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("description", &self.description)
            .field("timestamp", &self.timestamp)
            .field("payload", &self.payload)
            .field("reversible", &self.reversible)
            .finish_non_exhaustive()
    }
}
