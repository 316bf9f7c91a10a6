//! Histórico de Ações: desfazer/refazer das operações em massa do painel
//!
//! Comportamento:
//! - Um único log linear por sessão, com cursor na última ação aplicada
//! - Registrar uma ação nova descarta o que estava desfeito após o cursor
//! - Capacidade limitada: as ações mais antigas saem primeiro
//! - Desfazer executa a ação compensatória; refazer reaplica a original
//! - Apenas um desfazer/refazer por vez; chamadas concorrentes são ignoradas
//! - Toda mudança gera uma notificação (toast) para o front-end
//!
//! Exemplo:
//! ```text
//! [status→qualificado] [tags→vip] [excluir 3]      cursor = 2
//!        desfazer ↩                                cursor = 1 (3 contatos restaurados)
//! [status→qualificado] [tags→vip] [responsável→Ana] cursor = 2 (exclusão descartada)
//! ```

pub mod entry;
pub mod notifier;
pub mod store;

pub use entry::{
    ActionExecutor, ActionPayload, EntityGroup, EntitySnapshot, FieldValue, HistoryEntry,
    HistoryEntryInput, OperationKind, SnapshotState,
};
pub use notifier::{
    HistoryCommand, InMemoryNotifier, Notification, NotificationAction, NotificationLevel,
    NotificationSink, TracingNotifier,
};
pub use store::{
    ActionHistoryStore, HistoryEntryView, HistoryPhase, HistorySummary, NavigationOutcome,
    NoOpReason, DEFAULT_MAX_HISTORY_SIZE,
};
