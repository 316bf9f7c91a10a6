//! ActionHistoryStore: log linear de ações com cursor, desfazer e refazer

use std::sync::{Arc, Mutex as StdMutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::entry::{EntityGroup, HistoryEntry, HistoryEntryInput, OperationKind};
use crate::notifier::{HistoryCommand, Notification, NotificationSink};

/// Capacidade padrão do histórico
pub const DEFAULT_MAX_HISTORY_SIZE: usize = 50;

const UNDO_LABEL: &str = "Desfazer";
const REDO_LABEL: &str = "Refazer";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryPhase {
    Idle,
    Undoing,
    Redoing,
}

/// Por que um desfazer/refazer não fez nada
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoOpReason {
    Busy,
    NothingToUndo,
    NothingToRedo,
    NotReversible,
}

/// Resultado de `undo()`/`redo()`.
///
/// Falhas da ação compensatória já foram notificadas quando chegam aqui; o
/// chamador não precisa tratá-las.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "resultado", rename_all = "snake_case")]
pub enum NavigationOutcome {
    Applied { entry_id: Uuid, description: String },
    NoOp { reason: NoOpReason },
    Failed { entry_id: Uuid, error: String },
}

impl NavigationOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, NavigationOutcome::Applied { .. })
    }

    fn no_op(reason: NoOpReason) -> Self {
        NavigationOutcome::NoOp { reason }
    }
}

/// Linha do histórico para exibição
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntryView {
    pub id: Uuid,
    pub kind: OperationKind,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    pub entity_group: EntityGroup,
    pub entity_count: usize,
    pub reversible: bool,
    /// Falso para entradas desfeitas que ainda podem ser refeitas
    pub applied: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistorySummary {
    pub total: usize,
    pub cursor: Option<usize>,
    pub phase: HistoryPhase,
    pub can_undo: bool,
    pub can_redo: bool,
    pub max_history_size: usize,
    pub entries: Vec<HistoryEntryView>,
}

#[derive(Debug)]
struct HistoryState {
    entries: Vec<HistoryEntry>,
    /// Última entrada aplicada e ainda não desfeita
    cursor: Option<usize>,
}

impl HistoryState {
    fn next_index(&self) -> usize {
        self.cursor.map_or(0, |c| c + 1)
    }

    fn can_undo(&self, phase: HistoryPhase) -> bool {
        self.cursor.is_some() && phase == HistoryPhase::Idle
    }

    fn can_redo(&self, phase: HistoryPhase) -> bool {
        self.next_index() < self.entries.len() && phase == HistoryPhase::Idle
    }
}

fn lock_phase(phase: &StdMutex<HistoryPhase>) -> MutexGuard<'_, HistoryPhase> {
    phase.lock().unwrap_or_else(|e| e.into_inner())
}

/// Marca a fase de um desfazer/refazer em andamento e volta para `Idle` ao
/// ser solto, inclusive quando o futuro é abandonado antes de terminar
struct PhaseGuard<'a> {
    phase: &'a StdMutex<HistoryPhase>,
}

impl<'a> PhaseGuard<'a> {
    fn enter(phase: &'a StdMutex<HistoryPhase>, next: HistoryPhase) -> Self {
        *lock_phase(phase) = next;
        Self { phase }
    }
}

impl Drop for PhaseGuard<'_> {
    fn drop(&mut self) {
        *lock_phase(self.phase) = HistoryPhase::Idle;
    }
}

/// Histórico de ações da sessão, compartilhado entre as telas via `Arc`.
///
/// Todas as mutações passam pelo `gate`: `undo`/`redo` usam `try_lock` e viram
/// no-op se já houver algo em andamento; `add_action` e `clear_history`
/// aguardam a vez.
pub struct ActionHistoryStore {
    state: RwLock<HistoryState>,
    phase: StdMutex<HistoryPhase>,
    gate: Mutex<()>,
    notifier: Arc<dyn NotificationSink>,
    max_history_size: usize,
}

impl ActionHistoryStore {
    pub fn new(notifier: Arc<dyn NotificationSink>, max_history_size: usize) -> Self {
        Self {
            state: RwLock::new(HistoryState {
                entries: Vec::new(),
                cursor: None,
            }),
            phase: StdMutex::new(HistoryPhase::Idle),
            gate: Mutex::new(()),
            notifier,
            max_history_size: max_history_size.max(1),
        }
    }

    pub fn with_default_capacity(notifier: Arc<dyn NotificationSink>) -> Self {
        Self::new(notifier, DEFAULT_MAX_HISTORY_SIZE)
    }

    pub fn max_history_size(&self) -> usize {
        self.max_history_size
    }

    /// Registra uma ação já concluída.
    ///
    /// Descarta as entradas desfeitas após o cursor, anexa a nova, move o
    /// cursor para ela e remove as mais antigas além da capacidade.
    pub async fn add_action(&self, input: HistoryEntryInput) -> HistoryEntry {
        let _gate = self.gate.lock().await;
        let entry = HistoryEntry::from_input(input);

        let (pruned, evicted, total) = {
            let mut state = self.state.write().await;

            let keep = state.next_index();
            let pruned = state.entries.len().saturating_sub(keep);
            state.entries.truncate(keep);
            state.entries.push(entry.clone());

            let evicted = state.entries.len().saturating_sub(self.max_history_size);
            if evicted > 0 {
                state.entries.drain(..evicted);
            }

            state.cursor = Some(state.entries.len() - 1);
            (pruned, evicted, state.entries.len())
        };

        tracing::info!(
            "📝 Ação registrada no histórico: {} [{}] ({} entradas, {} descartadas do refazer, {} removidas por capacidade)",
            entry.description,
            entry.kind,
            total,
            pruned,
            evicted
        );

        let mut notification = Notification::success(entry.description.clone());
        if entry.reversible {
            notification = notification.with_action(UNDO_LABEL, HistoryCommand::Undo);
        }
        self.notifier.notify(notification);

        entry
    }

    /// Desfaz a entrada sob o cursor executando sua ação compensatória
    pub async fn undo(&self) -> NavigationOutcome {
        let Ok(_gate) = self.gate.try_lock() else {
            tracing::debug!("Desfazer ignorado: histórico ocupado");
            return NavigationOutcome::no_op(NoOpReason::Busy);
        };

        let (index, entry) = {
            let state = self.state.read().await;
            let Some(index) = state.cursor else {
                return NavigationOutcome::no_op(NoOpReason::NothingToUndo);
            };
            let Some(entry) = state.entries.get(index).cloned() else {
                return NavigationOutcome::no_op(NoOpReason::NothingToUndo);
            };
            if !entry.reversible {
                tracing::debug!("Desfazer ignorado: '{}' não é reversível", entry.description);
                return NavigationOutcome::no_op(NoOpReason::NotReversible);
            }
            (index, entry)
        };

        let phase = PhaseGuard::enter(&self.phase, HistoryPhase::Undoing);
        tracing::info!("↩️ Desfazendo: {} ({} entidades)", entry.description, entry.payload.len());
        let result = entry.reverse().await;

        let mut state = self.state.write().await;
        drop(phase);

        match result {
            Ok(()) => {
                state.cursor = index.checked_sub(1);
                drop(state);

                self.notifier.notify(
                    Notification::success(format!("Ação desfeita: {}", entry.description))
                        .with_action(REDO_LABEL, HistoryCommand::Redo),
                );
                NavigationOutcome::Applied {
                    entry_id: entry.id,
                    description: entry.description,
                }
            }
            Err(err) => {
                drop(state);

                tracing::error!("❌ Falha ao desfazer '{}': {:#}", entry.description, err);
                self.notifier.notify(Notification::error(format!(
                    "Não foi possível desfazer \"{}\": {}",
                    entry.description, err
                )));
                NavigationOutcome::Failed {
                    entry_id: entry.id,
                    error: format!("{:#}", err),
                }
            }
        }
    }

    /// Reaplica a próxima entrada desfeita
    pub async fn redo(&self) -> NavigationOutcome {
        let Ok(_gate) = self.gate.try_lock() else {
            tracing::debug!("Refazer ignorado: histórico ocupado");
            return NavigationOutcome::no_op(NoOpReason::Busy);
        };

        let (index, entry) = {
            let state = self.state.read().await;
            let index = state.next_index();
            let Some(entry) = state.entries.get(index).cloned() else {
                return NavigationOutcome::no_op(NoOpReason::NothingToRedo);
            };
            (index, entry)
        };

        let phase = PhaseGuard::enter(&self.phase, HistoryPhase::Redoing);
        tracing::info!("↪️ Refazendo: {} ({} entidades)", entry.description, entry.payload.len());
        let result = entry.replay().await;

        let mut state = self.state.write().await;
        drop(phase);

        match result {
            Ok(()) => {
                state.cursor = Some(index);
                drop(state);

                let mut notification =
                    Notification::success(format!("Ação refeita: {}", entry.description));
                if entry.reversible {
                    notification = notification.with_action(UNDO_LABEL, HistoryCommand::Undo);
                }
                self.notifier.notify(notification);
                NavigationOutcome::Applied {
                    entry_id: entry.id,
                    description: entry.description,
                }
            }
            Err(err) => {
                drop(state);

                tracing::error!("❌ Falha ao refazer '{}': {:#}", entry.description, err);
                self.notifier.notify(Notification::error(format!(
                    "Não foi possível refazer \"{}\": {}",
                    entry.description, err
                )));
                NavigationOutcome::Failed {
                    entry_id: entry.id,
                    error: format!("{:#}", err),
                }
            }
        }
    }

    pub async fn clear_history(&self) {
        let _gate = self.gate.lock().await;
        let removed = {
            let mut state = self.state.write().await;
            let removed = state.entries.len();
            state.entries.clear();
            state.cursor = None;
            removed
        };

        tracing::info!("🧹 Histórico limpo ({} entradas removidas)", removed);
        self.notifier.notify(Notification::info("Histórico de ações limpo"));
    }

    /// Entradas mais recentes primeiro, no máximo `limit`
    pub async fn get_recent_actions(&self, limit: usize) -> Vec<HistoryEntry> {
        let state = self.state.read().await;
        state.entries.iter().rev().take(limit).cloned().collect()
    }

    pub async fn can_undo(&self) -> bool {
        let state = self.state.read().await;
        state.can_undo(*lock_phase(&self.phase))
    }

    pub async fn can_redo(&self) -> bool {
        let state = self.state.read().await;
        state.can_redo(*lock_phase(&self.phase))
    }

    pub async fn phase(&self) -> HistoryPhase {
        *lock_phase(&self.phase)
    }

    pub async fn cursor(&self) -> Option<usize> {
        self.state.read().await.cursor
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.entries.is_empty()
    }

    pub async fn summary(&self, limit: usize) -> HistorySummary {
        let state = self.state.read().await;
        let phase = *lock_phase(&self.phase);
        let next = state.next_index();

        let entries = state
            .entries
            .iter()
            .enumerate()
            .rev()
            .take(limit)
            .map(|(index, entry)| HistoryEntryView {
                id: entry.id,
                kind: entry.kind,
                description: entry.description.clone(),
                timestamp: entry.timestamp,
                entity_group: entry.payload.entity_group,
                entity_count: entry.payload.len(),
                reversible: entry.reversible,
                applied: index < next,
            })
            .collect();

        HistorySummary {
            total: state.entries.len(),
            cursor: state.cursor,
            phase,
            can_undo: state.can_undo(phase),
            can_redo: state.can_redo(phase),
            max_history_size: self.max_history_size,
            entries,
        }
    }
}
