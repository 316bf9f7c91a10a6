//! Notificações (toasts) emitidas pelo histórico

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Quantidade padrão de notificações retidas pelo `InMemoryNotifier`
pub const DEFAULT_FEED_CAPACITY: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Success,
    Info,
    Error,
}

/// Comando do histórico que um botão do toast dispara
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryCommand {
    Undo,
    Redo,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationAction {
    pub label: String,
    pub command: HistoryCommand,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub action: Option<NotificationAction>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    fn new(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            action: None,
            created_at: Utc::now(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Success, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Info, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Error, message)
    }

    pub fn with_action(mut self, label: impl Into<String>, command: HistoryCommand) -> Self {
        self.action = Some(NotificationAction {
            label: label.into(),
            command,
        });
        self
    }
}

/// Destino das notificações do histórico
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

fn log_notification(notification: &Notification) {
    match notification.level {
        NotificationLevel::Success | NotificationLevel::Info => tracing::info!(
            "🔔 {} (ação: {:?})",
            notification.message,
            notification.action.as_ref().map(|a| a.command)
        ),
        NotificationLevel::Error => tracing::error!("🔔 {}", notification.message),
    }
}

/// Apenas registra as notificações no log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl NotificationSink for TracingNotifier {
    fn notify(&self, notification: Notification) {
        log_notification(&notification);
    }
}

/// Feed limitado de notificações consumido pelo front-end.
///
/// Quando cheio, descarta as mais antigas.
#[derive(Debug)]
pub struct InMemoryNotifier {
    feed: Mutex<VecDeque<Notification>>,
    capacity: usize,
}

impl InMemoryNotifier {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            feed: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Remove e retorna todas as notificações pendentes, da mais antiga para a mais nova
    pub fn drain(&self) -> Vec<Notification> {
        let mut feed = self.feed.lock().unwrap_or_else(|e| e.into_inner());
        feed.drain(..).collect()
    }

    /// Cópia das notificações pendentes sem consumi-las
    pub fn pending(&self) -> Vec<Notification> {
        let feed = self.feed.lock().unwrap_or_else(|e| e.into_inner());
        feed.iter().cloned().collect()
    }
}

impl Default for InMemoryNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_FEED_CAPACITY)
    }
}

impl NotificationSink for InMemoryNotifier {
    fn notify(&self, notification: Notification) {
        log_notification(&notification);

        let mut feed = self.feed.lock().unwrap_or_else(|e| e.into_inner());
        if feed.len() == self.capacity {
            feed.pop_front();
        }
        feed.push_back(notification);
    }
}
