// Biblioteca do painel jurídico
// Expõe módulos para uso em testes e no binário

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use std::sync::Arc;

use historico::{ActionHistoryStore, InMemoryNotifier};

use crate::handlers::bulk::OrchestratorFor;
use crate::models::{Contato, Processo};
use crate::services::bulk::{BulkCallbacks, BulkOperationOrchestrator};

/// Estado compartilhado entre os handlers.
///
/// Um único histórico atende contatos e processos, então desfazer sempre
/// reverte a última operação da sessão, seja qual for a tabela.
pub struct AppState {
    pub settings: config::Settings,
    pub history: Arc<ActionHistoryStore>,
    pub notifications: Arc<InMemoryNotifier>,
    pub contatos: BulkOperationOrchestrator<Contato>,
    pub processos: BulkOperationOrchestrator<Processo>,
}

impl AppState {
    pub fn new(
        settings: config::Settings,
        contatos_callbacks: BulkCallbacks,
        processos_callbacks: BulkCallbacks,
    ) -> Self {
        let notifications = Arc::new(InMemoryNotifier::new(
            settings.history.notification_feed_size,
        ));
        let history = Arc::new(ActionHistoryStore::new(
            notifications.clone(),
            settings.history.max_size,
        ));

        Self {
            contatos: BulkOperationOrchestrator::new(history.clone(), contatos_callbacks),
            processos: BulkOperationOrchestrator::new(history.clone(), processos_callbacks),
            settings,
            history,
            notifications,
        }
    }
}

impl OrchestratorFor<Contato> for AppState {
    fn orchestrator(&self) -> &BulkOperationOrchestrator<Contato> {
        &self.contatos
    }
}

impl OrchestratorFor<Processo> for AppState {
    fn orchestrator(&self) -> &BulkOperationOrchestrator<Processo> {
        &self.processos
    }
}
