//! Erros das operações em massa

use historico::{EntityGroup, OperationKind};
use thiserror::Error;

/// Callback obrigatório ausente: erro de programação, não de usuário
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("callback de {operation} não configurado para {group}")]
    MissingCallback {
        group: EntityGroup,
        operation: OperationKind,
    },

    #[error("exclusão em massa de {group} exige os callbacks de exclusão e de restauração")]
    MissingRestore { group: EntityGroup },
}

#[derive(Debug, Error)]
pub enum BulkOperationError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Nenhuma entidade selecionada")]
    EmptySelection,

    #[error("Falha ao capturar o estado anterior: {0}")]
    Snapshot(#[from] serde_json::Error),

    /// Erro devolvido pelo callback de mutação, sem alterações
    #[error(transparent)]
    Mutation(anyhow::Error),
}

impl BulkOperationError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, BulkOperationError::Configuration(_))
    }
}

pub type BulkResult<T> = Result<T, BulkOperationError>;
