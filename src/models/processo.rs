/// Processo judicial acompanhado pelo escritório
use chrono::{DateTime, NaiveDate, Utc};
use historico::EntityGroup;
use serde::{Deserialize, Serialize};

use super::BulkEntity;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Processo {
    pub id: String,
    /// Número CNJ (NNNNNNN-DD.AAAA.J.TR.OOOO)
    pub numero: String,
    #[serde(default)]
    pub titulo: String,
    #[serde(default)]
    pub contato_id: Option<String>,
    pub status: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub responsavel: Option<String>,
    #[serde(default)]
    pub prazo: Option<NaiveDate>,
    #[serde(default)]
    pub criado_em: Option<DateTime<Utc>>,
}

impl Processo {
    pub fn new(id: impl Into<String>, numero: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            numero: numero.into(),
            titulo: String::new(),
            contato_id: None,
            status: status.into(),
            tags: Vec::new(),
            responsavel: None,
            prazo: None,
            criado_em: None,
        }
    }
}

impl BulkEntity for Processo {
    const GROUP: EntityGroup = EntityGroup::Processos;

    fn id(&self) -> &str {
        &self.id
    }

    fn status(&self) -> &str {
        &self.status
    }

    fn tags(&self) -> &[String] {
        &self.tags
    }

    fn owner(&self) -> Option<&str> {
        self.responsavel.as_deref()
    }

    fn deadline(&self) -> Option<NaiveDate> {
        self.prazo
    }
}
