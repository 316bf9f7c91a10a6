/// Contato (lead) vindo do WhatsApp ou cadastrado manualmente
use chrono::{DateTime, NaiveDate, Utc};
use historico::EntityGroup;
use serde::{Deserialize, Serialize};

use super::BulkEntity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrigemContato {
    #[default]
    Whatsapp,
    Manual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contato {
    pub id: String,
    pub nome: String,
    #[serde(default)]
    pub telefone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub origem: OrigemContato,
    /// novo, em_atendimento, qualificado, convertido, perdido...
    pub status: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub responsavel: Option<String>,
    /// Data do próximo retorno combinado com o lead
    #[serde(default)]
    pub proximo_contato: Option<NaiveDate>,
    #[serde(default)]
    pub criado_em: Option<DateTime<Utc>>,
}

impl Contato {
    pub fn new(id: impl Into<String>, nome: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            nome: nome.into(),
            telefone: String::new(),
            email: None,
            origem: OrigemContato::Whatsapp,
            status: status.into(),
            tags: Vec::new(),
            responsavel: None,
            proximo_contato: None,
            criado_em: None,
        }
    }
}

impl BulkEntity for Contato {
    const GROUP: EntityGroup = EntityGroup::Contatos;

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
        self.proximo_contato
    }
}
