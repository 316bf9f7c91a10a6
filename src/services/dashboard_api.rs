//! Cliente HTTP para a API REST do painel
//!
//! Fornece os callbacks de mutação em massa usados pelos orquestradores.
//! O formato dos payloads segue o backend do painel:
//! - `POST /api/{grupo}/bulk-update`  `{ids, updates}`
//! - `POST /api/{grupo}/bulk-delete`  `{ids}`
//! - `POST /api/{grupo}/bulk-restore` `{registros}`
//! - `POST /api/{grupo}/bulk-archive` `{ids}` (status passa a `arquivado`)

use std::sync::Arc;
use std::time::Duration;

use historico::{EntityGroup, FieldValue};
use reqwest::{Client as HttpClient, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::config::ApiSettings;
use crate::services::bulk::{BulkCallbacks, MutationRequest, RecordRequest};
use crate::utils::logging::log_api_error;

/// Erros do cliente da API do painel
#[derive(Debug, Error)]
pub enum ApiError {
    /// Erro de requisição HTTP (conexão, timeout, corpo inválido)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Resposta não-2xx da API
    #[error("Dashboard API error (status {status}): {message}")]
    Status { status: u16, message: String },

    #[error("Authentication failed: {0}")]
    Auth(String),
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
}

#[derive(Clone)]
pub struct DashboardApiClient {
    http_client: HttpClient,
    base_url: String,
    token: Arc<RwLock<Option<String>>>,
}

impl DashboardApiClient {
    pub fn new(settings: &ApiSettings) -> Result<Self, ApiError> {
        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .connect_timeout(Duration::from_secs(5))
            .build()?;

        Ok(Self {
            http_client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            token: Arc::new(RwLock::new(settings.token.clone())),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn set_token(&self, token: impl Into<String>) {
        *self.token.write().await = Some(token.into());
    }

    pub async fn has_token(&self) -> bool {
        self.token.read().await.is_some()
    }

    /// Autentica em `/api/auth/login` e guarda o token para as próximas chamadas
    pub async fn login(&self, email: &str, password: &str) -> Result<(), ApiError> {
        let url = format!("{}/api/auth/login", self.base_url);
        tracing::debug!("POST {} (login de {})", url, email);

        let response = self
            .http_client
            .post(&url)
            .json(&json!({ "email": email, "senha": password }))
            .send()
            .await?;

        let response = match Self::handle_response("/api/auth/login", response).await {
            Ok(response) => response,
            Err(ApiError::Status { status, message }) if status == 401 || status == 403 => {
                return Err(ApiError::Auth(message));
            }
            Err(e) => return Err(e),
        };

        let body: LoginResponse = response.json().await?;
        self.set_token(body.token).await;
        tracing::info!("🔑 Login na API do painel realizado ({})", email);
        Ok(())
    }

    pub async fn bulk_update(
        &self,
        group: EntityGroup,
        ids: &[String],
        updates: &FieldValue,
    ) -> Result<(), ApiError> {
        self.post(
            &format!("/api/{}/bulk-update", group),
            &json!({ "ids": ids, "updates": updates }),
        )
        .await
    }

    pub async fn bulk_delete(&self, group: EntityGroup, ids: &[String]) -> Result<(), ApiError> {
        self.post(&format!("/api/{}/bulk-delete", group), &json!({ "ids": ids }))
            .await
    }

    /// Recria registros excluídos a partir dos snapshots completos
    pub async fn bulk_restore(&self, group: EntityGroup, records: &[Value]) -> Result<(), ApiError> {
        self.post(
            &format!("/api/{}/bulk-restore", group),
            &json!({ "registros": records }),
        )
        .await
    }

    /// Arquivar é uma transição de status no backend; desfazer usa `bulk_update`
    pub async fn bulk_archive(&self, group: EntityGroup, ids: &[String]) -> Result<(), ApiError> {
        self.post(&format!("/api/{}/bulk-archive", group), &json!({ "ids": ids }))
            .await
    }

    /// Tabela de callbacks completa para um grupo de entidades
    pub fn callbacks(&self, group: EntityGroup) -> BulkCallbacks {
        let update = move |client: DashboardApiClient| {
            move |request: MutationRequest| {
                let client = client.clone();
                async move {
                    client.bulk_update(group, &request.ids, &request.updates).await?;
                    anyhow::Ok(())
                }
            }
        };

        let delete = {
            let client = self.clone();
            move |request: RecordRequest| {
                let client = client.clone();
                async move {
                    client.bulk_delete(group, &request.ids).await?;
                    anyhow::Ok(())
                }
            }
        };

        let restore = {
            let client = self.clone();
            move |request: RecordRequest| {
                let client = client.clone();
                async move {
                    let records: Vec<Value> = request
                        .previous_states
                        .iter()
                        .filter_map(|snapshot| snapshot.record_value().cloned())
                        .collect();
                    client.bulk_restore(group, &records).await?;
                    anyhow::Ok(())
                }
            }
        };

        let archive = {
            let client = self.clone();
            move |request: RecordRequest| {
                let client = client.clone();
                async move {
                    client.bulk_archive(group, &request.ids).await?;
                    anyhow::Ok(())
                }
            }
        };

        BulkCallbacks::new()
            .with_status_update(update(self.clone()))
            .with_tag_assignment(update(self.clone()))
            .with_owner_assignment(update(self.clone()))
            .with_deadline_update(update(self.clone()))
            .with_delete(delete, restore)
            .with_archive(archive)
    }

    async fn post(&self, endpoint: &str, body: &Value) -> Result<(), ApiError> {
        let url = format!("{}{}", self.base_url, endpoint);
        tracing::debug!("POST {} with body: {}", url, body);

        let mut request = self.http_client.post(&url).json(body);
        if let Some(token) = self.token.read().await.as_deref() {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            log_api_error(endpoint, None, &e.to_string());
            ApiError::from(e)
        })?;

        Self::handle_response(endpoint, response).await?;
        Ok(())
    }

    async fn handle_response(endpoint: &str, response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let status_code = status.as_u16();
        let error_body = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
        log_api_error(endpoint, Some(status_code), &error_body);

        // Tentar extrair mensagem de erro do JSON
        let message = serde_json::from_str::<Value>(&error_body)
            .ok()
            .and_then(|json| {
                json.get("error")
                    .or_else(|| json.get("message"))
                    .or_else(|| json.get("mensagem"))
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| error_body.chars().take(300).collect());

        Err(ApiError::Status {
            status: status_code,
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Contato, Processo};
    use crate::services::bulk::BulkOperationOrchestrator;
    use historico::{ActionHistoryStore, TracingNotifier};
    use httpmock::prelude::*;

    fn settings(base_url: String) -> ApiSettings {
        ApiSettings {
            base_url,
            timeout_seconds: 5,
            token: None,
            email: None,
            password: None,
        }
    }

    #[tokio::test]
    async fn test_login_stores_bearer_token() {
        let server = MockServer::start_async().await;
        let login = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/auth/login")
                    .json_body(json!({"email": "adv@escritorio.com", "senha": "123"}));
                then.status(200).json_body(json!({"token": "tok-1"}));
            })
            .await;
        let update = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/contatos/bulk-update")
                    .header("authorization", "Bearer tok-1");
                then.status(200).json_body(json!({"ok": true}));
            })
            .await;

        let client = DashboardApiClient::new(&settings(server.base_url())).unwrap();
        client.login("adv@escritorio.com", "123").await.unwrap();
        assert!(client.has_token().await);

        client
            .bulk_update(
                EntityGroup::Contatos,
                &["1".to_string()],
                &FieldValue::Status("qualificado".into()),
            )
            .await
            .unwrap();

        login.assert_async().await;
        update.assert_async().await;
    }

    #[tokio::test]
    async fn test_login_rejected_is_auth_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/auth/login");
                then.status(401).json_body(json!({"error": "Credenciais inválidas"}));
            })
            .await;

        let client = DashboardApiClient::new(&settings(server.base_url())).unwrap();
        let err = client.login("adv@escritorio.com", "errada").await.unwrap_err();

        assert!(matches!(err, ApiError::Auth(ref msg) if msg == "Credenciais inválidas"));
        assert!(!client.has_token().await);
    }

    #[tokio::test]
    async fn test_error_status_is_reported_with_message() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/processos/bulk-archive");
                then.status(422).json_body(json!({"message": "processo com prazo em aberto"}));
            })
            .await;

        let client = DashboardApiClient::new(&settings(format!("{}/", server.base_url()))).unwrap();
        let err = client
            .bulk_archive(EntityGroup::Processos, &["p1".to_string()])
            .await
            .unwrap_err();

        match err {
            ApiError::Status { status, message } => {
                assert_eq!(status, 422);
                assert_eq!(message, "processo com prazo em aberto");
            }
            other => panic!("erro inesperado: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_callbacks_drive_status_update_and_undo() {
        let server = MockServer::start_async().await;
        let forward = server
            .mock_async(|when, then| {
                when.method(POST).path("/api/contatos/bulk-update").json_body(json!({
                    "ids": ["1", "2"],
                    "updates": {"status": "qualificado"}
                }));
                then.status(200);
            })
            .await;
        let reverse = server
            .mock_async(|when, then| {
                when.method(POST).path("/api/contatos/bulk-update").json_body(json!({
                    "ids": ["1", "2"],
                    "updates": {"status": "novo"}
                }));
                then.status(200);
            })
            .await;

        let client = DashboardApiClient::new(&settings(server.base_url())).unwrap();
        let history = Arc::new(ActionHistoryStore::with_default_capacity(Arc::new(TracingNotifier)));
        let orchestrator: BulkOperationOrchestrator<Contato> =
            BulkOperationOrchestrator::new(history.clone(), client.callbacks(EntityGroup::Contatos));
        let seed = vec![Contato::new("1", "Ana", "novo"), Contato::new("2", "Bruno", "novo")];

        orchestrator.bulk_status_update(&seed, "qualificado").await.unwrap();
        assert!(history.undo().await.is_applied());

        forward.assert_async().await;
        reverse.assert_async().await;
    }

    #[tokio::test]
    async fn test_delete_undo_posts_full_records_to_restore() {
        let server = MockServer::start_async().await;
        let delete = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/contatos/bulk-delete")
                    .json_body(json!({"ids": ["9"]}));
                then.status(204);
            })
            .await;
        let restore = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/contatos/bulk-restore")
                    .body_contains("\"nome\":\"Carla\"");
                then.status(200);
            })
            .await;

        let client = DashboardApiClient::new(&settings(server.base_url())).unwrap();
        let history = Arc::new(ActionHistoryStore::with_default_capacity(Arc::new(TracingNotifier)));
        let orchestrator: BulkOperationOrchestrator<Contato> =
            BulkOperationOrchestrator::new(history.clone(), client.callbacks(EntityGroup::Contatos));

        orchestrator
            .bulk_delete(&[Contato::new("9", "Carla", "perdido")])
            .await
            .unwrap();
        assert!(history.undo().await.is_applied());

        delete.assert_async().await;
        restore.assert_async().await;
    }

    #[tokio::test]
    async fn test_archive_undo_restores_status_through_bulk_update() {
        let server = MockServer::start_async().await;
        let archive = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/processos/bulk-archive")
                    .json_body(json!({"ids": ["p1", "p2"]}));
                then.status(200);
            })
            .await;
        let restore_ativo = server
            .mock_async(|when, then| {
                when.method(POST).path("/api/processos/bulk-update").json_body(json!({
                    "ids": ["p1"],
                    "updates": {"status": "ativo"}
                }));
                then.status(200);
            })
            .await;
        let restore_suspenso = server
            .mock_async(|when, then| {
                when.method(POST).path("/api/processos/bulk-update").json_body(json!({
                    "ids": ["p2"],
                    "updates": {"status": "suspenso"}
                }));
                then.status(200);
            })
            .await;

        let client = DashboardApiClient::new(&settings(server.base_url())).unwrap();
        let history = Arc::new(ActionHistoryStore::with_default_capacity(Arc::new(TracingNotifier)));
        let orchestrator: BulkOperationOrchestrator<Processo> =
            BulkOperationOrchestrator::new(history.clone(), client.callbacks(EntityGroup::Processos));
        let seed = vec![
            Processo::new("p1", "0001234-56.2024.8.26.0100", "ativo"),
            Processo::new("p2", "0007654-32.2023.8.26.0100", "suspenso"),
        ];

        let entry = orchestrator.bulk_archive(&seed).await.unwrap();
        assert!(entry.reversible);
        assert!(history.undo().await.is_applied());

        archive.assert_async().await;
        restore_ativo.assert_async().await;
        restore_suspenso.assert_async().await;
    }

    #[tokio::test]
    async fn test_failed_mutation_is_not_recorded() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/contatos/bulk-update");
                then.status(500).body("boom");
            })
            .await;

        let client = DashboardApiClient::new(&settings(server.base_url())).unwrap();
        let history = Arc::new(ActionHistoryStore::with_default_capacity(Arc::new(TracingNotifier)));
        let orchestrator: BulkOperationOrchestrator<Contato> =
            BulkOperationOrchestrator::new(history.clone(), client.callbacks(EntityGroup::Contatos));

        let err = orchestrator
            .bulk_owner_assignment(&[Contato::new("1", "Ana", "novo")], Some("Dr. Paulo".into()))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("status 500"));
        assert!(history.is_empty().await);
        assert!(orchestrator.last_error().await.is_some());
    }
}
