/// Middleware de autenticação para as rotas do painel
///
/// Valida o header `X-Dashboard-Key` contra `auth.dashboard_key` da configuração.
/// Operações em massa e desfazer/refazer alteram dados de clientes, então
/// em produção a chave é obrigatória.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::AppState;

pub const DASHBOARD_KEY_HEADER: &str = "X-Dashboard-Key";

/// # Respostas
///
/// - Chave válida: segue para o handler
/// - **401 Unauthorized**: chave ausente ou inválida
/// - **503 Service Unavailable**: chave não configurada em produção
///
/// Em desenvolvimento, sem chave configurada, o acesso é liberado (warning no log).
pub async fn require_dashboard_key(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    let provided_key = headers
        .get(DASHBOARD_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    let expected_key = state.settings.auth.dashboard_key.as_deref();

    match (expected_key, provided_key, state.settings.is_production()) {
        (Some(expected), Some(provided), _) if expected == provided => {
            tracing::debug!("✅ Acesso ao painel liberado");
            Ok(next.run(request).await)
        }

        (Some(_), provided, _) => {
            tracing::warn!(
                "❌ Acesso negado - X-Dashboard-Key inválido ou ausente: {:?}",
                provided.map(|_| "<redacted>")
            );
            Err(unauthorized_response())
        }

        (None, _, false) => {
            tracing::warn!(
                "⚠️  auth.dashboard_key não configurado - acesso liberado em desenvolvimento"
            );
            Ok(next.run(request).await)
        }

        (None, _, true) => {
            tracing::error!("🚨 auth.dashboard_key não configurado em produção! Bloqueando acesso.");
            Err(service_unavailable_response())
        }
    }
}

fn unauthorized_response() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": "Unauthorized",
            "message": "Missing or invalid X-Dashboard-Key header",
        })),
    )
        .into_response()
}

fn service_unavailable_response() -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({
            "error": "Service Unavailable",
            "message": "Dashboard key not configured on server",
        })),
    )
        .into_response()
}
