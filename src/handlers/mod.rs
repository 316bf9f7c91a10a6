pub mod bulk;
pub mod health;
pub mod history;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::middleware::require_dashboard_key;
use crate::models::{BulkEntity, Contato, Processo};
use crate::AppState;

pub use health::health_check;

/// Monta o router completo do painel
///
/// `/health` é público; histórico, notificações e operações em massa passam
/// pela validação do `X-Dashboard-Key`.
pub fn router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route(
            "/historico",
            get(history::get_history).delete(history::clear_history),
        )
        .route("/historico/desfazer", post(history::undo))
        .route("/historico/refazer", post(history::redo))
        .route("/notificacoes", get(history::drain_notifications))
        .merge(bulk_routes::<Contato>())
        .merge(bulk_routes::<Processo>())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_dashboard_key,
        ));

    Router::new()
        .route("/health", get(health_check))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn bulk_routes<E>() -> Router<Arc<AppState>>
where
    E: BulkEntity + serde::de::DeserializeOwned + 'static,
    AppState: bulk::OrchestratorFor<E>,
{
    let base = format!("/{}/bulk", E::GROUP);

    Router::new()
        .route(&format!("{}/status", base), post(bulk::bulk_status::<E>))
        .route(&format!("{}/excluir", base), post(bulk::bulk_delete::<E>))
        .route(&format!("{}/tags", base), post(bulk::bulk_tags::<E>))
        .route(&format!("{}/responsavel", base), post(bulk::bulk_owner::<E>))
        .route(&format!("{}/prazo", base), post(bulk::bulk_deadline::<E>))
        .route(&format!("{}/arquivar", base), post(bulk::bulk_archive::<E>))
        .route(&format!("{}/estado", base), get(bulk::run_state::<E>))
}
