/// Middleware layer para o Axum router
///
/// - Autenticação das rotas do painel (X-Dashboard-Key)

pub mod dashboard_auth;

pub use dashboard_auth::require_dashboard_key;
