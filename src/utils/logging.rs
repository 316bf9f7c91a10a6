use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// Inicializa o subscriber global; `RUST_LOG` controla o filtro (padrão: info)
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    // try_init: em testes o subscriber pode já ter sido instalado
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

pub fn log_request_received(endpoint: &str, method: &str) {
    info!("Request received: {} {}", method, endpoint);
}

pub fn log_bulk_operation_done(group: &str, operation: &str, count: usize) {
    info!("✅ Operação em massa concluída: {} em {} {}", operation, count, group);
}

pub fn log_bulk_operation_failed(group: &str, operation: &str, error: &str) {
    error!("❌ Operação em massa falhou: {} em {} - Error: {}", operation, group, error);
}

pub fn log_api_error(endpoint: &str, status: Option<u16>, error: &str) {
    error!("Dashboard API error: {} - Status: {:?} - Error: {}", endpoint, status, error);
}

pub fn log_config_loaded(env: &str) {
    info!("Configuration loaded successfully for environment: {}", env);
}

pub fn log_server_startup(port: u16) {
    info!("🚀 Painel jurídico server starting on port {}", port);
}

pub fn log_server_ready(port: u16) {
    info!("✅ Server ready and listening on http://0.0.0.0:{}", port);
}

pub fn log_health_check() {
    debug!("Health check requested");
}

pub fn log_info(message: &str) {
    info!("{}", message);
}

pub fn log_error(message: &str) {
    error!("{}", message);
}

pub fn log_warning(message: &str) {
    warn!("{}", message);
}
