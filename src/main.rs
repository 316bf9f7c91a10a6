/// Painel Jurídico: API de operações em massa com desfazer/refazer
///
/// Arquitetura:
/// - Front-end envia a seleção da tabela (contatos ou processos)
/// - Orquestrador captura o estado anterior e chama a API do painel
/// - Cada operação bem-sucedida entra no histórico da sessão
/// - Desfazer/refazer reaplicam as mutações pela mesma API

use std::sync::Arc;

use historico::EntityGroup;
use tokio::net::TcpListener;

use painel_juridico::config::Settings;
use painel_juridico::handlers;
use painel_juridico::services::DashboardApiClient;
use painel_juridico::utils::logging::*;
use painel_juridico::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env é opcional em produção
    dotenvy::dotenv().ok();

    init_tracing();

    let settings = Settings::new()?;
    log_config_loaded(&settings.environment);

    let api = DashboardApiClient::new(&settings.api)?;
    if !api.has_token().await {
        match (&settings.api.email, &settings.api.password) {
            (Some(email), Some(password)) => api.login(email, password).await?,
            _ => log_warning(
                "⚠️  API do painel sem token nem credenciais - chamadas seguirão sem autenticação",
            ),
        }
    }
    log_info(&format!("✅ API do painel: {}", api.base_url()));

    let state = Arc::new(AppState::new(
        settings.clone(),
        api.callbacks(EntityGroup::Contatos),
        api.callbacks(EntityGroup::Processos),
    ));
    log_info(&format!(
        "📚 Histórico de ações com capacidade {}",
        state.history.max_history_size()
    ));

    let app = handlers::router(state);

    // No Cloud Run, usar a variável de ambiente PORT
    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(settings.server.port);
    let listener = TcpListener::bind(format!("{}:{}", settings.server.host, port)).await?;

    log_server_startup(port);
    log_server_ready(port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log_info("🛑 Server shut down gracefully");
    Ok(())
}

/// Signal handler para graceful shutdown
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log_error(&format!("Falha ao instalar handler de Ctrl+C: {}", e));
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log_error(&format!("Falha ao instalar handler de SIGTERM: {}", e));
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            log_info("🛑 Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            log_info("🛑 Received SIGTERM, shutting down gracefully...");
        }
    }
}
