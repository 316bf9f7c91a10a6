use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat};
use config::builder::DefaultState;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub api: ApiSettings,
    pub history: HistorySettings,
    #[serde(default)]
    pub auth: AuthSettings,
    /// development | production
    pub environment: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// API REST do painel (backend que persiste contatos e processos)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub timeout_seconds: u64,
    pub token: Option<String>,  // Token fixo (opcional; senão usa login)
    pub email: Option<String>,  // Credenciais para /api/auth/login
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HistorySettings {
    pub max_size: usize,
    pub notification_feed_size: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct AuthSettings {
    pub dashboard_key: Option<String>,  // Valor esperado no header X-Dashboard-Key
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let mut builder = Self::defaults()?
            // Arquivo de configuração base
            .add_source(File::with_name("config/default").required(false))
            // Arquivo específico do ambiente
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false));

        // Variáveis de ambiente usadas no deploy
        if let Ok(url) = std::env::var("DASHBOARD_API_URL") {
            builder = builder.set_override("api.base_url", url)?;
        }
        if let Ok(token) = std::env::var("DASHBOARD_API_TOKEN") {
            builder = builder.set_override("api.token", token)?;
        }
        if let Ok(key) = std::env::var("DASHBOARD_KEY") {
            builder = builder.set_override("auth.dashboard_key", key)?;
        }
        if let Ok(env) = std::env::var("RUST_ENV") {
            builder = builder.set_override("environment", env)?;
        }

        builder = builder.add_source(Environment::with_prefix("PAINEL").separator("__"));

        builder.build()?.try_deserialize()
    }

    /// Carrega a partir de um TOML em memória sobre os valores padrão
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        Self::defaults()?
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("environment", "development")?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("api.base_url", "http://localhost:3333")?
            .set_default("api.timeout_seconds", 15)?
            .set_default("history.max_size", historico::DEFAULT_MAX_HISTORY_SIZE as u64)?
            .set_default("history.notification_feed_size", 100)
    }
}
