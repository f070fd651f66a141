use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub roster_path: PathBuf,
    pub alpha_vantage_api_key: String,
    pub alpha_vantage_base_url: String,
    pub symbol_suffix: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub provider_request_timeout_secs: u64,
    pub provider_user_agent: String,
    pub scrape_cron: String,
    pub scrape_lock_wait_ms: u64,
    pub force_rewind_days: u32,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("roster_path", &self.roster_path)
            .field("database_url", &"[redacted]")
            .field("alpha_vantage_api_key", &"[redacted]")
            .field("alpha_vantage_base_url", &self.alpha_vantage_base_url)
            .field("symbol_suffix", &self.symbol_suffix)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field(
                "provider_request_timeout_secs",
                &self.provider_request_timeout_secs,
            )
            .field("provider_user_agent", &self.provider_user_agent)
            .field("scrape_cron", &self.scrape_cron)
            .field("scrape_lock_wait_ms", &self.scrape_lock_wait_ms)
            .field("force_rewind_days", &self.force_rewind_days)
            .finish()
    }
}
