use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Parsing and validation are decoupled from the process environment so tests
/// can drive them with a `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let database_url = require("DATABASE_URL")?;
    let alpha_vantage_api_key = require("ALPHA_VANTAGE_API_KEY")?;
    let alpha_vantage_base_url = or_default(
        "ALPHA_VANTAGE_BASE_URL",
        "https://www.alphavantage.co/query",
    );

    let env = parse_environment(&or_default("ASXDB_ENV", "development"))?;

    let bind_addr = parse("ASXDB_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("ASXDB_LOG_LEVEL", "info");
    let roster_path = PathBuf::from(or_default("ASXDB_ROSTER_PATH", "./config/companies.yaml"));
    let symbol_suffix = or_default("ASXDB_SYMBOL_SUFFIX", ".AX");

    let db_max_connections = parse_u32("ASXDB_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("ASXDB_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("ASXDB_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let provider_request_timeout_secs = parse_u64("ASXDB_PROVIDER_REQUEST_TIMEOUT_SECS", "30")?;
    let provider_user_agent = or_default(
        "ASXDB_PROVIDER_USER_AGENT",
        "asxdb/0.1 (financial-statements)",
    );

    let scrape_cron = or_default("ASXDB_SCRAPE_CRON", "0 */10 * * * *");
    if scrape_cron.split_whitespace().count() < 6 {
        return Err(ConfigError::InvalidEnvVar {
            var: "ASXDB_SCRAPE_CRON".to_string(),
            reason: format!("expected a 6-field cron expression (with seconds), got \"{scrape_cron}\""),
        });
    }
    let scrape_lock_wait_ms = parse_u64("ASXDB_SCRAPE_LOCK_WAIT_MS", "1000")?;
    let force_rewind_days = parse_u32("ASXDB_FORCE_REWIND_DAYS", "365")?;

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        roster_path,
        alpha_vantage_api_key,
        alpha_vantage_base_url,
        symbol_suffix,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        provider_request_timeout_secs,
        provider_user_agent,
        scrape_cron,
        scrape_lock_wait_ms,
        force_rewind_days,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEnvVar`] for anything other than
/// `development`, `test` or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "ASXDB_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
