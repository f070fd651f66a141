pub mod app_config;
pub mod companies;
pub mod config;
pub mod statements;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use companies::{
    load_roster, normalize_code, Company, CompanyConfig, RosterFile, NEVER_REFRESHED,
};
pub use config::{load_app_config, load_app_config_from_env};
pub use statements::{
    BalanceSheet, CashFlowStatement, IncomeStatement, Statement, StatementKind, StatementType,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read roster file {path}: {source}")]
    RosterFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse roster file: {0}")]
    RosterFileParse(#[from] serde_yaml::Error),

    #[error("roster validation failed: {0}")]
    Validation(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid company code \"{0}\": expected 1-6 ASCII letters or digits")]
    InvalidCompanyCode(String),

    #[error("unknown statement type: {0}")]
    UnknownStatementType(String),
}
