//! Company roster types and the `companies.yaml` roster file.

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ConfigError, CoreError};

/// `last_refreshed` given to companies that have never been scraped.
///
/// The Unix epoch sorts ahead of every real refresh time, so newly listed
/// companies are picked up before any previously refreshed one.
pub const NEVER_REFRESHED: DateTime<Utc> = DateTime::<Utc>::UNIX_EPOCH;

const MAX_CODE_LEN: usize = 6;

/// A company on the roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub code: String,
    pub name: String,
    pub industry: String,
    pub last_refreshed: DateTime<Utc>,
    pub is_active: bool,
}

/// Trim and uppercase a company code, rejecting anything that is not 1-6
/// ASCII alphanumerics.
///
/// # Errors
///
/// Returns [`CoreError::InvalidCompanyCode`] when the normalized code is empty,
/// too long, or contains other characters.
pub fn normalize_code(raw: &str) -> Result<String, CoreError> {
    let code = raw.trim().to_ascii_uppercase();
    let valid = !code.is_empty()
        && code.len() <= MAX_CODE_LEN
        && code.chars().all(|c| c.is_ascii_alphanumeric());
    if valid {
        Ok(code)
    } else {
        Err(CoreError::InvalidCompanyCode(raw.to_string()))
    }
}

/// One entry of the roster file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyConfig {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub industry: String,
}

#[derive(Debug, Deserialize)]
pub struct RosterFile {
    pub companies: Vec<CompanyConfig>,
}

/// Load, normalize and validate the roster from a YAML file.
///
/// Company codes are normalized in place (see [`normalize_code`]).
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_roster(path: &Path) -> Result<RosterFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::RosterFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let mut roster: RosterFile = serde_yaml::from_str(&content)?;
    normalize_roster(&mut roster)?;

    Ok(roster)
}

fn normalize_roster(roster: &mut RosterFile) -> Result<(), ConfigError> {
    let mut seen_codes = HashSet::new();

    for company in &mut roster.companies {
        company.code = normalize_code(&company.code)
            .map_err(|e| ConfigError::Validation(e.to_string()))?;
        company.name = company.name.trim().to_string();
        company.industry = company.industry.trim().to_string();

        if company.name.is_empty() {
            return Err(ConfigError::Validation(format!(
                "company '{}' must have a non-empty name",
                company.code
            )));
        }

        if !seen_codes.insert(company.code.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate company code: '{}'",
                company.code
            )));
        }
    }

    Ok(())
}
