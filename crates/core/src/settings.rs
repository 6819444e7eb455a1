//! Runtime configuration assembled from the environment.
//!
//! Everything the jobs need is collected into an explicit [`Settings`] value
//! at startup and passed into constructors; nothing reads the environment
//! after that except the per-job tuning helpers, which jobs call while
//! building their own parameter structs.

use std::env;
use std::path::PathBuf;

use chrono::NaiveDate;

use crate::errors::{Error, Result};

pub const DEFAULT_UPSTREAM_BASE_URL: &str =
    "https://api-gateway-eu.salonware.com/third-party-api-server/api";

/// Name + upstream identifier of one physical branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchConfig {
    pub name: String,
    pub branch_id: String,
}

/// Credentials and addressing for the upstream third-party API.
#[derive(Debug, Clone)]
pub struct UpstreamSettings {
    pub base_url: String,
    pub business: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub sandbox_database_url: Option<String>,
    pub sandbox_mode: bool,
    pub upstream: UpstreamSettings,
    pub branches: Vec<BranchConfig>,
    pub export_dir: PathBuf,
    pub auto_migrate: bool,
}

impl Settings {
    /// Build the settings from the process environment, validating the
    /// mandatory variables. Call after `dotenvy::dotenv()`.
    pub fn from_env() -> Result<Self> {
        let settings = Settings {
            database_url: required("DATABASE_URL")?,
            sandbox_database_url: optional("SANDBOX_DATABASE_URL"),
            sandbox_mode: bool_env("SANDBOX_MODE", false),
            upstream: UpstreamSettings {
                base_url: optional("UPSTREAM_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_UPSTREAM_BASE_URL.to_string()),
                business: required("UPSTREAM_BUSINESS")?,
                username: required("UPSTREAM_USERNAME")?,
                password: required("UPSTREAM_PASSWORD")?,
            },
            branches: branch_roster()?,
            export_dir: PathBuf::from(
                optional("EXPORT_DIR").unwrap_or_else(|| "data/exports".to_string()),
            ),
            auto_migrate: flag("AUTO_MIGRATE"),
        };
        Ok(settings)
    }

    /// The DSN the invocation should use, honouring sandbox mode.
    pub fn active_database_url(&self) -> Result<&str> {
        if self.sandbox_mode {
            return match self.sandbox_database_url.as_deref() {
                Some(url) if !url.trim().is_empty() => Ok(url),
                _ => Err(Error::config(
                    "SANDBOX_MODE is enabled but SANDBOX_DATABASE_URL is empty",
                )),
            };
        }
        if self.database_url.trim().is_empty() {
            return Err(Error::config("DATABASE_URL is empty"));
        }
        Ok(&self.database_url)
    }

    /// Purchasing branch for stock reconciliation. Explicit override first,
    /// then the second roster slot (the deployment this mirrors keeps the
    /// purchasing site there).
    pub fn reconcile_pk_branch_id(&self) -> Result<String> {
        if let Some(id) = optional("STOCK_RECONCILE_PK_BRANCH_ID") {
            return Ok(id);
        }
        self.branches
            .get(1)
            .map(|b| b.branch_id.clone())
            .ok_or_else(|| {
                Error::config("STOCK_RECONCILE_PK_BRANCH_ID is not set and no SITE_2 branch exists")
            })
    }
}

/// Collect the `SITE_{N}_BRANCH_ID` / `SITE_{N}_NAME` roster. Slots must be
/// contiguous starting at 1; the first missing branch id ends the roster.
fn branch_roster() -> Result<Vec<BranchConfig>> {
    let mut branches = Vec::new();
    for n in 1.. {
        let Some(branch_id) = optional(&format!("SITE_{n}_BRANCH_ID")) else {
            break;
        };
        let name = optional(&format!("SITE_{n}_NAME")).unwrap_or_else(|| format!("SITE_{n}"));
        branches.push(BranchConfig { name, branch_id });
    }
    if branches.is_empty() {
        return Err(Error::config(
            "no branches configured: SITE_1_BRANCH_ID is required",
        ));
    }
    Ok(branches)
}

fn required(key: &str) -> Result<String> {
    optional(key).ok_or_else(|| Error::Config(format!("environment variable {key} is required")))
}

fn optional(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Optional non-empty string from the environment.
pub fn str_env(key: &str) -> Option<String> {
    optional(key)
}

/// `1` means on; anything else (including unset) means off.
pub fn flag(key: &str) -> bool {
    matches!(env::var(key).as_deref(), Ok("1"))
}

/// Positive integer from the environment, falling back to `default` when
/// unset, unparsable or non-positive.
pub fn int_env(key: &str, default: i64) -> i64 {
    match optional(key).map(|raw| raw.parse::<i64>()) {
        Some(Ok(n)) if n > 0 => n,
        _ => default,
    }
}

/// Boolean from the environment with an explicit default.
pub fn bool_env(key: &str, default: bool) -> bool {
    match optional(key) {
        Some(raw) => parse_bool(&raw).unwrap_or(default),
        None => default,
    }
}

/// Optional `YYYY-MM-DD` date; unset is `None`, malformed is a config error.
pub fn date_env(key: &str) -> Result<Option<NaiveDate>> {
    match optional(key) {
        None => Ok(None),
        Some(raw) => parse_date(&raw)
            .map(Some)
            .ok_or_else(|| Error::Config(format!("invalid {key} (want YYYY-MM-DD): {raw}"))),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "f" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}
