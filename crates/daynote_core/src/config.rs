//! Application configuration from environment variables.
//!
//! # Responsibility
//! - Resolve every runtime setting with a documented default.
//! - Reject malformed values with the offending variable named.
//!
//! # Invariants
//! - `log_dir` is always absolute.
//! - `session_ttl` is never zero.

use crate::logging::{default_log_level, normalize_level};
use crate::service::todo_workflow::DeleteNoticePolicy;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_DB_PATH: &str = "DAYNOTE_DB_PATH";
pub const ENV_BIND: &str = "DAYNOTE_BIND";
pub const ENV_LOG_LEVEL: &str = "DAYNOTE_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "DAYNOTE_LOG_DIR";
pub const ENV_SESSION_TTL_SECS: &str = "DAYNOTE_SESSION_TTL_SECS";
pub const ENV_DELETE_NOTICE: &str = "DAYNOTE_DELETE_NOTICE";

const DEFAULT_DB_FILE_NAME: &str = "daynote.sqlite3";
const DEFAULT_LOG_DIR_NAME: &str = "daynote-logs";
const DEFAULT_BIND: &str = "127.0.0.1:8080";
const DEFAULT_SESSION_TTL_SECS: u64 = 14 * 24 * 60 * 60;

/// Invalid configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
    pub reason: String,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid {}=`{}`: {}", self.var, self.value, self.reason)
    }
}

impl Error for ConfigError {}

/// Resolved runtime settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    /// `host:port` the HTTP server binds to.
    pub bind: String,
    pub log_level: &'static str,
    pub log_dir: PathBuf,
    pub session_ttl: Duration,
    pub delete_notice: DeleteNoticePolicy,
}

impl Default for AppConfig {
    fn default() -> Self {
        let temp = std::env::temp_dir();
        Self {
            db_path: temp.join(DEFAULT_DB_FILE_NAME),
            bind: DEFAULT_BIND.to_string(),
            log_level: default_log_level(),
            log_dir: temp.join(DEFAULT_LOG_DIR_NAME),
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
            delete_notice: DeleteNoticePolicy::default(),
        }
    }
}

impl AppConfig {
    /// Reads settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let mut config = Self::default();

        if let Some(path) = get(ENV_DB_PATH) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(bind) = get(ENV_BIND) {
            if !bind.contains(':') {
                return Err(invalid(ENV_BIND, bind, "expected host:port"));
            }
            config.bind = bind;
        }
        if let Some(level) = get(ENV_LOG_LEVEL) {
            config.log_level =
                normalize_level(&level).map_err(|err| invalid(ENV_LOG_LEVEL, level, err))?;
        }
        if let Some(dir) = get(ENV_LOG_DIR) {
            let path = PathBuf::from(&dir);
            if !path.is_absolute() {
                return Err(invalid(ENV_LOG_DIR, dir, "must be an absolute path"));
            }
            config.log_dir = path;
        }
        if let Some(ttl) = get(ENV_SESSION_TTL_SECS) {
            let secs = match ttl.parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => return Err(invalid(ENV_SESSION_TTL_SECS, ttl, "expected positive seconds")),
            };
            config.session_ttl = Duration::from_secs(secs);
        }
        if let Some(policy) = get(ENV_DELETE_NOTICE) {
            config.delete_notice = DeleteNoticePolicy::parse(&policy).ok_or_else(|| {
                invalid(
                    ENV_DELETE_NOTICE,
                    policy.clone(),
                    "expected after_success|before_authorization",
                )
            })?;
        }

        Ok(config)
    }
}

fn invalid(var: &'static str, value: String, reason: impl ToString) -> ConfigError {
    ConfigError {
        var,
        value,
        reason: reason.to_string(),
    }
}
