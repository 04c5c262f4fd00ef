//! Daemon configuration from environment variables

use anyhow::{anyhow, Result};
use ezyq_api_rpc::{RateLimitConfig, RpcServerConfig, DEFAULT_RPC_HOST, DEFAULT_RPC_PORT};
use ezyq_core::port::MaintenanceConfig;
use std::str::FromStr;

const DEFAULT_DB_PATH: &str = "~/.ezyq/ezyq.db";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// Tilde-expanded SQLite file path
    pub db_path: String,
    pub rpc: RpcServerConfig,
    pub log_format: LogFormat,
    pub maintenance: MaintenanceConfig,
    pub maintenance_interval_hours: u64,
}

impl DaemonConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys take defaults, unparsable ones fail
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let db_path = lookup("EZYQ_DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string());

        let log_format = match lookup("EZYQ_LOG_FORMAT").as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(anyhow!(
                    "Invalid EZYQ_LOG_FORMAT {:?} (expected pretty or json)",
                    other
                ))
            }
        };

        let defaults = MaintenanceConfig::default();
        let rate_defaults = RateLimitConfig::default();

        Ok(Self {
            db_path: shellexpand::tilde(&db_path).into_owned(),
            rpc: RpcServerConfig {
                host: lookup("EZYQ_RPC_HOST").unwrap_or_else(|| DEFAULT_RPC_HOST.to_string()),
                port: parse_or(&lookup, "EZYQ_RPC_PORT", DEFAULT_RPC_PORT)?,
                rate_limit: RateLimitConfig {
                    burst: parse_or(&lookup, "EZYQ_RATE_LIMIT_BURST", rate_defaults.burst)?,
                    rate_per_sec: parse_or(
                        &lookup,
                        "EZYQ_RATE_LIMIT_RATE",
                        rate_defaults.rate_per_sec,
                    )?,
                },
            },
            log_format,
            maintenance: MaintenanceConfig {
                terminal_entry_retention_days: parse_or(
                    &lookup,
                    "EZYQ_TERMINAL_RETENTION_DAYS",
                    defaults.terminal_entry_retention_days,
                )?,
                ..defaults
            },
            maintenance_interval_hours: parse_or(&lookup, "EZYQ_MAINTENANCE_INTERVAL_HOURS", 24)?,
        })
    }

    /// sqlx connection url for the database file
    pub fn database_url(&self) -> String {
        format!("sqlite://{}", self.db_path)
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("Invalid {} {:?}: {}", key, raw, e)),
    }
}
