// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment once at startup. Missing
//! authentication configuration aborts startup: running with a partial auth
//! setup is worse than not starting.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `AUTH_DOMAIN` | Identity-provider domain (issuer + JWKS discovery) | Required |
//! | `AUTH_AUDIENCE` | Expected JWT audience; also the permissions-claim namespace | Required |
//! | `AUTH_ROLES_CLAIM` | Fully-qualified roles claim key | `{AUTH_AUDIENCE}/roles` |
//! | `SYNC_SERVICE_SECRET` | Shared secret for the identity-provider sync callback | Required, non-empty |
//! | `AUTH_DEV_MODE` | `true` disables signature verification (development only) | `false` |
//! | `DATA_DIR` | Directory holding the embedded database | `./data` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `AUDIT_PERSISTENCE` | `durable` or `console` | `console` |
//! | `AUDIT_QUEUE_CAPACITY` | Bounded audit queue size | `1024` |
//! | `AUDIT_DROP_POLICY` | `oldest` or `newest` on full queue | `oldest` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::env;
use std::path::PathBuf;

/// Configuration loading error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("environment variable {0} must not be empty")]
    Empty(&'static str),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// What to do with new audit entries when the queue is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditDropPolicy {
    /// Evict the oldest queued entry to make room for the new one.
    DropOldest,
    /// Discard the new entry, keep what is already queued.
    DropNewest,
}

/// Where finished audit entries go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditPersistence {
    /// Write entries to the embedded database.
    Durable,
    /// Log entries to the console only (development).
    Console,
}

/// Audit subsystem configuration.
#[derive(Debug, Clone)]
pub struct AuditConfig {
    pub persistence: AuditPersistence,
    pub queue_capacity: usize,
    pub drop_policy: AuditDropPolicy,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            persistence: AuditPersistence::Console,
            queue_capacity: 1024,
            drop_policy: AuditDropPolicy::DropOldest,
        }
    }
}

/// Process-wide application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Identity-provider domain, e.g. `tenant.us.auth0.com`.
    pub auth_domain: String,
    /// Expected token audience; doubles as the permissions-claim namespace.
    pub audience: String,
    /// Fully-qualified roles claim key.
    pub roles_claim: String,
    /// Shared secret guarding `POST /users/sync`.
    pub sync_secret: String,
    /// Decode tokens without signature verification. Development only.
    pub dev_mode: bool,
    /// Directory holding the embedded database file.
    pub data_dir: PathBuf,
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Audit subsystem settings.
    pub audit: AuditConfig,
}

impl AppConfig {
    /// Expected JWT issuer.
    pub fn issuer(&self) -> String {
        format!("https://{}/", self.auth_domain)
    }

    /// JWKS discovery URL for the configured domain.
    pub fn jwks_url(&self) -> String {
        format!("https://{}/.well-known/jwks.json", self.auth_domain)
    }

    /// Namespaced permissions claim key.
    pub fn permissions_claim(&self) -> String {
        format!("{}/permissions", self.audience)
    }

    /// Path of the embedded database file.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("finance.redb")
    }

    /// Load configuration from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let auth_domain = required("AUTH_DOMAIN")?;
        let audience = required("AUTH_AUDIENCE")?;
        let sync_secret = required("SYNC_SERVICE_SECRET")?;

        let roles_claim =
            env::var("AUTH_ROLES_CLAIM").unwrap_or_else(|_| format!("{audience}/roles"));

        let dev_mode = env::var("AUTH_DEV_MODE")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let data_dir = env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data"));

        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = match env::var("PORT") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value: raw,
            })?,
            Err(_) => 8080,
        };

        Ok(Self {
            auth_domain,
            audience,
            roles_claim,
            sync_secret,
            dev_mode,
            data_dir,
            host,
            port,
            audit: audit_from_env()?,
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    let value = env::var(name).map_err(|_| ConfigError::Missing(name))?;
    if value.trim().is_empty() {
        return Err(ConfigError::Empty(name));
    }
    Ok(value)
}

fn audit_from_env() -> Result<AuditConfig, ConfigError> {
    let persistence = match env::var("AUDIT_PERSISTENCE").as_deref() {
        Ok("durable") => AuditPersistence::Durable,
        Ok("console") | Err(_) => AuditPersistence::Console,
        Ok(other) => {
            return Err(ConfigError::Invalid {
                name: "AUDIT_PERSISTENCE",
                value: other.to_string(),
            })
        }
    };

    let queue_capacity = match env::var("AUDIT_QUEUE_CAPACITY") {
        Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
            name: "AUDIT_QUEUE_CAPACITY",
            value: raw,
        })?,
        Err(_) => 1024,
    };

    let drop_policy = match env::var("AUDIT_DROP_POLICY").as_deref() {
        Ok("newest") => AuditDropPolicy::DropNewest,
        Ok("oldest") | Err(_) => AuditDropPolicy::DropOldest,
        Ok(other) => {
            return Err(ConfigError::Invalid {
                name: "AUDIT_DROP_POLICY",
                value: other.to_string(),
            })
        }
    };

    Ok(AuditConfig {
        persistence,
        queue_capacity,
        drop_policy,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // Env-var tests mutate process state; keep them serialized on one lock.
    static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

    fn with_clean_env<F: FnOnce()>(f: F) {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        for name in [
            "AUTH_DOMAIN",
            "AUTH_AUDIENCE",
            "AUTH_ROLES_CLAIM",
            "SYNC_SERVICE_SECRET",
            "AUTH_DEV_MODE",
            "AUDIT_PERSISTENCE",
            "AUDIT_QUEUE_CAPACITY",
            "AUDIT_DROP_POLICY",
            "PORT",
        ] {
            std::env::remove_var(name);
        }
        f();
    }

    #[test]
    fn missing_domain_fails() {
        with_clean_env(|| {
            std::env::set_var("AUTH_AUDIENCE", "https://api.example.com");
            std::env::set_var("SYNC_SERVICE_SECRET", "s3cret");
            let err = AppConfig::from_env().unwrap_err();
            assert!(matches!(err, ConfigError::Missing("AUTH_DOMAIN")));
        });
    }

    #[test]
    fn empty_secret_fails() {
        with_clean_env(|| {
            std::env::set_var("AUTH_DOMAIN", "tenant.auth.example.com");
            std::env::set_var("AUTH_AUDIENCE", "https://api.example.com");
            std::env::set_var("SYNC_SERVICE_SECRET", "  ");
            let err = AppConfig::from_env().unwrap_err();
            assert!(matches!(err, ConfigError::Empty("SYNC_SERVICE_SECRET")));
        });
    }

    #[test]
    fn derived_claim_keys_and_defaults() {
        with_clean_env(|| {
            std::env::set_var("AUTH_DOMAIN", "tenant.auth.example.com");
            std::env::set_var("AUTH_AUDIENCE", "https://api.example.com");
            std::env::set_var("SYNC_SERVICE_SECRET", "s3cret");

            let config = AppConfig::from_env().unwrap();
            assert_eq!(config.issuer(), "https://tenant.auth.example.com/");
            assert_eq!(
                config.jwks_url(),
                "https://tenant.auth.example.com/.well-known/jwks.json"
            );
            assert_eq!(
                config.permissions_claim(),
                "https://api.example.com/permissions"
            );
            assert_eq!(config.roles_claim, "https://api.example.com/roles");
            assert_eq!(config.port, 8080);
            assert!(!config.dev_mode);
            assert_eq!(config.audit.persistence, AuditPersistence::Console);
            assert_eq!(config.audit.drop_policy, AuditDropPolicy::DropOldest);
        });
    }

    #[test]
    fn roles_claim_override_wins() {
        with_clean_env(|| {
            std::env::set_var("AUTH_DOMAIN", "tenant.auth.example.com");
            std::env::set_var("AUTH_AUDIENCE", "https://api.example.com");
            std::env::set_var("SYNC_SERVICE_SECRET", "s3cret");
            std::env::set_var("AUTH_ROLES_CLAIM", "https://finance.example.com/roles");

            let config = AppConfig::from_env().unwrap();
            assert_eq!(config.roles_claim, "https://finance.example.com/roles");
        });
    }

    #[test]
    fn invalid_audit_persistence_rejected() {
        with_clean_env(|| {
            std::env::set_var("AUTH_DOMAIN", "tenant.auth.example.com");
            std::env::set_var("AUTH_AUDIENCE", "https://api.example.com");
            std::env::set_var("SYNC_SERVICE_SECRET", "s3cret");
            std::env::set_var("AUDIT_PERSISTENCE", "sometimes");

            let err = AppConfig::from_env().unwrap_err();
            assert!(matches!(
                err,
                ConfigError::Invalid {
                    name: "AUDIT_PERSISTENCE",
                    ..
                }
            ));
        });
    }
}
