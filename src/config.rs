// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment once at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `DATA_DIR` | Directory holding `notes.redb` | unset (in-memory storage) |
//! | `FIELD_KEY` | Base64 of the 32-byte field encryption key | Required |
//! | `TLS_CERT_PATH` | PEM certificate chain | unset (plain HTTP) |
//! | `TLS_KEY_PATH` | PEM private key | unset (plain HTTP) |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::crypto::{FieldKey, KeyError};

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";

/// Environment variable name for the database directory.
///
/// When unset, notes live in memory and are lost on restart.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

/// Environment variable name for the field encryption key.
///
/// Must be the standard Base64 encoding of exactly 32 bytes. Rotating it
/// makes every stored note unreadable.
pub const FIELD_KEY_ENV: &str = "FIELD_KEY";

pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("FIELD_KEY is required")]
    MissingFieldKey,

    #[error("FIELD_KEY is invalid: {0}")]
    InvalidFieldKey(#[source] KeyError),

    #[error("PORT must be a port number, got `{0}`")]
    InvalidPort(String),

    #[error("invalid bind address `{0}`")]
    InvalidAddress(String),

    #[error("TLS_CERT_PATH and TLS_KEY_PATH must be set together")]
    IncompleteTls,

    #[error("LOG_FORMAT must be `json` or `pretty`, got `{0}`")]
    InvalidLogFormat(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

impl LogFormat {
    /// Read the log format from the process environment.
    ///
    /// Logging starts before the rest of the configuration is parsed, so an
    /// unknown value falls back to `pretty` instead of failing.
    pub fn from_env() -> Self {
        match std::env::var(LOG_FORMAT_ENV) {
            Ok(raw) => Self::parse(&raw).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            _ => Err(ConfigError::InvalidLogFormat(raw.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

pub struct ServerConfig {
    pub addr: SocketAddr,
    pub data_dir: Option<PathBuf>,
    pub field_key: FieldKey,
    pub tls: Option<TlsPaths>,
    pub log_format: LogFormat,
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("addr", &self.addr)
            .field("data_dir", &self.data_dir)
            .field("tls", &self.tls)
            .field("log_format", &self.log_format)
            .finish_non_exhaustive()
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let host = non_empty(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match non_empty(PORT_ENV) {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw.clone()))?,
            None => DEFAULT_PORT,
        };
        let addr = format!("{host}:{port}")
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidAddress(format!("{host}:{port}")))?;

        let field_key = non_empty(FIELD_KEY_ENV)
            .ok_or(ConfigError::MissingFieldKey)
            .and_then(|raw| FieldKey::from_base64(&raw).map_err(ConfigError::InvalidFieldKey))?;

        let tls = match (non_empty(TLS_CERT_PATH_ENV), non_empty(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: PathBuf::from(cert),
                key: PathBuf::from(key),
            }),
            (None, None) => None,
            _ => return Err(ConfigError::IncompleteTls),
        };

        let log_format = match non_empty(LOG_FORMAT_ENV) {
            Some(raw) => LogFormat::parse(&raw)?,
            None => LogFormat::default(),
        };

        Ok(Self {
            addr,
            data_dir: non_empty(DATA_DIR_ENV).map(PathBuf::from),
            field_key,
            tls,
            log_format,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KEY_LEN;
    use base64ct::{Base64, Encoding};
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn field_key() -> String {
        Base64::encode_string(&[3u8; KEY_LEN])
    }

    #[test]
    fn defaults_apply_when_only_field_key_is_set() {
        let key = field_key();
        let config = ServerConfig::from_lookup(lookup(&[(FIELD_KEY_ENV, key.as_str())])).unwrap();
        assert_eq!(config.addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.data_dir, None);
        assert_eq!(config.tls, None);
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn explicit_values_are_used() {
        let key = field_key();
        let config = ServerConfig::from_lookup(lookup(&[
            (FIELD_KEY_ENV, key.as_str()),
            (HOST_ENV, "127.0.0.1"),
            (PORT_ENV, "9443"),
            (DATA_DIR_ENV, "/var/lib/notes"),
            (TLS_CERT_PATH_ENV, "/tls/cert.pem"),
            (TLS_KEY_PATH_ENV, "/tls/key.pem"),
            (LOG_FORMAT_ENV, "JSON"),
        ]))
        .unwrap();

        assert_eq!(config.addr, "127.0.0.1:9443".parse().unwrap());
        assert_eq!(config.data_dir, Some(PathBuf::from("/var/lib/notes")));
        assert_eq!(
            config.tls,
            Some(TlsPaths {
                cert: PathBuf::from("/tls/cert.pem"),
                key: PathBuf::from("/tls/key.pem"),
            })
        );
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn field_key_is_required_and_validated() {
        assert!(matches!(
            ServerConfig::from_lookup(lookup(&[])),
            Err(ConfigError::MissingFieldKey)
        ));

        let short = Base64::encode_string(&[3u8; 16]);
        assert!(matches!(
            ServerConfig::from_lookup(lookup(&[(FIELD_KEY_ENV, short.as_str())])),
            Err(ConfigError::InvalidFieldKey(KeyError::InvalidLength { .. }))
        ));
    }

    #[test]
    fn rejects_bad_port_and_half_tls() {
        let key = field_key();
        assert!(matches!(
            ServerConfig::from_lookup(lookup(&[(FIELD_KEY_ENV, key.as_str()), (PORT_ENV, "http")])),
            Err(ConfigError::InvalidPort(_))
        ));
        assert!(matches!(
            ServerConfig::from_lookup(lookup(&[
                (FIELD_KEY_ENV, key.as_str()),
                (TLS_CERT_PATH_ENV, "/c.pem"),
            ])),
            Err(ConfigError::IncompleteTls)
        ));
    }

    #[test]
    fn debug_output_omits_field_key() {
        let key = field_key();
        let config = ServerConfig::from_lookup(lookup(&[(FIELD_KEY_ENV, key.as_str())])).unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains(&key));
        assert!(!rendered.contains("field_key"));
    }
}
