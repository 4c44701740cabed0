//! Server configuration.

use std::env;

/// Default bind port.
pub const DEFAULT_PORT: u16 = 8080;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// PostgreSQL URL. The in-memory store is used when unset.
    pub database_url: Option<String>,
    /// Connection pool size.
    pub db_max_connections: u32,
    /// HS256 secret shared with the identity provider.
    pub jwt_secret: String,
    /// Expected token issuer.
    pub jwt_issuer: String,
    /// Lifetime of tokens minted by this server, in hours.
    pub jwt_expiration_hours: u64,
    /// Maps provider key. Only reported by the health check.
    pub maps_api_key: Option<String>,
    /// Log level used when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration through `lookup`. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let jwt_secret = var("HAIL_JWT_SECRET")
            .ok_or_else(|| anyhow::anyhow!("HAIL_JWT_SECRET is required"))?;

        Ok(Self {
            host: var("HAIL_SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: var("HAIL_SERVER_PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            database_url: var("DATABASE_URL"),
            db_max_connections: var("HAIL_DB_MAX_CONNECTIONS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
            jwt_secret,
            jwt_issuer: var("HAIL_JWT_ISSUER")
                .unwrap_or_else(|| auth::DEFAULT_JWT_ISSUER.to_string()),
            jwt_expiration_hours: var("HAIL_JWT_EXPIRATION_HOURS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(auth::DEFAULT_JWT_EXPIRATION_HOURS),
            maps_api_key: var("HAIL_MAPS_API_KEY"),
            log_level: var("HAIL_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Returns the server address.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns true if a database is configured.
    pub fn has_database(&self) -> bool {
        self.database_url.is_some()
    }

    /// Returns true if a maps provider key is configured.
    pub fn has_maps(&self) -> bool {
        self.maps_api_key.is_some()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("HAIL_JWT_SECRET", "s3cret")]).unwrap();

        assert_eq!(config.server_addr(), "0.0.0.0:8080");
        assert!(!config.has_database());
        assert!(!config.has_maps());
        assert_eq!(config.db_max_connections, 5);
        assert_eq!(config.jwt_issuer, "hail");
        assert_eq!(config.jwt_expiration_hours, 24);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_secret_is_required() {
        assert!(load(&[]).is_err());
        assert!(load(&[("HAIL_JWT_SECRET", "  ")]).is_err());
    }

    #[test]
    fn test_unparsable_port_falls_back() {
        let config = load(&[
            ("HAIL_JWT_SECRET", "s3cret"),
            ("HAIL_SERVER_PORT", "eighty"),
            ("DATABASE_URL", "postgres://localhost/hail"),
            ("HAIL_MAPS_API_KEY", "key"),
        ])
        .unwrap();

        assert_eq!(config.port, DEFAULT_PORT);
        assert!(config.has_database());
        assert!(config.has_maps());
    }
}
