use serde::Deserialize;

/// Application configuration, loaded from environment variables with a
/// double-underscore section separator (e.g. `OIDC__ISSUER`, `DATABASE__URL`).
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server host (default: 0.0.0.0)
    pub host: String,
    /// Server port (default: 8080)
    pub port: u16,
    pub oidc: OidcConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OidcConfig {
    /// OIDC issuer URL for JWT validation (required)
    pub issuer: String,
    /// OIDC audience (client ID); recorded but not validated yet
    pub audience: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database URL (default: sqlite:./data/identity.db)
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (default: info)
    pub level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    /// CORS allowed origins (default: *)
    pub origins: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 8080_i64)?
            .set_default("oidc.audience", "")?
            .set_default("database.url", "sqlite:./data/identity.db")?
            .set_default("logging.level", "info")?
            .set_default("cors.origins", "*")?
            .add_source(config::Environment::default().separator("__"))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_without_issuer_fails() {
        // OIDC__ISSUER has no default; a bare environment must not yield a
        // usable config.
        if std::env::var("OIDC__ISSUER").is_ok() {
            return;
        }
        assert!(Config::load().is_err());
    }

    #[test]
    fn test_nested_sections_deserialize() {
        let config: Config = config::Config::builder()
            .set_default("host", "127.0.0.1")
            .unwrap()
            .set_default("port", 9000_i64)
            .unwrap()
            .set_default("oidc.issuer", "https://issuer.example")
            .unwrap()
            .set_default("oidc.audience", "app")
            .unwrap()
            .set_default("database.url", ":memory:")
            .unwrap()
            .set_default("logging.level", "debug")
            .unwrap()
            .set_default("cors.origins", "*")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.oidc.issuer, "https://issuer.example");
        assert_eq!(config.database.url, ":memory:");
    }
}
