//! Application configuration management.
//!
//! Configuration is read from environment variables with the `envy` crate,
//! after loading an optional `.env` file.

use serde::Deserialize;

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `DATABASE_URL` (optional): PostgreSQL connection string. Without it the
///   ledger runs on the in-memory store and nothing survives a restart.
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3000
/// - `DATABASE_MAX_CONNECTIONS` (optional): pool size, defaults to 5
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database_url: Option<String>,

    #[serde(default = "default_port")]
    pub server_port: u16,

    #[serde(default = "default_max_connections")]
    pub database_max_connections: u32,
}

fn default_port() -> u16 {
    3000
}

fn default_max_connections() -> u32 {
    5
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if an environment variable value cannot be parsed
    /// into the expected type.
    pub fn from_env() -> Result<Self, envy::Error> {
        // Does nothing if there is no .env file
        dotenvy::dotenv().ok();

        envy::from_env::<Config>()
    }

    /// Same as [`Config::from_env`] but over an explicit set of variables.
    pub fn from_vars<I>(vars: I) -> Result<Self, envy::Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter(vars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_unset() {
        let config = Config::from_vars(Vec::new()).unwrap();

        assert_eq!(config.database_url, None);
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.database_max_connections, 5);
    }

    #[test]
    fn reads_upper_case_variables() {
        let config = Config::from_vars(vec![
            ("DATABASE_URL".to_string(), "postgres://bank@localhost/bank".to_string()),
            ("SERVER_PORT".to_string(), "8080".to_string()),
        ])
        .unwrap();

        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://bank@localhost/bank")
        );
        assert_eq!(config.server_port, 8080);
    }

    #[test]
    fn rejects_unparseable_port() {
        assert!(
            Config::from_vars(vec![("SERVER_PORT".to_string(), "eighty".to_string())]).is_err()
        );
    }
}
