//! Application configuration

use tracing::warn;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: String,
    pub port: u16,
    pub jwt_secret: String,
    pub token_lifetime_days: i64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let database_path =
            std::env::var("DATABASE_PATH").unwrap_or_else(|_| "./shout.db".to_string());

        let port = parse_or_default("PORT", 8080);

        // No default: a guessable signing secret breaks every token
        let jwt_secret = std::env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set"))?;
        if jwt_secret.trim().is_empty() {
            anyhow::bail!("JWT_SECRET must not be empty");
        }

        let token_lifetime_days = parse_or_default("TOKEN_LIFETIME_DAYS", 30);

        Ok(Self {
            database_path,
            port,
            jwt_secret,
            token_lifetime_days,
        })
    }
}

/// Read a numeric env var, keeping the default when it is unset and
/// warning when it is set but unparsable.
fn parse_or_default<T>(var: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display + Copy,
{
    match std::env::var(var) {
        Ok(value) => value.parse().unwrap_or_else(|_| {
            warn!("Invalid {} value {:?}, using {}", var, value, default);
            default
        }),
        Err(_) => default,
    }
}
