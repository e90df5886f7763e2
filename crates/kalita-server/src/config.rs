use std::net::SocketAddr;
use std::path::PathBuf;

/// JWT secrets that ship in sample env files and MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
];

/// Longest session lifetime accepted, in days.
const MAX_SESSION_DAYS: i64 = 3650;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("KALITA_JWT_SECRET is still a placeholder value")]
    PlaceholderSecret,

    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub api_key: String,
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub session_days: i64,
    pub admin_emails: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let jwt_secret = required("KALITA_JWT_SECRET")?;
        if PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            return Err(ConfigError::PlaceholderSecret);
        }
        let api_key = required("KALITA_API_KEY")?;

        let port = parse_or(&lookup, "KALITA_PORT", 3000)?;
        let session_days = parse_or(&lookup, "KALITA_SESSION_DAYS", 30)?;
        if !(1..=MAX_SESSION_DAYS).contains(&session_days) {
            return Err(ConfigError::Invalid {
                name: "KALITA_SESSION_DAYS",
                value: session_days.to_string(),
            });
        }

        let admin_emails = lookup("KALITA_ADMIN_EMAILS")
            .map(|raw| {
                raw.split(',')
                    .map(kalita_api::auth::normalize_email)
                    .filter(|e| !e.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            jwt_secret,
            api_key,
            db_path: lookup("KALITA_DB_PATH").unwrap_or_else(|| "kalita.db".into()).into(),
            host: lookup("KALITA_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            session_days,
            admin_emails,
        })
    }

    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
    }
}
