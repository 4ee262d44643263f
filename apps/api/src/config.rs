use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};

/// Which `Authenticator` implementation the server runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthProvider {
    Hosted,
    OAuth,
}

impl FromStr for AuthProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hosted" => Ok(AuthProvider::Hosted),
            "oauth" | "google" => Ok(AuthProvider::OAuth),
            other => bail!("AUTH_PROVIDER must be 'hosted' or 'oauth', got '{other}'"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HostedAuthConfig {
    pub verify_url: String,
    pub secret_key: String,
}

#[derive(Debug, Clone)]
pub struct GoogleOAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
    pub database_url: String,
}

/// Application configuration loaded from environment variables.
/// Fails at startup if a variable required by the selected auth provider is missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub auth_provider: AuthProvider,
    pub hosted: Option<HostedAuthConfig>,
    pub google: Option<GoogleOAuthConfig>,
    pub frontend_url: String,
    pub redis_url: Option<String>,
    pub plan_upload_limit: u32,
    pub max_upload_bytes: usize,
    pub session_ttl_secs: u64,
    pub skill_taxonomy_path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let auth_provider: AuthProvider = optional_env("AUTH_PROVIDER")
            .unwrap_or_else(|| "hosted".to_string())
            .parse()?;

        let (hosted, google) = match auth_provider {
            AuthProvider::Hosted => (
                Some(HostedAuthConfig {
                    verify_url: require_env("HOSTED_AUTH_VERIFY_URL")?,
                    secret_key: require_env("HOSTED_AUTH_SECRET_KEY")?,
                }),
                None,
            ),
            AuthProvider::OAuth => (
                None,
                Some(GoogleOAuthConfig {
                    client_id: require_env("GOOGLE_CLIENT_ID")?,
                    client_secret: require_env("GOOGLE_CLIENT_SECRET")?,
                    redirect_url: optional_env("GOOGLE_REDIRECT_URL").unwrap_or_else(|| {
                        "http://localhost:8080/api/auth/google/callback".to_string()
                    }),
                    database_url: require_env("DATABASE_URL")?,
                }),
            ),
        };

        Ok(Config {
            port: parse_env("PORT", 8080)?,
            rust_log: optional_env("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            auth_provider,
            hosted,
            google,
            frontend_url: optional_env("FRONTEND_URL")
                .unwrap_or_else(|| "http://localhost:5000".to_string())
                .trim_end_matches('/')
                .to_string(),
            redis_url: optional_env("REDIS_URL"),
            plan_upload_limit: parse_env("PLAN_UPLOAD_LIMIT", 10)?,
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?,
            session_ttl_secs: parse_env("SESSION_TTL_SECS", 7 * 24 * 60 * 60)?,
            skill_taxonomy_path: optional_env("SKILL_TAXONOMY_PATH").map(PathBuf::from),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Unset and blank are both treated as absent.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        None => Ok(default),
    }
}
