use anyhow::{Context, Result};
use std::env;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Dev,
    Staging,
    Prod,
}

impl Environment {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "prod" | "production" => Self::Prod,
            "staging" => Self::Staging,
            _ => Self::Dev,
        }
    }

    pub fn is_dev(&self) -> bool {
        matches!(self, Self::Dev)
    }

    #[allow(dead_code)]
    pub fn is_prod(&self) -> bool {
        matches!(self, Self::Prod)
    }
}

/// Which intent oracle backs classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleProvider {
    /// The language-understanding service over HTTP.
    Llm,
    /// Deterministic keyword taxonomy; no network. For dev and tests.
    Keyword,
}

impl OracleProvider {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "keyword" | "stub" => Self::Keyword,
            _ => Self::Llm,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub env: Environment,
    pub server_addr: String,

    // Database
    pub database_url: String,
    pub database_max_connections: u32,

    // Redis
    pub redis_url: String,
    pub redis_cache_ttl_seconds: u64,

    // CORS
    pub cors_allow_origins: Vec<String>,

    // Intent oracle
    pub oracle_provider: OracleProvider,
    pub oracle_url: String,
    pub oracle_token: String,
    pub oracle_timeout_seconds: u64,

    // Estimation
    /// Flat additive surcharge for urgent requests, in percent.
    pub urgency_fee_percent: f64,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        let env = Environment::from_str(&env::var("ENV").unwrap_or_else(|_| "dev".to_string()));
        let server_addr = env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        // Database
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        // Redis
        let redis_url =
            env::var("REDIS_URL").unwrap_or_else(|_| "redis://redis:6379/0".to_string());
        let redis_cache_ttl_seconds = env::var("REDIS_CACHE_TTL_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(1800); // 30 minutes default; scopes are regenerable

        // CORS
        let cors_allow_origins = env::var("CORS_ALLOW_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        // Intent oracle
        let oracle_provider = OracleProvider::from_str(
            &env::var("ORACLE_PROVIDER").unwrap_or_else(|_| "llm".to_string()),
        );
        let oracle_url =
            env::var("ORACLE_URL").unwrap_or_else(|_| "http://oracle-service:8000".to_string());
        let oracle_token = match oracle_provider {
            // No token needed for the in-process oracle
            OracleProvider::Keyword => env::var("ORACLE_TOKEN").unwrap_or_default(),
            OracleProvider::Llm => env::var("ORACLE_TOKEN").context("ORACLE_TOKEN must be set")?,
        };
        let oracle_timeout_seconds = env::var("ORACLE_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30); // classification is a single short completion

        // Estimation
        let urgency_fee_percent = env::var("URGENCY_FEE_PERCENT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(25.0);

        Ok(Settings {
            env,
            server_addr,
            database_url,
            database_max_connections,
            redis_url,
            redis_cache_ttl_seconds,
            cors_allow_origins,
            oracle_provider,
            oracle_url,
            oracle_token,
            oracle_timeout_seconds,
            urgency_fee_percent,
        })
    }
}
