use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Grace period for in-flight requests after a shutdown signal.
    pub shutdown_timeout_secs: u64,
    /// Authority new accounts are created under (`acct:name@{auth_domain}`).
    pub auth_domain: String,
    /// Minimum accepted password length at registration.
    pub password_min_length: usize,
    /// JWT token configuration (secret, expiry durations).
    pub jwt: JwtConfig,
    /// Asset URLs injected by `/embed.js`.
    pub embed: EmbedConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`| `30`                       |
    /// | `AUTH_DOMAIN`          | `localhost`                |
    /// | `PASSWORD_MIN_LENGTH`  | `8`                        |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins = split_list(
            &std::env::var("CORS_ORIGINS").unwrap_or_else(|_| "http://localhost:5173".into()),
        );

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let auth_domain = std::env::var("AUTH_DOMAIN").unwrap_or_else(|_| "localhost".into());
        assert!(!auth_domain.is_empty(), "AUTH_DOMAIN must not be empty");

        let password_min_length: usize = std::env::var("PASSWORD_MIN_LENGTH")
            .unwrap_or_else(|_| "8".into())
            .parse()
            .expect("PASSWORD_MIN_LENGTH must be a valid usize");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            auth_domain,
            password_min_length,
            jwt: JwtConfig::from_env(),
            embed: EmbedConfig::from_env(),
        }
    }
}

/// Client asset URLs the embed loader injects into host pages.
#[derive(Debug, Clone)]
pub struct EmbedConfig {
    pub script_urls: Vec<String>,
    pub style_urls: Vec<String>,
}

impl EmbedConfig {
    /// | Env Var              | Default                       |
    /// |----------------------|-------------------------------|
    /// | `CLIENT_SCRIPT_URLS` | `/assets/scripts/client.js`   |
    /// | `CLIENT_STYLE_URLS`  | `/assets/styles/client.css`   |
    pub fn from_env() -> Self {
        let script_urls = split_list(
            &std::env::var("CLIENT_SCRIPT_URLS")
                .unwrap_or_else(|_| "/assets/scripts/client.js".into()),
        );
        let style_urls = split_list(
            &std::env::var("CLIENT_STYLE_URLS")
                .unwrap_or_else(|_| "/assets/styles/client.css".into()),
        );
        Self {
            script_urls,
            style_urls,
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
