//! Process-environment configuration (§6), loaded once at startup.

use std::time::Duration;

/// Per-provider OAuth application credentials, used only for the executors'
/// single silent token-refresh attempt — the authorization-code dance itself
/// is out of scope.
#[derive(Debug, Clone, Default)]
pub struct OAuthAppCredentials {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from_email: String,
    pub use_tls: bool,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret_key: String,
    pub cors_origins: Vec<String>,

    pub scheduler_enabled: bool,
    pub scheduler_check_interval_minutes: u32,
    pub scheduler_timezone: String,

    pub smtp: SmtpConfig,

    pub google: OAuthAppCredentials,
    pub facebook: OAuthAppCredentials,
    pub github: OAuthAppCredentials,
    pub spotify: OAuthAppCredentials,

    pub frontend_url: String,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<bool>().ok())
        .unwrap_or(default)
}

fn oauth_pair(prefix: &str) -> OAuthAppCredentials {
    OAuthAppCredentials {
        client_id: env_opt(&format!("{prefix}_CLIENT_ID")),
        client_secret: env_opt(&format!("{prefix}_CLIENT_SECRET")),
    }
}

impl AppConfig {
    /// Load configuration from the process environment. `JWT_SECRET_KEY` is
    /// the only variable with no usable default — we refuse to start
    /// without it, matching the "Required" note in §6's env var table.
    pub fn from_env() -> anyhow::Result<Self> {
        let jwt_secret_key = std::env::var("JWT_SECRET_KEY")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET_KEY is required"))?;

        Ok(Self {
            database_url: env_or("DATABASE_URL", "postgres://localhost/area"),
            jwt_secret_key,
            cors_origins: env_or("CORS_ORIGINS", "*")
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),

            scheduler_enabled: env_bool("SCHEDULER_ENABLED", true),
            scheduler_check_interval_minutes: env_or("SCHEDULER_CHECK_INTERVAL_MINUTES", "1")
                .parse()
                .unwrap_or(1),
            scheduler_timezone: env_or("SCHEDULER_TIMEZONE", "UTC"),

            smtp: SmtpConfig {
                host: env_or("SMTP_HOST", "localhost"),
                port: env_or("SMTP_PORT", "587").parse().unwrap_or(587),
                username: env_opt("SMTP_USERNAME"),
                password: env_opt("SMTP_PASSWORD"),
                from_email: env_or("SMTP_FROM_EMAIL", "noreply@example.com"),
                use_tls: env_bool("SMTP_USE_TLS", true),
            },

            google: oauth_pair("GOOGLE"),
            facebook: oauth_pair("FACEBOOK"),
            github: oauth_pair("GITHUB"),
            spotify: oauth_pair("SPOTIFY"),

            frontend_url: env_or("FRONTEND_URL", "http://localhost:3000"),
        })
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.scheduler_check_interval_minutes as u64 * 60)
    }

    /// Per-tick total timeout, §5: `tickInterval * 0.8`.
    pub fn tick_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.tick_interval().as_secs_f64() * 0.8)
    }

    /// Default per-HTTP-call timeout, §5.
    pub fn http_call_timeout(&self) -> Duration {
        Duration::from_secs(30)
    }

    /// Lookback window used by remote-data Checkers, §4.2.
    pub fn lookback_window(&self) -> chrono::Duration {
        chrono::Duration::minutes(5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn from_env_requires_jwt_secret() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::remove_var("JWT_SECRET_KEY");
        assert!(AppConfig::from_env().is_err());
    }

    #[test]
    fn from_env_applies_defaults() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("JWT_SECRET_KEY", "test-secret");
        std::env::remove_var("SCHEDULER_CHECK_INTERVAL_MINUTES");
        std::env::remove_var("CORS_ORIGINS");
        let cfg = AppConfig::from_env().unwrap();
        assert_eq!(cfg.scheduler_check_interval_minutes, 1);
        assert_eq!(cfg.cors_origins, vec!["*".to_string()]);
        assert_eq!(cfg.tick_interval(), Duration::from_secs(60));
        assert_eq!(cfg.tick_timeout(), Duration::from_secs(48));
        std::env::remove_var("JWT_SECRET_KEY");
    }
}
