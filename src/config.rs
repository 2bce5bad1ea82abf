use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    pub base_url: String,
    pub api_key: String,
}

/// Process-wide configuration, built once at startup and shared through
/// `AppState` instead of being read from the environment ad hoc.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub environment: Environment,
    pub cookie_domain: Option<String>,
    pub jwt: JwtConfig,
    pub media: MediaConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let environment = match std::env::var("APP_ENV").as_deref() {
            Ok("production") => Environment::Production,
            _ => Environment::Development,
        };
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            ttl_days: std::env::var("JWT_TTL_DAYS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(15),
        };
        let media = MediaConfig {
            base_url: std::env::var("MEDIA_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:9000".into()),
            api_key: std::env::var("MEDIA_API_KEY").unwrap_or_default(),
        };
        Ok(Self {
            database_url,
            environment,
            cookie_domain: std::env::var("COOKIE_DOMAIN").ok(),
            jwt,
            media,
        })
    }
}
