use std::env;

use sqlx::SqlitePool;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub http: reqwest::Client,
    pub jwt: JwtConfig,
    pub mail: MailConfig,
    pub geo: GeoConfig,
    pub payments: PaymentConfig,
}

#[derive(Clone, Debug)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_hours: i64,
}

impl JwtConfig {
    pub fn from_env() -> Self {
        let secret = env::var("JWT_SECRET").unwrap_or_else(|_| "change-me".to_string());
        if secret == "change-me" {
            log::warn!("JWT_SECRET not set. Using default secret. Set JWT_SECRET in production.");
        }
        let ttl_hours = env::var("JWT_TTL_HOURS")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(24);
        Self { secret, ttl_hours }
    }
}

/// Outbound transactional mail goes through an HTTP relay. When no relay is
/// configured, notifications are a no-op.
#[derive(Clone, Debug)]
pub struct MailConfig {
    pub api_url: String,
    pub api_token: String,
    pub from_address: String,
}

impl MailConfig {
    pub fn from_env() -> Self {
        Self {
            api_url: env::var("MAIL_API_URL").unwrap_or_default(),
            api_token: env::var("MAIL_API_TOKEN").unwrap_or_default(),
            from_address: env::var("MAIL_FROM")
                .unwrap_or_else(|_| "no-reply@servicefinder.local".to_string()),
        }
    }

    pub fn enabled(&self) -> bool {
        !self.api_url.trim().is_empty()
    }
}

#[derive(Clone, Debug)]
pub struct GeoConfig {
    pub api_url: String,
    pub api_key: String,
}

impl GeoConfig {
    pub fn from_env() -> Self {
        Self {
            api_url: env::var("GEOCODE_API_URL")
                .unwrap_or_else(|_| "https://api.opencagedata.com/geocode/v1/json".to_string()),
            api_key: env::var("GEOCODE_API_KEY").unwrap_or_default(),
        }
    }

    pub fn enabled(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

#[derive(Clone, Debug)]
pub struct PaymentConfig {
    pub api_url: String,
    pub key_id: String,
    pub key_secret: String,
}

impl PaymentConfig {
    pub fn from_env() -> Self {
        Self {
            api_url: env::var("PAYMENT_API_URL")
                .unwrap_or_else(|_| "https://api.razorpay.com/v1".to_string()),
            key_id: env::var("PAYMENT_KEY_ID").unwrap_or_default(),
            key_secret: env::var("PAYMENT_KEY_SECRET").unwrap_or_default(),
        }
    }
}
