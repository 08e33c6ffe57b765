use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::auth::hash_password;
use crate::models::{ROLE_PROVIDER, ROLE_USER};
use crate::state::{AppState, GeoConfig, JwtConfig, MailConfig, PaymentConfig};

/// App state over a throwaway database with every outbound integration
/// unconfigured, so geocoding, mail, and payments all take their disabled
/// paths.
pub async fn test_state() -> AppState {
    AppState {
        db: test_pool().await,
        http: reqwest::Client::new(),
        jwt: JwtConfig {
            secret: "test-secret".to_string(),
            ttl_hours: 1,
        },
        mail: MailConfig {
            api_url: String::new(),
            api_token: String::new(),
            from_address: "no-reply@test.local".to_string(),
        },
        geo: GeoConfig {
            api_url: String::new(),
            api_key: String::new(),
        },
        payments: PaymentConfig {
            api_url: String::new(),
            key_id: String::new(),
            key_secret: String::new(),
        },
    }
}

pub async fn test_pool() -> SqlitePool {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("test.db");
    let url = format!("sqlite://{}?mode=rwc", db_path.display());
    // Leak tempdir so it lives for the test
    std::mem::forget(dir);

    let options = SqliteConnectOptions::from_str(&url)
        .unwrap()
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();
    crate::db::run_migrations(&pool).await.unwrap();
    pool
}

pub async fn seed_user(pool: &SqlitePool, name: &str, email: &str) -> i64 {
    sqlx::query(
        r#"INSERT INTO users (name, email, password_hash, phone, location, role, created_at)
           VALUES (?, ?, ?, NULL, NULL, ?, ?)"#,
    )
    .bind(name)
    .bind(email)
    .bind(hash_password("password").unwrap())
    .bind(ROLE_USER)
    .bind(chrono::Utc::now().to_rfc3339())
    .execute(pool)
    .await
    .unwrap()
    .last_insert_rowid()
}

pub async fn seed_provider(pool: &SqlitePool, name: &str, email: &str, service_type: &str) -> i64 {
    seed_provider_at(pool, name, email, service_type, None, None).await
}

pub async fn seed_provider_at(
    pool: &SqlitePool,
    name: &str,
    email: &str,
    service_type: &str,
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> i64 {
    sqlx::query(
        r#"INSERT INTO service_providers
           (name, email, password_hash, phone, service_type, experience_years, service_cost,
            location, availability, latitude, longitude, role, created_at)
           VALUES (?, ?, ?, NULL, ?, 3, 50.0, 'Springfield', 'weekdays', ?, ?, ?, ?)"#,
    )
    .bind(name)
    .bind(email)
    .bind(hash_password("password").unwrap())
    .bind(service_type)
    .bind(latitude)
    .bind(longitude)
    .bind(ROLE_PROVIDER)
    .bind(chrono::Utc::now().to_rfc3339())
    .execute(pool)
    .await
    .unwrap()
    .last_insert_rowid()
}
