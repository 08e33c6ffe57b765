use std::{env, fs, path::Path};

use chrono::Utc;
use sqlx::SqlitePool;

use crate::{
    auth::hash_password,
    errors::ApiResult,
    models::{BookingDetailRow, ProviderRow, UserRow, ROLE_ADMIN},
};

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

pub fn ensure_sqlite_dir(db_url: &str) -> std::io::Result<()> {
    let path = if let Some(path) = db_url.strip_prefix("sqlite://") {
        Some(path)
    } else if let Some(path) = db_url.strip_prefix("sqlite:") {
        Some(path)
    } else {
        None
    };

    let Some(path) = path else {
        return Ok(());
    };

    let path = path.split('?').next().unwrap_or(path);
    if path == ":memory:" || path.is_empty() {
        return Ok(());
    }

    let path = path.strip_prefix("file:").unwrap_or(path);
    let db_path = Path::new(path);
    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Seed a default admin account if none exists.
pub async fn seed_admin(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let existing = sqlx::query_as::<_, (i64,)>("SELECT id FROM admins LIMIT 1")
        .fetch_optional(pool)
        .await?;

    if existing.is_some() {
        return Ok(());
    }

    let username = env::var("ADMIN_NAME").unwrap_or_else(|_| "Super Admin".to_string());
    let email = env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@servicefinder.local".to_string());
    let password = env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin".to_string());

    if password == "admin" {
        log::warn!("ADMIN_PASSWORD not set. Using default password 'admin'. Set ADMIN_PASSWORD in production.");
    }

    let password_hash =
        hash_password(&password).map_err(|_| sqlx::Error::Protocol("password hash failed".into()))?;

    sqlx::query(
        r#"INSERT INTO admins (username, email, password_hash, role, created_at)
           VALUES (?, ?, ?, ?, ?)"#,
    )
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(ROLE_ADMIN)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

/// Email uniqueness spans both the user and provider namespaces.
pub async fn email_taken(pool: &SqlitePool, email: &str) -> ApiResult<bool> {
    let taken = sqlx::query_scalar::<_, i64>(
        r#"SELECT EXISTS (SELECT 1 FROM users WHERE email = ?)
                  OR EXISTS (SELECT 1 FROM service_providers WHERE email = ?)"#,
    )
    .bind(email)
    .bind(email)
    .fetch_one(pool)
    .await?;
    Ok(taken != 0)
}

pub async fn fetch_user(pool: &SqlitePool, user_id: i64) -> ApiResult<Option<UserRow>> {
    let row = sqlx::query_as::<_, UserRow>(
        r#"SELECT id, name, email, password_hash, phone, location, role, created_at
           FROM users WHERE id = ? LIMIT 1"#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub const PROVIDER_SELECT: &str = r#"SELECT id, name, email, password_hash, phone, service_type,
       experience_years, service_cost, location, availability, latitude, longitude, role, created_at
       FROM service_providers"#;

pub async fn fetch_provider(pool: &SqlitePool, provider_id: i64) -> ApiResult<Option<ProviderRow>> {
    let row = sqlx::query_as::<_, ProviderRow>(&format!("{PROVIDER_SELECT} WHERE id = ? LIMIT 1"))
        .bind(provider_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub const BOOKING_DETAIL_SELECT: &str = r#"SELECT b.id, b.user_id, b.provider_id,
       b.date_of_service, b.time_slot, b.status, b.payment_method,
       u.name AS user_name, u.email AS user_email,
       p.name AS provider_name, p.email AS provider_email,
       p.service_type AS provider_service_type,
       r.id AS review_id, r.rating AS review_rating, r.comment AS review_comment
       FROM bookings b
       JOIN users u ON u.id = b.user_id
       JOIN service_providers p ON p.id = b.provider_id
       LEFT JOIN reviews r ON r.booking_id = b.id"#;

pub async fn fetch_booking_detail(
    pool: &SqlitePool,
    booking_id: i64,
) -> ApiResult<Option<BookingDetailRow>> {
    let row = sqlx::query_as::<_, BookingDetailRow>(&format!(
        "{BOOKING_DETAIL_SELECT} WHERE b.id = ? LIMIT 1"
    ))
    .bind(booking_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn list_bookings_for_user(
    pool: &SqlitePool,
    user_id: i64,
) -> ApiResult<Vec<BookingDetailRow>> {
    let rows = sqlx::query_as::<_, BookingDetailRow>(&format!(
        "{BOOKING_DETAIL_SELECT} WHERE b.user_id = ? ORDER BY b.id"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn list_bookings_for_provider(
    pool: &SqlitePool,
    provider_id: i64,
) -> ApiResult<Vec<BookingDetailRow>> {
    let rows = sqlx::query_as::<_, BookingDetailRow>(&format!(
        "{BOOKING_DETAIL_SELECT} WHERE b.provider_id = ? ORDER BY b.id"
    ))
    .bind(provider_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn list_all_bookings(pool: &SqlitePool) -> ApiResult<Vec<BookingDetailRow>> {
    let rows = sqlx::query_as::<_, BookingDetailRow>(&format!(
        "{BOOKING_DETAIL_SELECT} ORDER BY b.id"
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
