use actix_web::{dev::ServiceRequest, web, Error, HttpMessage};
use actix_web_httpauth::extractors::bearer::BearerAuth;
use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::{
    errors::{ApiError, ApiResult},
    models::{AdminRow, ProviderRow, UserRow, ROLE_ADMIN, ROLE_PROVIDER, ROLE_USER},
    state::{AppState, JwtConfig},
};

/// The authenticated caller, decoded from the bearer token and made available
/// to handlers through request extensions.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: i64,
    pub name: String,
    pub role: String,
}

/// A credentialed account resolved by email from any of the three namespaces.
#[derive(Clone, Debug)]
pub struct Principal {
    pub id: i64,
    pub name: String,
    pub role: String,
    pub password_hash: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub name: String,
    pub iat: i64,
    pub exp: i64,
}

pub fn hash_password(password: &str) -> Result<String, password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    let parsed_hash = PasswordHash::new(password_hash);
    match parsed_hash {
        Ok(hash) => Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok(),
        Err(_) => false,
    }
}

pub fn issue_token(config: &JwtConfig, id: i64, role: &str, name: &str) -> ApiResult<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: id.to_string(),
        role: role.to_string(),
        name: name.to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::hours(config.ttl_hours)).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|err| ApiError::Internal(format!("token signing failed: {err}")))
}

pub fn decode_token(config: &JwtConfig, token: &str) -> Option<AuthUser> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(),
    )
    .ok()?;
    let id = data.claims.sub.parse().ok()?;
    Some(AuthUser {
        id,
        name: data.claims.name,
        role: data.claims.role,
    })
}

/// Resolve an email across the three account namespaces: admins first, then
/// providers, then users.
pub async fn resolve_principal(pool: &SqlitePool, email: &str) -> ApiResult<Option<Principal>> {
    let admin = sqlx::query_as::<_, AdminRow>(
        "SELECT id, username, email, password_hash, role, created_at FROM admins WHERE email = ? LIMIT 1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;
    if let Some(admin) = admin {
        return Ok(Some(Principal {
            id: admin.id,
            name: admin.username,
            role: admin.role,
            password_hash: admin.password_hash,
        }));
    }

    let provider = sqlx::query_as::<_, ProviderRow>(
        r#"SELECT id, name, email, password_hash, phone, service_type, experience_years,
                  service_cost, location, availability, latitude, longitude, role, created_at
           FROM service_providers WHERE email = ? LIMIT 1"#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;
    if let Some(provider) = provider {
        return Ok(Some(Principal {
            id: provider.id,
            name: provider.name,
            role: provider.role,
            password_hash: provider.password_hash,
        }));
    }

    let user = sqlx::query_as::<_, UserRow>(
        r#"SELECT id, name, email, password_hash, phone, location, role, created_at
           FROM users WHERE email = ? LIMIT 1"#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(user.map(|user| Principal {
        id: user.id,
        name: user.name,
        role: user.role,
        password_hash: user.password_hash,
    }))
}

pub async fn authenticate_credentials(
    pool: &SqlitePool,
    email: &str,
    password: &str,
) -> ApiResult<Principal> {
    let principal = resolve_principal(pool, email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))?;
    if !verify_password(password, &principal.password_hash) {
        return Err(ApiError::Unauthorized("Invalid email or password".to_string()));
    }
    Ok(principal)
}

fn unauthorized() -> Error {
    ApiError::Unauthorized("Invalid or missing token".to_string()).into()
}

fn authenticate(req: &ServiceRequest, credentials: &BearerAuth) -> Result<AuthUser, Error> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(unauthorized)?;
    decode_token(&state.jwt, credentials.token()).ok_or_else(unauthorized)
}

pub async fn user_validator(
    req: ServiceRequest,
    credentials: BearerAuth,
) -> Result<ServiceRequest, (Error, ServiceRequest)> {
    role_validator(req, credentials, ROLE_USER)
}

pub async fn provider_validator(
    req: ServiceRequest,
    credentials: BearerAuth,
) -> Result<ServiceRequest, (Error, ServiceRequest)> {
    role_validator(req, credentials, ROLE_PROVIDER)
}

pub async fn admin_validator(
    req: ServiceRequest,
    credentials: BearerAuth,
) -> Result<ServiceRequest, (Error, ServiceRequest)> {
    role_validator(req, credentials, ROLE_ADMIN)
}

fn role_validator(
    req: ServiceRequest,
    credentials: BearerAuth,
    role: &str,
) -> Result<ServiceRequest, (Error, ServiceRequest)> {
    match authenticate(&req, &credentials) {
        Ok(user) => {
            if user.role != role {
                return Err((
                    ApiError::Forbidden(
                        "Access Denied: You do not have permission to perform this action."
                            .to_string(),
                    )
                    .into(),
                    req,
                ));
            }
            req.extensions_mut().insert(user);
            Ok(req)
        }
        Err(err) => Err((err, req)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret".to_string(),
            ttl_hours: 1,
        }
    }

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("hunter22").unwrap();
        assert!(verify_password("hunter22", &hash));
        assert!(!verify_password("hunter23", &hash));
        assert!(!verify_password("hunter22", "not-a-phc-string"));
    }

    #[test]
    fn token_round_trip_preserves_identity() {
        let config = test_config();
        let token = issue_token(&config, 42, ROLE_PROVIDER, "Asha").unwrap();
        let user = decode_token(&config, &token).unwrap();
        assert_eq!(user.id, 42);
        assert_eq!(user.role, ROLE_PROVIDER);
        assert_eq!(user.name, "Asha");
    }

    #[test]
    fn token_rejected_with_wrong_secret() {
        let token = issue_token(&test_config(), 7, ROLE_USER, "Ben").unwrap();
        let other = JwtConfig {
            secret: "different".to_string(),
            ttl_hours: 1,
        };
        assert!(decode_token(&other, &token).is_none());
    }

    #[test]
    fn garbage_token_rejected() {
        assert!(decode_token(&test_config(), "not.a.jwt").is_none());
    }

    #[tokio::test]
    async fn login_resolves_admin_before_user_on_shared_email() {
        let pool = crate::test_support::test_pool().await;
        crate::test_support::seed_user(&pool, "Plain User", "boss@example.com").await;
        sqlx::query(
            "INSERT INTO admins (username, email, password_hash, role, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind("Boss")
        .bind("boss@example.com")
        .bind(hash_password("admin-pass").unwrap())
        .bind(ROLE_ADMIN)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&pool)
        .await
        .unwrap();

        let principal = resolve_principal(&pool, "boss@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(principal.role, ROLE_ADMIN);
        assert_eq!(principal.name, "Boss");
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let pool = crate::test_support::test_pool().await;
        crate::test_support::seed_user(&pool, "Priya", "priya@example.com").await;

        let err = authenticate_credentials(&pool, "priya@example.com", "not-the-password")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));

        let err = authenticate_credentials(&pool, "nobody@example.com", "password")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));

        let principal = authenticate_credentials(&pool, "priya@example.com", "password")
            .await
            .unwrap();
        assert_eq!(principal.name, "Priya");
    }
}
