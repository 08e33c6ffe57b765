use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::{
    auth::{authenticate_credentials, hash_password, issue_token},
    db::email_taken,
    errors::{ApiError, ApiResult},
    geo,
    models::{ProviderDto, UserDto, ROLE_ADMIN, ROLE_PROVIDER, ROLE_USER},
    state::AppState,
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterUserRequest {
    name: String,
    email: String,
    password: String,
    phone: Option<String>,
    location: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterProviderRequest {
    name: String,
    email: String,
    password: String,
    service_type: String,
    phone: Option<String>,
    experience_years: Option<i64>,
    service_cost: Option<f64>,
    location: Option<String>,
    availability: Option<String>,
}

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    token: String,
    role: String,
    name: String,
    id: i64,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/auth")
            .service(web::resource("/register/user").route(web::post().to(register_user)))
            .service(web::resource("/register/provider").route(web::post().to(register_provider)))
            .service(web::resource("/login").route(web::post().to(login)))
            .service(web::resource("/login/admin").route(web::post().to(login_admin))),
    );
}

fn validate_credentials(name: &str, email: &str, password: &str) -> Vec<String> {
    let mut errors = Vec::new();
    if name.trim().is_empty() {
        errors.push("Name is required".to_string());
    }
    if email.trim().is_empty() || !email.contains('@') {
        errors.push("Invalid email format".to_string());
    }
    if password.len() < 6 {
        errors.push("Password must be at least 6 characters long".to_string());
    }
    errors
}

async fn register_user(
    state: web::Data<AppState>,
    payload: web::Json<RegisterUserRequest>,
) -> ApiResult<HttpResponse> {
    let payload = payload.into_inner();
    let errors = validate_credentials(&payload.name, &payload.email, &payload.password);
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors.join("; ")));
    }

    if email_taken(&state.db, &payload.email).await? {
        return Err(ApiError::BadRequest("Email is already taken!".to_string()));
    }

    let password_hash = hash_password(&payload.password)
        .map_err(|_| ApiError::Internal("password hash failed".to_string()))?;

    let result = sqlx::query(
        r#"INSERT INTO users (name, email, password_hash, phone, location, role, created_at)
           VALUES (?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&payload.name)
    .bind(&payload.email)
    .bind(&password_hash)
    .bind(&payload.phone)
    .bind(&payload.location)
    .bind(ROLE_USER)
    .bind(chrono::Utc::now().to_rfc3339())
    .execute(&state.db)
    .await?;

    Ok(HttpResponse::Created().json(UserDto {
        id: result.last_insert_rowid(),
        name: payload.name,
        email: payload.email,
        phone: payload.phone,
        location: payload.location,
        role: ROLE_USER.to_string(),
    }))
}

async fn register_provider(
    state: web::Data<AppState>,
    payload: web::Json<RegisterProviderRequest>,
) -> ApiResult<HttpResponse> {
    let payload = payload.into_inner();
    let mut errors = validate_credentials(&payload.name, &payload.email, &payload.password);
    if payload.service_type.trim().is_empty() {
        errors.push("Service type is required".to_string());
    }
    if payload.experience_years.unwrap_or(0) < 0 {
        errors.push("Experience cannot be negative".to_string());
    }
    if payload.service_cost.unwrap_or(0.0) < 0.0 {
        errors.push("Service cost cannot be negative".to_string());
    }
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors.join("; ")));
    }

    if email_taken(&state.db, &payload.email).await? {
        return Err(ApiError::BadRequest("Email is already taken!".to_string()));
    }

    let password_hash = hash_password(&payload.password)
        .map_err(|_| ApiError::Internal("password hash failed".to_string()))?;

    // Coordinates are filled lazily; a geocoding failure never blocks
    // registration.
    let coords = match payload.location.as_deref() {
        Some(address) => geo::geocode(&state.http, &state.geo, address).await,
        None => None,
    };
    let (latitude, longitude) = match coords {
        Some((lat, lng)) => (Some(lat), Some(lng)),
        None => (None, None),
    };

    let experience_years = payload.experience_years.unwrap_or(0);
    let result = sqlx::query(
        r#"INSERT INTO service_providers
           (name, email, password_hash, phone, service_type, experience_years, service_cost,
            location, availability, latitude, longitude, role, created_at)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&payload.name)
    .bind(&payload.email)
    .bind(&password_hash)
    .bind(&payload.phone)
    .bind(&payload.service_type)
    .bind(experience_years)
    .bind(payload.service_cost)
    .bind(&payload.location)
    .bind(&payload.availability)
    .bind(latitude)
    .bind(longitude)
    .bind(ROLE_PROVIDER)
    .bind(chrono::Utc::now().to_rfc3339())
    .execute(&state.db)
    .await?;

    Ok(HttpResponse::Created().json(ProviderDto {
        id: result.last_insert_rowid(),
        name: payload.name,
        email: payload.email,
        phone: payload.phone,
        service_type: payload.service_type,
        experience_years,
        service_cost: payload.service_cost,
        location: payload.location,
        availability: payload.availability,
        latitude,
        longitude,
        role: ROLE_PROVIDER.to_string(),
    }))
}

async fn login(
    state: web::Data<AppState>,
    payload: web::Json<LoginRequest>,
) -> ApiResult<HttpResponse> {
    let payload = payload.into_inner();
    let response = login_inner(&state, &payload).await?;
    Ok(HttpResponse::Ok().json(response))
}

async fn login_admin(
    state: web::Data<AppState>,
    payload: web::Json<LoginRequest>,
) -> ApiResult<HttpResponse> {
    let payload = payload.into_inner();
    let response = login_inner(&state, &payload).await?;
    if response.role != ROLE_ADMIN {
        return Err(ApiError::BadRequest("Unauthorized: Not an admin".to_string()));
    }
    Ok(HttpResponse::Ok().json(response))
}

async fn login_inner(state: &AppState, payload: &LoginRequest) -> ApiResult<TokenResponse> {
    let principal = authenticate_credentials(&state.db, &payload.email, &payload.password).await?;
    let token = issue_token(&state.jwt, principal.id, &principal.role, &principal.name)?;
    Ok(TokenResponse {
        token,
        role: principal.role,
        name: principal.name,
        id: principal.id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;

    use crate::test_support::{seed_user, test_state};

    fn login_payload(email: &str, password: &str) -> web::Json<LoginRequest> {
        web::Json(LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        })
    }

    #[tokio::test]
    async fn admin_login_rejects_non_admin_credentials() {
        let state = test_state().await;
        seed_user(&state.db, "Priya", "priya@example.com").await;
        let data = web::Data::new(state);

        // Valid user credentials, but not an admin account.
        let err = login_admin(data.clone(), login_payload("priya@example.com", "password"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));

        let ok = login(data, login_payload("priya@example.com", "password"))
            .await
            .unwrap();
        assert_eq!(ok.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn admin_login_accepts_admin_credentials() {
        let state = test_state().await;
        sqlx::query(
            "INSERT INTO admins (username, email, password_hash, role, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind("Boss")
        .bind("boss@example.com")
        .bind(hash_password("admin-pass").unwrap())
        .bind(ROLE_ADMIN)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&state.db)
        .await
        .unwrap();
        let data = web::Data::new(state);

        let ok = login_admin(data, login_payload("boss@example.com", "admin-pass"))
            .await
            .unwrap();
        assert_eq!(ok.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn provider_registration_survives_geocode_failure() {
        // test_state carries no geocoding key, so the lookup yields nothing.
        let state = test_state().await;
        let data = web::Data::new(state.clone());

        let resp = register_provider(
            data,
            web::Json(RegisterProviderRequest {
                name: "Ravi".to_string(),
                email: "ravi@example.com".to_string(),
                password: "secret1".to_string(),
                service_type: "Plumbing".to_string(),
                phone: None,
                experience_years: Some(3),
                service_cost: None,
                location: Some("Springfield".to_string()),
                availability: None,
            }),
        )
        .await
        .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);

        let row = sqlx::query_as::<_, crate::models::ProviderRow>(&format!(
            "{} WHERE email = ?",
            crate::db::PROVIDER_SELECT
        ))
        .bind("ravi@example.com")
        .fetch_one(&state.db)
        .await
        .unwrap();
        assert_eq!(row.location.as_deref(), Some("Springfield"));
        assert!(row.latitude.is_none());
        assert!(row.longitude.is_none());
    }
}
