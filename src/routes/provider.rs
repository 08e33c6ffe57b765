use actix_web::{web, HttpResponse};
use actix_web_httpauth::middleware::HttpAuthentication;
use serde::Deserialize;

use crate::{
    auth::{provider_validator, AuthUser},
    bookings,
    db::{self, email_taken},
    errors::{ApiError, ApiResult},
    geo, mailer,
    models::{is_known_status, BookingDto, ProviderDto},
    state::AppState,
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateProviderProfileRequest {
    name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    service_type: Option<String>,
    experience_years: Option<i64>,
    service_cost: Option<f64>,
    location: Option<String>,
    availability: Option<String>,
}

#[derive(Deserialize)]
struct StatusUpdateRequest {
    status: String,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/provider")
            .wrap(HttpAuthentication::bearer(provider_validator))
            .service(web::resource("/profile").route(web::put().to(update_profile)))
            .service(web::resource("/bookings").route(web::get().to(view_bookings)))
            .service(
                web::resource("/bookings/{id}/status").route(web::put().to(update_booking_status)),
            ),
    );
}

async fn update_profile(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    payload: web::Json<UpdateProviderProfileRequest>,
) -> ApiResult<HttpResponse> {
    let payload = payload.into_inner();
    let provider = db::fetch_provider(&state.db, auth.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Provider not found".to_string()))?;

    let email = match payload.email {
        Some(email) if email != provider.email => {
            if email_taken(&state.db, &email).await? {
                return Err(ApiError::BadRequest("Email is already taken".to_string()));
            }
            email
        }
        _ => provider.email,
    };
    let name = payload.name.unwrap_or(provider.name);
    let phone = payload.phone.or(provider.phone);
    let service_type = payload.service_type.unwrap_or(provider.service_type);
    let experience_years = payload.experience_years.unwrap_or(provider.experience_years);
    let service_cost = payload.service_cost.or(provider.service_cost);
    let availability = payload.availability.or(provider.availability);

    // A changed location re-geocodes; the text address is kept even when the
    // lookup fails.
    let (location, latitude, longitude) = match payload.location {
        Some(location) => match geo::geocode(&state.http, &state.geo, &location).await {
            Some((lat, lng)) => (Some(location), Some(lat), Some(lng)),
            None => (Some(location), provider.latitude, provider.longitude),
        },
        None => (provider.location, provider.latitude, provider.longitude),
    };

    sqlx::query(
        r#"UPDATE service_providers
           SET name = ?, email = ?, phone = ?, service_type = ?, experience_years = ?,
               service_cost = ?, location = ?, availability = ?, latitude = ?, longitude = ?
           WHERE id = ?"#,
    )
    .bind(&name)
    .bind(&email)
    .bind(&phone)
    .bind(&service_type)
    .bind(experience_years)
    .bind(service_cost)
    .bind(&location)
    .bind(&availability)
    .bind(latitude)
    .bind(longitude)
    .bind(auth.id)
    .execute(&state.db)
    .await?;

    Ok(HttpResponse::Ok().json(ProviderDto {
        id: provider.id,
        name,
        email,
        phone,
        service_type,
        experience_years,
        service_cost,
        location,
        availability,
        latitude,
        longitude,
        role: provider.role,
    }))
}

async fn view_bookings(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
) -> ApiResult<HttpResponse> {
    let rows = db::list_bookings_for_provider(&state.db, auth.id).await?;
    let dtos: Vec<BookingDto> = rows.into_iter().map(BookingDto::from).collect();
    Ok(HttpResponse::Ok().json(dtos))
}

async fn update_booking_status(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<i64>,
    payload: web::Json<StatusUpdateRequest>,
) -> ApiResult<HttpResponse> {
    let booking_id = path.into_inner();
    let status = payload.into_inner().status.to_uppercase();
    if !is_known_status(&status) {
        return Err(ApiError::BadRequest(format!("Invalid status: {status}")));
    }

    let row = bookings::update_booking_status(&state.db, auth.id, booking_id, &status).await?;

    // Best-effort notification; the response does not wait for delivery.
    mailer::notify_status_change(&state, &row);

    Ok(HttpResponse::Ok().json(BookingDto::from(row)))
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test, web, App};

    use crate::auth::issue_token;
    use crate::db;
    use crate::models::ROLE_PROVIDER;
    use crate::test_support::{seed_provider, test_state};

    #[actix_web::test]
    async fn profile_update_persists_when_geocoding_fails() {
        // test_state carries no geocoding key, so the lookup yields nothing.
        let state = test_state().await;
        let provider_id = seed_provider(&state.db, "Ravi", "ravi@example.com", "Plumbing").await;
        let token = issue_token(&state.jwt, provider_id, ROLE_PROVIDER, "Ravi").unwrap();

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(super::configure),
        )
        .await;

        let req = test::TestRequest::put()
            .uri("/api/provider/profile")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .set_json(serde_json::json!({ "location": "Shelbyville" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let row = db::fetch_provider(&state.db, provider_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.location.as_deref(), Some("Shelbyville"));
        assert!(row.latitude.is_none());
        assert!(row.longitude.is_none());

        let req = test::TestRequest::put()
            .uri("/api/provider/profile")
            .set_json(serde_json::json!({ "location": "Elsewhere" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
