use actix_web::{web, HttpResponse};
use actix_web_httpauth::middleware::HttpAuthentication;
use serde::Deserialize;

use crate::{
    auth::{user_validator, AuthUser},
    bookings,
    db::{self, email_taken},
    errors::{ApiError, ApiResult},
    models::{
        is_known_payment_method, BookingDto, ProviderDto, UserDto, PAYMENT_CASH,
    },
    providers,
    state::AppState,
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchQuery {
    service_type: Option<String>,
    location: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NearbyQuery {
    lat: f64,
    lng: f64,
    radius: Option<f64>,
    service_type: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BookingRequest {
    service_provider_id: i64,
    date_of_service: String,
    time_slot: String,
    payment_method: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReviewRequest {
    booking_id: i64,
    rating: i64,
    comment: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateUserProfileRequest {
    name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    location: Option<String>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/user")
            // Public directory lookups come first; everything else needs a
            // ROLE_USER bearer token.
            .service(web::resource("/search").route(web::get().to(search_providers)))
            .service(web::resource("/search/nearby").route(web::get().to(search_nearby)))
            .service(web::resource("/provider/{id}").route(web::get().to(provider_by_id)))
            .service(
                web::scope("")
                    .wrap(HttpAuthentication::bearer(user_validator))
                    .service(web::resource("/providers").route(web::get().to(all_providers)))
                    .service(web::resource("/profile").route(web::put().to(update_profile)))
                    .service(web::resource("/book").route(web::post().to(book_service)))
                    .service(web::resource("/bookings").route(web::get().to(view_bookings)))
                    .service(web::resource("/review").route(web::post().to(submit_review))),
            ),
    );
}

async fn all_providers(state: web::Data<AppState>) -> ApiResult<HttpResponse> {
    let rows = providers::list_providers(&state.db).await?;
    let dtos: Vec<ProviderDto> = rows.into_iter().map(ProviderDto::from).collect();
    Ok(HttpResponse::Ok().json(dtos))
}

async fn search_providers(
    state: web::Data<AppState>,
    query: web::Query<SearchQuery>,
) -> ApiResult<HttpResponse> {
    let query = query.into_inner();
    let rows = providers::search_providers(
        &state.db,
        query.service_type.as_deref(),
        query.location.as_deref(),
    )
    .await?;
    let dtos: Vec<ProviderDto> = rows.into_iter().map(ProviderDto::from).collect();
    Ok(HttpResponse::Ok().json(dtos))
}

async fn search_nearby(
    state: web::Data<AppState>,
    query: web::Query<NearbyQuery>,
) -> ApiResult<HttpResponse> {
    let query = query.into_inner();
    let radius = query.radius.unwrap_or(10.0);
    let nearby = providers::nearby_providers(
        &state.db,
        query.lat,
        query.lng,
        radius,
        query.service_type.as_deref(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(nearby))
}

async fn provider_by_id(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let provider_id = path.into_inner();
    let row = providers::get_provider(&state.db, provider_id)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound(format!("Service Provider not found with id: {provider_id}"))
        })?;
    Ok(HttpResponse::Ok().json(ProviderDto::from(row)))
}

async fn update_profile(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    payload: web::Json<UpdateUserProfileRequest>,
) -> ApiResult<HttpResponse> {
    let payload = payload.into_inner();
    let user = db::fetch_user(&state.db, auth.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let email = match payload.email {
        Some(email) if email != user.email => {
            if email_taken(&state.db, &email).await? {
                return Err(ApiError::BadRequest("Email is already taken".to_string()));
            }
            email
        }
        _ => user.email,
    };
    let name = payload.name.unwrap_or(user.name);
    let phone = payload.phone.or(user.phone);
    let location = payload.location.or(user.location);

    sqlx::query("UPDATE users SET name = ?, email = ?, phone = ?, location = ? WHERE id = ?")
        .bind(&name)
        .bind(&email)
        .bind(&phone)
        .bind(&location)
        .bind(auth.id)
        .execute(&state.db)
        .await?;

    Ok(HttpResponse::Ok().json(UserDto {
        id: user.id,
        name,
        email,
        phone,
        location,
        role: user.role,
    }))
}

async fn book_service(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    payload: web::Json<BookingRequest>,
) -> ApiResult<HttpResponse> {
    let payload = payload.into_inner();
    if payload.date_of_service.trim().is_empty() {
        return Err(ApiError::Validation("Date of service is required".to_string()));
    }
    if payload.time_slot.trim().is_empty() {
        return Err(ApiError::Validation("Time slot is required".to_string()));
    }
    let payment_method = payload
        .payment_method
        .as_deref()
        .unwrap_or(PAYMENT_CASH)
        .to_uppercase();
    if !is_known_payment_method(&payment_method) {
        return Err(ApiError::Validation(format!(
            "Unknown payment method: {payment_method}"
        )));
    }

    let row = bookings::create_booking(
        &state.db,
        auth.id,
        payload.service_provider_id,
        &payload.date_of_service,
        &payload.time_slot,
        &payment_method,
    )
    .await?;
    Ok(HttpResponse::Created().json(BookingDto::from(row)))
}

async fn view_bookings(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
) -> ApiResult<HttpResponse> {
    let rows = db::list_bookings_for_user(&state.db, auth.id).await?;
    let dtos: Vec<BookingDto> = rows.into_iter().map(BookingDto::from).collect();
    Ok(HttpResponse::Ok().json(dtos))
}

async fn submit_review(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    payload: web::Json<ReviewRequest>,
) -> ApiResult<HttpResponse> {
    let payload = payload.into_inner();
    if !(1..=5).contains(&payload.rating) {
        return Err(ApiError::Validation(
            "Rating must be between 1 and 5".to_string(),
        ));
    }

    let review = bookings::submit_review(
        &state.db,
        auth.id,
        payload.booking_id,
        payload.rating,
        payload.comment.as_deref(),
    )
    .await?;
    Ok(HttpResponse::Created().json(review))
}
