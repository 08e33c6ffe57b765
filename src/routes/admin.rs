use actix_web::{web, HttpResponse};
use actix_web_httpauth::middleware::HttpAuthentication;

use crate::{
    auth::admin_validator,
    db,
    errors::{ApiError, ApiResult},
    models::{BookingDto, ProviderDto, UserDto, UserRow},
    providers,
    state::AppState,
};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/admin")
            .wrap(HttpAuthentication::bearer(admin_validator))
            .service(web::resource("/users").route(web::get().to(list_users)))
            .service(web::resource("/users/{id}").route(web::delete().to(delete_user)))
            .service(web::resource("/providers").route(web::get().to(list_providers)))
            .service(web::resource("/providers/{id}").route(web::delete().to(delete_provider)))
            .service(web::resource("/bookings").route(web::get().to(list_bookings))),
    );
}

async fn list_users(state: web::Data<AppState>) -> ApiResult<HttpResponse> {
    let rows = sqlx::query_as::<_, UserRow>(
        "SELECT id, name, email, password_hash, phone, location, role, created_at FROM users ORDER BY id",
    )
    .fetch_all(&state.db)
    .await?;
    let dtos: Vec<UserDto> = rows.into_iter().map(UserDto::from).collect();
    Ok(HttpResponse::Ok().json(dtos))
}

async fn delete_user(state: web::Data<AppState>, path: web::Path<i64>) -> ApiResult<HttpResponse> {
    let user_id = path.into_inner();
    if db::fetch_user(&state.db, user_id).await?.is_none() {
        return Err(ApiError::NotFound(format!(
            "User not found with id: {user_id}"
        )));
    }

    // Bookings and their reviews go with the account via FK cascade.
    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user_id)
        .execute(&state.db)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

async fn list_providers(state: web::Data<AppState>) -> ApiResult<HttpResponse> {
    let rows = providers::list_providers(&state.db).await?;
    let dtos: Vec<ProviderDto> = rows.into_iter().map(ProviderDto::from).collect();
    Ok(HttpResponse::Ok().json(dtos))
}

async fn delete_provider(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let provider_id = path.into_inner();
    if db::fetch_provider(&state.db, provider_id).await?.is_none() {
        return Err(ApiError::NotFound(format!(
            "Provider not found with id: {provider_id}"
        )));
    }

    sqlx::query("DELETE FROM service_providers WHERE id = ?")
        .bind(provider_id)
        .execute(&state.db)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

async fn list_bookings(state: web::Data<AppState>) -> ApiResult<HttpResponse> {
    let rows = db::list_all_bookings(&state.db).await?;
    let dtos: Vec<BookingDto> = rows.into_iter().map(BookingDto::from).collect();
    Ok(HttpResponse::Ok().json(dtos))
}
