use actix_web::{web, HttpResponse};
use actix_web_httpauth::middleware::HttpAuthentication;
use serde::Deserialize;

use crate::{
    auth::{user_validator, AuthUser},
    bookings,
    errors::{ApiError, ApiResult},
    models::{BookingDto, PAYMENT_ONLINE},
    payments,
    state::AppState,
};

#[derive(Deserialize)]
struct CreateOrderRequest {
    amount: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaymentBookingRequest {
    service_provider_id: i64,
    date_of_service: String,
    time_slot: String,
}

#[derive(Deserialize)]
struct VerifyPaymentRequest {
    razorpay_order_id: String,
    razorpay_payment_id: String,
    razorpay_signature: String,
    #[serde(rename = "bookingDTO")]
    booking: PaymentBookingRequest,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/payment")
            .service(web::resource("/create-order").route(web::post().to(create_order)))
            .service(
                web::resource("/verify-payment")
                    .wrap(HttpAuthentication::bearer(user_validator))
                    .route(web::post().to(verify_payment)),
            ),
    );
}

async fn create_order(
    state: web::Data<AppState>,
    payload: web::Json<CreateOrderRequest>,
) -> ApiResult<HttpResponse> {
    let payload = payload.into_inner();
    if payload.amount <= 0 {
        return Err(ApiError::Validation("Amount must be positive".to_string()));
    }
    let order_id = payments::create_order(&state.http, &state.payments, payload.amount).await?;
    Ok(HttpResponse::Ok().body(order_id))
}

/// Verified payment is the only path that creates a booking as a side effect;
/// an invalid signature leaves no trace.
async fn verify_payment(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    payload: web::Json<VerifyPaymentRequest>,
) -> ApiResult<HttpResponse> {
    let payload = payload.into_inner();

    let valid = payments::verify_payment_signature(
        &state.payments.key_secret,
        &payload.razorpay_order_id,
        &payload.razorpay_payment_id,
        &payload.razorpay_signature,
    );
    if !valid {
        return Err(ApiError::BadRequest(
            "Payment verification failed".to_string(),
        ));
    }

    let row = bookings::create_booking(
        &state.db,
        auth.id,
        payload.booking.service_provider_id,
        &payload.booking.date_of_service,
        &payload.booking.time_slot,
        PAYMENT_ONLINE,
    )
    .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": "success",
        "message": "Payment verified and booking confirmed!",
        "booking": BookingDto::from(row),
    })))
}
