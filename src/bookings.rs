use sqlx::SqlitePool;

use crate::{
    db,
    errors::{ApiError, ApiResult},
    models::{
        is_terminal_status, is_valid_transition, BookingDetailRow, ReviewDto, STATUS_COMPLETED,
        STATUS_PENDING,
    },
};

/// Create a booking in the PENDING state. Shared by the standard booking flow
/// and the payment-confirmation flow.
pub async fn create_booking(
    pool: &SqlitePool,
    user_id: i64,
    provider_id: i64,
    date_of_service: &str,
    time_slot: &str,
    payment_method: &str,
) -> ApiResult<BookingDetailRow> {
    if db::fetch_user(pool, user_id).await?.is_none() {
        return Err(ApiError::NotFound("User not found".to_string()));
    }
    if db::fetch_provider(pool, provider_id).await?.is_none() {
        return Err(ApiError::NotFound("Service Provider not found".to_string()));
    }

    let result = sqlx::query(
        r#"INSERT INTO bookings (user_id, provider_id, date_of_service, time_slot, status, payment_method, created_at)
           VALUES (?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(user_id)
    .bind(provider_id)
    .bind(date_of_service)
    .bind(time_slot)
    .bind(STATUS_PENDING)
    .bind(payment_method)
    .bind(chrono::Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    let booking_id = result.last_insert_rowid();
    db::fetch_booking_detail(pool, booking_id)
        .await?
        .ok_or_else(|| ApiError::Internal("booking vanished after insert".to_string()))
}

/// Transition a booking's status on behalf of its owning provider.
///
/// Read-check-update runs in one transaction. Concurrent transitions on the
/// same booking are not serialized beyond that; last write wins.
pub async fn update_booking_status(
    pool: &SqlitePool,
    provider_id: i64,
    booking_id: i64,
    new_status: &str,
) -> ApiResult<BookingDetailRow> {
    let mut tx = pool.begin().await?;

    let current = sqlx::query_as::<_, (i64, String)>(
        "SELECT provider_id, status FROM bookings WHERE id = ?",
    )
    .bind(booking_id)
    .fetch_optional(&mut *tx)
    .await?;

    let (owner_id, status) = match current {
        Some(row) => row,
        None => return Err(ApiError::NotFound("Booking not found".to_string())),
    };

    if owner_id != provider_id {
        return Err(ApiError::BadRequest(
            "This booking does not belong to you".to_string(),
        ));
    }

    if is_terminal_status(&status) {
        return Err(ApiError::BadRequest(
            "Cannot change status of a completed or cancelled booking".to_string(),
        ));
    }

    if !is_valid_transition(&status, new_status) {
        return Err(ApiError::BadRequest(format!(
            "Cannot change status from {status} to {new_status}"
        )));
    }

    sqlx::query("UPDATE bookings SET status = ? WHERE id = ?")
        .bind(new_status)
        .bind(booking_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    db::fetch_booking_detail(pool, booking_id)
        .await?
        .ok_or_else(|| ApiError::Internal("booking vanished after update".to_string()))
}

/// A review is allowed once per booking, only by the booking's user, and only
/// after the booking completed.
pub async fn submit_review(
    pool: &SqlitePool,
    user_id: i64,
    booking_id: i64,
    rating: i64,
    comment: Option<&str>,
) -> ApiResult<ReviewDto> {
    let booking = sqlx::query_as::<_, (i64, String)>(
        "SELECT id, status FROM bookings WHERE id = ? AND user_id = ?",
    )
    .bind(booking_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    let (booking_id, status) = match booking {
        Some(row) => row,
        None => {
            return Err(ApiError::NotFound(
                "Booking not found or does not belong to user".to_string(),
            ))
        }
    };

    if status != STATUS_COMPLETED {
        return Err(ApiError::BadRequest(
            "Cannot review a booking that is not completed".to_string(),
        ));
    }

    let existing = sqlx::query_scalar::<_, i64>(
        "SELECT EXISTS (SELECT 1 FROM reviews WHERE booking_id = ?)",
    )
    .bind(booking_id)
    .fetch_one(pool)
    .await?;
    if existing != 0 {
        return Err(ApiError::BadRequest(
            "A review for this booking already exists".to_string(),
        ));
    }

    let result = sqlx::query(
        "INSERT INTO reviews (booking_id, rating, comment, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(booking_id)
    .bind(rating)
    .bind(comment)
    .bind(chrono::Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    Ok(ReviewDto {
        id: result.last_insert_rowid(),
        booking_id,
        rating,
        comment: comment.map(str::to_string),
    })
}
