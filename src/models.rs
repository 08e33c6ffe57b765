use serde::Serialize;

pub const ROLE_USER: &str = "ROLE_USER";
pub const ROLE_PROVIDER: &str = "ROLE_PROVIDER";
pub const ROLE_ADMIN: &str = "ROLE_ADMIN";

pub const STATUS_PENDING: &str = "PENDING";
pub const STATUS_ACCEPTED: &str = "ACCEPTED";
pub const STATUS_REJECTED: &str = "REJECTED";
pub const STATUS_COMPLETED: &str = "COMPLETED";
pub const STATUS_CANCELLED: &str = "CANCELLED";

pub const PAYMENT_CASH: &str = "CASH";
pub const PAYMENT_ONLINE: &str = "ONLINE";

/// Terminal statuses admit no further transition.
pub fn is_terminal_status(status: &str) -> bool {
    matches!(
        status,
        STATUS_REJECTED | STATUS_COMPLETED | STATUS_CANCELLED
    )
}

/// The booking state machine: a provider moves PENDING to ACCEPTED or
/// REJECTED, and an ACCEPTED booking to COMPLETED or CANCELLED.
pub fn is_valid_transition(from: &str, to: &str) -> bool {
    matches!(
        (from, to),
        (STATUS_PENDING, STATUS_ACCEPTED)
            | (STATUS_PENDING, STATUS_REJECTED)
            | (STATUS_ACCEPTED, STATUS_COMPLETED)
            | (STATUS_ACCEPTED, STATUS_CANCELLED)
    )
}

pub fn is_known_status(status: &str) -> bool {
    matches!(
        status,
        STATUS_PENDING | STATUS_ACCEPTED | STATUS_REJECTED | STATUS_COMPLETED | STATUS_CANCELLED
    )
}

pub fn is_known_payment_method(method: &str) -> bool {
    matches!(method, PAYMENT_CASH | PAYMENT_ONLINE)
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub role: String,
    pub created_at: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProviderRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub service_type: String,
    pub experience_years: i64,
    pub service_cost: Option<f64>,
    pub location: Option<String>,
    pub availability: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub role: String,
    pub created_at: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AdminRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: String,
}

/// One booking joined with its user, provider, and optional review.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BookingDetailRow {
    pub id: i64,
    pub user_id: i64,
    pub provider_id: i64,
    pub date_of_service: String,
    pub time_slot: String,
    pub status: String,
    pub payment_method: String,
    pub user_name: String,
    pub user_email: String,
    pub provider_name: String,
    pub provider_email: String,
    pub provider_service_type: String,
    pub review_id: Option<i64>,
    pub review_rating: Option<i64>,
    pub review_comment: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub role: String,
}

impl From<UserRow> for UserDto {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            location: row.location,
            role: row.role,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderDto {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub service_type: String,
    pub experience_years: i64,
    pub service_cost: Option<f64>,
    pub location: Option<String>,
    pub availability: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub role: String,
}

impl From<ProviderRow> for ProviderDto {
    fn from(row: ProviderRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            service_type: row.service_type,
            experience_years: row.experience_years,
            service_cost: row.service_cost,
            location: row.location,
            availability: row.availability,
            latitude: row.latitude,
            longitude: row.longitude,
            role: row.role,
        }
    }
}

/// Provider plus its haversine distance from a nearby-search origin.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyProviderDto {
    #[serde(flatten)]
    pub provider: ProviderDto,
    pub distance_km: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDto {
    pub id: i64,
    pub booking_id: i64,
    pub rating: i64,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDto {
    pub id: i64,
    pub date_of_service: String,
    pub time_slot: String,
    pub status: String,
    pub payment_method: String,
    pub user_id: i64,
    pub user_name: String,
    pub user_email: String,
    pub service_provider_id: i64,
    pub provider_name: String,
    pub provider_email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review: Option<ReviewDto>,
}

impl From<BookingDetailRow> for BookingDto {
    fn from(row: BookingDetailRow) -> Self {
        let review = match (row.review_id, row.review_rating) {
            (Some(id), Some(rating)) => Some(ReviewDto {
                id,
                booking_id: row.id,
                rating,
                comment: row.review_comment.clone(),
            }),
            _ => None,
        };
        Self {
            id: row.id,
            date_of_service: row.date_of_service,
            time_slot: row.time_slot,
            status: row.status,
            payment_method: row.payment_method,
            user_id: row.user_id,
            user_name: row.user_name,
            user_email: row.user_email,
            service_provider_id: row.provider_id,
            provider_name: row.provider_name,
            provider_email: row.provider_email,
            review,
        }
    }
}
