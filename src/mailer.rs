use crate::{
    models::{BookingDetailRow, STATUS_ACCEPTED, STATUS_REJECTED},
    state::{AppState, MailConfig},
};

/// Dispatch the booking-decision email for a transition to ACCEPTED or
/// REJECTED. Fire-and-forget: the task is spawned and never awaited, delivery
/// is at-most-once, failures are logged and swallowed.
pub fn notify_status_change(state: &AppState, booking: &BookingDetailRow) {
    let message = match booking.status.as_str() {
        STATUS_ACCEPTED => confirmation_message(booking),
        STATUS_REJECTED => rejection_message(booking),
        _ => return,
    };

    if !state.mail.enabled() {
        return;
    }
    if booking.user_email.trim().is_empty() {
        log::warn!("Recipient email is empty for booking {}", booking.id);
        return;
    }

    let client = state.http.clone();
    let config = state.mail.clone();
    let to = booking.user_email.clone();
    let (subject, body) = message;
    tokio::spawn(async move {
        if let Err(err) = send_mail(&client, &config, &to, &subject, &body).await {
            log::warn!("Email send failed for {to}: {err}");
        }
    });
}

pub fn confirmation_message(booking: &BookingDetailRow) -> (String, String) {
    let subject = format!(
        "Your ServiceFinder Booking is Confirmed! (ID: {})",
        booking.id
    );
    let body = format!(
        "Hi {},\n\n\
         Your booking with {} is confirmed.\n\n\
         Details:\n\
         Service: {}\n\
         Date: {}\n\
         Time: {}\n\n\
         Thank you for using ServiceFinder!",
        booking.user_name,
        booking.provider_name,
        booking.provider_service_type,
        booking.date_of_service,
        booking.time_slot,
    );
    (subject, body)
}

pub fn rejection_message(booking: &BookingDetailRow) -> (String, String) {
    let subject = format!("Booking Update: Request Declined (ID: {})", booking.id);
    let body = format!(
        "Hi {},\n\n\
         We are sorry, but {} is unable to accept your booking request for:\n\n\
         Service: {}\n\
         Date: {}\n\
         Time: {}\n\n\
         Please feel free to search for another provider.\n\n\
         Thank you for using ServiceFinder.",
        booking.user_name,
        booking.provider_name,
        booking.provider_service_type,
        booking.date_of_service,
        booking.time_slot,
    );
    (subject, body)
}

async fn send_mail(
    client: &reqwest::Client,
    config: &MailConfig,
    to: &str,
    subject: &str,
    body: &str,
) -> Result<(), reqwest::Error> {
    let payload = serde_json::json!({
        "from": config.from_address,
        "to": to,
        "subject": subject,
        "text": body,
    });

    client
        .post(&config.api_url)
        .bearer_auth(&config.api_token)
        .json(&payload)
        .send()
        .await?
        .error_for_status()?;
    Ok(())
}
