use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::{errors::ApiResult, providers, state::AppState};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/chatbot-hook").route(web::post().to(chatbot_hook)));
}

/// Dialogflow fulfillment webhook: a recognized FindProvider intent with
/// slot-filled category/location becomes a provider search and a one-sentence
/// reply.
async fn chatbot_hook(
    state: web::Data<AppState>,
    payload: web::Json<serde_json::Value>,
) -> ApiResult<HttpResponse> {
    let query_result = &payload["queryResult"];
    let intent = query_result["intent"]["displayName"].as_str().unwrap_or("");
    let category = query_result["parameters"]["service_category"]
        .as_str()
        .unwrap_or("");
    let location = query_result["parameters"]["location"].as_str().unwrap_or("");

    let fulfillment_text = if intent == "FindProvider" {
        let hits = providers::search_providers(
            &state.db,
            non_empty(category),
            non_empty(location),
        )
        .await?;
        let first_name = hits.first().map(|hit| hit.name.as_str());
        fulfillment(hits.len(), first_name, category, location)
    } else {
        "Sorry, I couldn't find any results for that.".to_string()
    };

    Ok(HttpResponse::Ok().json(json!({ "fulfillmentText": fulfillment_text })))
}

fn fulfillment(count: usize, first_name: Option<&str>, category: &str, location: &str) -> String {
    match (count, first_name) {
        (0, _) => format!("Sorry, I couldn't find any {category} services in {location}."),
        (1, Some(name)) => format!("I found 1 {category} in {location}: {name}"),
        (n, _) => format!("I found {n} {category} services in {location}."),
    }
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phrasing_for_zero_one_and_many() {
        assert_eq!(
            fulfillment(0, None, "plumbing", "Springfield"),
            "Sorry, I couldn't find any plumbing services in Springfield."
        );
        assert_eq!(
            fulfillment(1, Some("Ravi Plumbing"), "plumbing", "Springfield"),
            "I found 1 plumbing in Springfield: Ravi Plumbing"
        );
        assert_eq!(
            fulfillment(3, Some("Ravi Plumbing"), "plumbing", "Springfield"),
            "I found 3 plumbing services in Springfield."
        );
    }

    #[test]
    fn blank_parameters_become_wildcards() {
        assert_eq!(non_empty(""), None);
        assert_eq!(non_empty("  "), None);
        assert_eq!(non_empty(" plumbing "), Some("plumbing"));
    }
}
