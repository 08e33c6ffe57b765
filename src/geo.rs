use crate::state::GeoConfig;

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two coordinates, in kilometers.
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();
    EARTH_RADIUS_KM * c
}

/// Resolve an address to coordinates through the geocoding API. Best effort:
/// failures are logged and reported as None so callers can proceed without
/// coordinates.
pub async fn geocode(
    client: &reqwest::Client,
    config: &GeoConfig,
    address: &str,
) -> Option<(f64, f64)> {
    if !config.enabled() {
        return None;
    }

    let response = client
        .get(&config.api_url)
        .query(&[("q", address), ("key", config.api_key.as_str()), ("limit", "1")])
        .send()
        .await;

    let body: serde_json::Value = match response {
        Ok(response) => match response.json().await {
            Ok(body) => body,
            Err(err) => {
                log::warn!("Geocoding response unreadable for '{address}': {err}");
                return None;
            }
        },
        Err(err) => {
            log::warn!("Geocoding request failed for '{address}': {err}");
            return None;
        }
    };

    let geometry = &body["results"][0]["geometry"];
    match (geometry["lat"].as_f64(), geometry["lng"].as_f64()) {
        (Some(lat), Some(lng)) => Some((lat, lng)),
        _ => {
            log::warn!("Geocoding returned no coordinates for '{address}'");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_distance_for_same_point() {
        assert!(haversine_km(12.97, 77.59, 12.97, 77.59).abs() < 1e-9);
    }

    #[test]
    fn one_degree_of_longitude_at_equator() {
        let d = haversine_km(0.0, 0.0, 0.0, 1.0);
        assert!((d - 111.19).abs() < 0.5, "got {d}");
    }

    #[test]
    fn london_to_paris_is_about_343_km() {
        let d = haversine_km(51.5074, -0.1278, 48.8566, 2.3522);
        assert!((d - 343.5).abs() < 5.0, "got {d}");
    }

    #[test]
    fn symmetric() {
        let a = haversine_km(12.97, 77.59, 13.08, 80.27);
        let b = haversine_km(13.08, 80.27, 12.97, 77.59);
        assert!((a - b).abs() < 1e-9);
    }
}
