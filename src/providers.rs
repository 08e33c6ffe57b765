use sqlx::SqlitePool;

use crate::{
    db::{self, PROVIDER_SELECT},
    errors::ApiResult,
    geo::haversine_km,
    models::{NearbyProviderDto, ProviderDto, ProviderRow},
};

/// Case-insensitive substring search over service type and/or location.
/// Returns rows in storage order; no ranking.
pub async fn search_providers(
    pool: &SqlitePool,
    service_type: Option<&str>,
    location: Option<&str>,
) -> ApiResult<Vec<ProviderRow>> {
    let rows = match (service_type, location) {
        (Some(service_type), Some(location)) => {
            sqlx::query_as::<_, ProviderRow>(&format!(
                "{PROVIDER_SELECT} WHERE service_type LIKE '%' || ? || '%' COLLATE NOCASE
                 AND location LIKE '%' || ? || '%' COLLATE NOCASE"
            ))
            .bind(service_type)
            .bind(location)
            .fetch_all(pool)
            .await?
        }
        (Some(service_type), None) => {
            sqlx::query_as::<_, ProviderRow>(&format!(
                "{PROVIDER_SELECT} WHERE service_type LIKE '%' || ? || '%' COLLATE NOCASE"
            ))
            .bind(service_type)
            .fetch_all(pool)
            .await?
        }
        (None, Some(location)) => {
            sqlx::query_as::<_, ProviderRow>(&format!(
                "{PROVIDER_SELECT} WHERE location LIKE '%' || ? || '%' COLLATE NOCASE"
            ))
            .bind(location)
            .fetch_all(pool)
            .await?
        }
        (None, None) => list_providers(pool).await?,
    };
    Ok(rows)
}

pub async fn list_providers(pool: &SqlitePool) -> ApiResult<Vec<ProviderRow>> {
    let rows = sqlx::query_as::<_, ProviderRow>(PROVIDER_SELECT)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Full-scan nearby search: haversine distance to every provider with known
/// coordinates, strict `< radius_km` filter, ascending by distance. Linear in
/// the provider count; fine at this scale, no spatial index.
pub async fn nearby_providers(
    pool: &SqlitePool,
    lat: f64,
    lng: f64,
    radius_km: f64,
    service_type: Option<&str>,
) -> ApiResult<Vec<NearbyProviderDto>> {
    let type_filter = service_type.unwrap_or("").trim().to_string();
    let rows = sqlx::query_as::<_, ProviderRow>(&format!(
        "{PROVIDER_SELECT} WHERE latitude IS NOT NULL AND longitude IS NOT NULL
         AND (? = '' OR service_type LIKE '%' || ? || '%' COLLATE NOCASE)"
    ))
    .bind(&type_filter)
    .bind(&type_filter)
    .fetch_all(pool)
    .await?;

    let mut nearby: Vec<NearbyProviderDto> = rows
        .into_iter()
        .filter_map(|row| {
            let (p_lat, p_lng) = match (row.latitude, row.longitude) {
                (Some(p_lat), Some(p_lng)) => (p_lat, p_lng),
                _ => return None,
            };
            let distance_km = haversine_km(lat, lng, p_lat, p_lng);
            if distance_km < radius_km {
                Some(NearbyProviderDto {
                    provider: ProviderDto::from(row),
                    distance_km,
                })
            } else {
                None
            }
        })
        .collect();

    nearby.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    Ok(nearby)
}

pub async fn get_provider(pool: &SqlitePool, provider_id: i64) -> ApiResult<Option<ProviderRow>> {
    db::fetch_provider(pool, provider_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seed_provider, seed_provider_at, test_pool};

    // Bengaluru city center and a few offsets with known rough distances.
    const BLR: (f64, f64) = (12.9716, 77.5946);

    #[tokio::test]
    async fn substring_search_is_case_insensitive() {
        let pool = test_pool().await;
        seed_provider(&pool, "Ravi", "ravi@example.com", "Plumbing").await;
        seed_provider(&pool, "Meena", "meena@example.com", "Electrical").await;

        let hits = search_providers(&pool, Some("plumb"), None).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Ravi");

        let hits = search_providers(&pool, Some("PLUMB"), None).await.unwrap();
        assert_eq!(hits.len(), 1);

        let hits = search_providers(&pool, None, Some("spring")).await.unwrap();
        assert_eq!(hits.len(), 2);

        let hits = search_providers(&pool, None, None).await.unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn nearby_filters_strictly_and_sorts_ascending() {
        let pool = test_pool().await;
        // ~0 km, ~12 km and ~157 km from the origin
        seed_provider_at(&pool, "Close", "a@example.com", "Plumbing", Some(BLR.0), Some(BLR.1))
            .await;
        seed_provider_at(
            &pool,
            "Mid",
            "b@example.com",
            "Plumbing",
            Some(BLR.0 + 0.11),
            Some(BLR.1),
        )
        .await;
        seed_provider_at(
            &pool,
            "Far",
            "c@example.com",
            "Plumbing",
            Some(BLR.0 + 1.41),
            Some(BLR.1),
        )
        .await;
        // No coordinates: must never appear
        seed_provider(&pool, "Unmapped", "d@example.com", "Plumbing").await;

        let hits = nearby_providers(&pool, BLR.0, BLR.1, 50.0, None).await.unwrap();
        let names: Vec<&str> = hits.iter().map(|h| h.provider.name.as_str()).collect();
        assert_eq!(names, vec!["Close", "Mid"]);
        assert!(hits[0].distance_km < hits[1].distance_km);
        assert!(hits.iter().all(|h| h.distance_km < 50.0));
    }

    #[tokio::test]
    async fn nearby_radius_is_exclusive() {
        let pool = test_pool().await;
        // ~111 km north of the equator origin
        seed_provider_at(&pool, "Edge", "e@example.com", "Plumbing", Some(1.0), Some(0.0)).await;

        let d = crate::geo::haversine_km(0.0, 0.0, 1.0, 0.0);
        let inside = nearby_providers(&pool, 0.0, 0.0, d + 0.01, None).await.unwrap();
        assert_eq!(inside.len(), 1);

        let outside = nearby_providers(&pool, 0.0, 0.0, d, None).await.unwrap();
        assert!(outside.is_empty());
    }

    #[tokio::test]
    async fn nearby_honors_service_type_filter() {
        let pool = test_pool().await;
        seed_provider_at(&pool, "Pipes", "p@example.com", "Plumbing", Some(BLR.0), Some(BLR.1))
            .await;
        seed_provider_at(&pool, "Wires", "w@example.com", "Electrical", Some(BLR.0), Some(BLR.1))
            .await;

        let hits = nearby_providers(&pool, BLR.0, BLR.1, 10.0, Some("plumb"))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].provider.name, "Pipes");

        let hits = nearby_providers(&pool, BLR.0, BLR.1, 10.0, Some("")).await.unwrap();
        assert_eq!(hits.len(), 2);
    }
}
