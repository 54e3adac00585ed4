use sqlx::PgPool;

use crate::core::error::{AppError, Result};
use crate::features::providers::models::ProviderLocation;
use crate::shared::geo::{GeoPoint, DEFAULT_SERVICE_RADIUS_KM};

/// Degrees of latitude per kilometer, for the bounding-box prefilter
const KM_PER_DEGREE_LAT: f64 = 111.0;

/// Slack added to the bounding box so the approximation never excludes a
/// provider the exact Haversine check would accept
const BOUNDING_BOX_MARGIN_DEG: f64 = 0.01;

/// Service for provider location records (heartbeat writes, candidate reads)
pub struct LocationService {
    pool: PgPool,
}

impl LocationService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Upsert a provider's last known location, keyed by provider id.
    ///
    /// Heartbeats are idempotent: a write that lands after the provider
    /// went offline only refreshes coordinates and `updated_at`.
    pub async fn upsert_location(
        &self,
        provider_id: &str,
        position: GeoPoint,
    ) -> Result<ProviderLocation> {
        sqlx::query_as::<_, ProviderLocation>(
            r#"
            INSERT INTO provider_locations (provider_id, latitude, longitude, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (provider_id) DO UPDATE
            SET latitude = EXCLUDED.latitude,
                longitude = EXCLUDED.longitude,
                updated_at = NOW()
            RETURNING provider_id, latitude, longitude, service_radius_km,
                      is_online, service_ids, updated_at
            "#,
        )
        .bind(provider_id)
        .bind(position.latitude())
        .bind(position.longitude())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to upsert location for provider {}: {:?}", provider_id, e);
            AppError::Database(e)
        })
    }

    /// Toggle the online flag, optionally updating radius and advertised services
    pub async fn set_availability(
        &self,
        provider_id: &str,
        is_online: bool,
        service_radius_km: Option<f64>,
        service_ids: Option<Vec<String>>,
    ) -> Result<ProviderLocation> {
        sqlx::query_as::<_, ProviderLocation>(
            r#"
            INSERT INTO provider_locations (provider_id, is_online, service_radius_km, service_ids, updated_at)
            VALUES ($1, $2, $3, COALESCE($4, ARRAY[]::TEXT[]), NOW())
            ON CONFLICT (provider_id) DO UPDATE
            SET is_online = EXCLUDED.is_online,
                service_radius_km = COALESCE($3, provider_locations.service_radius_km),
                service_ids = COALESCE($4, provider_locations.service_ids),
                updated_at = NOW()
            RETURNING provider_id, latitude, longitude, service_radius_km,
                      is_online, service_ids, updated_at
            "#,
        )
        .bind(provider_id)
        .bind(is_online)
        .bind(service_radius_km)
        .bind(service_ids)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to set availability for provider {}: {:?}", provider_id, e);
            AppError::Database(e)
        })
    }

    /// Get a provider's location record
    pub async fn get_by_provider_id(&self, provider_id: &str) -> Result<ProviderLocation> {
        sqlx::query_as::<_, ProviderLocation>(
            r#"
            SELECT provider_id, latitude, longitude, service_radius_km,
                   is_online, service_ids, updated_at
            FROM provider_locations
            WHERE provider_id = $1
            "#,
        )
        .bind(provider_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get location for provider {}: {:?}", provider_id, e);
            AppError::Database(e)
        })?
        .ok_or_else(|| {
            AppError::NotFound(format!("No location record for provider {}", provider_id))
        })
    }

    /// Find online candidate providers near a requester for one service.
    ///
    /// Uses a per-row bounding-box approximation (each provider's own
    /// service radius, defaulted to 20 km) for initial filtering; the
    /// exact Haversine eligibility check runs in the dispatch path.
    /// 1 degree of latitude is approximately 111km; longitude shrinks
    /// with the cosine of the latitude. The longitude delta is wrapped
    /// at the antimeridian, so a requester at 179.99° still sees a
    /// provider at -179.99°.
    pub async fn find_candidates(
        &self,
        requester: GeoPoint,
        service_id: &str,
    ) -> Result<Vec<ProviderLocation>> {
        sqlx::query_as::<_, ProviderLocation>(
            r#"
            SELECT provider_id, latitude, longitude, service_radius_km,
                   is_online, service_ids, updated_at
            FROM provider_locations
            WHERE is_online = TRUE
              AND latitude IS NOT NULL
              AND longitude IS NOT NULL
              AND $3 = ANY(service_ids)
              AND ABS(latitude - $1) <= COALESCE(service_radius_km, $4) / $5 + $6
              AND LEAST(ABS(longitude - $2), 360 - ABS(longitude - $2)) <=
                  COALESCE(service_radius_km, $4) / $5
                      / GREATEST(ABS(COS(RADIANS($1))), 0.01)
                  + $6
            "#,
        )
        .bind(requester.latitude())
        .bind(requester.longitude())
        .bind(service_id)
        .bind(DEFAULT_SERVICE_RADIUS_KM)
        .bind(KM_PER_DEGREE_LAT)
        .bind(BOUNDING_BOX_MARGIN_DEG)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to find candidate providers: {:?}", e);
            AppError::Database(e)
        })
    }
}
