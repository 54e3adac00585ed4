use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::emergencies::models::{
    EmergencyDispatch, EmergencyRequest, EmergencyStatus,
};
use crate::shared::geo::GeoPoint;

/// Whether the failure being recorded spends the last retry.
///
/// `current_retry_count` is the count before this failure is recorded;
/// the request flips to `failed` once the incremented count reaches the
/// budget.
pub fn retries_exhausted(current_retry_count: i32, max_retries: i32) -> bool {
    current_retry_count + 1 >= max_retries
}

/// Service for emergency request records and their lifecycle
pub struct EmergencyService {
    pool: PgPool,
}

impl EmergencyService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new emergency request in `pending` state
    pub async fn create(
        &self,
        requester_id: &str,
        position: GeoPoint,
        service_id: &str,
        description: Option<&str>,
    ) -> Result<EmergencyRequest> {
        sqlx::query_as::<_, EmergencyRequest>(
            r#"
            INSERT INTO emergency_requests
                (requester_id, service_id, requester_latitude, requester_longitude, description)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, requester_id, service_id, requester_latitude, requester_longitude,
                      description, status, retry_count, last_error, created_at, updated_at
            "#,
        )
        .bind(requester_id)
        .bind(service_id)
        .bind(position.latitude())
        .bind(position.longitude())
        .bind(description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create emergency request: {:?}", e);
            AppError::Database(e)
        })
    }

    /// Get an emergency request by id
    pub async fn get_by_id(&self, id: Uuid) -> Result<EmergencyRequest> {
        sqlx::query_as::<_, EmergencyRequest>(
            r#"
            SELECT id, requester_id, service_id, requester_latitude, requester_longitude,
                   description, status, retry_count, last_error, created_at, updated_at
            FROM emergency_requests
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get emergency request: {:?}", e);
            AppError::Database(e)
        })?
        .ok_or_else(|| AppError::NotFound(format!("Emergency request {} not found", id)))
    }

    /// Fetch a batch of pending requests, oldest first, skipping those
    /// that already exhausted their retries
    pub async fn fetch_pending(&self, max_retries: i32, limit: i64) -> Result<Vec<EmergencyRequest>> {
        sqlx::query_as::<_, EmergencyRequest>(
            r#"
            SELECT id, requester_id, service_id, requester_latitude, requester_longitude,
                   description, status, retry_count, last_error, created_at, updated_at
            FROM emergency_requests
            WHERE status = 'pending' AND retry_count < $1
            ORDER BY created_at
            LIMIT $2
            "#,
        )
        .bind(max_retries)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch pending emergency requests: {:?}", e);
            AppError::Database(e)
        })
    }

    /// Mark a request's terminal dispatch outcome
    pub async fn update_status(&self, id: Uuid, status: EmergencyStatus) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE emergency_requests
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update emergency request status: {:?}", e);
            AppError::Database(e)
        })?;

        Ok(())
    }

    /// Record a failed dispatch pass. The request stays `pending` until
    /// the retry budget is spent, then flips to `failed`.
    pub async fn mark_failed(
        &self,
        id: Uuid,
        current_retry_count: i32,
        max_retries: i32,
        error: &str,
    ) -> Result<()> {
        let exhausted = retries_exhausted(current_retry_count, max_retries);
        let status = if exhausted {
            EmergencyStatus::Failed
        } else {
            EmergencyStatus::Pending
        };

        sqlx::query(
            r#"
            UPDATE emergency_requests
            SET status = $2, retry_count = retry_count + 1, last_error = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(error)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to mark emergency request failed: {:?}", e);
            AppError::Database(e)
        })?;

        if exhausted {
            tracing::warn!("Emergency request {} failed permanently: {}", id, error);
        }

        Ok(())
    }

    /// Record one notified provider for a request. Idempotent per
    /// (request, provider), so a retried pass never duplicates rows.
    pub async fn record_dispatch(
        &self,
        request_id: Uuid,
        provider_id: &str,
        distance_km: f64,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO emergency_dispatches (request_id, provider_id, distance_km)
            VALUES ($1, $2, $3)
            ON CONFLICT (request_id, provider_id) DO NOTHING
            "#,
        )
        .bind(request_id)
        .bind(provider_id)
        .bind(distance_km)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to record dispatch: {:?}", e);
            AppError::Database(e)
        })?;

        Ok(())
    }

    /// List the dispatch fan-out for a request, nearest provider first
    pub async fn list_dispatches(&self, request_id: Uuid) -> Result<Vec<EmergencyDispatch>> {
        sqlx::query_as::<_, EmergencyDispatch>(
            r#"
            SELECT id, request_id, provider_id, distance_km, notified_at
            FROM emergency_dispatches
            WHERE request_id = $1
            ORDER BY distance_km
            "#,
        )
        .bind(request_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list dispatches: {:?}", e);
            AppError::Database(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_budget_is_spent_on_the_final_attempt() {
        // Budget of 3: failures recorded at counts 0 and 1 leave the
        // request pending, the failure at count 2 is terminal
        assert!(!retries_exhausted(0, 3));
        assert!(!retries_exhausted(1, 3));
        assert!(retries_exhausted(2, 3));
        assert!(retries_exhausted(3, 3));
    }

    #[test]
    fn single_retry_budget_fails_on_first_error() {
        assert!(retries_exhausted(0, 1));
    }
}
