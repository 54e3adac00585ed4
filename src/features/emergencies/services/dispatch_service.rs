use std::sync::Arc;

use crate::core::error::Result;
use crate::features::emergencies::models::{EmergencyRequest, EmergencyStatus};
use crate::features::emergencies::services::EmergencyService;
use crate::features::notifications::{DispatchNotice, NotificationGateway};
use crate::features::providers::models::ProviderLocation;
use crate::features::providers::LocationService;
use crate::shared::geo::{check_eligibility, GeoPoint};

/// An eligible provider together with the computed distance
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchMatch {
    pub provider_id: String,
    pub distance_km: f64,
}

/// Outcome of one dispatch pass over a request
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchOutcome {
    pub status: EmergencyStatus,
    pub matched: usize,
    pub notified: usize,
}

/// Service that fans an emergency request out to eligible providers
pub struct DispatchService {
    emergency_service: Arc<EmergencyService>,
    location_service: Arc<LocationService>,
    gateway: Arc<dyn NotificationGateway>,
}

impl DispatchService {
    pub fn new(
        emergency_service: Arc<EmergencyService>,
        location_service: Arc<LocationService>,
        gateway: Arc<dyn NotificationGateway>,
    ) -> Self {
        Self {
            emergency_service,
            location_service,
            gateway,
        }
    }

    /// Run one dispatch pass for a pending request.
    ///
    /// Candidates come from a bounding-box prefilter; the exact
    /// per-candidate decision is the shared geo-eligibility check. Each
    /// eligible provider gets a dispatch row and a gateway notice; a
    /// delivery failure is logged per provider and never fails the
    /// request.
    pub async fn dispatch(&self, request: &EmergencyRequest) -> Result<DispatchOutcome> {
        let requester = GeoPoint::new(request.requester_latitude, request.requester_longitude)?;

        let candidates = self
            .location_service
            .find_candidates(requester, &request.service_id)
            .await?;

        let matches = select_matches(requester, &candidates);

        if matches.is_empty() {
            self.emergency_service
                .update_status(request.id, EmergencyStatus::NoMatch)
                .await?;
            tracing::info!(
                "Emergency request {} had no eligible provider ({} candidates screened)",
                request.id,
                candidates.len()
            );
            return Ok(DispatchOutcome {
                status: EmergencyStatus::NoMatch,
                matched: 0,
                notified: 0,
            });
        }

        for matched in &matches {
            self.emergency_service
                .record_dispatch(request.id, &matched.provider_id, matched.distance_km)
                .await?;
        }

        let notified = notify_matches(self.gateway.as_ref(), request, &matches).await;

        self.emergency_service
            .update_status(request.id, EmergencyStatus::Dispatched)
            .await?;

        tracing::info!(
            "Emergency request {} dispatched to {} providers ({} notified)",
            request.id,
            matches.len(),
            notified
        );

        Ok(DispatchOutcome {
            status: EmergencyStatus::Dispatched,
            matched: matches.len(),
            notified,
        })
    }
}

/// Send a dispatch notice to every matched provider, returning how many
/// deliveries succeeded.
///
/// Best-effort fan-out: a delivery failure is logged per provider and
/// never aborts the rest. The dispatch rows stand either way, so a
/// provider the gateway missed still sees the request in-app on next
/// sync.
pub async fn notify_matches(
    gateway: &dyn NotificationGateway,
    request: &EmergencyRequest,
    matches: &[DispatchMatch],
) -> usize {
    let mut notified = 0;
    for matched in matches {
        let notice = DispatchNotice {
            request_id: request.id,
            service_id: request.service_id.clone(),
            requester_latitude: request.requester_latitude,
            requester_longitude: request.requester_longitude,
            distance_km: matched.distance_km,
            channels: DispatchNotice::all_channels(),
        };

        match gateway.notify_dispatch(&matched.provider_id, &notice).await {
            Ok(()) => notified += 1,
            Err(e) => {
                tracing::warn!(
                    "Failed to notify provider {} for request {}: {}",
                    matched.provider_id,
                    request.id,
                    e
                );
            }
        }
    }
    notified
}

/// Evaluate geo-eligibility for every candidate, nearest match first.
///
/// Each candidate is checked independently against the requester's
/// position; there is no shared state across evaluations.
pub fn select_matches(requester: GeoPoint, candidates: &[ProviderLocation]) -> Vec<DispatchMatch> {
    let mut matches: Vec<DispatchMatch> = candidates
        .iter()
        .filter_map(|candidate| {
            let check = check_eligibility(requester, &candidate.candidate_location());
            if check.eligible {
                Some(DispatchMatch {
                    provider_id: candidate.provider_id.clone(),
                    distance_km: check.distance_km.unwrap_or(0.0),
                })
            } else {
                None
            }
        })
        .collect();

    matches.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::AppError;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;
    use uuid::Uuid;

    fn provider(
        id: &str,
        lat: Option<f64>,
        lng: Option<f64>,
        radius: Option<f64>,
        is_online: bool,
    ) -> ProviderLocation {
        ProviderLocation {
            provider_id: id.to_string(),
            latitude: lat,
            longitude: lng,
            service_radius_km: radius,
            is_online,
            service_ids: vec!["plumbing".to_string()],
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn selects_only_online_providers_within_radius() {
        let requester = GeoPoint::new(38.8, -9.1).unwrap();
        let candidates = vec![
            // Central Lisbon, ~8.9 km away, in range
            provider("lisbon", Some(38.7223), Some(-9.1393), Some(50.0), true),
            // Porto, ~275 km away, far out of range
            provider("porto", Some(41.15), Some(-8.61), Some(20.0), true),
            // In range but offline
            provider("offline", Some(38.79), Some(-9.11), Some(50.0), false),
            // Online but never shared a location
            provider("no-location", None, None, Some(50.0), true),
        ];

        let matches = select_matches(requester, &candidates);

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].provider_id, "lisbon");
        assert!(matches[0].distance_km > 8.0 && matches[0].distance_km < 10.0);
    }

    #[test]
    fn default_radius_applies_only_when_unset() {
        let requester = GeoPoint::new(38.8, -9.1).unwrap();
        let candidates = vec![
            // ~8.9 km away with no configured radius: the 20 km default applies
            provider("defaulted", Some(38.7223), Some(-9.1393), None, true),
            // Same position with an explicit zero radius: on-site only, no match
            provider("on-site", Some(38.7223), Some(-9.1393), Some(0.0), true),
        ];

        let matches = select_matches(requester, &candidates);

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].provider_id, "defaulted");
    }

    #[test]
    fn matches_are_ordered_nearest_first() {
        let requester = GeoPoint::new(38.8, -9.1).unwrap();
        let candidates = vec![
            provider("farther", Some(38.7223), Some(-9.1393), Some(50.0), true),
            provider("nearer", Some(38.79), Some(-9.11), Some(50.0), true),
        ];

        let matches = select_matches(requester, &candidates);

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].provider_id, "nearer");
        assert!(matches[0].distance_km < matches[1].distance_km);
    }

    #[test]
    fn empty_candidate_set_produces_no_matches() {
        let requester = GeoPoint::new(38.8, -9.1).unwrap();
        assert!(select_matches(requester, &[]).is_empty());
    }

    #[test]
    fn providers_across_the_antimeridian_are_matched() {
        // ~1.1 km apart even though the raw longitude delta is ~359.99°
        let requester = GeoPoint::new(0.0, 179.995).unwrap();
        let candidates = vec![provider(
            "across",
            Some(0.0),
            Some(-179.995),
            Some(20.0),
            true,
        )];

        let matches = select_matches(requester, &candidates);

        assert_eq!(matches.len(), 1);
        assert!(matches[0].distance_km < 2.0, "got {}", matches[0].distance_km);
    }

    struct FlakyGateway {
        reject: &'static str,
        attempted: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl NotificationGateway for FlakyGateway {
        async fn notify_dispatch(
            &self,
            provider_id: &str,
            _notice: &DispatchNotice,
        ) -> crate::core::error::Result<()> {
            self.attempted.lock().unwrap().push(provider_id.to_string());
            if provider_id == self.reject {
                return Err(AppError::ExternalServiceError("HTTP 502".to_string()));
            }
            Ok(())
        }
    }

    fn pending_request() -> EmergencyRequest {
        EmergencyRequest {
            id: Uuid::new_v4(),
            requester_id: "c-1".to_string(),
            service_id: "plumbing".to_string(),
            requester_latitude: 38.8,
            requester_longitude: -9.1,
            description: None,
            status: EmergencyStatus::Pending,
            retry_count: 0,
            last_error: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn gateway_failure_for_one_provider_does_not_stop_the_fan_out() {
        let gateway = FlakyGateway {
            reject: "p-2",
            attempted: Mutex::new(Vec::new()),
        };
        let matches = vec![
            DispatchMatch {
                provider_id: "p-1".to_string(),
                distance_km: 1.0,
            },
            DispatchMatch {
                provider_id: "p-2".to_string(),
                distance_km: 2.0,
            },
            DispatchMatch {
                provider_id: "p-3".to_string(),
                distance_km: 3.0,
            },
        ];

        let notified = notify_matches(&gateway, &pending_request(), &matches).await;

        assert_eq!(notified, 2);
        // Every provider was attempted, including the ones after the failure
        assert_eq!(
            *gateway.attempted.lock().unwrap(),
            vec!["p-1", "p-2", "p-3"]
        );
    }
}
