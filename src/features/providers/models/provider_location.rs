use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::shared::geo::{CandidateLocation, GeoPoint};

/// Database model for a provider's last known location and dispatch settings
#[derive(Debug, Clone, FromRow)]
pub struct ProviderLocation {
    pub provider_id: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub service_radius_km: Option<f64>,
    pub is_online: bool,
    pub service_ids: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

impl ProviderLocation {
    /// View of this record as a geo-eligibility candidate.
    ///
    /// Coordinates that fail range validation (should not happen, the
    /// heartbeat endpoint validates on write) are treated the same as a
    /// provider who never shared a location.
    pub fn candidate_location(&self) -> CandidateLocation {
        let coordinates = match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => match GeoPoint::new(lat, lng) {
                Ok(point) => Some(point),
                Err(e) => {
                    tracing::warn!(
                        "Stored coordinates for provider {} are invalid: {}",
                        self.provider_id,
                        e
                    );
                    None
                }
            },
            _ => None,
        };

        CandidateLocation {
            coordinates,
            service_radius_km: self.service_radius_km,
            is_online: self.is_online,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(lat: Option<f64>, lng: Option<f64>) -> ProviderLocation {
        ProviderLocation {
            provider_id: "p-1".to_string(),
            latitude: lat,
            longitude: lng,
            service_radius_km: Some(10.0),
            is_online: true,
            service_ids: vec!["plumbing".to_string()],
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn candidate_with_coordinates() {
        let candidate = record(Some(38.7), Some(-9.1)).candidate_location();
        assert!(candidate.coordinates.is_some());
        assert!(candidate.is_online);
    }

    #[test]
    fn candidate_without_coordinates() {
        assert!(record(None, None).candidate_location().coordinates.is_none());
        assert!(record(Some(38.7), None).candidate_location().coordinates.is_none());
    }

    #[test]
    fn candidate_with_corrupt_coordinates() {
        // Out-of-range stored values degrade to "no location" instead of panicking
        let candidate = record(Some(123.0), Some(-9.1)).candidate_location();
        assert!(candidate.coordinates.is_none());
    }
}
