use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// Mean Earth radius in kilometers (for Haversine formula)
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Service radius applied when a provider has never configured one.
/// A stored radius of exactly zero is a legitimate "on-site only"
/// configuration and is never replaced by this default.
pub const DEFAULT_SERVICE_RADIUS_KM: f64 = 20.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeoError {
    #[error("latitude {0} is out of range [-90, 90]")]
    InvalidLatitude(f64),

    #[error("longitude {0} is out of range [-180, 180]")]
    InvalidLongitude(f64),
}

/// A validated coordinate pair in signed decimal degrees.
///
/// Construction is the single place coordinate ranges are checked;
/// everything downstream can assume a well-formed point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(GeoError::InvalidLatitude(latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(GeoError::InvalidLongitude(longitude));
        }

        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// Calculate the great-circle distance between two points in kilometers.
///
/// Uses the atan2 form of the Haversine formula, which stays numerically
/// stable for antipodal points where the naive asin form does not.
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let delta_lat = (b.latitude - a.latitude).to_radians();
    let delta_lng = (b.longitude - a.longitude).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat_a.cos() * lat_b.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// Location state of a candidate provider, as stored by the heartbeat.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateLocation {
    /// Last reported position; `None` if the provider never shared one
    pub coordinates: Option<GeoPoint>,
    /// Configured service radius; falls back to [`DEFAULT_SERVICE_RADIUS_KM`]
    pub service_radius_km: Option<f64>,
    pub is_online: bool,
}

/// Outcome of the geo-eligibility check for one candidate provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityCheck {
    pub eligible: bool,
    /// Distance to the requester; `None` when the provider has no coordinates
    pub distance_km: Option<f64>,
}

/// Decide whether a candidate provider is in range of an emergency requester.
///
/// A provider without coordinates can never match and yields
/// `eligible = false` with no distance, not an error. The radius boundary
/// is inclusive: a distance exactly equal to the service radius matches.
pub fn check_eligibility(requester: GeoPoint, candidate: &CandidateLocation) -> EligibilityCheck {
    let Some(position) = candidate.coordinates else {
        return EligibilityCheck {
            eligible: false,
            distance_km: None,
        };
    };

    let distance_km = haversine_km(requester, position);
    let radius = candidate
        .service_radius_km
        .unwrap_or(DEFAULT_SERVICE_RADIUS_KM);

    EligibilityCheck {
        eligible: candidate.is_online && distance_km <= radius,
        distance_km: Some(distance_km),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(lat: f64, lng: f64) -> GeoPoint {
        GeoPoint::new(lat, lng).unwrap()
    }

    fn online_candidate(lat: f64, lng: f64, radius: Option<f64>) -> CandidateLocation {
        CandidateLocation {
            coordinates: Some(point(lat, lng)),
            service_radius_km: radius,
            is_online: true,
        }
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        assert_eq!(
            GeoPoint::new(90.5, 0.0),
            Err(GeoError::InvalidLatitude(90.5))
        );
        assert_eq!(
            GeoPoint::new(0.0, -180.5),
            Err(GeoError::InvalidLongitude(-180.5))
        );
        assert!(GeoPoint::new(f64::NAN, 0.0).is_err());
        assert!(GeoPoint::new(0.0, f64::INFINITY).is_err());
        // Boundary values are valid
        assert!(GeoPoint::new(90.0, 180.0).is_ok());
        assert!(GeoPoint::new(-90.0, -180.0).is_ok());
    }

    #[test]
    fn same_point_has_zero_distance() {
        let lisbon = point(38.7223, -9.1393);
        assert_eq!(haversine_km(lisbon, lisbon), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = point(38.8, -9.1);
        let b = point(41.15, -8.61);
        assert!((haversine_km(a, b) - haversine_km(b, a)).abs() < 1e-9);
    }

    #[test]
    fn nearby_provider_within_radius_is_eligible() {
        // Requester near Lisbon, provider in central Lisbon: ~8.9 km
        let requester = point(38.8, -9.1);
        let result = check_eligibility(requester, &online_candidate(38.7223, -9.1393, Some(50.0)));

        assert!(result.eligible);
        let distance = result.distance_km.unwrap();
        assert!(distance > 8.0 && distance < 10.0, "got {distance}");
    }

    #[test]
    fn distant_provider_is_not_eligible() {
        // Requester near Lisbon, provider in Porto: ~275 km, far past 20 km
        let requester = point(38.8, -9.1);
        let result = check_eligibility(requester, &online_candidate(41.15, -8.61, Some(20.0)));

        assert!(!result.eligible);
        let distance = result.distance_km.unwrap();
        assert!(distance > 260.0 && distance < 290.0, "got {distance}");
    }

    #[test]
    fn antipodal_points_remain_stable() {
        let a = point(0.0, 0.0);
        let b = point(0.0, 180.0);
        let distance = haversine_km(a, b);

        // Half the Earth's circumference, ~20015 km
        assert!(distance.is_finite());
        assert!((distance - 20015.0).abs() < 10.0, "got {distance}");
    }

    #[test]
    fn boundary_distance_equal_to_radius_is_eligible() {
        let requester = point(0.0, 0.0);
        let candidate = online_candidate(0.0, 0.1, None);
        let distance = check_eligibility(requester, &candidate).distance_km.unwrap();

        // Set the radius to the exact computed distance: inclusive boundary
        let exact = CandidateLocation {
            service_radius_km: Some(distance),
            ..candidate
        };
        assert!(check_eligibility(requester, &exact).eligible);

        // Anything short of it is not
        let short = CandidateLocation {
            service_radius_km: Some(distance - 1e-9),
            ..exact
        };
        assert!(!check_eligibility(requester, &short).eligible);
    }

    #[test]
    fn zero_radius_matches_only_identical_coordinates() {
        let requester = point(38.7223, -9.1393);

        let colocated = online_candidate(38.7223, -9.1393, Some(0.0));
        assert!(check_eligibility(requester, &colocated).eligible);

        let nearby = online_candidate(38.7224, -9.1393, Some(0.0));
        assert!(!check_eligibility(requester, &nearby).eligible);
    }

    #[test]
    fn missing_coordinates_never_match() {
        let requester = point(38.8, -9.1);
        let candidate = CandidateLocation {
            coordinates: None,
            service_radius_km: Some(50.0),
            is_online: true,
        };

        let result = check_eligibility(requester, &candidate);
        assert!(!result.eligible);
        assert_eq!(result.distance_km, None);
    }

    #[test]
    fn offline_provider_reports_distance_but_not_eligibility() {
        let requester = point(38.8, -9.1);
        let candidate = CandidateLocation {
            is_online: false,
            ..online_candidate(38.7223, -9.1393, Some(50.0))
        };

        let result = check_eligibility(requester, &candidate);
        assert!(!result.eligible);
        assert!(result.distance_km.is_some());
    }

    #[test]
    fn eligibility_is_deterministic() {
        let requester = point(38.8, -9.1);
        let candidate = online_candidate(38.7223, -9.1393, Some(50.0));

        let first = check_eligibility(requester, &candidate);
        for _ in 0..100 {
            assert_eq!(check_eligibility(requester, &candidate), first);
        }
    }

    #[test]
    fn distance_symmetry_holds_across_a_coordinate_grid() {
        for lat in [-80.0, -45.0, 0.0, 33.3, 89.0] {
            for lng in [-179.0, -90.0, 0.0, 45.5, 179.0] {
                let a = point(lat, lng);
                let b = point(lat / 2.0, lng / 2.0);
                assert!((haversine_km(a, b) - haversine_km(b, a)).abs() < 1e-9);
                assert_eq!(haversine_km(a, a), 0.0);
            }
        }
    }
}
