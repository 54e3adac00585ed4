mod dispatch_service;
mod emergency_service;

pub use dispatch_service::{select_matches, DispatchMatch, DispatchOutcome, DispatchService};
pub use emergency_service::EmergencyService;
