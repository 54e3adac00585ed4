//! Emergency requests and their dispatch fan-out.
//!
//! Clients create an emergency request with their position and the
//! service they need; a background worker finds nearby online providers
//! with the geo-eligibility check and notifies each match through the
//! notification gateway.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Auth | Description |
//! |--------|----------|------|-------------|
//! | POST | `/api/emergencies` | Yes | Create emergency request |
//! | GET | `/api/emergencies/{id}` | Yes | Request with dispatch fan-out |
//! | GET | `/api/emergencies/{id}/dispatches` | Yes | Notified providers |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod workers;

pub use services::{DispatchService, EmergencyService};
pub use workers::DispatchWorker;
