//! Provider location records and the live location heartbeat.
//!
//! Providers who are online report their position every 30 seconds; the
//! stored record feeds the emergency dispatch candidate queries.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Auth | Description |
//! |--------|----------|------|-------------|
//! | PUT | `/api/providers/me/location` | Provider | Heartbeat location upsert |
//! | GET | `/api/providers/me/location` | Provider | Current location record |
//! | PUT | `/api/providers/me/availability` | Provider | Toggle online flag |

pub mod dtos;
pub mod handlers;
pub mod heartbeat;
pub mod models;
pub mod routes;
pub mod services;

pub use services::LocationService;
