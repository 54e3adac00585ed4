pub mod location_handler;

pub use location_handler::{get_my_location, set_availability, upsert_location};
