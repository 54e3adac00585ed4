pub mod emergency_handler;

pub use emergency_handler::{create_emergency, get_emergency, list_dispatches};
