mod emergency;

pub use emergency::{EmergencyDispatch, EmergencyRequest, EmergencyStatus};
