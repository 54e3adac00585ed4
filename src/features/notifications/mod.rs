//! Client for the external notification gateway (push, in-app, email).

pub mod gateway;

pub use gateway::{DispatchNotice, HttpNotificationGateway, NotificationGateway};
