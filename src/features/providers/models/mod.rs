mod provider_location;

pub use provider_location::ProviderLocation;
