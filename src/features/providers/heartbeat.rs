//! Live location heartbeat for online providers.
//!
//! While a provider is online, a repeating task samples the device
//! location and pushes it to the persistence layer as an idempotent
//! upsert keyed by provider id. The task is bound to the provider's
//! lifecycle: activation performs an immediate first tick, deactivation
//! cancels the timer. A failed tick (geolocation denied, timed out, or
//! the write rejected) is logged and skipped; the schedule continues and
//! the next tick is the implicit retry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::shared::geo::GeoPoint;

/// Nominal interval between location reports
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Error)]
pub enum HeartbeatError {
    #[error("Geolocation unavailable: {0}")]
    Location(String),

    #[error("Location report failed: {0}")]
    Report(String),
}

/// Source of the device's current position (GPS, platform location API)
#[async_trait]
pub trait LocationSource: Send + Sync {
    async fn current_location(&self) -> Result<GeoPoint, HeartbeatError>;
}

/// Sink for sampled positions, an upsert keyed by provider id
#[async_trait]
pub trait LocationReporter: Send + Sync {
    async fn report(&self, provider_id: &str, position: GeoPoint) -> Result<(), HeartbeatError>;
}

/// Reporter that pushes heartbeats to the dispatch service API.
///
/// Used by provider-side agents; the server itself persists through
/// `LocationService`.
pub struct ApiLocationReporter {
    client: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl ApiLocationReporter {
    pub fn new(base_url: &str, access_token: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: access_token.to_string(),
        }
    }
}

#[async_trait]
impl LocationReporter for ApiLocationReporter {
    async fn report(&self, _provider_id: &str, position: GeoPoint) -> Result<(), HeartbeatError> {
        let url = format!("{}/api/providers/me/location", self.base_url);

        let response = self
            .client
            .put(&url)
            .bearer_auth(&self.access_token)
            .json(&serde_json::json!({
                "latitude": position.latitude(),
                "longitude": position.longitude(),
            }))
            .send()
            .await
            .map_err(|e| HeartbeatError::Report(e.to_string()))?;

        if !response.status().is_success() {
            return Err(HeartbeatError::Report(format!(
                "HTTP {}",
                response.status()
            )));
        }

        Ok(())
    }
}

/// One logical heartbeat timer per provider.
///
/// Activating a provider that already has a running timer cancels the
/// old one first, so rapid online/offline toggles can never leave two
/// timers reporting for the same provider. An in-flight tick may still
/// complete after deactivation; that is acceptable because the write is
/// an idempotent upsert.
pub struct HeartbeatRegistry {
    interval: Duration,
    tasks: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl HeartbeatRegistry {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            tasks: Mutex::new(HashMap::new()),
        }
    }

    /// Start the heartbeat for a provider: one immediate tick, then one
    /// every interval until deactivated.
    pub fn activate(
        &self,
        provider_id: &str,
        source: Arc<dyn LocationSource>,
        reporter: Arc<dyn LocationReporter>,
    ) {
        let mut tasks = self.tasks.lock().unwrap();

        if let Some(previous) = tasks.remove(provider_id) {
            previous.abort();
            tracing::debug!("Replaced running heartbeat for provider {}", provider_id);
        }

        let id = provider_id.to_string();
        let interval = self.interval;
        let handle = tokio::spawn(async move {
            // First tick fires immediately, not at t + interval
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                if let Err(e) = Self::tick(&id, source.as_ref(), reporter.as_ref()).await {
                    tracing::warn!("Heartbeat tick skipped for provider {}: {}", id, e);
                }
            }
        });

        tasks.insert(provider_id.to_string(), handle);
        tracing::info!("Heartbeat activated for provider {}", provider_id);
    }

    /// Stop the heartbeat for a provider; no-op if none is running
    pub fn deactivate(&self, provider_id: &str) {
        let mut tasks = self.tasks.lock().unwrap();
        if let Some(handle) = tasks.remove(provider_id) {
            handle.abort();
            tracing::info!("Heartbeat deactivated for provider {}", provider_id);
        }
    }

    pub fn is_active(&self, provider_id: &str) -> bool {
        self.tasks.lock().unwrap().contains_key(provider_id)
    }

    async fn tick(
        provider_id: &str,
        source: &dyn LocationSource,
        reporter: &dyn LocationReporter,
    ) -> Result<(), HeartbeatError> {
        let position = source.current_location().await?;
        reporter.report(provider_id, position).await
    }
}

impl Drop for HeartbeatRegistry {
    fn drop(&mut self) {
        let mut tasks = self.tasks.lock().unwrap();
        for (_, handle) in tasks.drain() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedSource;

    #[async_trait]
    impl LocationSource for FixedSource {
        async fn current_location(&self) -> Result<GeoPoint, HeartbeatError> {
            Ok(GeoPoint::new(38.7223, -9.1393).unwrap())
        }
    }

    struct DeniedSource;

    #[async_trait]
    impl LocationSource for DeniedSource {
        async fn current_location(&self) -> Result<GeoPoint, HeartbeatError> {
            Err(HeartbeatError::Location("permission denied".to_string()))
        }
    }

    #[derive(Default)]
    struct CountingReporter {
        writes: AtomicUsize,
    }

    impl CountingReporter {
        fn count(&self) -> usize {
            self.writes.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LocationReporter for CountingReporter {
        async fn report(&self, _provider_id: &str, _position: GeoPoint) -> Result<(), HeartbeatError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingReporter {
        attempts: AtomicUsize,
    }

    #[async_trait]
    impl LocationReporter for FailingReporter {
        async fn report(&self, _provider_id: &str, _position: GeoPoint) -> Result<(), HeartbeatError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(HeartbeatError::Report("network down".to_string()))
        }
    }

    // Let the spawned heartbeat task run up to the next await point
    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn first_tick_is_immediate_then_every_interval() {
        let registry = HeartbeatRegistry::new(Duration::from_secs(30));
        let reporter = Arc::new(CountingReporter::default());

        registry.activate("p-1", Arc::new(FixedSource), reporter.clone());
        settle().await;
        assert_eq!(reporter.count(), 1);

        tokio::time::advance(Duration::from_secs(30)).await;
        settle().await;
        assert_eq!(reporter.count(), 2);

        tokio::time::advance(Duration::from_secs(90)).await;
        settle().await;
        assert_eq!(reporter.count(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn deactivation_stops_writes_and_reactivation_reports_immediately() {
        let registry = HeartbeatRegistry::new(Duration::from_secs(30));
        let reporter = Arc::new(CountingReporter::default());

        registry.activate("p-1", Arc::new(FixedSource), reporter.clone());
        settle().await;
        assert_eq!(reporter.count(), 1);

        registry.deactivate("p-1");
        assert!(!registry.is_active("p-1"));

        tokio::time::advance(Duration::from_secs(300)).await;
        settle().await;
        assert_eq!(reporter.count(), 1);

        // Reactivation ticks immediately, not at t + 30s
        registry.activate("p-1", Arc::new(FixedSource), reporter.clone());
        settle().await;
        assert_eq!(reporter.count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_double_activation_runs_a_single_timer() {
        let registry = HeartbeatRegistry::new(Duration::from_secs(30));
        let reporter = Arc::new(CountingReporter::default());

        registry.activate("p-1", Arc::new(FixedSource), reporter.clone());
        registry.activate("p-1", Arc::new(FixedSource), reporter.clone());
        settle().await;

        // Two concurrent timers would double the write count over a window
        tokio::time::advance(Duration::from_secs(120)).await;
        settle().await;
        assert!(
            reporter.count() <= 6,
            "expected a single timer, saw {} writes",
            reporter.count()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn denied_geolocation_skips_the_tick_but_keeps_the_schedule() {
        let registry = HeartbeatRegistry::new(Duration::from_secs(30));
        let reporter = Arc::new(CountingReporter::default());

        registry.activate("p-1", Arc::new(DeniedSource), reporter.clone());
        settle().await;
        tokio::time::advance(Duration::from_secs(90)).await;
        settle().await;

        assert_eq!(reporter.count(), 0);
        assert!(registry.is_active("p-1"));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_write_is_not_retried_until_the_next_tick() {
        let registry = HeartbeatRegistry::new(Duration::from_secs(30));
        let reporter = Arc::new(FailingReporter {
            attempts: AtomicUsize::new(0),
        });

        registry.activate("p-1", Arc::new(FixedSource), reporter.clone());
        settle().await;
        assert_eq!(reporter.attempts.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(30)).await;
        settle().await;
        assert_eq!(reporter.attempts.load(Ordering::SeqCst), 2);
        assert!(registry.is_active("p-1"));
    }

    #[tokio::test(start_paused = true)]
    async fn independent_providers_keep_independent_timers() {
        let registry = HeartbeatRegistry::new(Duration::from_secs(30));
        let reporter = Arc::new(CountingReporter::default());

        registry.activate("p-1", Arc::new(FixedSource), reporter.clone());
        registry.activate("p-2", Arc::new(FixedSource), reporter.clone());
        settle().await;
        assert_eq!(reporter.count(), 2);

        registry.deactivate("p-1");
        tokio::time::advance(Duration::from_secs(30)).await;
        settle().await;

        assert_eq!(reporter.count(), 3);
        assert!(registry.is_active("p-2"));
    }
}
