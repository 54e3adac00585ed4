use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;

use crate::core::config::DispatchConfig;
use crate::core::error::Result;
use crate::features::emergencies::services::{DispatchService, EmergencyService};

/// Dispatch worker that runs in the background.
/// Picks up pending emergency requests and fans them out to eligible
/// providers.
pub struct DispatchWorker {
    emergency_service: Arc<EmergencyService>,
    dispatch_service: Arc<DispatchService>,
    config: DispatchConfig,
}

impl DispatchWorker {
    pub fn new(
        emergency_service: Arc<EmergencyService>,
        dispatch_service: Arc<DispatchService>,
        config: DispatchConfig,
    ) -> Self {
        Self {
            emergency_service,
            dispatch_service,
            config,
        }
    }

    /// Run the worker in a background loop
    pub async fn run(&self) {
        tracing::info!(
            "Starting dispatch worker (poll interval: {}s, batch size: {})",
            self.config.poll_interval_secs,
            self.config.batch_size
        );

        let mut interval = interval(Duration::from_secs(self.config.poll_interval_secs));

        loop {
            interval.tick().await;

            if let Err(e) = self.process_batch().await {
                tracing::error!("Error processing dispatch batch: {:?}", e);
            }
        }
    }

    /// Process a batch of pending emergency requests
    async fn process_batch(&self) -> Result<()> {
        let requests = self
            .emergency_service
            .fetch_pending(self.config.max_retries, self.config.batch_size)
            .await?;

        if requests.is_empty() {
            return Ok(());
        }

        tracing::info!("Processing {} pending emergency requests", requests.len());

        for request in requests {
            match self.dispatch_service.dispatch(&request).await {
                Ok(outcome) => {
                    tracing::info!(
                        "Emergency request {} completed: {:?} ({} matched, {} notified)",
                        request.id,
                        outcome.status,
                        outcome.matched,
                        outcome.notified
                    );
                }
                Err(e) => {
                    tracing::error!(
                        "Failed to dispatch emergency request {}: {:?}",
                        request.id,
                        e
                    );
                    self.emergency_service
                        .mark_failed(
                            request.id,
                            request.retry_count,
                            self.config.max_retries,
                            &e.to_string(),
                        )
                        .await?;
                }
            }
        }

        Ok(())
    }
}
