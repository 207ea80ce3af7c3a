//! Rate Limiter
//!
//! Per-client sliding-window admission in front of every route.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use platform::rate_limit::{InMemoryRateLimitStore, RateLimitConfig, RateLimitStore};
use tokio::task::JoinHandle;

use crate::domain::client_identity::ClientIdentity;
use crate::error::{GatewayError, GatewayResult};

/// Outcome of an admitted request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    /// Requests left in the window after this one
    pub remaining: u32,
}

/// Sliding-window rate limiter over an injected store
pub struct RateLimiter<S = InMemoryRateLimitStore>
where
    S: RateLimitStore + Send + Sync + 'static,
{
    store: Arc<S>,
    config: RateLimitConfig,
}

impl<S> Clone for RateLimiter<S>
where
    S: RateLimitStore + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            config: self.config,
        }
    }
}

impl<S> RateLimiter<S>
where
    S: RateLimitStore + Send + Sync + 'static,
{
    pub fn new(store: Arc<S>, config: RateLimitConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Admit or reject one request from `identity`
    pub async fn check(&self, identity: &ClientIdentity) -> GatewayResult<Admission> {
        self.check_at(identity, Utc::now().timestamp_millis()).await
    }

    pub async fn check_at(
        &self,
        identity: &ClientIdentity,
        now_ms: i64,
    ) -> GatewayResult<Admission> {
        let result = self
            .store
            .check_and_record(identity.as_str(), &self.config, now_ms)
            .await?;

        if !result.allowed {
            let retry_after_secs = retry_after_secs(result.retry_after_ms(now_ms));
            tracing::warn!(
                client = %identity,
                limit = self.config.max_requests,
                retry_after_secs,
                "Rate limit exceeded"
            );
            return Err(GatewayError::RateLimitExceeded { retry_after_secs });
        }

        Ok(Admission {
            remaining: result.remaining,
        })
    }

    /// Drop buckets that saw no request during the last window
    pub async fn sweep(&self) -> GatewayResult<usize> {
        self.sweep_at(Utc::now().timestamp_millis()).await
    }

    pub async fn sweep_at(&self, now_ms: i64) -> GatewayResult<usize> {
        let removed = self.store.sweep(self.config.window_ms(), now_ms).await?;
        if removed > 0 {
            tracing::debug!(removed, "Swept idle rate limit buckets");
        }
        Ok(removed)
    }

    /// Sweep on a fixed interval until the handle is aborted
    pub fn spawn_sweeper(self, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                if let Err(e) = self.sweep().await {
                    tracing::warn!(error = %e, "Rate limit sweep failed");
                }
            }
        })
    }
}

/// Whole seconds, rounded up, never below one
fn retry_after_secs(retry_after_ms: i64) -> u64 {
    let secs = (retry_after_ms.max(0) as u64).div_ceil(1000);
    secs.max(1)
}
