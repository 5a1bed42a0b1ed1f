//! Market status reconciliation.
//!
//! For every configured market, derive the current status through the
//! clock and compare it against the cached value. Only a transition (or
//! a cold start with no cached entry) produces a gateway write and a
//! status-change publish; an unchanged status is a no-op, which bounds
//! write volume to actual transitions.

use async_trait::async_trait;
use pulse_core::{clock, MarketStatus};
use pulse_gateway::keys;
use pulse_scheduler::{Job, JobContext, JobResult};
use pulse_telemetry::Metrics;
use std::time::Duration;
use tracing::{info, warn};

/// The reconciler job.
pub struct MarketStatusJob {
    interval: Duration,
    status_ttl: Duration,
}

impl MarketStatusJob {
    pub const NAME: &'static str = "market_status_reconciler";

    pub fn new(interval: Duration, status_ttl: Duration) -> Self {
        Self {
            interval,
            status_ttl,
        }
    }
}

#[async_trait]
impl Job for MarketStatusJob {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn run(&self, ctx: JobContext) -> JobResult<()> {
        let mut open_count = 0i64;

        for def in ctx.markets.iter() {
            let status = clock::status_at(def, ctx.now);
            if status.status.is_open() {
                open_count += 1;
            }

            let key = keys::market_status(&def.exchange);
            let cached = match ctx.gateway.get(&key).await {
                Ok(value) => value,
                Err(e) => {
                    // Gateway unreachable: drop this attempt, retry on
                    // the next natural interval.
                    warn!(exchange = %def.exchange, error = %e, "Status read dropped");
                    continue;
                }
            };

            let previous = cached.and_then(|json| serde_json::from_str::<MarketStatus>(&json).ok());
            if previous.is_some_and(|prev| prev.status == status.status) {
                continue;
            }

            let payload = serde_json::to_string(&status)?;
            if let Err(e) = ctx
                .gateway
                .set(&key, payload.clone(), self.status_ttl)
                .await
            {
                warn!(exchange = %def.exchange, error = %e, "Status write dropped");
                continue;
            }
            Metrics::gateway_write("market_status");
            Metrics::status_transition(def.exchange.as_str(), &status.status.to_string());
            info!(
                exchange = %def.exchange,
                status = %status.status,
                "Market status transition"
            );

            if !ctx.suppress_publish {
                match ctx
                    .gateway
                    .publish(keys::MARKET_STATUS_CHANNEL, payload)
                    .await
                {
                    Ok(_) => Metrics::gateway_publish(keys::MARKET_STATUS_CHANNEL),
                    Err(e) => {
                        warn!(exchange = %def.exchange, error = %e, "Status publish dropped");
                    }
                }
            }
        }

        Metrics::markets_open(open_count);
        Ok(())
    }
}
