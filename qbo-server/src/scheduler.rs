//! Background cache refresh.
//!
//! One task, one interval: refresh the entity cache immediately at
//! startup (a no-op until the first OAuth connect) and then hourly.

use std::sync::Arc;
use std::time::Duration;

use qbo_core::cache::CacheStore;
use qbo_core::{fetch, QboClient};
use tokio::time::MissedTickBehavior;
use tracing::info;

const REFRESH_INTERVAL: Duration = Duration::from_secs(3600);

pub async fn run(client: Arc<QboClient>, cache: Arc<CacheStore>) {
    info!(
        interval_secs = REFRESH_INTERVAL.as_secs(),
        "Cache refresh scheduler started"
    );

    let mut interval = tokio::time::interval(REFRESH_INTERVAL);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        // First tick fires immediately.
        interval.tick().await;
        fetch::refresh_cache(&client, &cache).await;
    }
}
