//! Periodic reaper over the pending table: frees slots whose deadline has
//! passed. Swept queries get no reply; the client's own retry timer takes
//! over from there.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::pending::PendingTable;

pub async fn run(pending: Arc<PendingTable>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        let reaped = pending.sweep_expired(Instant::now());
        if reaped > 0 {
            debug!(reaped, "swept expired pending queries");
        }
    }
}
