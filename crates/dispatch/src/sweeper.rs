//! Dispatch sweeper
//!
//! Periodic task that keeps rides from getting stuck: first expires
//! assignments that outlived the acceptance window, then re-runs matching
//! over every unassigned `requested` ride. Both passes reuse the guarded
//! transitions, so racing a live accept is safe.

use std::sync::Arc;
use std::time::Duration;

use log::{error, info};
use tokio::task::JoinHandle;
use tokio::time::interval;

use crate::engine::DispatchEngine;

/// Spawn the sweeper loop; abort the handle to stop it
pub fn spawn_sweeper(engine: Arc<DispatchEngine>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("dispatch sweeper started, period {:?}", period);
        let mut tick = interval(period);
        // the first tick fires immediately; skip it so a fresh service
        // does not sweep before anything happened
        tick.tick().await;

        loop {
            tick.tick().await;

            match engine.expire_stale_assignments().await {
                Ok(0) => {}
                Ok(n) => info!("sweeper expired {n} stale assignments"),
                Err(e) => error!("sweeper expiry pass failed: {e}"),
            }

            match engine.dispatch_pending().await {
                Ok(0) => {}
                Ok(n) => info!("sweeper dispatched {n} pending rides"),
                Err(e) => error!("sweeper dispatch pass failed: {e}"),
            }
        }
    })
}
