//! Background promotion loop.

use crate::{app::App, config::settings::DEFAULT_PROMOTION_INTERVAL_SECS, core::wait};
use std::{sync::Arc, time::Duration};
use tokio::{
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tracing::{debug, info};

/// Spawns a task that sweeps `app` right away and then once per `interval`.
///
/// A zero interval falls back to the default of five seconds. The task runs
/// until it is aborted or the runtime shuts down.
pub fn spawn_promotion_loop(app: Arc<App>, interval: Duration) -> JoinHandle<()> {
    let interval = if interval.is_zero() {
        Duration::from_secs(DEFAULT_PROMOTION_INTERVAL_SECS)
    } else {
        interval
    };
    info!(interval_ms = interval.as_millis(), "starting promotion loop");

    tokio::spawn(async move {
        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let promoted = app.promote_ready(wait::current_time()).await;
            if promoted > 0 {
                debug!(promoted, "promotion sweep finished");
            }
        }
    })
}
