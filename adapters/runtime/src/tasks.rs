//! Background timers driving the simulation clock and the command queue.

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::watch,
    time::{self, Instant, MissedTickBehavior},
};
use tracing::debug;

use crate::shared::Shared;

pub(crate) async fn clock_task(
    shared: Arc<Shared>,
    tick_interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut interval = time::interval(tick_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = interval.tick() => shared.clock_tick(),
        }
    }
    debug!("clock task stopped");
}

/// Dispatches held commands once per debounce period and sleeps while
/// nothing is held.
pub(crate) async fn input_task(shared: Arc<Shared>, mut shutdown: watch::Receiver<bool>) {
    'outer: loop {
        let (idle, period) = shared.input_status();
        if idle {
            tokio::select! {
                _ = shutdown.changed() => break,
                () = shared.input_wake.notified() => continue,
            }
        }

        let mut interval = time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = shutdown.changed() => break 'outer,
                _ = interval.tick() => shared.input_tick(),
            }
            let (idle, current) = shared.input_status();
            if idle || current != period {
                break;
            }
        }
    }
    debug!("input task stopped");
}
