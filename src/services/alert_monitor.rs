use std::time::Duration;

use tokio::time::{self, MissedTickBehavior};

use crate::{services::alert_checker::run_check, AppState};

pub fn spawn_alert_monitor(state: AppState) {
    let secs = state.settings.check_interval_sec.max(1);

    tokio::spawn(async move {
        let mut interval = time::interval(Duration::from_secs(secs));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;

            // run each tick in its own task so a panic inside a cycle is
            // reported here instead of killing the monitor
            let tick_state = state.clone();
            match tokio::spawn(async move { run_check(&tick_state).await }).await {
                Ok(report) if report.alerts_sent > 0 || report.cleared > 0 => {
                    tracing::info!(
                        sent = report.alerts_sent,
                        cleared = report.cleared,
                        "[alert-monitor] tick done"
                    );
                }
                Ok(_) => {}
                Err(e) => tracing::error!("[alert-monitor] tick error: {}", e),
            }
        }
    });

    if secs >= 60 {
        tracing::info!("Background checker started (every {} min)", secs / 60);
    } else {
        tracing::info!("Background checker started (every {} sec)", secs);
    }
}
