//! Periodic summary of who is online

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::info;

use crate::state::AppState;

/// Log connected players and busy rooms every `presence_log_interval_secs`
///
/// Returns `None` when the interval is configured as zero.
pub fn spawn_presence_logger(state: Arc<AppState>) -> Option<JoinHandle<()>> {
    let secs = state.config.presence_log_interval_secs;
    if secs == 0 {
        return None;
    }

    Some(tokio::spawn(async move {
        let mut timer = interval(Duration::from_secs(secs));
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        timer.tick().await;

        loop {
            timer.tick().await;
            info!("{}", presence_summary(&state).await);
        }
    }))
}

async fn presence_summary(state: &AppState) -> String {
    let mut names: Vec<String> = state
        .players
        .all()
        .into_iter()
        .map(|p| if p.name.is_empty() { p.id } else { p.name })
        .collect();
    names.sort();

    let mut occupied = 0;
    for room in state.rooms.all() {
        if !room.lock().await.is_empty() {
            occupied += 1;
        }
    }

    format!(
        "Online: {} player(s) [{}] on {} connection(s), {} of {} room(s) occupied",
        names.len(),
        names.join(", "),
        state.broadcaster.connection_count(),
        occupied,
        state.rooms.len()
    )
}
