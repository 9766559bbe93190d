//! Scheduled background tasks using tokio-cron-scheduler.
//!
//! ```text
//! Scheduler (every 10 minutes by default)
//!     │
//!     └─► SessionManager::sweep_expired()
//!             └─► DELETE FROM sessions WHERE expires_at <= now
//! ```
//!
//! The sweep runs independently of request traffic. A failed run is only
//! logged; the next tick is the retry. Runs may overlap if one overruns its
//! interval, which is harmless because the delete is idempotent.

use anyhow::Result;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::domains::auth::SessionManager;

/// Start all scheduled tasks. The caller owns the returned scheduler and
/// shuts it down on exit.
pub async fn start_scheduler(sessions: SessionManager) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let schedule = sessions.config().sweep_schedule.clone();
    let sweep_sessions = sessions.clone();
    let sweep_job = Job::new_async(schedule.as_str(), move |_uuid, _lock| {
        let sessions = sweep_sessions.clone();
        Box::pin(async move {
            run_session_sweep(&sessions).await;
        })
    })?;

    scheduler.add(sweep_job).await?;
    scheduler.start().await?;

    tracing::info!(schedule = %schedule, "Scheduled tasks started (expired session sweep)");
    Ok(scheduler)
}

/// Run one expired-session sweep
pub async fn run_session_sweep(sessions: &SessionManager) -> u64 {
    let removed = sessions.sweep_expired().await;
    tracing::info!("Cleaned up {} expired sessions", removed);
    removed
}
