//! Idle session eviction.
//!
//! Sessions nobody touched for the configured idle timeout are evicted:
//! removed from the registry and closed with `CloseReason::IdleTimeout`, so
//! subscribers learn why their stream ended.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::time::interval;

use mindstorm_core::config::LifecycleConfig;
use mindstorm_core::session::{CloseReason, SessionStore};

/// Evicts every session idle for at least `idle_timeout`. Returns how many
/// were evicted.
pub async fn sweep_idle_sessions(store: &SessionStore, idle_timeout: Duration) -> usize {
    let mut evicted = 0;
    for session in store.live_sessions().await {
        if session.idle_for().await >= idle_timeout {
            match store
                .evict(session.code().as_str(), CloseReason::IdleTimeout)
                .await
            {
                Ok(()) => evicted += 1,
                // Lost a race with another evict; nothing left to do.
                Err(err) => tracing::debug!(code = %session.code(), "sweep skipped: {err}"),
            }
        }
    }
    if evicted > 0 {
        tracing::info!(evicted, "idle sessions evicted");
    }
    evicted
}

/// Starts the background sweeper task. At most one instance runs per
/// process; later calls are ignored.
pub fn start_idle_sweeper(store: Arc<SessionStore>, lifecycle: LifecycleConfig) {
    static SWEEPER_RUNNING: AtomicBool = AtomicBool::new(false);
    if SWEEPER_RUNNING.swap(true, Ordering::SeqCst) {
        tracing::warn!("idle sweeper already running, skipping");
        return;
    }

    tokio::spawn(async move {
        let mut ticker = interval(lifecycle.sweep_interval());
        tracing::info!(
            sweep_interval_secs = lifecycle.sweep_interval_secs,
            idle_timeout_secs = lifecycle.idle_timeout_secs,
            "idle sweeper started"
        );
        loop {
            ticker.tick().await;
            sweep_idle_sessions(&store, lifecycle.idle_timeout()).await;
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use mindstorm_core::config::{CodeConfig, SubmissionLimits};
    use mindstorm_core::session::{NotificationBus, SessionEvent};

    fn new_store() -> Arc<SessionStore> {
        let limits = SubmissionLimits {
            min_interval_ms: 0,
            max_identical_per_author: 0,
            ..SubmissionLimits::default()
        };
        Arc::new(SessionStore::new(
            limits,
            CodeConfig::default(),
            Arc::new(NotificationBus::default()),
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_evicts_only_idle_sessions() {
        let store = new_store();
        let idle = store.create("Team offsite", "ana").await.unwrap();
        let busy = store.create("Quarter plan", "bob").await.unwrap();

        tokio::time::advance(Duration::from_secs(7200)).await;
        // A submission resets the busy session's idle clock.
        busy.submit_idea("bob", "ship the beta").await.unwrap();

        let evicted = sweep_idle_sessions(&store, Duration::from_secs(3600)).await;
        assert_eq!(evicted, 1);

        assert!(
            store
                .lookup(idle.code().as_str())
                .await
                .unwrap_err()
                .is_not_found()
        );
        assert!(store.lookup(busy.code().as_str()).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_tells_subscribers_why_the_session_ended() {
        let store = new_store();
        let session = store.create("Team offsite", "ana").await.unwrap();
        let mut events = session.subscribe();

        tokio::time::advance(Duration::from_secs(7200)).await;
        sweep_idle_sessions(&store, Duration::from_secs(3600)).await;

        match events.next().await.unwrap() {
            SessionEvent::Closed { reason } => assert_eq!(reason, CloseReason::IdleTimeout),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_sessions_survive_a_sweep() {
        let store = new_store();
        let session = store.create("Team offsite", "ana").await.unwrap();

        let evicted = sweep_idle_sessions(&store, Duration::from_secs(3600)).await;
        assert_eq!(evicted, 0);
        assert!(store.lookup(session.code().as_str()).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_sweeper_evicts_on_schedule() {
        let store = new_store();
        let session = store.create("Team offsite", "ana").await.unwrap();
        let code = session.code().as_str().to_string();

        start_idle_sweeper(
            Arc::clone(&store),
            LifecycleConfig {
                idle_timeout_secs: 3600,
                sweep_interval_secs: 60,
                ..LifecycleConfig::default()
            },
        );

        // Step past the idle timeout in sweep-sized increments so the
        // ticker keeps up under paused time.
        for _ in 0..62 {
            tokio::time::advance(Duration::from_secs(60)).await;
        }
        for _ in 0..50 {
            tokio::task::yield_now().await;
        }

        assert!(store.lookup(&code).await.unwrap_err().is_not_found());
    }
}
