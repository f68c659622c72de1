//! Stream watchdog
//!
//! Wakes once per check interval and compares the last processed frame (or
//! the last restart, whichever is newer) against the stall and restart
//! thresholds.

use crate::status::StatusSink;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Watchdog configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchdogConfig {
    /// Check interval (milliseconds)
    pub check_interval_ms: u64,
    /// Report a stall after this long without a frame (milliseconds)
    pub stall_after_ms: u64,
    /// Restart the stream after this long without a frame (milliseconds)
    pub restart_after_ms: u64,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            check_interval_ms: 1000,
            stall_after_ms: 2000,
            restart_after_ms: 5000,
        }
    }
}

/// Time of the last processed frame, shared between the processing
/// context and the watchdog
#[derive(Debug, Clone, Default)]
pub struct Heartbeat(Arc<Mutex<Option<Instant>>>);

impl Heartbeat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn beat(&self, now: Instant) {
        match self.0.lock() {
            Ok(mut last) => *last = Some(now),
            Err(poisoned) => *poisoned.into_inner() = Some(now),
        }
    }

    pub fn last(&self) -> Option<Instant> {
        match self.0.lock() {
            Ok(last) => *last,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

/// Watchdog decision for one check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogVerdict {
    Healthy,
    Stalled,
    Restart,
}

/// Stall/restart decision logic
#[derive(Debug, Clone)]
pub struct Watchdog {
    config: WatchdogConfig,
    last_restart: Option<Instant>,
    restarts: u64,
}

impl Watchdog {
    pub fn new(config: WatchdogConfig) -> Self {
        Self {
            config,
            last_restart: None,
            restarts: 0,
        }
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_millis(self.config.check_interval_ms)
    }

    pub fn restarts(&self) -> u64 {
        self.restarts
    }

    /// Decide what to do at `now`.
    ///
    /// Without a recorded source address nothing can be restarted and the
    /// stream is reported healthy. A restart becomes the new staleness
    /// reference until a frame arrives.
    pub fn check(&mut self, now: Instant, last_frame: Option<Instant>, has_source: bool) -> WatchdogVerdict {
        if !has_source {
            return WatchdogVerdict::Healthy;
        }

        let reference = match (last_frame, self.last_restart) {
            (Some(frame), Some(restart)) => frame.max(restart),
            (Some(t), None) | (None, Some(t)) => t,
            (None, None) => {
                // First check with a source: start the clock here
                self.last_restart = Some(now);
                return WatchdogVerdict::Healthy;
            }
        };

        let stale = now.saturating_duration_since(reference);
        if stale > Duration::from_millis(self.config.restart_after_ms) {
            self.last_restart = Some(now);
            self.restarts += 1;
            WatchdogVerdict::Restart
        } else if stale > Duration::from_millis(self.config.stall_after_ms) {
            WatchdogVerdict::Stalled
        } else {
            WatchdogVerdict::Healthy
        }
    }
}

impl Default for Watchdog {
    fn default() -> Self {
        Self::new(WatchdogConfig::default())
    }
}

/// What the watchdog supervises
pub trait StreamSupervisor: Send + Sync + 'static {
    /// Whether a source address has been recorded
    fn has_source(&self) -> bool;

    /// Reconnect to the recorded source
    fn restart(&self) -> impl Future<Output = ()> + Send;
}

/// Run the watchdog until `shutdown` flips to true
pub async fn run_watchdog<S: StreamSupervisor>(
    mut watchdog: Watchdog,
    heartbeat: Heartbeat,
    supervisor: S,
    sink: StatusSink,
    mut shutdown: watch::Receiver<bool>,
) {
    info!("Starting stream watchdog");
    let mut interval = tokio::time::interval(watchdog.check_interval());
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut previous = WatchdogVerdict::Healthy;

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = shutdown.changed() => break,
        }
        if *shutdown.borrow() {
            break;
        }

        let now = tokio::time::Instant::now().into_std();
        let verdict = watchdog.check(now, heartbeat.last(), supervisor.has_source());

        match verdict {
            WatchdogVerdict::Healthy => {}
            WatchdogVerdict::Stalled => {
                if previous != WatchdogVerdict::Stalled {
                    warn!("Stream stalled");
                    sink.status("Stream stalled");
                }
            }
            WatchdogVerdict::Restart => {
                warn!("No frames, restarting stream (restart #{})", watchdog.restarts());
                metrics::counter!("watchdog_restarts_total").increment(1);
                sink.status("Restarting stream");
                supervisor.restart().await;
            }
        }
        if verdict != previous {
            debug!("Watchdog verdict: {:?}", verdict);
        }
        previous = verdict;
    }

    info!("Stream watchdog stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn test_six_second_outage_restarts_once() {
        let mut watchdog = Watchdog::default();
        let t0 = Instant::now();
        let last_frame = Some(t0);

        let verdicts: Vec<WatchdogVerdict> = (1..=6)
            .map(|s| watchdog.check(t0 + secs(s), last_frame, true))
            .collect();

        assert_eq!(
            verdicts,
            vec![
                WatchdogVerdict::Healthy,
                WatchdogVerdict::Healthy,
                WatchdogVerdict::Stalled,
                WatchdogVerdict::Stalled,
                WatchdogVerdict::Stalled,
                WatchdogVerdict::Restart,
            ]
        );
        assert_eq!(watchdog.restarts(), 1);

        // Restart is the new reference
        assert_eq!(watchdog.check(t0 + secs(7), last_frame, true), WatchdogVerdict::Healthy);
    }

    #[test]
    fn test_frames_keep_it_healthy() {
        let mut watchdog = Watchdog::default();
        let t0 = Instant::now();
        for s in 1..20 {
            let frame = Some(t0 + secs(s) - Duration::from_millis(300));
            assert_eq!(watchdog.check(t0 + secs(s), frame, true), WatchdogVerdict::Healthy);
        }
    }

    #[test]
    fn test_no_source_never_restarts() {
        let mut watchdog = Watchdog::default();
        let t0 = Instant::now();
        assert_eq!(watchdog.check(t0 + secs(60), Some(t0), false), WatchdogVerdict::Healthy);
        assert_eq!(watchdog.restarts(), 0);
    }

    #[test]
    fn test_source_without_frames_uses_first_check() {
        let mut watchdog = Watchdog::default();
        let t0 = Instant::now();
        assert_eq!(watchdog.check(t0, None, true), WatchdogVerdict::Healthy);
        assert_eq!(watchdog.check(t0 + secs(3), None, true), WatchdogVerdict::Stalled);
        assert_eq!(watchdog.check(t0 + secs(6), None, true), WatchdogVerdict::Restart);
    }

    #[derive(Clone, Default)]
    struct CountingSupervisor {
        restarts: Arc<AtomicU64>,
    }

    impl StreamSupervisor for CountingSupervisor {
        fn has_source(&self) -> bool {
            true
        }

        async fn restart(&self) {
            self.restarts.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_watchdog_loop_restarts_once() {
        let heartbeat = Heartbeat::new();
        heartbeat.beat(tokio::time::Instant::now().into_std());
        let supervisor = CountingSupervisor::default();
        let sink = StatusSink::default();
        let mut status_rx = sink.subscribe();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(run_watchdog(
            Watchdog::default(),
            heartbeat,
            supervisor.clone(),
            sink,
            shutdown_rx,
        ));

        tokio::time::sleep(Duration::from_millis(6500)).await;
        assert_eq!(supervisor.restarts.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_millis(4000)).await;
        assert_eq!(supervisor.restarts.load(Ordering::SeqCst), 1);

        let mut statuses = Vec::new();
        while let Ok(update) = status_rx.try_recv() {
            if let crate::StatusUpdate::Status(s) = update {
                statuses.push(s);
            }
        }
        // Still no frames after the restart, so the stall is reported again
        assert_eq!(
            statuses,
            vec!["Stream stalled", "Restarting stream", "Stream stalled"]
        );

        shutdown_tx.send_replace(true);
        handle.await.unwrap();
    }
}
