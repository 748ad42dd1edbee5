//! Periodic live-map refresh.
//!
//! Every tick dispatches its own request. Ticks are numbered at dispatch and
//! an outcome is only recorded if no later-dispatched tick has been recorded
//! already, so a slow response can never overwrite a newer one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use models::live_map::LiveMap;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::admin::AdminService;
use crate::errors::AdminError;

#[derive(Debug, Clone, Default)]
pub struct LiveMapState {
    /// Dispatch number of the last recorded outcome (0 = none yet).
    pub seq: u64,
    /// Last good snapshot; errors do not clear it.
    pub snapshot: Option<Arc<LiveMap>>,
    pub last_error: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

struct Shared {
    state: ArcSwap<LiveMapState>,
    next_seq: AtomicU64,
    /// Run whose responses are accepted; 0 when no poller is running.
    run: AtomicU64,
    next_run: AtomicU64,
    updates: watch::Sender<u64>,
}

impl Shared {
    /// Returns whether the outcome was newer than what is displayed.
    fn record(&self, seq: u64, outcome: Result<Arc<LiveMap>, String>) -> bool {
        let mut applied = false;
        self.state.rcu(|current| {
            applied = seq > current.seq;
            if !applied {
                return Arc::clone(current);
            }
            let mut next = LiveMapState::clone(current);
            next.seq = seq;
            next.updated_at = Some(Utc::now());
            match &outcome {
                Ok(map) => {
                    next.snapshot = Some(map.clone());
                    next.last_error = None;
                }
                Err(message) => next.last_error = Some(message.clone()),
            }
            Arc::new(next)
        });
        if applied {
            self.updates.send_replace(seq);
        }
        applied
    }

    fn is_current(&self, run: u64) -> bool {
        self.run.load(Ordering::SeqCst) == run
    }

    /// One request. With `run` set, the outcome is dropped if that run was
    /// stopped while the request was out.
    async fn fetch(&self, admin: &AdminService, run: Option<u64>) -> Result<bool, AdminError> {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(seq, "live map tick");
        let result = admin.live_map().await;
        if run.is_some_and(|run| !self.is_current(run)) {
            debug!(seq, "poller stopped, dropping response");
            return Ok(false);
        }
        match result {
            Ok(map) => {
                let applied = self.record(seq, Ok(Arc::new(map)));
                if !applied {
                    debug!(seq, "dropping response older than the displayed one");
                }
                Ok(applied)
            }
            Err(e) => {
                if e.requires_login() {
                    self.run.store(0, Ordering::SeqCst);
                    warn!(error = %e, "live map polling stopped");
                } else {
                    warn!(seq, error = %e, "live map refresh failed");
                }
                self.record(seq, Err(e.to_string()));
                Err(e)
            }
        }
    }
}

/// Keeps the most recent live-map snapshot.
pub struct LiveMapMonitor {
    admin: AdminService,
    shared: Arc<Shared>,
}

impl LiveMapMonitor {
    pub fn new(admin: AdminService) -> Self {
        let (updates, _) = watch::channel(0);
        let shared = Shared {
            state: ArcSwap::from_pointee(LiveMapState::default()),
            next_seq: AtomicU64::new(0),
            run: AtomicU64::new(0),
            next_run: AtomicU64::new(0),
            updates,
        };
        Self { admin, shared: Arc::new(shared) }
    }

    pub fn state(&self) -> Arc<LiveMapState> {
        self.shared.state.load_full()
    }

    /// Yields the dispatch number of each newly recorded outcome.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.shared.updates.subscribe()
    }

    /// Whether no poller is running: never started, stopped, or halted by
    /// a lost session.
    pub fn is_stopped(&self) -> bool {
        self.shared.run.load(Ordering::SeqCst) == 0
    }

    /// One fetch outside the schedule. `Ok(false)` means a newer outcome was
    /// already recorded.
    pub async fn poll_once(&self) -> Result<bool, AdminError> {
        self.shared.fetch(&self.admin, None).await
    }

    /// Fetch now and then every `every`, until the handle is stopped or
    /// dropped, or the session is lost. Starting again replaces any earlier
    /// run; its late responses are ignored.
    pub fn start(&self, every: Duration) -> PollHandle {
        let run = self.shared.next_run.fetch_add(1, Ordering::SeqCst) + 1;
        self.shared.run.store(run, Ordering::SeqCst);
        let shared = self.shared.clone();
        let admin = self.admin.clone();
        info!(run, interval_secs = every.as_secs_f64(), "live map polling started");
        let ticker = tokio::spawn(async move {
            let mut ticks = tokio::time::interval(every);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                if !shared.is_current(run) {
                    break;
                }
                let shared = shared.clone();
                let admin = admin.clone();
                tokio::spawn(async move {
                    let _ = shared.fetch(&admin, Some(run)).await;
                });
            }
        });
        PollHandle { shared: self.shared.clone(), run, ticker }
    }
}

/// Stops the schedule when stopped or dropped; responses still in flight
/// are ignored once it is.
pub struct PollHandle {
    shared: Arc<Shared>,
    run: u64,
    ticker: JoinHandle<()>,
}

impl PollHandle {
    pub fn stop(&self) {
        let stopped = self.shared.run.compare_exchange(self.run, 0, Ordering::SeqCst, Ordering::SeqCst);
        if stopped.is_ok() {
            info!(run = self.run, "live map polling stopped");
        }
        self.ticker.abort();
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
