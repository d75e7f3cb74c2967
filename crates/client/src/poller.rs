//! Progress polling
//!
//! One polling task per job handle. The next tick is scheduled only after
//! the previous fetch settles, so a slow backend can never cause two
//! overlapping requests for the same handle. Terminal states are absorbing;
//! `needs_input` suspends the loop until the subscription is resumed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use labpull_common::{Error, JobHandle, JobSnapshot, JobStatus, NameChoice, ProgressUpdate};

use crate::http::PanelApi;

/// Polling configuration
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Delay between the end of one fetch and the start of the next
    pub interval: Duration,
    /// Consecutive transient failures tolerated before the job is declared
    /// unreachable. `None` retries forever.
    pub max_consecutive_blips: Option<u32>,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_consecutive_blips: Some(30),
        }
    }
}

/// Terminal result of one polling run
#[derive(Debug, Clone)]
pub enum JobOutcome {
    /// The backend reported `success` or `error`
    Finished(JobSnapshot),
    /// Polling ended without a backend verdict: the handle vanished (404)
    /// or the host stayed unreachable past the blip budget
    Aborted(Error),
}

/// Callbacks driven by the poller. One implementation per install attempt.
pub trait JobEvents: Send + Sync {
    /// A `pending`/`running` report arrived
    fn on_snapshot(&self, update: &ProgressUpdate);

    /// The backend is blocked on a naming decision; polling is suspended
    /// until [`Subscription::resume`] is called
    fn on_needs_input(&self, choice: &NameChoice);

    /// Polling ended. Fires exactly once per subscription.
    fn on_terminal(&self, outcome: &JobOutcome);
}

struct SubscriptionState {
    stopped: AtomicBool,
    /// Wakes the loop out of its inter-tick sleep when stopping
    stop_wake: Notify,
    /// Wakes the loop out of a `needs_input` suspension
    resume_wake: Notify,
    /// Most recent normalized snapshot for this handle
    last_snapshot: Mutex<Option<JobSnapshot>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl SubscriptionState {
    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    fn mark_stopped(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}

/// Handle to one polling run. Cloneable; all clones control the same run.
#[derive(Clone)]
pub struct Subscription {
    state: Arc<SubscriptionState>,
}

impl Subscription {
    /// Stop polling. Cancels the pending timer; a fetch already in flight
    /// settles silently without invoking any callback. There is no
    /// server-side cancel: the remote job keeps running.
    pub fn stop(&self) {
        self.state.mark_stopped();
        self.state.stop_wake.notify_one();
        self.state.resume_wake.notify_one();
    }

    /// Resume a subscription suspended on `needs_input`. The next fetch
    /// fires immediately rather than after one interval.
    pub fn resume(&self) {
        self.state.resume_wake.notify_one();
    }

    pub fn is_stopped(&self) -> bool {
        self.state.is_stopped()
    }

    /// Most recent snapshot observed for this handle, if any
    pub fn latest_snapshot(&self) -> Option<JobSnapshot> {
        self.state.last_snapshot.lock().clone()
    }

    /// Wait for the polling task to finish (terminal state or stop)
    pub async fn wait(&self) {
        let task = self.state.task.lock().take();
        if let Some(task) = task {
            let _ = task.await;
        }
    }
}

/// Owns the polling cadence for install jobs against one panel
pub struct ProgressPoller {
    api: Arc<dyn PanelApi>,
    config: PollerConfig,
}

enum Tick {
    Report(JobSnapshot),
    Transient(Error),
    Fatal(Error),
}

impl ProgressPoller {
    pub fn new(api: Arc<dyn PanelApi>, config: PollerConfig) -> Self {
        Self { api, config }
    }

    /// Start polling `handle`. The first fetch fires immediately.
    pub fn start(&self, handle: JobHandle, events: Arc<dyn JobEvents>) -> Subscription {
        let state = Arc::new(SubscriptionState {
            stopped: AtomicBool::new(false),
            stop_wake: Notify::new(),
            resume_wake: Notify::new(),
            last_snapshot: Mutex::new(None),
            task: Mutex::new(None),
        });

        let task = tokio::spawn(poll_loop(
            self.api.clone(),
            handle,
            events,
            self.config.clone(),
            state.clone(),
        ));
        *state.task.lock() = Some(task);

        Subscription { state }
    }
}

async fn poll_loop(
    api: Arc<dyn PanelApi>,
    handle: JobHandle,
    events: Arc<dyn JobEvents>,
    config: PollerConfig,
    state: Arc<SubscriptionState>,
) {
    let mut blips: u32 = 0;

    loop {
        if state.is_stopped() {
            return;
        }

        let fetched = api.fetch_progress(&handle).await;

        // A stop while the fetch was in flight discards its result.
        if state.is_stopped() {
            return;
        }

        let tick = match fetched {
            Ok(report) => match JobSnapshot::from_report(&report) {
                Ok(snapshot) => Tick::Report(snapshot),
                Err(err) => Tick::Transient(err),
            },
            Err(err @ Error::JobNotFound(_)) => Tick::Fatal(err),
            Err(err) => Tick::Transient(err),
        };

        match tick {
            Tick::Fatal(err) => {
                state.mark_stopped();
                events.on_terminal(&JobOutcome::Aborted(err));
                return;
            }
            Tick::Transient(err) => {
                blips += 1;
                warn!(job = %handle, error = %err, blips, "transient poll failure, will retry");
                if let Some(max) = config.max_consecutive_blips {
                    if blips >= max {
                        state.mark_stopped();
                        events.on_terminal(&JobOutcome::Aborted(Error::HostUnreachable {
                            attempts: blips,
                        }));
                        return;
                    }
                }
            }
            Tick::Report(snapshot) => {
                blips = 0;
                *state.last_snapshot.lock() = Some(snapshot.clone());

                match snapshot.status {
                    JobStatus::Pending | JobStatus::Running => {
                        events.on_snapshot(&snapshot.progress);
                    }
                    JobStatus::NeedsInput => {
                        debug!(job = %handle, "job blocked on name resolution, suspending poll");
                        let choice = snapshot.name_choice.clone().unwrap_or_else(|| NameChoice {
                            suggested_name: String::new(),
                            current_name: String::new(),
                            choices: Vec::new(),
                            base_dir: String::new(),
                        });
                        events.on_needs_input(&choice);

                        state.resume_wake.notified().await;
                        if state.is_stopped() {
                            return;
                        }
                        debug!(job = %handle, "resuming poll");
                        // Refetch immediately after resumption.
                        continue;
                    }
                    JobStatus::Success | JobStatus::Error => {
                        state.mark_stopped();
                        events.on_terminal(&JobOutcome::Finished(snapshot));
                        return;
                    }
                }
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(config.interval) => {}
            _ = state.stop_wake.notified() => {}
        }
    }
}
