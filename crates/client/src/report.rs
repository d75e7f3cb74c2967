//! Terminal outcome reporting

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::debug;

use labpull_common::JobStatus;

use crate::poller::JobOutcome;

/// User-facing notification surface. The CLI backs this with colored
/// terminal output; tests record calls.
pub trait Notifier: Send + Sync {
    fn notify_success(&self, message: &str);
    fn notify_error(&self, message: &str);
    /// Tear down any live progress indicator. Called before either
    /// notification, for every outcome polarity.
    fn clear_progress(&self);
}

/// Consumes a terminal outcome exactly once and turns it into a
/// user-visible notification plus unconditional cleanup.
pub struct ResultReporter {
    notifier: Arc<dyn Notifier>,
    reported: AtomicBool,
}

impl ResultReporter {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            notifier,
            reported: AtomicBool::new(false),
        }
    }

    /// Report one terminal outcome. Duplicate calls are ignored.
    pub fn report(&self, outcome: &JobOutcome) {
        if self.reported.swap(true, Ordering::SeqCst) {
            debug!("duplicate terminal outcome ignored");
            return;
        }

        self.notifier.clear_progress();

        match outcome {
            JobOutcome::Finished(snapshot) if snapshot.status == JobStatus::Success => {
                let message = if snapshot.progress.message.is_empty() {
                    "image installed successfully"
                } else {
                    &snapshot.progress.message
                };
                self.notifier.notify_success(message);
            }
            JobOutcome::Finished(snapshot) => {
                let text = snapshot.failure_text();
                let message = if text.is_empty() {
                    "install failed"
                } else {
                    text
                };
                self.notifier.notify_error(message);
            }
            JobOutcome::Aborted(err) => {
                self.notifier.notify_error(&err.to_string());
            }
        }
    }

    pub fn has_reported(&self) -> bool {
        self.reported.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use labpull_common::{Error, InstallPhase, JobSnapshot, ProgressUpdate};
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recording {
        successes: Mutex<Vec<String>>,
        errors: Mutex<Vec<String>>,
        clears: AtomicBool,
    }

    impl Notifier for Recording {
        fn notify_success(&self, message: &str) {
            self.successes.lock().push(message.to_string());
        }
        fn notify_error(&self, message: &str) {
            self.errors.lock().push(message.to_string());
        }
        fn clear_progress(&self) {
            self.clears.store(true, Ordering::SeqCst);
        }
    }

    fn snapshot(status: JobStatus, message: &str) -> JobSnapshot {
        JobSnapshot {
            status,
            progress: ProgressUpdate {
                phase: InstallPhase::Generic,
                percent: 100,
                message: message.to_string(),
            },
            name_choice: None,
            error: None,
            stderr: None,
        }
    }

    #[test]
    fn test_success_reported_once() {
        let notifier = Arc::new(Recording::default());
        let reporter = ResultReporter::new(notifier.clone());

        let outcome = JobOutcome::Finished(snapshot(JobStatus::Success, "done"));
        reporter.report(&outcome);
        reporter.report(&outcome);

        assert_eq!(notifier.successes.lock().as_slice(), ["done"]);
        assert!(notifier.errors.lock().is_empty());
    }

    #[test]
    fn test_cleanup_runs_for_failures_too() {
        let notifier = Arc::new(Recording::default());
        let reporter = ResultReporter::new(notifier.clone());

        reporter.report(&JobOutcome::Aborted(Error::JobNotFound("j1".into())));

        assert!(notifier.clears.load(Ordering::SeqCst));
        assert_eq!(notifier.errors.lock().len(), 1);
    }

    #[test]
    fn test_error_snapshot_uses_failure_text() {
        let notifier = Arc::new(Recording::default());
        let reporter = ResultReporter::new(notifier.clone());

        let mut snap = snapshot(JobStatus::Error, "generic");
        snap.stderr = Some("qemu-img: no space left".to_string());
        reporter.report(&JobOutcome::Finished(snap));

        assert_eq!(notifier.errors.lock().as_slice(), ["qemu-img: no space left"]);
    }
}
