//! Name-resolution coordination
//!
//! When a poll reports `needs_input`, the backend is blocked on a naming
//! ambiguity. The coordinator owns that episode: it holds the pending
//! choice, validates the operator's answer locally, submits the resolution,
//! and resumes the suspended poll on the same handle. `resolve` is
//! presentation-agnostic; a CLI prompt, a GUI modal, or a test harness
//! drive it the same way.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use labpull_common::{naming, Error, JobHandle, NameChoice, Result};

use crate::http::PanelApi;
use crate::poller::Subscription;

/// Coordinator phase for one handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumePhase {
    /// No naming episode active
    Idle,
    /// A choice is pending; waiting on the operator
    AwaitingChoice,
    /// A resolution is on the wire
    Submitting,
    /// The resolution was accepted and polling resumed
    Resumed,
}

struct CoordinatorState {
    phase: ResumePhase,
    choice: Option<NameChoice>,
    /// Inline error from the last failed resolution attempt
    last_error: Option<String>,
}

/// Drives the `needs_input` episode of one install attempt
pub struct ResumeCoordinator {
    api: Arc<dyn PanelApi>,
    handle: JobHandle,
    subscription: Subscription,
    state: Mutex<CoordinatorState>,
}

impl ResumeCoordinator {
    pub fn new(api: Arc<dyn PanelApi>, handle: JobHandle, subscription: Subscription) -> Self {
        Self {
            api,
            handle,
            subscription,
            state: Mutex::new(CoordinatorState {
                phase: ResumePhase::Idle,
                choice: None,
                last_error: None,
            }),
        }
    }

    /// Open a naming episode for this handle.
    ///
    /// Returns false if an episode is already open (a duplicate
    /// `needs_input` snapshot must not produce a second prompt).
    pub fn begin(&self, choice: &NameChoice) -> bool {
        let mut state = self.state.lock();
        match state.phase {
            ResumePhase::AwaitingChoice | ResumePhase::Submitting => {
                debug!(job = %self.handle, "duplicate needs_input ignored, episode already open");
                false
            }
            ResumePhase::Idle | ResumePhase::Resumed => {
                state.phase = ResumePhase::AwaitingChoice;
                state.choice = Some(choice.clone());
                state.last_error = None;
                true
            }
        }
    }

    pub fn phase(&self) -> ResumePhase {
        self.state.lock().phase
    }

    /// The choice the backend surfaced for the open episode, if any
    pub fn pending_choice(&self) -> Option<NameChoice> {
        self.state.lock().choice.clone()
    }

    /// Inline error from the most recent failed resolution attempt
    pub fn last_error(&self) -> Option<String> {
        self.state.lock().last_error.clone()
    }

    /// Submit the operator's chosen name and resume polling on success.
    ///
    /// The name is validated locally first; a validation failure keeps the
    /// episode open, records an inline error, and never touches the
    /// network. A failed submission (transport or backend refusal) also
    /// re-opens the episode so the operator can retry with another name.
    pub async fn resolve(&self, name: &str) -> Result<()> {
        let trimmed = name.trim().to_string();

        {
            let mut state = self.state.lock();
            if state.phase != ResumePhase::AwaitingChoice {
                return Err(Error::Validation(
                    "no name resolution is pending for this job".to_string(),
                ));
            }

            if let Err(err) = naming::validate_image_name(&trimmed) {
                state.last_error = Some(err.to_string());
                return Err(err);
            }

            state.phase = ResumePhase::Submitting;
        }

        let result = self.api.choose_name(&self.handle, &trimmed).await;

        let mut state = self.state.lock();
        match result {
            Ok(reply) if reply.success => {
                state.phase = ResumePhase::Resumed;
                state.choice = None;
                state.last_error = None;
                drop(state);

                info!(job = %self.handle, name = %trimmed, "name resolution accepted, resuming poll");
                self.subscription.resume();
                Ok(())
            }
            Ok(reply) => {
                let message = reply
                    .message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| "name was refused by the backend".to_string());
                warn!(job = %self.handle, %message, "name resolution refused");
                state.phase = ResumePhase::AwaitingChoice;
                state.last_error = Some(message.clone());
                Err(Error::Rejected(message))
            }
            Err(err) => {
                warn!(job = %self.handle, error = %err, "name resolution failed to submit");
                state.phase = ResumePhase::AwaitingChoice;
                state.last_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Abandon the episode and the job client-side. The remote job is left
    /// to its own devices; only local polling stops.
    pub fn cancel(&self) {
        info!(job = %self.handle, "install abandoned by operator");
        let mut state = self.state.lock();
        state.phase = ResumePhase::Idle;
        state.choice = None;
        state.last_error = None;
        drop(state);

        self.subscription.stop();
    }
}
