//! labpull Client Library
//!
//! Orchestrates remote lab-image installs against the panel API: catalog
//! search, job submission, progress polling with mid-flight name
//! resolution, and terminal outcome reporting.

pub mod catalog;
pub mod http;
pub mod poller;
pub mod report;
pub mod resume;
pub mod submit;

// Re-export commonly used types
pub use http::{ChooseReply, PanelApi, PanelClient, SearchReply, SubmitReply};
pub use poller::{JobEvents, JobOutcome, PollerConfig, ProgressPoller, Subscription};
pub use report::{Notifier, ResultReporter};
pub use resume::{ResumeCoordinator, ResumePhase};
pub use submit::JobSubmitter;
