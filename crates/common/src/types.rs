//! Core types for labpull

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Vendor/image type understood by the remote lab host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageKind {
    Qemu,
    Iol,
    Dynamips,
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageKind::Qemu => write!(f, "qemu"),
            ImageKind::Iol => write!(f, "iol"),
            ImageKind::Dynamips => write!(f, "dynamips"),
        }
    }
}

impl FromStr for ImageKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "qemu" => Ok(ImageKind::Qemu),
            "iol" => Ok(ImageKind::Iol),
            "dynamips" => Ok(ImageKind::Dynamips),
            other => Err(Error::Validation(format!("unknown image kind: {other}"))),
        }
    }
}

/// Credentials for the managed lab host
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostCredentials {
    pub host: String,
    pub username: String,
    pub password: String,
}

impl HostCredentials {
    pub fn is_complete(&self) -> bool {
        !self.host.trim().is_empty()
            && !self.username.trim().is_empty()
            && !self.password.is_empty()
    }
}

/// One install attempt as confirmed by the operator. Immutable once submitted.
#[derive(Debug, Clone, Serialize)]
pub struct InstallRequest {
    pub kind: ImageKind,
    pub catalog_id: String,
    pub target_name: Option<String>,
    pub credentials: HostCredentials,
}

/// Opaque backend-issued identifier for one in-progress remote install
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobHandle(String);

impl JobHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Job status reported by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    NeedsInput,
    Success,
    Error,
}

impl JobStatus {
    /// Parse a wire status string; unknown strings yield None so a single
    /// bad payload can be treated as a transient tick.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(JobStatus::Pending),
            "running" => Some(JobStatus::Running),
            "needs_input" => Some(JobStatus::NeedsInput),
            "success" => Some(JobStatus::Success),
            "error" => Some(JobStatus::Error),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Success | JobStatus::Error)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Running => write!(f, "running"),
            JobStatus::NeedsInput => write!(f, "needs_input"),
            JobStatus::Success => write!(f, "success"),
            JobStatus::Error => write!(f, "error"),
        }
    }
}

/// Backend-reported sub-stage of an install
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallPhase {
    Pull,
    Copy,
    Fix,
    Generic,
}

impl fmt::Display for InstallPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstallPhase::Pull => write!(f, "downloading"),
            InstallPhase::Copy => write!(f, "copying to host"),
            InstallPhase::Fix => write!(f, "fixing permissions"),
            InstallPhase::Generic => write!(f, "installing"),
        }
    }
}

/// Normalized progress tuple fed to progress reporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressUpdate {
    pub phase: InstallPhase,
    pub percent: u8,
    pub message: String,
}

/// Naming ambiguity payload attached to a `needs_input` report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameChoice {
    pub suggested_name: String,
    pub current_name: String,
    pub choices: Vec<String>,
    pub base_dir: String,
}

/// Raw progress report as returned by `GET install_progress`.
///
/// Every field except `status` is optional on the wire; consumers go
/// through [`JobSnapshot::from_report`] rather than reading this directly.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobReport {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub phase: Option<String>,
    #[serde(default)]
    pub progress: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub stderr: Option<String>,
    #[serde(default)]
    pub suggested_name: Option<String>,
    #[serde(default)]
    pub current_name: Option<String>,
    #[serde(default)]
    pub choices: Vec<String>,
    #[serde(default)]
    pub base_dir: Option<String>,
}

/// Result of one status fetch, normalized for the rest of the system.
/// Transient; only the most recent snapshot per handle is retained.
#[derive(Debug, Clone, Serialize)]
pub struct JobSnapshot {
    pub status: JobStatus,
    pub progress: ProgressUpdate,
    pub name_choice: Option<NameChoice>,
    pub error: Option<String>,
    pub stderr: Option<String>,
}

impl JobSnapshot {
    /// Normalize a raw report. Unknown status strings are a malformed
    /// tick, not a terminal condition.
    pub fn from_report(report: &JobReport) -> Result<Self> {
        let status = JobStatus::parse(&report.status)
            .ok_or_else(|| Error::Malformed(format!("unknown job status: {:?}", report.status)))?;

        let name_choice = if status == JobStatus::NeedsInput {
            Some(NameChoice::from_report(report))
        } else {
            None
        };

        Ok(Self {
            status,
            progress: crate::phase::interpret(report),
            name_choice,
            error: report.error.clone(),
            stderr: report.stderr.clone(),
        })
    }

    /// Diagnostic text for an `error` outcome: explicit error field first,
    /// then raw stderr, then the generic message.
    pub fn failure_text(&self) -> &str {
        if let Some(error) = self.error.as_deref().filter(|s| !s.trim().is_empty()) {
            error
        } else if let Some(stderr) = self.stderr.as_deref().filter(|s| !s.trim().is_empty()) {
            stderr
        } else {
            &self.progress.message
        }
    }
}

impl NameChoice {
    pub fn from_report(report: &JobReport) -> Self {
        Self {
            suggested_name: report.suggested_name.clone().unwrap_or_default(),
            current_name: report.current_name.clone().unwrap_or_default(),
            choices: report.choices.clone(),
            base_dir: report.base_dir.clone().unwrap_or_default(),
        }
    }
}

/// One installable image as listed by the remote catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub size: String,
}

/// A catalog section groups items of one image kind
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSection {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub items: Vec<CatalogItem>,
}

impl CatalogSection {
    /// Typed image kind, if the section's wire type is recognized
    pub fn image_kind(&self) -> Option<ImageKind> {
        self.kind.parse().ok()
    }

    /// Display label, falling back to the wire type
    pub fn title(&self) -> &str {
        if self.label.trim().is_empty() {
            &self.kind
        } else {
            &self.label
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_kind_round_trip() {
        for kind in [ImageKind::Qemu, ImageKind::Iol, ImageKind::Dynamips] {
            let parsed: ImageKind = kind.to_string().parse().unwrap();
            assert_eq!(parsed, kind);
        }
        assert!("QEMU".parse::<ImageKind>().is_ok());
        assert!("docker".parse::<ImageKind>().is_err());
    }

    #[test]
    fn test_job_report_parsing() {
        let json = r#"{"status": "running", "phase": "pull", "progress": 40, "message": "downloading image"}"#;
        let report: JobReport = serde_json::from_str(json).unwrap();
        let snapshot = JobSnapshot::from_report(&report).unwrap();
        assert_eq!(snapshot.status, JobStatus::Running);
        assert_eq!(snapshot.progress.phase, InstallPhase::Pull);
        assert_eq!(snapshot.progress.percent, 40);
        assert!(snapshot.name_choice.is_none());
    }

    #[test]
    fn test_needs_input_report_parsing() {
        let json = r#"{
            "status": "needs_input",
            "suggested_name": "vendor-1.0",
            "current_name": "vendor",
            "choices": ["vendor-1.0", "vendor-1.1"],
            "base_dir": "/opt/unetlab/addons/qemu"
        }"#;
        let report: JobReport = serde_json::from_str(json).unwrap();
        let snapshot = JobSnapshot::from_report(&report).unwrap();
        assert_eq!(snapshot.status, JobStatus::NeedsInput);
        let choice = snapshot.name_choice.unwrap();
        assert_eq!(choice.suggested_name, "vendor-1.0");
        assert_eq!(choice.choices.len(), 2);
        assert_eq!(choice.base_dir, "/opt/unetlab/addons/qemu");
    }

    #[test]
    fn test_unknown_status_is_malformed() {
        let report: JobReport =
            serde_json::from_str(r#"{"status": "exploded"}"#).unwrap();
        assert!(matches!(
            JobSnapshot::from_report(&report),
            Err(Error::Malformed(_))
        ));
    }

    #[test]
    fn test_failure_text_priority() {
        let report: JobReport = serde_json::from_str(
            r#"{"status": "error", "message": "failed", "stderr": "disk full", "error": "copy failed"}"#,
        )
        .unwrap();
        let snapshot = JobSnapshot::from_report(&report).unwrap();
        assert_eq!(snapshot.failure_text(), "copy failed");

        let report: JobReport =
            serde_json::from_str(r#"{"status": "error", "message": "failed", "stderr": "disk full"}"#)
                .unwrap();
        assert_eq!(JobSnapshot::from_report(&report).unwrap().failure_text(), "disk full");

        let report: JobReport =
            serde_json::from_str(r#"{"status": "error", "message": "failed"}"#).unwrap();
        assert_eq!(JobSnapshot::from_report(&report).unwrap().failure_text(), "failed");
    }

    #[test]
    fn test_catalog_section_parsing() {
        let json = r#"{
            "type": "QEMU",
            "label": "QEMU images",
            "items": [{"id": 42, "name": "vios-adventerprisek9-m", "size": "128M"}]
        }"#;
        let section: CatalogSection = serde_json::from_str(json).unwrap();
        assert_eq!(section.image_kind(), Some(ImageKind::Qemu));
        assert_eq!(section.title(), "QEMU images");
        assert_eq!(section.items[0].id, 42);
    }
}
