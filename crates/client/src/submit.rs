//! Install job submission

use std::sync::Arc;
use tracing::info;

use labpull_common::{Error, InstallRequest, JobHandle, Result};

use crate::http::PanelApi;

/// Issues the initial install request and converts the synchronous error
/// surface into the typed taxonomy. Does not start polling; that is the
/// caller's responsibility.
pub struct JobSubmitter {
    api: Arc<dyn PanelApi>,
}

impl JobSubmitter {
    pub fn new(api: Arc<dyn PanelApi>) -> Self {
        Self { api }
    }

    /// Submit one install attempt, returning the backend-assigned handle.
    ///
    /// Incomplete credentials or a blank catalog id fail with
    /// `Error::Validation` before any network call. Transport failures map
    /// to `Error::Network`, non-2xx or undecodable responses to
    /// `Error::Protocol`, and a well-formed refusal (or a reply with no
    /// job id) to `Error::Rejected` carrying the backend message.
    pub async fn submit(&self, request: &InstallRequest) -> Result<JobHandle> {
        validate(request)?;

        let reply = self.api.submit_install(request).await?;

        if !reply.success {
            return Err(Error::Rejected(
                reply
                    .message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| "install request refused".to_string()),
            ));
        }

        let job_id = reply
            .job_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| Error::Rejected("backend did not assign a job id".to_string()))?;

        let handle = JobHandle::new(job_id);
        info!(job = %handle, kind = %request.kind, id = %request.catalog_id, "install job submitted");
        Ok(handle)
    }
}

fn validate(request: &InstallRequest) -> Result<()> {
    if request.catalog_id.trim().is_empty() {
        return Err(Error::Validation(
            "a catalog id is required to install an image".to_string(),
        ));
    }
    if !request.credentials.is_complete() {
        return Err(Error::Validation(
            "host address, username, and password are required".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use labpull_common::{HostCredentials, ImageKind};

    fn request() -> InstallRequest {
        InstallRequest {
            kind: ImageKind::Qemu,
            catalog_id: "42".to_string(),
            target_name: None,
            credentials: HostCredentials {
                host: "10.0.0.5".to_string(),
                username: "admin".to_string(),
                password: "eve".to_string(),
            },
        }
    }

    #[test]
    fn test_validate_accepts_complete_request() {
        assert!(validate(&request()).is_ok());
    }

    #[test]
    fn test_validate_requires_catalog_id() {
        let mut req = request();
        req.catalog_id = "  ".to_string();
        assert!(matches!(validate(&req), Err(Error::Validation(_))));
    }

    #[test]
    fn test_validate_requires_credentials() {
        let mut req = request();
        req.credentials.password.clear();
        assert!(matches!(validate(&req), Err(Error::Validation(_))));
    }
}
