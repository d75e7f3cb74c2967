//! Panel HTTP client
//!
//! Typed access to the lab-image panel endpoints. The [`PanelApi`] trait is
//! the seam the orchestrator is built against; [`PanelClient`] is the
//! reqwest implementation used in production.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use labpull_common::{
    CatalogSection, Error, ImageKind, InstallRequest, JobHandle, JobReport, Result,
};

/// Response to `POST install`
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitReply {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Response to `POST install_choose`
#[derive(Debug, Clone, Deserialize)]
pub struct ChooseReply {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Response to `POST search_all`
#[derive(Debug, Clone, Deserialize)]
pub struct SearchReply {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub sections: Vec<CatalogSection>,
    #[serde(default)]
    pub stderr: Option<String>,
}

/// Panel operations the orchestrator depends on
#[async_trait]
pub trait PanelApi: Send + Sync {
    /// Submit an install job; the reply carries the backend-assigned job id
    async fn submit_install(&self, request: &InstallRequest) -> Result<SubmitReply>;

    /// Fetch the current progress report for a job.
    ///
    /// Errors are pre-classified for the poller: transport failures map to
    /// `Error::Network`, 404 to `Error::JobNotFound`, other unexpected
    /// statuses to `Error::Protocol`, and undecodable bodies to
    /// `Error::Malformed`.
    async fn fetch_progress(&self, handle: &JobHandle) -> Result<JobReport>;

    /// Submit the operator's name resolution for a suspended job
    async fn choose_name(&self, handle: &JobHandle, name: &str) -> Result<ChooseReply>;

    /// List the remote catalog, optionally narrowed by a server-side query
    async fn search_all(&self, query: Option<&str>) -> Result<SearchReply>;
}

#[derive(Serialize)]
struct InstallBody<'a> {
    #[serde(rename = "type")]
    kind: ImageKind,
    id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    host: &'a str,
    username: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct ChooseBody<'a> {
    job_id: &'a str,
    name: &'a str,
}

#[derive(Serialize)]
struct SearchBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    query: Option<&'a str>,
}

/// reqwest-backed panel client
pub struct PanelClient {
    http: reqwest::Client,
    base_url: String,
    language: Option<String>,
}

impl PanelClient {
    /// Create a client for the panel at `base_url` (e.g.
    /// `http://10.0.0.5/api/ishare2`). `language` becomes the
    /// `Accept-Language` header on every request so the backend can
    /// localize its messages.
    pub fn new(base_url: impl Into<String>, language: Option<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
            language,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn apply_headers(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.language {
            Some(lang) => builder.header(reqwest::header::ACCEPT_LANGUAGE, lang),
            None => builder,
        }
    }

    /// Decode a reply body, mapping non-2xx statuses and undecodable JSON
    /// to a protocol error carrying the raw status code. Progress fetches
    /// do their own, more forgiving classification.
    async fn decode_strict<T: serde::de::DeserializeOwned>(
        resp: reqwest::Response,
    ) -> Result<T> {
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Protocol {
                status: status.as_u16(),
            });
        }
        resp.json::<T>().await.map_err(|_| Error::Protocol {
            status: status.as_u16(),
        })
    }
}

#[async_trait]
impl PanelApi for PanelClient {
    async fn submit_install(&self, request: &InstallRequest) -> Result<SubmitReply> {
        let body = InstallBody {
            kind: request.kind,
            id: &request.catalog_id,
            name: request.target_name.as_deref(),
            host: &request.credentials.host,
            username: &request.credentials.username,
            password: &request.credentials.password,
        };

        debug!(kind = %request.kind, id = %request.catalog_id, "submitting install");
        let resp = self
            .apply_headers(self.http.post(self.endpoint("install")).json(&body))
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        Self::decode_strict(resp).await
    }

    async fn fetch_progress(&self, handle: &JobHandle) -> Result<JobReport> {
        let resp = self
            .apply_headers(
                self.http
                    .get(self.endpoint("install_progress"))
                    .query(&[("job_id", handle.as_str())]),
            )
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::JobNotFound(handle.to_string()));
        }
        if !status.is_success() {
            return Err(Error::Protocol {
                status: status.as_u16(),
            });
        }

        resp.json::<JobReport>()
            .await
            .map_err(|e| Error::Malformed(e.to_string()))
    }

    async fn choose_name(&self, handle: &JobHandle, name: &str) -> Result<ChooseReply> {
        let body = ChooseBody {
            job_id: handle.as_str(),
            name,
        };

        debug!(job = %handle, name, "submitting name resolution");
        let resp = self
            .apply_headers(self.http.post(self.endpoint("install_choose")).json(&body))
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        Self::decode_strict(resp).await
    }

    async fn search_all(&self, query: Option<&str>) -> Result<SearchReply> {
        let resp = self
            .apply_headers(
                self.http
                    .post(self.endpoint("search_all"))
                    .json(&SearchBody { query }),
            )
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        Self::decode_strict(resp).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use labpull_common::HostCredentials;

    #[test]
    fn test_install_body_serialization() {
        let request = InstallRequest {
            kind: ImageKind::Qemu,
            catalog_id: "42".to_string(),
            target_name: None,
            credentials: HostCredentials {
                host: "10.0.0.5".to_string(),
                username: "admin".to_string(),
                password: "eve".to_string(),
            },
        };
        let body = InstallBody {
            kind: request.kind,
            id: &request.catalog_id,
            name: request.target_name.as_deref(),
            host: &request.credentials.host,
            username: &request.credentials.username,
            password: &request.credentials.password,
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["type"], "qemu");
        assert_eq!(json["id"], "42");
        assert!(json.get("name").is_none());
        assert_eq!(json["host"], "10.0.0.5");
    }

    #[test]
    fn test_submit_reply_parsing() {
        let reply: SubmitReply =
            serde_json::from_str(r#"{"success": true, "job_id": "j1"}"#).unwrap();
        assert!(reply.success);
        assert_eq!(reply.job_id.as_deref(), Some("j1"));

        // missing fields default rather than failing the decode
        let reply: SubmitReply = serde_json::from_str(r#"{}"#).unwrap();
        assert!(!reply.success);
        assert!(reply.job_id.is_none());
    }

    #[test]
    fn test_search_reply_parsing() {
        let reply: SearchReply = serde_json::from_str(
            r#"{
                "success": true,
                "sections": [
                    {"type": "qemu", "label": "QEMU", "items": [{"id": 1, "name": "vios", "size": "128M"}]},
                    {"type": "iol", "label": "IOL", "items": []}
                ]
            }"#,
        )
        .unwrap();
        assert!(reply.success);
        assert_eq!(reply.sections.len(), 2);
        assert_eq!(reply.sections[0].items[0].name, "vios");
    }

    #[test]
    fn test_endpoint_building_trims_trailing_slash() {
        let client = PanelClient::new("http://panel/api/ishare2/", None);
        assert_eq!(
            client.endpoint("install_progress"),
            "http://panel/api/ishare2/install_progress"
        );
    }
}
