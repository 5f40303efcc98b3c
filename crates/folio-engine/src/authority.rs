//! # External Validation Authority
//!
//! The authority accepts one document per call and may only acknowledge
//! receipt. The final status lands on the document record later, so callers
//! always re-read the store after [`ValidationAuthority::submit`].
//!
//! ## Wire Format
//! ```text
//!   POST {endpoint}
//!   Authorization: Bearer <api_token>        (optional)
//!   { "tenantId": "...", "documentId": "..." }
//!
//!   2xx  { "success": true, "status": "accepted", "message": "...", "observations": [] }
//!   4xx/5xx  { "error": "..." }  or plain text
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};

/// What the authority said about one submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    /// Whether the call was accepted for processing.
    pub success: bool,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub observations: Vec<String>,
}

/// Submits one document for validation.
#[async_trait]
pub trait ValidationAuthority: Send + Sync {
    async fn submit(&self, document_id: &str) -> EngineResult<SubmissionReceipt>;
}

// =============================================================================
// HTTP Client
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitRequest<'a> {
    tenant_id: &'a str,
    document_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// [`ValidationAuthority`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpAuthority {
    client: reqwest::Client,
    endpoint: url::Url,
    api_token: Option<String>,
    tenant_id: String,
    call_timeout: Duration,
}

impl HttpAuthority {
    pub fn new(
        endpoint: &str,
        api_token: Option<String>,
        tenant_id: impl Into<String>,
        call_timeout: Duration,
    ) -> EngineResult<Self> {
        let endpoint = url::Url::parse(endpoint)?;
        let client = reqwest::Client::builder().build()?;

        Ok(HttpAuthority {
            client,
            endpoint,
            api_token,
            tenant_id: tenant_id.into(),
            call_timeout,
        })
    }

    /// Builds the client from `[authority]` and `[database].tenant_id`.
    pub fn from_config(config: &EngineConfig) -> EngineResult<Self> {
        let endpoint = config
            .authority
            .endpoint
            .as_deref()
            .ok_or_else(|| EngineError::InvalidConfig("authority.endpoint is not set".into()))?;

        Self::new(
            endpoint,
            config.authority.api_token.clone(),
            config.database.tenant_id.clone(),
            config.call_timeout(),
        )
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }

    async fn send(&self, document_id: &str) -> EngineResult<SubmissionReceipt> {
        let mut request = self.client.post(self.endpoint.clone()).json(&SubmitRequest {
            tenant_id: &self.tenant_id,
            document_id,
        });
        if let Some(ref token) = self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&text)
                .map(|body| body.error)
                .unwrap_or_else(|_| if text.is_empty() { status.to_string() } else { text });
            warn!(document_id = %document_id, status = %status, error = %message, "Authority refused submission");
            return Err(EngineError::Authority(message));
        }

        Ok(response.json::<SubmissionReceipt>().await?)
    }
}

#[async_trait]
impl ValidationAuthority for HttpAuthority {
    async fn submit(&self, document_id: &str) -> EngineResult<SubmissionReceipt> {
        debug!(document_id = %document_id, endpoint = %self.endpoint, "Submitting document");

        let receipt = tokio::time::timeout(self.call_timeout, self.send(document_id))
            .await
            .map_err(|_| EngineError::timeout("authority submit", self.call_timeout))??;

        debug!(
            document_id = %document_id,
            success = receipt.success,
            status = ?receipt.status,
            "Authority acknowledged submission"
        );
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_is_camel_case() {
        let body = serde_json::to_value(SubmitRequest {
            tenant_id: "t1",
            document_id: "d1",
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"tenantId": "t1", "documentId": "d1"}));
    }

    #[test]
    fn test_receipt_tolerates_missing_fields() {
        let receipt: SubmissionReceipt = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert!(receipt.success);
        assert!(receipt.status.is_none());
        assert!(receipt.observations.is_empty());

        let full: SubmissionReceipt = serde_json::from_str(
            r#"{"success": false, "status": "rejected", "message": "RUC inválido", "observations": ["4000"]}"#,
        )
        .unwrap();
        assert_eq!(full.status.as_deref(), Some("rejected"));
        assert_eq!(full.observations, vec!["4000".to_string()]);
    }

    #[test]
    fn test_from_config_requires_endpoint() {
        let mut config = EngineConfig::default();
        assert!(matches!(
            HttpAuthority::from_config(&config),
            Err(EngineError::InvalidConfig(_))
        ));

        config.authority.endpoint = Some("https://validator.internal/submit".into());
        let authority = HttpAuthority::from_config(&config).unwrap();
        assert_eq!(authority.endpoint(), "https://validator.internal/submit");
    }

    #[test]
    fn test_invalid_endpoint() {
        let err = HttpAuthority::new("::nope", None, "t", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, EngineError::InvalidUrl(_)));
    }
}
