//! Remote-service client: transport seam plus the three wire operations.
//!
//! The remote processing service exposes three JSON-over-HTTP operations;
//! success is defined as an HTTP 2xx status. The core treats all three as
//! opaque beyond shape and status code:
//!
//! | Operation    | Method + path            |
//! |--------------|--------------------------|
//! | createObject | POST `/input_data`       |
//! | applyPrompt  | POST `/apply_prompt`     |
//! | deleteObject | DELETE `/objects/{name}` |
//!
//! ## The transport seam
//!
//! [`ApiClient`] never talks to the network directly: it goes through the
//! [`ApiTransport`] trait, with [`HttpTransport`] (reqwest) as the default
//! implementation. Tests inject a scripted transport via
//! [`crate::config::FlowConfigBuilder::transport`] and exercise the full
//! audit/error path without a live service.
//!
//! ## Auditing
//!
//! Every call appends a `pending` record to the shared [`AuditLog`] before
//! the request is issued, and a resolved (or failed) record once it settles.
//! This pending-then-resolved pairing is what makes the log useful when a
//! call hangs: the pending entry is already there.

use crate::audit::{ApiCallRecord, AuditLog, CallKind};
use crate::config::FlowConfig;
use crate::error::FlowError;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// A settled HTTP exchange: status code plus the decoded body.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body parsed as JSON; `None` when the body was empty or not
    /// well-formed JSON (DELETE responses are typically bodyless).
    pub body: Option<serde_json::Value>,
}

impl TransportResponse {
    /// True for any 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Low-level transport the client issues requests through.
///
/// `Err(String)` means a transport-level failure before any response was
/// received (DNS, connect, timeout); a non-2xx status is a *successful*
/// transport exchange and comes back as `Ok`.
#[async_trait]
pub trait ApiTransport: Send + Sync {
    /// POST `body` as JSON to `url`.
    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<TransportResponse, String>;

    /// DELETE `url` (no request body).
    async fn delete(&self, url: &str) -> Result<TransportResponse, String>;
}

/// Default transport: reqwest with rustls and a per-call timeout.
///
/// Each call is attempted exactly once; there is no retry or backoff layer.
pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    /// Build a transport with the per-call timeout from `config`.
    pub fn new(config: &FlowConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { http }
    }

    async fn read_body(response: reqwest::Response) -> TransportResponse {
        let status = response.status().as_u16();
        let body = response.json::<serde_json::Value>().await.ok();
        TransportResponse { status, body }
    }
}

#[async_trait]
impl ApiTransport for HttpTransport {
    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<TransportResponse, String> {
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        Ok(Self::read_body(response).await)
    }

    async fn delete(&self, url: &str) -> Result<TransportResponse, String> {
        let response = self.http.delete(url).send().await.map_err(|e| e.to_string())?;
        Ok(Self::read_body(response).await)
    }
}

// ── Wire payloads ────────────────────────────────────────────────────────

/// Request body for POST `/input_data`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateObjectRequest {
    /// Generated artifact name the service will create.
    pub created_object_name: String,
    /// Fixed type tag, `"strings"` by default.
    pub data_type: String,
    /// Decoded file contents in submission order.
    pub input_data: Vec<String>,
}

/// One input binding of an applyPrompt request.
#[derive(Debug, Clone, Serialize)]
pub struct PromptInput {
    /// Name of a previously created remote object.
    pub object_name: String,
    /// How the service should feed the object into the prompt.
    pub processing_mode: String,
}

/// Request body for POST `/apply_prompt`.
#[derive(Debug, Clone, Serialize)]
pub struct ApplyPromptRequest {
    /// Output artifact name(s) the job will create.
    pub created_object_names: Vec<String>,
    /// Natural-language transformation template with an input placeholder.
    pub prompt_string: String,
    /// Input bindings, one per source object.
    pub inputs: Vec<PromptInput>,
}

// ── Client ───────────────────────────────────────────────────────────────

/// The audited client for the three remote operations.
///
/// Shared by [`crate::upload::UploadService`],
/// [`crate::extract::ExtractionService`], and
/// [`crate::objects::ObjectLifecycleManager`]; all of them log through the
/// same [`AuditLog`] handle so the session's call history is one sequence.
pub struct ApiClient {
    base_url: String,
    transport: Arc<dyn ApiTransport>,
    audit: Arc<AuditLog>,
}

impl ApiClient {
    /// Build a client from the session config, honouring an injected
    /// transport when one is configured.
    pub fn new(config: &FlowConfig, audit: Arc<AuditLog>) -> Self {
        let transport = config
            .transport
            .clone()
            .unwrap_or_else(|| Arc::new(HttpTransport::new(config)) as Arc<dyn ApiTransport>);
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            transport,
            audit,
        }
    }

    /// The shared audit log this client appends to.
    pub fn audit(&self) -> &Arc<AuditLog> {
        &self.audit
    }

    /// POST `/input_data`: create one remote object from decoded contents.
    ///
    /// Returns the settled response (2xx or not); the caller decides whether
    /// the artifact counts as created. Transport failures come back as
    /// [`FlowError::NetworkError`] after the failed audit record is appended.
    pub async fn create_object(
        &self,
        request: &CreateObjectRequest,
    ) -> Result<TransportResponse, FlowError> {
        self.post_audited("/input_data", request).await
    }

    /// POST `/apply_prompt`: submit one extraction job.
    pub async fn apply_prompt(
        &self,
        request: &ApplyPromptRequest,
    ) -> Result<TransportResponse, FlowError> {
        self.post_audited("/apply_prompt", request).await
    }

    /// DELETE `/objects/{name}`: remove one server-side artifact.
    ///
    /// Status-only: the response body is not interpreted.
    pub async fn delete_object(&self, name: &str) -> Result<TransportResponse, FlowError> {
        let target = format!("/objects/{name}");
        let url = format!("{}{}", self.base_url, target);

        self.audit
            .append(ApiCallRecord::pending(CallKind::Delete, &target, None));

        match self.transport.delete(&url).await {
            Ok(response) => {
                debug!(target = %target, status = response.status, "delete settled");
                self.audit.append(ApiCallRecord::resolved(
                    CallKind::Delete,
                    &target,
                    None,
                    None,
                    response.status,
                    response.is_success(),
                ));
                Ok(response)
            }
            Err(detail) => {
                warn!(target = %target, %detail, "delete transport failure");
                self.audit.append(ApiCallRecord::failed(
                    CallKind::Delete,
                    &target,
                    &detail,
                    None,
                ));
                Err(FlowError::NetworkError { target, detail })
            }
        }
    }

    /// Shared POST path: serialize, audit pending, issue, audit settled.
    async fn post_audited<T: Serialize>(
        &self,
        target: &str,
        request: &T,
    ) -> Result<TransportResponse, FlowError> {
        let payload = serde_json::to_value(request).map_err(|e| FlowError::ParseError {
            target: target.to_string(),
            detail: format!("request serialization: {e}"),
        })?;
        let url = format!("{}{}", self.base_url, target);

        self.audit.append(ApiCallRecord::pending(
            CallKind::Post,
            target,
            Some(payload.clone()),
        ));

        match self.transport.post_json(&url, &payload).await {
            // A 2xx whose body is not well-formed JSON is a failure, not a
            // success with an empty body: the service contract is JSON in,
            // JSON out.
            Ok(response) if response.is_success() && response.body.is_none() => {
                let detail = "response body is not well-formed JSON".to_string();
                warn!(target = %target, status = response.status, "unparseable response body");
                self.audit.append(ApiCallRecord::failed(
                    CallKind::Post,
                    target,
                    &detail,
                    Some(response.status),
                ));
                Err(FlowError::ParseError {
                    target: target.to_string(),
                    detail,
                })
            }
            Ok(response) => {
                debug!(target = %target, status = response.status, "call settled");
                self.audit.append(ApiCallRecord::resolved(
                    CallKind::Post,
                    target,
                    Some(payload),
                    response.body.clone(),
                    response.status,
                    response.is_success(),
                ));
                Ok(response)
            }
            Err(detail) => {
                warn!(target = %target, %detail, "transport failure");
                self.audit
                    .append(ApiCallRecord::failed(CallKind::Post, target, &detail, None));
                Err(FlowError::NetworkError {
                    target: target.to_string(),
                    detail,
                })
            }
        }
    }
}
