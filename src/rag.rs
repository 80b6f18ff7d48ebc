use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::coerce::{normalize, parse_flag, parse_int, required_text};
use crate::error::{ApiError, passthrough_status};

pub const DEFAULT_NUM_RESULTS: i64 = 5;

/// Body of `POST /vectorize-rag-retrieve`.
#[derive(Debug, Default, Deserialize)]
pub struct RagRequest {
    #[serde(rename = "accessToken")]
    pub access_token: Option<Value>,
    #[serde(rename = "retrievalEndpointURL")]
    pub retrieval_endpoint_url: Option<Value>,
    pub question: Option<Value>,
    #[serde(rename = "numResults")]
    pub num_results: Option<Value>,
    pub rerank: Option<Value>,
}

/// JSON body sent to the retrieval endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievalPayload {
    pub question: String,
    #[serde(rename = "numResults")]
    pub num_results: i64,
    pub rerank: bool,
}

#[derive(Debug, Clone)]
pub struct RetrievalCall {
    pub endpoint: Url,
    pub access_token: String,
    pub payload: RetrievalPayload,
}

impl RetrievalCall {
    /// Validates the request and resolves defaults. `allowed_hosts` limits
    /// which endpoints may be reached; an empty list allows any host.
    pub fn from_request(request: &RagRequest, allowed_hosts: &[String]) -> Result<Self, ApiError> {
        let access_token = normalize(request.access_token.as_ref());
        let endpoint = normalize(request.retrieval_endpoint_url.as_ref());
        let (Some(access_token), Some(endpoint)) = (access_token, endpoint) else {
            return Err(ApiError::validation(
                "Missing access token or retrieval endpoint URL",
            ));
        };
        let question = required_text(request.question.as_ref())
            .ok_or_else(|| ApiError::validation("Search query is required"))?;

        let endpoint = Url::parse(&endpoint)
            .ok()
            .filter(|url| matches!(url.scheme(), "http" | "https") && url.host_str().is_some())
            .ok_or_else(|| ApiError::validation("Invalid retrieval endpoint URL"))?;

        if !host_allowed(&endpoint, allowed_hosts) {
            return Err(ApiError::Forbidden(format!(
                "Retrieval endpoint host is not allowed: {}",
                endpoint.host_str().unwrap_or_default()
            )));
        }

        let num_results = parse_int(request.num_results.as_ref())
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_NUM_RESULTS);
        let rerank = parse_flag(request.rerank.as_ref(), true);

        Ok(RetrievalCall {
            endpoint,
            access_token,
            payload: RetrievalPayload {
                question,
                num_results,
                rerank,
            },
        })
    }
}

fn host_allowed(endpoint: &Url, allowed_hosts: &[String]) -> bool {
    if allowed_hosts.is_empty() {
        return true;
    }
    let host = endpoint.host_str().unwrap_or_default().to_ascii_lowercase();
    allowed_hosts.iter().any(|allowed| *allowed == host)
}

#[derive(Debug, Clone)]
pub struct RagClient {
    http: reqwest::Client,
}

impl RagClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Forwards one retrieval call and returns the upstream JSON verbatim.
    pub async fn retrieve(&self, call: &RetrievalCall) -> Result<Value, ApiError> {
        log::info!(
            "forwarding retrieval to {} (numResults={}, rerank={})",
            call.endpoint.host_str().unwrap_or_default(),
            call.payload.num_results,
            call.payload.rerank
        );

        let response = self
            .http
            .post(call.endpoint.clone())
            .header("Authorization", &call.access_token)
            .json(&call.payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Upstream {
                status: passthrough_status(status.as_u16()),
                message: format!("Retrieval API error: {}", body.trim()),
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| {
            ApiError::Internal(format!("An error occurred: invalid retrieval response: {e}"))
        })
    }
}
