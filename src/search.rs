use std::fmt;

use serde::Deserialize;
use serde_json::Value;

use crate::coerce::{normalize, parse_int, required_text};
use crate::error::{ApiError, passthrough_status};

pub const MAX_COUNT: i64 = 20;
pub const DEFAULT_COUNT: i64 = 10;

/// Body of `POST /brave_search`. Every field stays a raw JSON value until
/// [`SearchParams::from_request`] has normalized it.
#[derive(Debug, Default, Deserialize)]
pub struct SearchRequest {
    #[serde(rename = "braveSearchAPIKey")]
    pub api_key: Option<Value>,
    pub q: Option<Value>,
    pub offset: Option<Value>,
    pub freshness: Option<Value>,
    pub result_filter: Option<Value>,
    pub country: Option<Value>,
    #[serde(rename = "searchLang", alias = "search_lang")]
    pub search_lang: Option<Value>,
    #[serde(rename = "uiLang", alias = "ui_lang")]
    pub ui_lang: Option<Value>,
    pub count: Option<Value>,
    pub safesearch: Option<Value>,
    #[serde(rename = "gogglesId", alias = "goggles_id")]
    pub goggles_id: Option<Value>,
    pub units: Option<Value>,
}

/// Validated provider query. Pairs use the provider's parameter names and
/// always start with `q`.
pub struct SearchParams {
    api_key: String,
    pairs: Vec<(&'static str, String)>,
}

impl SearchParams {
    pub fn from_request(request: &SearchRequest) -> Result<Self, ApiError> {
        let api_key = normalize(request.api_key.as_ref())
            .ok_or_else(|| ApiError::validation("Brave Search API Key is required"))?;
        let query = required_text(request.q.as_ref())
            .ok_or_else(|| ApiError::validation("Search query is required"))?;

        let mut pairs = vec![("q", query)];

        if let Some(offset) = parse_int(request.offset.as_ref()).filter(|o| *o >= 0) {
            pairs.push(("offset", offset.to_string()));
        }

        let text_fields = [
            ("freshness", &request.freshness),
            ("result_filter", &request.result_filter),
            ("country", &request.country),
            ("search_lang", &request.search_lang),
            ("ui_lang", &request.ui_lang),
        ];
        for (name, value) in text_fields {
            if let Some(value) = normalize(value.as_ref()) {
                pairs.push((name, value));
            }
        }

        let count = parse_int(request.count.as_ref())
            .filter(|c| *c > 0)
            .map(|c| c.min(MAX_COUNT))
            .unwrap_or(DEFAULT_COUNT);
        pairs.push(("count", count.to_string()));

        let trailing_fields = [
            ("safesearch", &request.safesearch),
            ("goggles_id", &request.goggles_id),
            ("units", &request.units),
        ];
        for (name, value) in trailing_fields {
            if let Some(value) = normalize(value.as_ref()) {
                pairs.push((name, value));
            }
        }

        Ok(SearchParams { api_key, pairs })
    }

    pub fn pairs(&self) -> &[(&'static str, String)] {
        &self.pairs
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn query(&self) -> &str {
        // `q` is always the first pair.
        &self.pairs[0].1
    }
}

impl fmt::Debug for SearchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchParams")
            .field("api_key", &"<redacted>")
            .field("pairs", &self.pairs)
            .finish()
    }
}

/// Thin client for the web-search provider.
#[derive(Debug, Clone)]
pub struct BraveClient {
    http: reqwest::Client,
    endpoint: String,
}

impl BraveClient {
    pub fn new(http: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }

    /// Runs one provider query and returns its JSON body untouched.
    pub async fn search(&self, params: &SearchParams) -> Result<Value, ApiError> {
        log::info!("forwarding search query: {}", params.query());

        let response = self
            .http
            .get(&self.endpoint)
            .query(params.pairs())
            .header("Accept", "application/json")
            .header("Accept-Encoding", "gzip")
            .header("X-Subscription-Token", &params.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Upstream {
                status: passthrough_status(status.as_u16()),
                message: format!("Brave Search API error: {}", body.trim()),
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::Internal(format!("An error occurred: invalid provider response: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(body: Value) -> SearchRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_requires_key_and_query() {
        let err = SearchParams::from_request(&request(json!({"q": "rust"}))).unwrap_err();
        assert_eq!(err.to_string(), "Brave Search API Key is required");

        let err = SearchParams::from_request(&request(json!({
            "braveSearchAPIKey": "{braveSearchAPIKey}",
            "q": "rust"
        })))
        .unwrap_err();
        assert_eq!(err.to_string(), "Brave Search API Key is required");

        let err =
            SearchParams::from_request(&request(json!({"braveSearchAPIKey": "k", "q": "  "}))).unwrap_err();
        assert_eq!(err.to_string(), "Search query is required");
    }

    #[test]
    fn test_count_is_clamped_and_defaulted() {
        let cases = [
            (json!(50), "20"),
            (json!("21"), "20"),
            (json!(20), "20"),
            (json!("5"), "5"),
            (json!(0), "10"),
            (json!(-3), "10"),
            (json!("lots"), "10"),
            (json!(null), "10"),
        ];
        for (count, expected) in cases {
            let params = SearchParams::from_request(&request(json!({
                "braveSearchAPIKey": "k",
                "q": "rust",
                "count": count.clone()
            })))
            .unwrap();
            assert_eq!(params.get("count"), Some(expected), "count input {count}");
        }
    }

    #[test]
    fn test_field_mapping_and_placeholders() {
        let params = SearchParams::from_request(&request(json!({
            "braveSearchAPIKey": "k",
            "q": "rust async",
            "offset": "2",
            "searchLang": "en",
            "uiLang": "{uiLang}",
            "gogglesId": "https://example.com/goggle",
            "country": "undefined",
            "freshness": "",
            "units": "metric",
            "safesearch": null
        })))
        .unwrap();

        assert_eq!(params.query(), "rust async");
        assert_eq!(params.get("offset"), Some("2"));
        assert_eq!(params.get("search_lang"), Some("en"));
        assert_eq!(params.get("goggles_id"), Some("https://example.com/goggle"));
        assert_eq!(params.get("units"), Some("metric"));
        assert_eq!(params.get("ui_lang"), None);
        assert_eq!(params.get("country"), None);
        assert_eq!(params.get("freshness"), None);
        assert_eq!(params.get("safesearch"), None);
        assert!(!format!("{params:?}").contains("\"k\""));
    }

    #[test]
    fn test_query_text_is_taken_literally() {
        for q in ["null", "{braces}", "undefined"] {
            let params =
                SearchParams::from_request(&request(json!({"braveSearchAPIKey": "k", "q": q}))).unwrap();
            assert_eq!(params.query(), q);
        }
    }

    #[test]
    fn test_negative_offset_is_skipped() {
        let params = SearchParams::from_request(&request(json!({
            "braveSearchAPIKey": "k",
            "q": "rust",
            "offset": -1
        })))
        .unwrap();
        assert_eq!(params.get("offset"), None);
    }
}
