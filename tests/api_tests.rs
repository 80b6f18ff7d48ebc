use axum::{
    Json, Router,
    body::{Body, to_bytes},
    extract::Query,
    http::{HeaderMap, Request, StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceExt;

use toolgate::api::{AppState, create_router};
use toolgate::config::Config;
use toolgate::document::DOCX_MIME;

mod test_helpers {
    use super::*;

    /// Serves `app` on an ephemeral local port and returns its base URL.
    pub async fn spawn_upstream(app: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    /// Fake search provider: echoes the forwarded parameters back as a web result.
    async fn brave_echo(
        headers: HeaderMap,
        Query(params): Query<HashMap<String, String>>,
    ) -> axum::response::Response {
        if params.get("q").map(String::as_str) == Some("fail") {
            return (StatusCode::TOO_MANY_REQUESTS, "rate limited").into_response();
        }
        if params.get("q").map(String::as_str) == Some("nothing") {
            return Json(json!({"type": "search"})).into_response();
        }
        let token = headers
            .get("x-subscription-token")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let mut keys: Vec<&String> = params.keys().collect();
        keys.sort();
        Json(json!({
            "web": {"results": [{
                "title": format!("count={}", params.get("count").cloned().unwrap_or_default()),
                "url": "https://example.com/echo",
                "description": format!("token={token} keys={keys:?}")
            }]}
        }))
        .into_response()
    }

    /// Fake retrieval endpoint: echoes the authorization header and body.
    async fn rag_echo(headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
        let auth = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        Json(json!({"authorization": auth, "received": body}))
    }

    async fn rag_unavailable() -> impl IntoResponse {
        (StatusCode::SERVICE_UNAVAILABLE, "index warming up")
    }

    pub async fn spawn_fakes() -> String {
        spawn_upstream(
            Router::new()
                .route("/search", get(brave_echo))
                .route("/retrieve", post(rag_echo))
                .route("/retrieve-down", post(rag_unavailable)),
        )
        .await
    }

    pub struct TestApp {
        pub state: Arc<AppState>,
        pub upstream: String,
        _dir: tempfile::TempDir,
    }

    impl TestApp {
        pub async fn new() -> Self {
            Self::with_config(|_| {}).await
        }

        pub async fn with_config(adjust: impl FnOnce(&mut Config)) -> Self {
            let upstream = spawn_fakes().await;
            let dir = tempfile::tempdir().unwrap();
            let mut config = Config::default();
            config.brave_search_url = format!("{upstream}/search");
            config.output_dir = dir.path().to_path_buf();
            adjust(&mut config);
            TestApp {
                state: Arc::new(AppState::new(config).unwrap()),
                upstream,
                _dir: dir,
            }
        }

        pub async fn send(&self, request: Request<Body>) -> (StatusCode, HeaderMap, Vec<u8>) {
            let response = create_router(self.state.clone()).oneshot(request).await.unwrap();
            let status = response.status();
            let headers = response.headers().clone();
            let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            (status, headers, body.to_vec())
        }

        pub async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
            let request = Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::HOST, "testhost:5000")
                .body(Body::from(body.to_string()))
                .unwrap();
            let (status, _, body) = self.send(request).await;
            (status, serde_json::from_slice(&body).unwrap())
        }
    }
}

use test_helpers::*;

#[tokio::test]
async fn test_search_requires_key_and_query() {
    let app = TestApp::new().await;

    let (status, body) = app.post_json("/brave_search", json!({"q": "rust"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Brave Search API Key is required");

    let (status, body) = app
        .post_json("/brave_search", json!({"braveSearchAPIKey": "k", "q": "   "}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Search query is required");

    let (status, body) = app.post_json("/brave_search", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No JSON data provided");
}

#[tokio::test]
async fn test_search_forwards_clamped_count_and_key() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post_json(
            "/brave_search",
            json!({
                "braveSearchAPIKey": "secret-key",
                "q": "rust axum",
                "count": "50",
                "searchLang": "en",
                "country": "undefined",
                "gogglesId": "{gogglesId}"
            }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    let digest = body["results"].as_str().unwrap();
    assert!(digest.contains("## Web Results"), "{digest}");
    assert!(digest.contains("count=20"), "{digest}");
    assert!(digest.contains("token=secret-key"), "{digest}");
    assert!(digest.contains("\"search_lang\""), "{digest}");
    assert!(!digest.contains("\"country\""), "{digest}");
    assert!(!digest.contains("\"goggles_id\""), "{digest}");
}

#[tokio::test]
async fn test_search_defaults_count_for_bad_values() {
    let app = TestApp::new().await;
    for count in [json!(0), json!(-4), json!("many")] {
        let (status, body) = app
            .post_json(
                "/brave_search",
                json!({"braveSearchAPIKey": "k", "q": "rust", "count": count}),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["results"].as_str().unwrap().contains("count=10"));
    }
}

#[tokio::test]
async fn test_search_empty_and_failing_provider() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post_json("/brave_search", json!({"braveSearchAPIKey": "k", "q": "nothing"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"], "No results found.");

    let (status, body) = app
        .post_json("/brave_search", json!({"braveSearchAPIKey": "k", "q": "fail"}))
        .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], "Brave Search API error: rate limited");
}

#[tokio::test]
async fn test_search_transport_failure_is_500() {
    let app = TestApp::with_config(|c| c.brave_search_url = "http://127.0.0.1:9/search".into()).await;
    let (status, body) = app
        .post_json("/brave_search", json!({"braveSearchAPIKey": "k", "q": "rust"}))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().starts_with("Request error: "));
}

#[tokio::test]
async fn test_rag_validation() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post_json("/vectorize-rag-retrieve", json!({"question": "why?"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing access token or retrieval endpoint URL");

    let (status, body) = app
        .post_json(
            "/vectorize-rag-retrieve",
            json!({"accessToken": "t", "retrievalEndpointURL": format!("{}/retrieve", app.upstream)}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Search query is required");
}

#[tokio::test]
async fn test_rag_forwards_coerced_payload() {
    let app = TestApp::new().await;
    let endpoint = format!("{}/retrieve", app.upstream);

    let (status, body) = app
        .post_json(
            "/vectorize-rag-retrieve",
            json!({
                "accessToken": "Bearer abc",
                "retrievalEndpointURL": endpoint,
                "question": "what is rust?",
                "numResults": "3",
                "rerank": "false"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["authorization"], "Bearer abc");
    assert_eq!(
        body["received"],
        json!({"question": "what is rust?", "numResults": 3, "rerank": false})
    );

    for bad in [json!(0), json!(-2), json!("lots")] {
        let (_, body) = app
            .post_json(
                "/vectorize-rag-retrieve",
                json!({"accessToken": "t", "retrievalEndpointURL": endpoint, "question": "q", "numResults": bad}),
            )
            .await;
        assert_eq!(body["received"]["numResults"], 5);
        assert_eq!(body["received"]["rerank"], true);
    }
}

#[tokio::test]
async fn test_rag_passes_upstream_errors_through() {
    let app = TestApp::new().await;
    let (status, body) = app
        .post_json(
            "/vectorize-rag-retrieve",
            json!({
                "accessToken": "t",
                "retrievalEndpointURL": format!("{}/retrieve-down", app.upstream),
                "question": "q"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "Retrieval API error: index warming up");
}

#[tokio::test]
async fn test_rag_allowlist_blocks_other_hosts() {
    let app = TestApp::with_config(|c| c.rag_allowed_hosts = vec!["retrieval.internal".into()]).await;
    let (status, body) = app
        .post_json(
            "/vectorize-rag-retrieve",
            json!({
                "accessToken": "t",
                "retrievalEndpointURL": format!("{}/retrieve", app.upstream),
                "question": "q"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].as_str().unwrap().contains("127.0.0.1"));
}

#[tokio::test]
async fn test_options_and_cors() {
    let app = TestApp::new().await;

    for uri in ["/brave_search", "/vectorize-rag-retrieve", "/generate_docx", "/download/abc"] {
        let request = Request::builder().method("OPTIONS").uri(uri).body(Body::empty()).unwrap();
        let (status, _, _) = app.send(request).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
    }

    let preflight = Request::builder()
        .method("OPTIONS")
        .uri("/brave_search")
        .header(header::ORIGIN, "https://plugin.example")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();
    let (status, headers, _) = app.send(preflight).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

#[tokio::test]
async fn test_download_unknown_id_is_404() {
    let app = TestApp::new().await;
    let request = Request::builder().uri("/download/does-not-exist").body(Body::empty()).unwrap();
    let (status, _, body) = app.send(request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, b"File not found");
}

#[tokio::test]
async fn test_generate_then_download() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post_json(
            "/generate_docx",
            json!({
                "content": [
                    {"type": "heading", "text": "Title", "level": 1},
                    {"type": "paragraph", "text": "Hello", "style": "No Such Style"}
                ]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let link = body["download_link"].as_str().unwrap();
    assert!(link.starts_with("http://testhost:5000/download/"), "{link}");
    assert_eq!(body["warnings"].as_array().unwrap().len(), 1);
    assert_eq!(app.state.files.len(), 1);

    let path = link.trim_start_matches("http://testhost:5000");
    let request = Request::builder().uri(path).body(Body::empty()).unwrap();
    let (status, headers, bytes) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], DOCX_MIME);
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"generated_document.docx\""
    );
    assert!(bytes.starts_with(b"PK"));
}

#[tokio::test]
async fn test_concurrent_generations_get_distinct_files() {
    let app = TestApp::new().await;

    let requests = (0..4).map(|i| {
        app.post_json(
            "/generate_docx",
            json!({"content": [{"type": "paragraph", "text": format!("Copy {i}")}]}),
        )
    });
    let responses = futures::future::join_all(requests).await;

    let mut links: Vec<String> = responses
        .into_iter()
        .map(|(status, body)| {
            assert_eq!(status, StatusCode::OK, "{body}");
            body["download_link"].as_str().unwrap().to_string()
        })
        .collect();
    links.sort();
    links.dedup();
    assert_eq!(links.len(), 4);
    assert_eq!(app.state.files.len(), 4);
}

#[tokio::test]
async fn test_generate_uses_public_base_url_and_omits_empty_warnings() {
    let app = TestApp::with_config(|c| c.public_base_url = Some("https://docs.example.com".into())).await;
    let (status, body) = app
        .post_json("/generate_docx", json!({"content": [{"type": "paragraph", "text": "Hi"}]}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(
        body["download_link"]
            .as_str()
            .unwrap()
            .starts_with("https://docs.example.com/download/")
    );
    assert!(body.get("warnings").is_none());
}

#[tokio::test]
async fn test_generate_rejects_empty_and_bad_heading() {
    let app = TestApp::new().await;

    let (status, body) = app.post_json("/generate_docx", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid input. Must provide document parameters.");

    let (status, body) = app
        .post_json(
            "/generate_docx",
            json!({"content": [{"type": "heading", "text": "Deep", "level": 12}]}),
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "level must be in range 0-9, got 12");
    assert!(app.state.files.is_empty());
}
