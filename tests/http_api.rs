use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::util::ServiceExt;

use prompt_compressor::{
    AppState, ExpanderError, MemoryStore, PromptExpander, PromptOptimizer,
};

struct CannedExpander {
    reply: String,
}

#[async_trait]
impl PromptExpander for CannedExpander {
    async fn expand(&self, _prompt: &str) -> Result<String, ExpanderError> {
        Ok(self.reply.clone())
    }
}

struct TestApp {
    router: axum::Router,
    store: Arc<MemoryStore>,
}

fn build_app(reply: &str) -> TestApp {
    let optimizer = Arc::new(PromptOptimizer::new(Box::new(CannedExpander {
        reply: reply.to_string(),
    })));
    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(optimizer, store.clone(), store.clone());

    TestApp {
        router: prompt_compressor::http::router(state),
        store,
    }
}

/// Canned reply: 400-char markdown, 100/60/90/30-char formats, wrapped in
/// a fenced code block with surrounding prose.
fn sales_email_reply() -> String {
    let body = serde_json::json!({
        "category": "Content",
        "original_prompt": "Write a sales email",
        "optimized_markdown": "m".repeat(400),
        "formats": {
            "json_pretty": "p".repeat(100),
            "json_minified": "r".repeat(60),
            "yaml": "y".repeat(90),
            "toon": "t".repeat(30),
        }
    });
    format!("Here is the optimized prompt:\n```json\n{body}\n```\n")
}

fn optimize_request(token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/optimize")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder
        .body(Body::from(r#"{"prompt": "Write a sales email"}"#))
        .expect("request")
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("json body")
}

/// Background persistence is fire-and-forget; give the spawned task a
/// moment to land before asserting on store contents.
async fn wait_for_records(store: &MemoryStore, expected: usize) {
    for _ in 0..100 {
        if store.len() >= expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("expected {expected} records, found {}", store.len());
}

#[tokio::test]
async fn optimize_returns_normalized_result_and_savings() {
    let app = build_app(&sales_email_reply());

    let response = app
        .router
        .clone()
        .oneshot(optimize_request(Some("alice-token")))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let payload = json_body(response).await;
    assert_eq!(payload["category"], "Content");
    assert_eq!(payload["original_prompt"], "Write a sales email");
    assert_eq!(payload["stats"]["token_counts"]["markdown"], 100);
    assert_eq!(payload["stats"]["token_counts"]["toon"], 8);
    assert_eq!(payload["savings"]["best_format"], "toon");
    assert_eq!(payload["savings"]["best_format_tokens"], 8);
    assert_eq!(payload["savings"]["savings_percentage"]["toon"], "92.0%");
    let toon_cost = payload["savings"]["cost_savings_usd"]["toon"]
        .as_f64()
        .expect("toon cost");
    assert!((toon_cost - 0.0000092).abs() < 1e-12);

    // The insert happens off the response path but does land
    wait_for_records(&app.store, 1).await;
}

#[tokio::test]
async fn optimize_requires_bearer_credential() {
    let app = build_app(&sales_email_reply());

    let response = app
        .router
        .oneshot(optimize_request(None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let payload = json_body(response).await;
    assert!(payload["error"].as_str().unwrap().contains("credential"));
    assert!(app.store.is_empty());
}

#[tokio::test]
async fn optimize_rejects_wrong_method() {
    let app = build_app(&sales_email_reply());

    let response = app
        .router
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/optimize")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn unparseable_reply_is_an_error_not_a_partial_result() {
    let app = build_app("I'm sorry, I can only chat about cooking.");

    let response = app
        .router
        .oneshot(optimize_request(Some("alice-token")))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let payload = json_body(response).await;
    assert!(payload["error"]
        .as_str()
        .unwrap()
        .contains("parseable JSON"));
    assert!(app.store.is_empty());
}

#[tokio::test]
async fn empty_prompt_is_a_client_error() {
    let app = build_app(&sales_email_reply());

    let request = Request::builder()
        .method("POST")
        .uri("/api/optimize")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, "Bearer alice-token")
        .body(Body::from(r#"{"prompt": "   "}"#))
        .expect("request");

    let response = app.router.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn history_lists_only_the_callers_records() {
    let app = build_app(&sales_email_reply());

    for token in ["alice-token", "alice-token", "bob-token"] {
        let response = app
            .router
            .clone()
            .oneshot(optimize_request(Some(token)))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }
    wait_for_records(&app.store, 3).await;

    let response = app
        .router
        .oneshot(
            Request::builder()
                .uri("/api/history")
                .header(header::AUTHORIZATION, "Bearer alice-token")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let payload = json_body(response).await;
    let records = payload.as_array().expect("array");
    assert_eq!(records.len(), 2);
    for record in records {
        assert_eq!(record["user_id"], "alice-token");
        assert_eq!(record["best_format"], "toon");
        assert_eq!(record["tokens_original"], 100);
        assert_eq!(record["tokens_optimized"], 8);
    }
}

#[tokio::test]
async fn delete_is_owner_scoped() {
    let app = build_app(&sales_email_reply());

    let response = app
        .router
        .clone()
        .oneshot(optimize_request(Some("alice-token")))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    wait_for_records(&app.store, 1).await;

    let listed = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/history")
                .header(header::AUTHORIZATION, "Bearer alice-token")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    let records = json_body(listed).await;
    let id = records[0]["id"].as_str().expect("id").to_string();

    // Bob knows the id but does not own the record: nothing is deleted
    let foreign = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/history?id={id}"))
                .header(header::AUTHORIZATION, "Bearer bob-token")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(foreign.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.store.len(), 1);

    // The owner can delete it
    let owned = app
        .router
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/history?id={id}"))
                .header(header::AUTHORIZATION, "Bearer alice-token")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(owned.status(), StatusCode::OK);
    let payload = json_body(owned).await;
    assert_eq!(payload["success"], true);
    assert!(app.store.is_empty());
}

#[tokio::test]
async fn delete_without_id_is_a_client_error() {
    let app = build_app(&sales_email_reply());

    let response = app
        .router
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/history")
                .header(header::AUTHORIZATION, "Bearer alice-token")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn stats_aggregates_the_callers_history() {
    let app = build_app(&sales_email_reply());

    for _ in 0..3 {
        let response = app
            .router
            .clone()
            .oneshot(optimize_request(Some("alice-token")))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }
    wait_for_records(&app.store, 3).await;

    let response = app
        .router
        .oneshot(
            Request::builder()
                .uri("/api/stats")
                .header(header::AUTHORIZATION, "Bearer alice-token")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let payload = json_body(response).await;
    assert_eq!(payload["total_prompts"], 3);
    assert_eq!(payload["total_token_savings"], 276);
    assert_eq!(payload["recent_optimizations"].as_array().unwrap().len(), 3);
    assert_eq!(
        payload["category_counts"][0]["name"].as_str().unwrap(),
        "Content"
    );
    assert_eq!(payload["usage_by_day"].as_array().unwrap().len(), 1);
}
