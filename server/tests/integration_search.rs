use axum::body::{Body, Bytes};
use axum::http::{Request, StatusCode};
use axum::Router;
use boolsearch_core::{Collection, SearchConfig};
use http_body_util::BodyExt;
use serde_json::Value;
use std::fs;
use tempfile::tempdir;
use tower::ServiceExt;

const COLLECTION: &str = ".I 1
.T
Retrieval systems
.W
Information retrieval systems for research libraries.
.X
.I 2
.T
Congress
.W
The Library of Congress classification scheme.
.X
.I 3
.T
Storage
.W
Data retrieval and information storage.
.X
";

fn tiny_app(admin_token: Option<&str>) -> Router {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tiny.ALL");
    fs::write(&path, COLLECTION).unwrap();
    let collection = Collection::read(&path, SearchConfig::default()).unwrap();
    boolsearch_server::router(collection, admin_token.map(str::to_string))
}

async fn call(app: Router, req: Request<Body>) -> (StatusCode, Bytes) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn search_returns_boolean_matches() {
    let (status, body) = call(tiny_app(None), get("/search?q=information+AND+NOT+storage")).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["total_hits"], 1);
    assert_eq!(json["results"][0]["doc_id"], 1);
    assert_eq!(json["results"][0]["title"], "Retrieval systems");
}

#[tokio::test]
async fn search_reports_corrections() {
    let (status, body) = call(tiny_app(None), get("/search?q=retreival+AND+informaton")).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["corrected_query"], "retrieval AND information");
    assert_eq!(json["corrections"].as_array().unwrap().len(), 2);
    assert_eq!(json["total_hits"], 2);
}

#[tokio::test]
async fn malformed_query_is_bad_request() {
    let (status, _) = call(tiny_app(None), get("/search?q=library+%5Cx+congress")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn doc_lookup() {
    let (status, body) = call(tiny_app(None), get("/doc/2")).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["title"], "Congress");
    let (status, _) = call(tiny_app(None), get("/doc/42")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn batch_requires_token_and_indexes() {
    let batch = r#"[{"id": 4, "title": "New", "body": "library of congress archives"}]"#;
    let post = |token: &str| {
        Request::post("/index/batch")
            .header("content-type", "application/json")
            .header("X-ADMIN-TOKEN", token)
            .body(Body::from(batch))
            .unwrap()
    };

    let (status, _) = call(tiny_app(Some("secret")), post("wrong")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let app = tiny_app(Some("secret"));
    let (status, _) = call(app.clone(), post("secret")).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = call(app.clone(), get("/search?q=%22library+of+congress%22")).await;
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["total_hits"], 2);

    let (status, _) = call(app, post("secret")).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn negation_lists_only_indexed_documents() {
    let batch = r#"[{"id": 50, "title": "Far", "body": "alpha archives"}]"#;
    let app = tiny_app(Some("secret"));
    let req = Request::post("/index/batch")
        .header("content-type", "application/json")
        .header("X-ADMIN-TOKEN", "secret")
        .body(Body::from(batch))
        .unwrap();
    let (status, _) = call(app.clone(), req).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(app, get("/search?q=NOT+alpha&limit=100")).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["total_hits"], 3);
    let ids: Vec<u64> = json["results"].as_array().unwrap().iter().map(|h| h["doc_id"].as_u64().unwrap()).collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[tokio::test]
async fn zero_limit_counts_without_results() {
    let (status, body) = call(tiny_app(None), get("/search?q=retrieval&limit=0")).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["total_hits"], 2);
    assert!(json["results"].as_array().unwrap().is_empty());
}
