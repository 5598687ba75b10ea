use anyhow::Result;
use axum::{extract::{Path, Query, State}, http::{HeaderMap, StatusCode}, routing::{get, post}, Json, Router};
use boolsearch_core::{AppliedCorrection, BestCandidate, Collection, DocId, Document, SearchConfig, SharedCollection};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
}
fn default_limit() -> usize { 10 }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    /// The query actually evaluated after spelling correction.
    pub corrected_query: String,
    pub corrections: Vec<AppliedCorrection>,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub doc_id: DocId,
    pub title: String,
}

#[derive(Deserialize)]
pub struct BatchDoc {
    pub id: DocId,
    #[serde(default)]
    pub title: String,
    pub body: String,
}

#[derive(Clone)]
pub struct AppState {
    pub collection: SharedCollection,
    pub admin_token: Option<String>,
}

/// Load the collection at `collection_path` and build the router around it.
pub fn build_app(collection_path: &str, config: SearchConfig) -> Result<Router> {
    let collection = Collection::read(collection_path, config)?;
    let admin_token = std::env::var("ADMIN_TOKEN").ok();
    Ok(router(collection, admin_token))
}

pub fn router(collection: Collection, admin_token: Option<String>) -> Router {
    let app_state = AppState { collection: Arc::new(RwLock::new(collection)), admin_token };

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .route("/index/batch", post(index_batch))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, (StatusCode, String)> {
    let start = std::time::Instant::now();
    let collection = state.collection.read();
    let outcome = collection
        .process_query_with(&params.q, &mut BestCandidate)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    // limit=0 reports the hit count without listing documents.
    let total_hits = outcome.doc_ids.len();
    let limit = params.limit.min(1000);
    let results = outcome
        .doc_ids
        .iter()
        .filter_map(|id| collection.document(*id))
        .take(limit)
        .map(|doc| SearchHit { doc_id: doc.id, title: doc.title.clone() })
        .collect();

    let elapsed = start.elapsed();
    tracing::debug!(query = %params.q, total_hits, took_s = elapsed.as_secs_f64(), "search");
    Ok(Json(SearchResponse {
        query: params.q,
        corrected_query: outcome.query,
        corrections: outcome.corrections,
        took_s: elapsed.as_secs_f64(),
        total_hits,
        results,
    }))
}

pub async fn doc_handler(
    State(state): State<AppState>,
    Path(doc_id): Path<DocId>,
) -> Result<Json<Document>, (StatusCode, String)> {
    let collection = state.collection.read();
    collection
        .document(doc_id)
        .cloned()
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, format!("document {doc_id} not found")))
}

/// Adds documents under the write lock; queries wait until the batch is in.
async fn index_batch(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(docs): Json<Vec<BatchDoc>>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    authorize(&state, &headers)?;
    let mut collection = state.collection.write();

    let mut seen = HashSet::new();
    for doc in &docs {
        if doc.id == 0 || collection.document(doc.id).is_some() || !seen.insert(doc.id) {
            return Err((StatusCode::CONFLICT, format!("document id {} is invalid or already indexed", doc.id)));
        }
    }
    for doc in &docs {
        collection
            .add_document(doc.id, &doc.title, &doc.body)
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    }
    tracing::info!(added = docs.len(), documents = collection.document_count(), "batch indexed");
    Ok(Json(serde_json::json!({ "indexed": docs.len(), "documents": collection.document_count() })))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), (StatusCode, String)> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err((StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set".into())),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "invalid admin token".into()))
    }
}
