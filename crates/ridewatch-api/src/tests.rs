//! Router tests over an in-memory store.

use std::{sync::Arc, time::Duration};

use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use async_trait::async_trait;
use axum::{
  Router,
  body::{Body, to_bytes},
  http::{Request, StatusCode},
};
use rand_core::OsRng;
use ridewatch_ai::RuleClassifier;
use ridewatch_core::{model::NewCompetitor, store::IntelStore};
use ridewatch_ingest::{IngestConfig, WebhookProcessor};
use ridewatch_news::{MultiSearch, NewsConfig, NewsScraper, SearchProvider, SearchResult};
use ridewatch_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::{ApiState, WebhookAuth, api_router};

const SECRET: &str = "s3cret";

/// Answers every query with one fixed article.
struct OneHit;

#[async_trait]
impl SearchProvider for OneHit {
  fn name(&self) -> &'static str { "Stub" }

  fn priority(&self) -> u8 { 0 }

  fn is_configured(&self) -> bool { true }

  async fn search(&self, _: &str, _: usize) -> ridewatch_news::Result<Vec<SearchResult>> {
    Ok(vec![SearchResult::new(
      "Stub",
      "Yango lanza nueva función en Lima",
      "https://andina.pe/yango-funcion",
      "Crecimiento del servicio",
    )])
  }
}

async fn app() -> (Router, Arc<SqliteStore>) {
  let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
  store
    .add_competitor(NewCompetitor { slug: "indriver".into(), name: "inDrive".into() })
    .await
    .unwrap();

  let salt = SaltString::generate(&mut OsRng);
  let secret_hash = Argon2::default()
    .hash_password(SECRET.as_bytes(), &salt)
    .unwrap()
    .to_string();

  let search = MultiSearch::new(vec![Arc::new(OneHit) as Arc<dyn SearchProvider>], Duration::from_secs(5));
  let state = ApiState {
    store:     store.clone(),
    processor: Arc::new(WebhookProcessor::new(
      store.clone(),
      Arc::new(RuleClassifier),
      IngestConfig::default(),
    )),
    news:      Arc::new(NewsScraper::new(
      store.clone(),
      Arc::new(search),
      NewsConfig::default(),
    )),
    auth:      Arc::new(WebhookAuth { secret_hash }),
  };
  (api_router(state), store)
}

fn post(uri: &str, secret: Option<&str>, body: Value) -> Request<Body> {
  let mut builder = Request::builder()
    .method("POST")
    .uri(uri)
    .header("content-type", "application/json");
  if let Some(secret) = secret {
    builder = builder.header("x-webhook-secret", secret);
  }
  builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str) -> Request<Body> {
  Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
  let response = app.clone().oneshot(req).await.unwrap();
  let status = response.status();
  let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
  let body = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, body)
}

fn driver_batch() -> Value {
  json!({
    "taskId": "abc",
    "taskName": "indriver-driver-pe",
    "dataCount": 1,
    "dataList": [{ "commission": "25%", "signup_bonus": "S/200" }]
  })
}

// ─── Webhooks ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn webhook_requires_secret() {
  let (app, store) = app().await;

  let (status, body) = send(&app, post("/webhooks/octoparse", None, driver_batch())).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert_eq!(body["error"], "invalid webhook secret");

  let (status, _) =
    send(&app, post("/webhooks/octoparse", Some("guess"), driver_batch())).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);

  assert!(store.list_collection_logs(10).await.unwrap().is_empty());
}

#[tokio::test]
async fn webhook_processes_batch() {
  let (app, store) = app().await;

  let (status, body) =
    send(&app, post("/webhooks/octoparse", Some(SECRET), driver_batch())).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body, json!({ "status": "success", "processed": 1, "task_name": "indriver-driver-pe" }));

  let (status, logs) = send(&app, get("/collection/logs?limit=5")).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(logs.as_array().unwrap().len(), 1);
  assert_eq!(logs[0]["items_collected"], 1);

  let indriver = store.find_competitor_by_slug("indriver").await.unwrap().unwrap();
  assert_eq!(store.latest_driver_tariffs(indriver.competitor_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn unknown_task_still_answers_ok() {
  let (app, _) = app().await;
  let payload = json!({ "taskId": "x", "taskName": "promos-pe", "dataList": [] });

  let (status, body) = send(&app, post("/webhooks/octoparse", Some(SECRET), payload)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["status"], "partial");

  let (_, health) = send(&app, get("/collection/status")).await;
  assert_eq!(health["sources"][0]["task_name"], "promos-pe");
  assert_eq!(health["health"], "warning");
}

#[tokio::test]
async fn stored_reviews_are_listed_per_competitor() {
  let (app, _) = app().await;
  let batch = json!({
    "taskId": "s1",
    "taskName": "playstore-indriver",
    "dataList": [{
      "app_version": "6.0.0",
      "release_notes": "Corrección de errores",
      "reviews": [{ "id": "r9", "rating": 0, "text": "El conductor llegó tarde" }]
    }]
  });
  let (_, body) = send(&app, post("/webhooks/octoparse", Some(SECRET), batch)).await;
  assert_eq!(body["processed"], 2);

  let (status, releases) = send(&app, get("/competitors/indriver/releases")).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(releases[0]["version"], "6.0.0");
  assert_eq!(releases[0]["platform"], "android");
  assert_eq!(releases[0]["significance"], "bugfix");

  let (status, reviews) = send(&app, get("/competitors/indriver/reviews?limit=5")).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(reviews.as_array().unwrap().len(), 1);
  assert_eq!(reviews[0]["external_id"], "android_r9");
  assert_eq!(reviews[0]["rating"], 3);
  assert_eq!(reviews[0]["role"], "driver");
  assert_eq!(reviews[0]["sentiment"], "neutral");

  let (status, body) = send(&app, get("/competitors/ghost/reviews")).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["error"], "competitor ghost not found");
}

#[tokio::test]
async fn malformed_payload_is_bad_request() {
  let (app, _) = app().await;
  let (status, body) =
    send(&app, post("/webhooks/octoparse", Some(SECRET), json!({ "dataList": 3 }))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].as_str().unwrap().starts_with("invalid webhook payload"));
}

// ─── News ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn news_search_reports_only_new_items() {
  let (app, _) = app().await;
  let query = json!({ "query": "Yango Lima", "competitors": ["Yango"] });

  let (status, body) = send(&app, post("/news/search", None, query.clone())).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["query"], "Yango Lima");
  assert_eq!(body["count"], 1);
  assert_eq!(body["results"][0]["competitors_mentioned"], json!(["yango"]));
  assert_eq!(body["results"][0]["provider"], "Stub");

  let (_, again) = send(&app, post("/news/search", None, query)).await;
  assert_eq!(again["count"], 0);

  let (_, listed) = send(&app, get("/news")).await;
  assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn empty_news_query_is_rejected() {
  let (app, _) = app().await;
  let (status, _) = send(&app, post("/news/search", None, json!({ "query": "  " }))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn provider_status_and_health() {
  let (app, _) = app().await;

  let (status, body) = send(&app, get("/news/providers")).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["available_count"], 1);
  assert_eq!(body["providers"][0]["name"], "Stub");

  let (status, body) = send(&app, get("/health")).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["status"], "ok");

  let (_, competitors) = send(&app, get("/competitors")).await;
  assert_eq!(competitors[0]["slug"], "indriver");
}
