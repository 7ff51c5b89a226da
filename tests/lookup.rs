use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;

const SPENT_KEY: &str = "spent-key";

#[derive(Debug, Deserialize)]
struct FoodResponse {
    name: String,
    calories: f64,
    image: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SuggestResponse {
    suggestions: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Default)]
struct FakeCounters {
    spent_calls: AtomicUsize,
    live_calls: AtomicUsize,
}

struct ChildGuard(Child);

impl Drop for ChildGuard {
    fn drop(&mut self) {
        let _ = self.0.kill();
        let _ = self.0.wait();
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn unique_data_path(label: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!(
        "farfit_lookup_{label}_{}_{nanos}.json",
        std::process::id()
    ));
    path.to_string_lossy().to_string()
}

/// Answers with 402 for the spent key and canned data for anything else.
fn charge(counters: &FakeCounters, params: &HashMap<String, String>) -> Option<Response> {
    if params.get("apiKey").map(String::as_str) == Some(SPENT_KEY) {
        counters.spent_calls.fetch_add(1, Ordering::SeqCst);
        return Some((StatusCode::PAYMENT_REQUIRED, "quota exhausted").into_response());
    }
    counters.live_calls.fetch_add(1, Ordering::SeqCst);
    None
}

async fn fake_search(
    State(counters): State<Arc<FakeCounters>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Some(response) = charge(&counters, &params) {
        return response;
    }
    let query = params.get("query").cloned().unwrap_or_default().to_lowercase();
    let number: usize = params
        .get("number")
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(1);
    let catalogue = [
        (9003, "apple", "apple.jpg"),
        (9016, "apple juice", "apple-juice.jpg"),
        (9019, "applesauce", "applesauce.jpg"),
        (11090, "broccoli", "broccoli.jpg"),
    ];
    let results: Vec<_> = catalogue
        .iter()
        .filter(|(_, name, _)| name.starts_with(&query))
        .take(number)
        .map(|(id, name, image)| json!({ "id": id, "name": name, "image": image }))
        .collect();
    Json(json!({ "results": results })).into_response()
}

async fn fake_information(
    State(counters): State<Arc<FakeCounters>>,
    Path(id): Path<i64>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Some(response) = charge(&counters, &params) {
        return response;
    }
    let amount: f64 = params
        .get("amount")
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(1.0);
    let per_unit = if id == 9003 { 95.2 } else { 10.0 };
    Json(json!({
        "id": id,
        "nutrition": {
            "nutrients": [
                { "name": "Fat", "amount": 0.3, "unit": "g" },
                { "name": "Calories", "amount": per_unit * amount, "unit": "kcal" }
            ]
        }
    }))
    .into_response()
}

async fn start_fake_api() -> (String, Arc<FakeCounters>) {
    let counters = Arc::new(FakeCounters::default());
    let app = Router::new()
        .route("/food/ingredients/search", get(fake_search))
        .route("/food/ingredients/:id/information", get(fake_information))
        .with_state(Arc::clone(&counters));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), counters)
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        if let Ok(resp) = client
            .get(format!("{base_url}/api/activities/catalogue"))
            .send()
            .await
        {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server(label: &str, api_url: &str, keys: &str) -> (String, ChildGuard) {
    let port = pick_free_port();
    let child = Command::new(env!("CARGO_BIN_EXE_farfit"))
        .env("PORT", port.to_string())
        .env("APP_DATA_PATH", unique_data_path(label))
        .env("SPOONACULAR_BASE_URL", api_url)
        .env("SPOONACULAR_IMAGE_BASE_URL", format!("{api_url}/images"))
        .env("SPOONACULAR_API_KEYS", keys)
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");
    let guard = ChildGuard(child);

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;
    (base_url, guard)
}

#[tokio::test]
async fn lookup_rotates_past_exhausted_key_and_logs_food() {
    let (api_url, counters) = start_fake_api().await;
    let (base_url, _server) =
        spawn_server("rotate", &api_url, &format!("{SPENT_KEY},live-key")).await;
    let client = Client::new();

    let response = client
        .post(format!("{base_url}/api/foods/lookup?owner=lookup-owner"))
        .json(&json!({
            "name": "apple",
            "amount": 2,
            "unit": "piece",
            "category": "snack",
            "meal_type": "snack"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::CREATED);
    let food: FoodResponse = response.json().await.unwrap();
    assert_eq!(food.name, "apple");
    assert_eq!(food.calories, 190.0);
    assert_eq!(food.image.as_deref(), Some(format!("{api_url}/images/apple.jpg").as_str()));
    assert_eq!(counters.spent_calls.load(Ordering::SeqCst), 1);

    // The pool stays on the working key afterwards.
    let suggestions: SuggestResponse = client
        .get(format!("{base_url}/api/foods/suggest?query=app"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        suggestions.suggestions,
        vec!["apple", "apple juice", "applesauce"]
    );
    assert_eq!(counters.spent_calls.load(Ordering::SeqCst), 1);

    let short: SuggestResponse = client
        .get(format!("{base_url}/api/foods/suggest?query=a"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(short.suggestions.is_empty());

    let response = client
        .post(format!("{base_url}/api/foods/lookup?owner=lookup-owner"))
        .json(&json!({ "name": "unobtainium", "amount": 1, "unit": "gram" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
    let body: ErrorResponse = response.json().await.unwrap();
    assert_eq!(body.error, "No results for \"unobtainium\".");

    let response = client
        .post(format!("{base_url}/api/foods/lookup?owner=lookup-owner"))
        .json(&json!({ "name": "apple", "amount": 0, "unit": "gram" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: ErrorResponse = response.json().await.unwrap();
    assert_eq!(body.error, "Please enter a valid amount.");

    let foods: Vec<FoodResponse> = client
        .get(format!("{base_url}/api/foods?owner=lookup-owner"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(foods.len(), 1);
    assert!(counters.live_calls.load(Ordering::SeqCst) >= 3);
}

#[tokio::test]
async fn lookup_reports_quota_when_every_key_is_spent() {
    let (api_url, counters) = start_fake_api().await;
    let (base_url, _server) = spawn_server("spent", &api_url, SPENT_KEY).await;
    let client = Client::new();

    let response = client
        .post(format!("{base_url}/api/foods/lookup?owner=quota-owner"))
        .json(&json!({ "name": "apple", "amount": 1, "unit": "piece" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::TOO_MANY_REQUESTS);
    let body: ErrorResponse = response.json().await.unwrap();
    assert_eq!(body.error, "API key exhausted. Switched to next key.");
    assert_eq!(counters.live_calls.load(Ordering::SeqCst), 0);

    let foods: Vec<FoodResponse> = client
        .get(format!("{base_url}/api/foods?owner=quota-owner"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(foods.is_empty());
}

#[tokio::test]
async fn lookup_without_keys_is_unavailable() {
    let (api_url, _counters) = start_fake_api().await;
    let (base_url, _server) = spawn_server("nokeys", &api_url, "").await;

    let response = Client::new()
        .post(format!("{base_url}/api/foods/lookup?owner=nokey-owner"))
        .json(&json!({ "name": "apple", "amount": 1, "unit": "piece" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::SERVICE_UNAVAILABLE);
}
