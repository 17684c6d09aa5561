//! API integration tests
//!
//! Expect a server on localhost:8080 backed by a migrated database.

use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

/// Helper to create a fresh account and return its token
async fn get_auth_token(client: &Client) -> String {
    let email = format!("owner-{}@bookstore.test", uuid::Uuid::new_v4());
    let response = client
        .post(format!("{}/auth/signup", BASE_URL))
        .json(&json!({
            "email": email,
            "password": "bookworm"
        }))
        .send()
        .await
        .expect("Failed to send signup request");

    let body: Value = response.json().await.expect("Failed to parse signup response");
    body["token"].as_str().expect("No token in response").to_string()
}

async fn create_memo(client: &Client, token: &str, body: Value) -> Value {
    let response = client
        .post(format!("{}/memos", BASE_URL))
        .bearer_auth(token)
        .json(&body)
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 201);
    response.json().await.expect("Failed to parse response")
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_signup_and_login() {
    let client = Client::new();
    let email = format!("owner-{}@bookstore.test", uuid::Uuid::new_v4());
    let credentials = json!({ "email": email, "password": "bookworm" });

    let response = client
        .post(format!("{}/auth/signup", BASE_URL))
        .json(&credentials)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);

    let duplicate = client
        .post(format!("{}/auth/signup", BASE_URL))
        .json(&credentials)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(duplicate.status(), 409);

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&credentials)
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["token"].is_string());
    assert_eq!(body["token_type"], "Bearer");
    assert!(body["user"].get("password_hash").is_none());
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "email": "nobody@bookstore.test",
            "password": "wrong-password"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_unauthorized_access() {
    let client = Client::new();

    let response = client
        .get(format!("{}/memos", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_memo_lifecycle() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let created = create_memo(
        &client,
        &token,
        json!({
            "visit_date": "2025-03-10",
            "visit_time": "afternoon",
            "weather": "rainy",
            "customer_impression": "우산을 들고 와서 한참 시집 코너에 머문 손님",
            "customer_tag": "토지 아주머니",
            "mood": "quiet",
            "tags": ["#시집", "시집", "비오는날"],
            "purchased_books": [
                { "title": "토지", "author": "박경리", "genre": "한국문학", "price": 18000 },
                { "title": "  " }
            ]
        }),
    )
    .await;

    let id = created["id"].as_str().expect("No id").to_string();
    assert_eq!(created["tags"], json!(["시집", "비오는날"]));
    assert_eq!(created["purchased_books"].as_array().map(Vec::len), Some(1));

    // Replace books
    let response = client
        .put(format!("{}/memos/{}", BASE_URL, id))
        .bearer_auth(&token)
        .json(&json!({
            "visit_date": "2025-03-10",
            "customer_impression": "다시 와서 소설을 골랐다",
            "purchased_books": [
                { "title": "채식주의자", "author": "한강" },
                { "title": "소년이 온다", "author": "한강" }
            ]
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let updated: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(updated["purchased_books"].as_array().map(Vec::len), Some(2));
    assert_eq!(updated["purchased_books"][0]["genre"], "기타");

    let response = client
        .get(format!("{}/memos?search=소설", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    let found: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(found.as_array().map(Vec::len), Some(1));

    let response = client
        .delete(format!("{}/memos/{}", BASE_URL, id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 204);

    let response = client
        .get(format!("{}/memos/{}", BASE_URL, id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[ignore]
async fn test_blank_impression_rejected() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let response = client
        .post(format!("{}/memos", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "customer_impression": "   " }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["error"].is_string());
}

#[tokio::test]
#[ignore]
async fn test_stats() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let response = client
        .get(format!("{}/stats", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    let empty: Value = response.json().await.expect("Failed to parse response");
    assert!(empty.is_null());

    for date in ["2025-03-10", "2025-03-12"] {
        create_memo(
            &client,
            &token,
            json!({
                "visit_date": date,
                "customer_impression": "단골 손님",
                "customer_tag": "토지 아주머니"
            }),
        )
        .await;
    }

    let response = client
        .get(format!("{}/stats", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    let stats: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(stats["total_memos"], 2);
    assert_eq!(stats["returning_customers"], json!([["토지 아주머니", 2]]));
}

#[tokio::test]
#[ignore]
async fn test_memos_are_isolated_between_accounts() {
    let client = Client::new();
    let owner = get_auth_token(&client).await;
    let other = get_auth_token(&client).await;

    let created = create_memo(
        &client,
        &owner,
        json!({
            "visit_date": "2025-03-10",
            "customer_impression": "대하소설을 찾는 손님",
            "customer_tag": "토지 아주머니",
            "tags": ["대하소설"],
            "purchased_books": [{ "title": "토지", "author": "박경리", "genre": "한국문학" }]
        }),
    )
    .await;
    let url = format!("{}/memos/{}", BASE_URL, created["id"].as_str().expect("No id"));

    let response = client
        .get(&url)
        .bearer_auth(&other)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 404);

    let response = client
        .put(&url)
        .bearer_auth(&other)
        .json(&json!({ "customer_impression": "덮어쓰기 시도" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 404);

    let response = client
        .delete(&url)
        .bearer_auth(&other)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 404);

    let response = client
        .get(format!("{}/tags", BASE_URL))
        .bearer_auth(&other)
        .send()
        .await
        .expect("Failed to send request");
    let tags: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(tags, json!([]));

    let response = client
        .get(format!("{}/stats", BASE_URL))
        .bearer_auth(&other)
        .send()
        .await
        .expect("Failed to send request");
    let stats: Value = response.json().await.expect("Failed to parse response");
    assert!(stats.is_null());

    let response = client
        .get(format!("{}/books/search?q=토", BASE_URL))
        .bearer_auth(&other)
        .send()
        .await
        .expect("Failed to send request");
    let suggestions: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(suggestions, json!([]));

    // The owner still sees the memo and its title untouched
    let response = client
        .get(&url)
        .bearer_auth(&owner)
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let memo: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(memo["customer_impression"], "대하소설을 찾는 손님");

    let response = client
        .get(format!("{}/books/search?q=토", BASE_URL))
        .bearer_auth(&owner)
        .send()
        .await
        .expect("Failed to send request");
    let suggestions: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(suggestions[0]["title"], "토지");
}

#[tokio::test]
#[ignore]
async fn test_analysis_requires_memos() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let response = client
        .post(format!("{}/ai-analysis", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "memos": [], "analysisType": "weekly" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_saved_analyses() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let response = client
        .post(format!("{}/analyses", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({
            "analysis_type": "weekly",
            "summary": "비 오는 날 시집이 잘 팔렸다",
            "insights": [],
            "recommendations": [],
            "fun_fact": "",
            "memo_count": 3
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);

    let response = client
        .get(format!("{}/analyses?limit=5", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    let saved: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(saved[0]["memo_count"], 3);
    assert_eq!(saved[0]["analysis_type"], "weekly");
}

#[tokio::test]
#[ignore]
async fn test_historical_weather_for_past_date_is_null() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let response = client
        .get(format!("{}/weather/historical?date=2020-01-01", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body.is_null());
}

#[tokio::test]
#[ignore]
async fn test_openapi_docs() {
    let client = Client::new();

    let response = client
        .get("http://localhost:8080/api-docs/openapi.json")
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["openapi"].is_string());
    assert!(body["paths"]["/memos"].is_object());
}
