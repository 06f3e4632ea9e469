use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};

use savor_api::{
    models::{AmenityFlags, PlaceId, Rating, Restaurant},
    routes::{create_router, AppState},
    services::{sources::InMemorySource, RecommendationEngine, SvdParams},
};

fn restaurant(id: &str, title: &str, category: &str, city: &str, score: f64) -> Restaurant {
    Restaurant {
        place_id: PlaceId::new(id),
        title: title.to_string(),
        category: Some(category.to_string()),
        city: Some(city.to_string()),
        price: Some("฿฿".to_string()),
        total_score: Some(score),
        address: Some("Sukhumvit Rd".to_string()),
        lat: Some(13.73),
        lng: Some(100.56),
        url: None,
        image_urls: Vec::new(),
        amenities: AmenityFlags::default(),
    }
}

fn seed_data() -> InMemorySource {
    let mut with_delivery = restaurant("t1", "Baan Suan", "Thai restaurant", "Bangkok", 4.7);
    with_delivery.amenities.delivery = Some(true);

    let restaurants = vec![
        with_delivery,
        restaurant("t2", "Krua Apsorn", "Thai restaurant", "Bangkok", 4.5),
        restaurant("t3", "Cold Curry", "Thai restaurant", "Phuket", 2.0),
        restaurant("j1", "Sushi Den", "Japanese restaurant", "Bangkok", 4.4),
        restaurant("j2", "Ramen Ya", "Japanese restaurant", "Chiang Mai", 3.9),
        restaurant("c1", "Cafe Amazon", "Cafe", "Phuket", 3.4),
        restaurant("c2", "Sad Salad", "Cafe", "Bangkok", 1.8),
        restaurant("c3", "Roast", "Cafe", "Bangkok", 4.2),
    ];

    let scores = [
        ("t1", 5.0),
        ("t2", 5.0),
        ("t3", 1.0),
        ("j1", 4.0),
        ("j2", 4.0),
        ("c1", 3.0),
        ("c2", 1.0),
        ("c3", 4.0),
    ];
    let mut ratings = Vec::new();
    for u in 0..12 {
        for (id, score) in scores {
            ratings.push(Rating::new(format!("reviewer-{}", u), PlaceId::new(id), score));
        }
    }

    InMemorySource::new(restaurants, ratings)
}

async fn create_test_server() -> TestServer {
    create_test_server_with_session_ttl(3600).await
}

async fn create_test_server_with_session_ttl(session_ttl_secs: u64) -> TestServer {
    let params = SvdParams {
        n_factors: 8,
        n_epochs: 25,
        lr: 0.01,
        seed: Some(5),
        ..Default::default()
    };
    let engine = RecommendationEngine::new(params, 10);
    let state = AppState::new(Arc::new(seed_data()), engine, session_ttl_secs)
        .await
        .unwrap();
    TestServer::new(create_router(Arc::new(state))).unwrap()
}

fn ids(value: &Value) -> Vec<String> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server().await;
    let response = server.get("/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let server = create_test_server().await;
    let response = server
        .get("/health")
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static("trace-abc-123"),
        )
        .await;
    assert_eq!(response.header("x-request-id"), "trace-abc-123");
}

#[tokio::test]
async fn test_facets() {
    let server = create_test_server().await;
    let response = server.get("/api/v1/restaurants/facets").await;
    response.assert_status_ok();

    let facets: Value = response.json();
    assert_eq!(
        facets["categories"],
        json!(["Cafe", "Japanese restaurant", "Thai restaurant"])
    );
    assert_eq!(facets["cities"], json!(["Bangkok", "Chiang Mai", "Phuket"]));
    assert_eq!(facets["amenities"].as_array().unwrap().len(), 16);
}

#[tokio::test]
async fn test_list_and_get_restaurant() {
    let server = create_test_server().await;

    let response = server.get("/api/v1/restaurants").add_query_param("q", "sushi").await;
    response.assert_status_ok();
    let rows: Vec<Value> = response.json();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["place_id"], "j1");

    let response = server.get("/api/v1/restaurants/t1").await;
    response.assert_status_ok();
    let restaurant: Value = response.json();
    assert_eq!(restaurant["title"], "Baan Suan");
    assert_eq!(restaurant["amenities"]["delivery"], true);

    server
        .get("/api/v1/restaurants/missing")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_filter_restaurants() {
    let server = create_test_server().await;

    let response = server
        .post("/api/v1/restaurants/filter")
        .json(&json!({
            "categories": ["Thai restaurant"],
            "cities": ["Bangkok"]
        }))
        .await;
    response.assert_status_ok();
    let outcome: Value = response.json();
    assert_eq!(outcome["count"], 2);
    assert_eq!(ids(&outcome["place_ids"]), vec!["t1", "t2"]);

    let response = server
        .post("/api/v1/restaurants/filter")
        .json(&json!({ "amenities": ["delivery"] }))
        .await;
    let outcome: Value = response.json();
    assert_eq!(ids(&outcome["place_ids"]), vec!["t1"]);

    server
        .post("/api/v1/restaurants/filter")
        .json(&json!({ "min_rating": 4.8, "max_rating": 4.0 }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_categories_index() {
    let server = create_test_server().await;
    let response = server
        .get("/api/v1/categories")
        .add_query_param("categories", "Cafe")
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(
        body["categories"]["Cafe"],
        json!(["Cafe Amazon", "Sad Salad", "Roast"])
    );
    assert!(body["categories"].get("Thai restaurant").is_none());
}

#[tokio::test]
async fn test_general_flow_end_to_end() {
    let server = create_test_server().await;

    let response = server
        .post("/api/v1/sessions")
        .json(&json!({ "flow": "general", "count": 3 }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let session: Value = response.json();
    assert_eq!(session["flow"], "general");
    assert_eq!(session["count"], 3);
    assert_eq!(session["target"], 3);
    let session_id = session["id"].as_str().unwrap().to_string();
    let to_rate = ids(&session["to_rate"]);
    assert_eq!(to_rate.len(), 3);

    // Recommendations are refused until every restaurant is rated
    server
        .post(&format!("/api/v1/sessions/{}/recommendations", session_id))
        .json(&json!({ "count": 3 }))
        .await
        .assert_status(StatusCode::CONFLICT);

    let ratings: serde_json::Map<String, Value> =
        to_rate.iter().map(|id| (id.clone(), json!(4))).collect();
    server
        .put(&format!("/api/v1/sessions/{}/ratings", session_id))
        .json(&json!({ "ratings": ratings }))
        .await
        .assert_status_ok();

    let response = server
        .post(&format!("/api/v1/sessions/{}/submit", session_id))
        .await;
    response.assert_status_ok();
    let progress: Value = response.json();
    assert_eq!(progress["rated"], 3);
    assert_eq!(progress["completed"], true);

    let response = server
        .post(&format!("/api/v1/sessions/{}/recommendations", session_id))
        .json(&json!({ "count": 3 }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    let recs = body["recommendations"].as_array().unwrap();
    assert_eq!(recs.len(), 3);
    for rec in recs {
        let id = rec["restaurant"]["place_id"].as_str().unwrap().to_string();
        assert!(!to_rate.contains(&id), "rated restaurant {} recommended", id);
        let predicted = rec["predicted_rating"].as_f64().unwrap();
        assert!((1.0..=5.0).contains(&predicted));
    }
    assert_eq!(body["rated"].as_object().unwrap().len(), 3);

    // The stored session carries the list too
    let session: Value = server
        .get(&format!("/api/v1/sessions/{}", session_id))
        .await
        .json();
    assert_eq!(session["recommendations"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_category_flow_with_partial_submit() {
    let server = create_test_server().await;

    let response = server
        .post("/api/v1/sessions")
        .json(&json!({
            "flow": "category",
            "categories": ["Japanese restaurant"],
            "selection": ["j1", "j2"]
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let session: Value = response.json();
    let session_id = session["id"].as_str().unwrap().to_string();
    assert_eq!(session["categories"], json!(["Japanese restaurant"]));

    server
        .put(&format!("/api/v1/sessions/{}/ratings", session_id))
        .json(&json!({ "ratings": { "j1": 5 } }))
        .await
        .assert_status_ok();
    let progress: Value = server
        .post(&format!("/api/v1/sessions/{}/submit", session_id))
        .await
        .json();
    assert_eq!(progress["rated"], 1);
    assert_eq!(progress["completed"], false);

    server
        .put(&format!("/api/v1/sessions/{}/ratings", session_id))
        .json(&json!({ "ratings": { "j2": 2 } }))
        .await
        .assert_status_ok();
    let progress: Value = server
        .post(&format!("/api/v1/sessions/{}/submit", session_id))
        .await
        .json();
    assert_eq!(progress["completed"], true);

    let response = server
        .post(&format!("/api/v1/sessions/{}/recommendations", session_id))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    let recs = body["recommendations"].as_array().unwrap();
    assert_eq!(recs.len(), 5);
    let top = recs[0]["restaurant"]["place_id"].as_str().unwrap();
    assert!(top == "t1" || top == "t2", "unexpected top pick {}", top);
}

#[tokio::test]
async fn test_category_selection_outside_categories_rejected() {
    let server = create_test_server().await;
    server
        .post("/api/v1/sessions")
        .json(&json!({
            "flow": "category",
            "categories": ["Cafe"],
            "selection": ["t1"]
        }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_filtered_flow() {
    let server = create_test_server().await;

    let response = server
        .post("/api/v1/sessions")
        .json(&json!({
            "flow": "filtered",
            "criteria": { "cities": ["Phuket"], "min_rating": 1.0 },
            "count": 5
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let session: Value = response.json();
    let mut to_rate = ids(&session["to_rate"]);
    to_rate.sort();
    assert_eq!(to_rate, vec!["c1", "t3"]);
    assert_eq!(session["truncated"], true);

    server
        .post("/api/v1/sessions")
        .json(&json!({
            "flow": "filtered",
            "criteria": { "cities": ["Atlantis"] }
        }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_staging_rejects_bad_input() {
    let server = create_test_server().await;
    let session: Value = server
        .post("/api/v1/sessions")
        .json(&json!({ "flow": "category", "selection": ["c1"] }))
        .await
        .json();
    let session_id = session["id"].as_str().unwrap().to_string();

    // Not on the to-rate list
    server
        .put(&format!("/api/v1/sessions/{}/ratings", session_id))
        .json(&json!({ "ratings": { "t1": 4 } }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    // Out of the star range
    server
        .put(&format!("/api/v1/sessions/{}/ratings", session_id))
        .json(&json!({ "ratings": { "c1": 6 } }))
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    // Nothing staged yet
    server
        .post(&format!("/api/v1/sessions/{}/submit", session_id))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_session() {
    let server = create_test_server().await;
    let session: Value = server
        .post("/api/v1/sessions")
        .json(&json!({ "flow": "general" }))
        .await
        .json();
    let session_id = session["id"].as_str().unwrap().to_string();

    server
        .delete(&format!("/api/v1/sessions/{}", session_id))
        .await
        .assert_status(StatusCode::NO_CONTENT);
    server
        .get(&format!("/api/v1/sessions/{}", session_id))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_stateless_recommendations() {
    let server = create_test_server().await;

    let response = server
        .post("/api/v1/recommendations")
        .json(&json!({ "ratings": { "c2": 1, "t3": 1 }, "count": 2 }))
        .await;
    response.assert_status_ok();
    let recs: Vec<Value> = response.json();
    assert_eq!(recs.len(), 2);
    let top: Vec<&str> = recs
        .iter()
        .map(|r| r["restaurant"]["place_id"].as_str().unwrap())
        .collect();
    assert!(top.contains(&"t1") && top.contains(&"t2"), "got {:?}", top);
    assert!(recs[0]["average_score"].as_f64().is_some());

    server
        .post("/api/v1/recommendations")
        .json(&json!({ "ratings": { "nowhere": 3 } }))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    server
        .post("/api/v1/recommendations")
        .json(&json!({ "ratings": { "t1": 5 }, "count": 50 }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_catalog_reload_bumps_version() {
    let server = create_test_server().await;
    let response = server.post("/api/v1/catalog/reload").await;
    response.assert_status_ok();
    let first: Value = response.json();
    assert_eq!(first["restaurants"], 8);
    assert_eq!(first["ratings"], 96);

    let second: Value = server.post("/api/v1/catalog/reload").await.json();
    assert!(second["version"].as_u64().unwrap() > first["version"].as_u64().unwrap());
}

async fn completed_category_session(server: &TestServer) -> String {
    let session: Value = server
        .post("/api/v1/sessions")
        .json(&json!({ "flow": "category", "selection": ["j1", "c3"] }))
        .await
        .json();
    let session_id = session["id"].as_str().unwrap().to_string();

    server
        .put(&format!("/api/v1/sessions/{}/ratings", session_id))
        .json(&json!({ "ratings": { "j1": 4, "c3": 5 } }))
        .await
        .assert_status_ok();
    let progress: Value = server
        .post(&format!("/api/v1/sessions/{}/submit", session_id))
        .await
        .json();
    assert_eq!(progress["completed"], true);

    session_id
}

#[tokio::test]
async fn test_session_recommendations_reject_malformed_body() {
    let server = create_test_server().await;
    let session_id = completed_category_session(&server).await;
    let path = format!("/api/v1/sessions/{}/recommendations", session_id);

    server
        .post(&path)
        .json(&json!({ "count": -3 }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    server
        .post(&path)
        .json(&json!({ "count": "three" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    server
        .post(&path)
        .json(&json!({ "count": 0 }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    // No body falls back to the default count
    let body: Value = server.post(&path).await.json();
    assert_eq!(body["recommendations"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_expired_sessions_are_gone() {
    let server = create_test_server_with_session_ttl(0).await;

    let session: Value = server
        .post("/api/v1/sessions")
        .json(&json!({ "flow": "category", "selection": ["c1"] }))
        .await
        .json();
    let session_id = session["id"].as_str().unwrap().to_string();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;

    server
        .get(&format!("/api/v1/sessions/{}", session_id))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    server
        .put(&format!("/api/v1/sessions/{}/ratings", session_id))
        .json(&json!({ "ratings": { "c1": 3 } }))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    server
        .post(&format!("/api/v1/sessions/{}/submit", session_id))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    server
        .post(&format!("/api/v1/sessions/{}/recommendations", session_id))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}
