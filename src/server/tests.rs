use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use super::*;
use crate::auth::google::fake_id_token;

fn test_config() -> Config {
    let mut config = Config::default();
    config.auth.jwt_secret = "router-test-secret".to_string();
    config.google.client_id = "test-client".to_string();
    config.google.frontend_url = "http://localhost:5173".to_string();
    config
}

fn test_app() -> (Router, AppState) {
    let config = test_config();
    let state = AppState::in_memory(&config).unwrap();
    (build_router(state.clone(), &config.server), state)
}

async fn sign_in(state: &AppState, name: &str) -> (String, String) {
    let user = state
        .users
        .upsert_google_user(&format!("sub-{name}"), &format!("{name}@example.com"), name)
        .await
        .unwrap();
    let token = state.jwt_service.issue(&user.id, &user.email).unwrap();
    (token, user.id)
}

fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn create_plan(app: &Router, token: &str, name: &str) -> String {
    let (status, body) = send(
        app,
        request("POST", "/api/meal-plans", Some(token), Some(json!({ "name": name, "description": "" }))),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_ping() {
    let (app, _) = test_app();
    let (status, body) = send(&app, request("GET", "/ping", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "pong");
}

#[tokio::test]
async fn test_api_requires_valid_token() {
    let (app, _) = test_app();

    let (status, body) = send(&app, request("GET", "/api/meal-plans", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (status, _) = send(&app, request("GET", "/api/meal-plans", Some("garbage"), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_share_link_scenario() {
    let (app, state) = test_app();
    let (owner, owner_id) = sign_in(&state, "owner").await;
    let (guest, _) = sign_in(&state, "guest").await;

    let plan_id = create_plan(&app, &owner, "Week 1").await;

    let (status, link) = send(
        &app,
        request(
            "POST",
            "/api/meal-plans/generate-link",
            Some(&owner),
            Some(json!({ "mealPlanId": plan_id, "role": "editor", "expiresIn": 1 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let code = link["code"].as_str().unwrap().to_string();
    assert_eq!(
        link["shareLink"],
        format!("http://localhost:5173/join?code={code}")
    );
    assert!(link["expiresAt"].is_string());

    let (status, joined) = send(
        &app,
        request("POST", "/api/meal-plans/join", Some(&guest), Some(json!({ "code": code }))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(joined["role"], "editor");
    assert_eq!(joined["mealPlan"]["id"], plan_id.as_str());
    assert_eq!(joined["mealPlan"]["createdBy"], owner_id.as_str());

    let (status, meal) = send(
        &app,
        request(
            "POST",
            "/api/meals",
            Some(&guest),
            Some(json!({
                "mealPlanId": plan_id,
                "meal": { "name": "Tacos", "day": "Friday", "mealType": "Dinner" }
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(meal["mealPlanId"], plan_id.as_str());

    let (status, listed) = send(
        &app,
        request("GET", &format!("/api/meals?mealPlanId={plan_id}"), Some(&owner), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, plans) = send(&app, request("GET", "/api/meal-plans", Some(&guest), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(plans.as_array().unwrap().len(), 1);

    // second redemption by the same user, and by the owner
    let (status, _) = send(
        &app,
        request("POST", "/api/meal-plans/join", Some(&guest), Some(json!({ "code": code }))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(
        &app,
        request("POST", "/api/meal-plans/join", Some(&owner), Some(json!({ "code": code }))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_join_errors() {
    let (app, state) = test_app();
    let (guest, _) = sign_in(&state, "guest").await;

    let (status, _) = send(
        &app,
        request("POST", "/api/meal-plans/join", Some(&guest), Some(json!({ "code": "" }))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        request("POST", "/api/meal-plans/join", Some(&guest), Some(json!({ "code": "UNKNOWN123" }))),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_viewer_shared_by_email_cannot_delete_plan() {
    let (app, state) = test_app();
    let (owner, _) = sign_in(&state, "owner").await;
    let (viewer, _) = sign_in(&state, "viewer").await;
    let plan_id = create_plan(&app, &owner, "Week 1").await;

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/api/meal-plans/share",
            Some(&owner),
            Some(json!({ "mealPlanId": plan_id, "email": "viewer@example.com", "role": "viewer" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let uri = format!("/api/meal-plans/{plan_id}");
    let (status, _) = send(&app, request("GET", &uri, Some(&viewer), None)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, request("DELETE", &uri, Some(&viewer), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(
        &app,
        request("PUT", &uri, Some(&viewer), Some(json!({ "name": "Hijacked" }))),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, request("DELETE", &uri, Some(&owner), None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, request("GET", &uri, Some(&owner), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_share_by_email_errors() {
    let (app, state) = test_app();
    let (owner, _) = sign_in(&state, "owner").await;
    let plan_id = create_plan(&app, &owner, "Week 1").await;

    let cases = [
        (json!({ "mealPlanId": plan_id, "email": "owner@example.com", "role": "viewer" }), StatusCode::BAD_REQUEST),
        (json!({ "mealPlanId": plan_id, "email": "ghost@example.com", "role": "viewer" }), StatusCode::NOT_FOUND),
        (json!({ "mealPlanId": plan_id, "email": "owner@example.com", "role": "chef" }), StatusCode::BAD_REQUEST),
        (json!({ "mealPlanId": "", "email": "owner@example.com", "role": "viewer" }), StatusCode::BAD_REQUEST),
    ];
    for (body, expected) in cases {
        let (status, _) = send(
            &app,
            request("POST", "/api/meal-plans/share", Some(&owner), Some(body)),
        )
        .await;
        assert_eq!(status, expected);
    }
}

#[tokio::test]
async fn test_meal_crud_over_http() {
    let (app, state) = test_app();
    let (owner, _) = sign_in(&state, "owner").await;
    let plan_id = create_plan(&app, &owner, "Week 1").await;

    let (status, meal) = send(
        &app,
        request(
            "POST",
            "/api/meals",
            Some(&owner),
            Some(json!({
                "mealPlanId": plan_id,
                "meal": { "name": "Oats", "description": "", "day": "Monday", "mealType": "Breakfast" }
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let meal_uri = format!("/api/meals/{}", meal["id"].as_str().unwrap());

    let (status, updated) = send(
        &app,
        request(
            "PUT",
            &meal_uri,
            Some(&owner),
            Some(json!({ "name": "Porridge", "description": "salted", "day": "Monday", "mealType": "Breakfast" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["id"], meal["id"]);
    assert_eq!(updated["createdAt"], meal["createdAt"]);
    assert_eq!(updated["name"], "Porridge");

    let (status, _) = send(
        &app,
        request("PUT", &meal_uri, Some(&owner), Some(json!({ "name": "No day" }))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, request("DELETE", &meal_uri, Some(&owner), None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, request("GET", &meal_uri, Some(&owner), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_request_validation() {
    let (app, state) = test_app();
    let (token, _) = sign_in(&state, "cook").await;

    let (status, _) = send(&app, request("GET", "/api/meals", Some(&token), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let malformed = Request::builder()
        .method("POST")
        .uri("/api/meal-plans")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app, malformed).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = send(&app, request("PATCH", "/api/meal-plans/abc", Some(&token), None)).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_credential_sign_in_issues_usable_token() {
    let (app, _) = test_app();
    let credential = fake_id_token("google-42", "chef@example.com", "Chef");

    let (status, body) = send(
        &app,
        request("POST", "/auth/google/callback", None, Some(json!({ "credential": credential }))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tokenType"], "Bearer");
    let token = body["token"].as_str().unwrap().to_string();

    let (status, me) = send(&app, request("GET", "/api/me", Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "chef@example.com");
    assert_eq!(me["google_id"], "google-42");

    let (status, _) = send(
        &app,
        request("POST", "/auth/google/callback", None, Some(json!({ "credential": "" }))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_google_login_redirects_with_state_cookie() {
    let (app, _) = test_app();
    let response = app
        .clone()
        .oneshot(request("GET", "/auth/google/login", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    let location = response.headers()[header::LOCATION].to_str().unwrap();
    assert!(location.starts_with("https://accounts.google.com/"));
    let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(cookie.starts_with("oauth_state="));
}

#[tokio::test]
async fn test_callback_rejects_state_mismatch() {
    let (app, _) = test_app();
    let req = Request::builder()
        .uri("/auth/google/callback?code=abc&state=one")
        .header(header::COOKIE, "oauth_state=two")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, request("GET", "/auth/google/callback?code=abc", None, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
