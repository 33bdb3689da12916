use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use hall3::config::Config;
use hall3::constants::auth::DEFAULT_ADMIN_API_KEY;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

async fn spawn_app() -> Router {
    let db_path =
        std::env::temp_dir().join(format!("hall3-api-test-{}.db", uuid::Uuid::new_v4()));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;

    let state = hall3::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");
    hall3::api::router(state).await
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    api_key: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(key) = api_key {
        builder = builder.header("X-Api-Key", key);
    }

    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn authorize(app: &Router, students: Value) {
    let (status, _) = send(
        app,
        "PUT",
        "/api/students/authorized",
        Some(DEFAULT_ADMIN_API_KEY),
        Some(json!({ "students": students })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

async fn signup(app: &Router, roll_number: &str, name: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/auth/signup",
        None,
        Some(json!({
            "roll_number": roll_number,
            "name": name,
            "phone_number": "9876543210",
            "room_number": "B-214",
            "password": "secret",
            "confirm_password": "secret",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "signup failed: {body}");
    body["data"]["api_key"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_auth_endpoints() {
    let app = spawn_app().await;

    let (status, _) = send(&app, "GET", "/api/system/status", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "GET", "/api/system/status", Some("wrong-key"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app,
        "GET",
        "/api/system/status",
        Some(DEFAULT_ADMIN_API_KEY),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["database"], true);
    assert_eq!(body["data"]["active_issues"], 0);
}

#[tokio::test]
async fn test_responses_carry_request_id_and_security_headers() {
    let app = spawn_app().await;

    let request = Request::builder()
        .uri("/api/system/status")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let headers = response.headers();
    let request_id = headers["x-request-id"].to_str().unwrap();
    assert!(uuid::Uuid::parse_str(request_id).is_ok());
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(
        headers["content-security-policy"],
        "default-src 'none'; frame-ancestors 'none'"
    );
    assert_eq!(headers["referrer-policy"], "no-referrer");
    assert_eq!(headers["cache-control"], "no-store");
}

#[tokio::test]
async fn test_admin_login() {
    let app = spawn_app().await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "username": "admin", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "username": "admin", "password": "password" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["actor"]["role"], "admin");
    assert_eq!(body["data"]["must_change_password"], true);
}

#[tokio::test]
async fn test_signup_rules() {
    let app = spawn_app().await;
    authorize(&app, json!([{ "roll_number": "21cs1001", "name": "Asha Rao" }])).await;

    let base = json!({
        "roll_number": "21CS1001",
        "name": "Asha Rao",
        "phone_number": "9876543210",
        "room_number": "B-214",
        "password": "secret",
    });

    let mut bad_phone = base.clone();
    bad_phone["phone_number"] = json!("12345");
    let (status, _) = send(&app, "POST", "/api/auth/signup", None, Some(bad_phone)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut stranger = base.clone();
    stranger["roll_number"] = json!("21CS9999");
    let (status, _) = send(&app, "POST", "/api/auth/signup", None, Some(stranger)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let mut wrong_name = base.clone();
    wrong_name["name"] = json!("Someone Else");
    let (status, _) = send(&app, "POST", "/api/auth/signup", None, Some(wrong_name)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, "POST", "/api/auth/signup", None, Some(base.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["actor"]["roll_number"], "21CS1001");

    let (status, _) = send(&app, "POST", "/api/auth/signup", None, Some(base)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_students_cannot_use_admin_endpoints() {
    let app = spawn_app().await;
    authorize(&app, json!([{ "roll_number": "21CS1001", "name": "Asha Rao" }])).await;
    let key = signup(&app, "21CS1001", "Asha Rao").await;

    let (status, _) = send(&app, "GET", "/api/system/status", Some(&key), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        "POST",
        "/api/inventory",
        Some(&key),
        Some(json!({ "name": "Football", "category": "Football", "quantity": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, "GET", "/api/students/authorized", Some(&key), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, "GET", "/api/auth/me", Some(&key), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role"], "student");
    assert_eq!(body["data"]["roll_number"], "21CS1001");
}

#[tokio::test]
async fn test_inventory_validation() {
    let app = spawn_app().await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/inventory",
        Some(DEFAULT_ADMIN_API_KEY),
        Some(json!({ "name": "  ", "category": "Cricket", "quantity": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/api/inventory",
        Some(DEFAULT_ADMIN_API_KEY),
        Some(json!({ "name": "Cricket Bat", "category": "Cricket", "quantity": -1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        "POST",
        "/api/inventory",
        Some(DEFAULT_ADMIN_API_KEY),
        Some(json!({ "name": "Cricket Bat", "category": "Cricket", "quantity": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["available"], 2);
    assert_eq!(body["data"]["condition"], "Good");

    let (status, _) = send(&app, "GET", "/api/inventory/999", Some(DEFAULT_ADMIN_API_KEY), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_issue_and_return_over_http() {
    let app = spawn_app().await;
    authorize(&app, json!([{ "roll_number": "21CS1001", "name": "Asha Rao" }])).await;
    let key = signup(&app, "21CS1001", "Asha Rao").await;

    let (_, body) = send(
        &app,
        "POST",
        "/api/inventory",
        Some(DEFAULT_ADMIN_API_KEY),
        Some(json!({ "name": "Shuttlecock", "category": "Badminton", "quantity": 1 })),
    )
    .await;
    let item_id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        "POST",
        "/api/issues",
        Some(&key),
        Some(json!({ "item_id": item_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let issue_id = body["data"]["id"].as_i64().unwrap();
    assert_eq!(body["data"]["status"], "issued");

    let (status, _) = send(
        &app,
        "POST",
        "/api/issues",
        Some(&key),
        Some(json!({ "item_id": item_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        &app,
        "GET",
        "/api/notifications/unread-count",
        Some(DEFAULT_ADMIN_API_KEY),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["unread"], 1);

    let (status, body) = send(
        &app,
        "POST",
        "/api/returns",
        Some(&key),
        Some(json!({ "issue_id": issue_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let return_id = body["data"]["id"].as_i64().unwrap();

    let (status, _) = send(
        &app,
        "POST",
        "/api/returns",
        Some(&key),
        Some(json!({ "issue_id": issue_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let approve = format!("/api/returns/{return_id}/approve");
    let (status, _) = send(&app, "POST", &approve, Some(&key), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, "POST", &approve, Some(DEFAULT_ADMIN_API_KEY), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "approved");

    let (status, _) = send(&app, "POST", &approve, Some(DEFAULT_ADMIN_API_KEY), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, body) = send(
        &app,
        "GET",
        &format!("/api/inventory/{item_id}"),
        Some(&key),
        None,
    )
    .await;
    assert_eq!(body["data"]["available"], 1);

    let (_, body) = send(&app, "GET", "/api/notifications", Some(&key), None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_hall_event_registration() {
    let app = spawn_app().await;
    authorize(
        &app,
        json!([
            { "roll_number": "21CS1001", "name": "Asha Rao" },
            { "roll_number": "21CS1002", "name": "Vikram Iyer" },
        ]),
    )
    .await;
    let asha = signup(&app, "21CS1001", "Asha Rao").await;
    let vikram = signup(&app, "21CS1002", "Vikram Iyer").await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/hall-events",
        Some(DEFAULT_ADMIN_API_KEY),
        Some(json!({ "title": "Table Tennis Night", "event_date": "31-12-2030" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        "POST",
        "/api/hall-events",
        Some(DEFAULT_ADMIN_API_KEY),
        Some(json!({
            "title": "Table Tennis Night",
            "event_date": "2030-12-31",
            "max_participants": 1,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let register = format!("/api/hall-events/{}/register", body["data"]["id"]);

    let (status, _) = send(&app, "POST", &register, Some(&asha), None).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(&app, "POST", &register, Some(&asha), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(&app, "POST", &register, Some(&vikram), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Event is full");

    let (_, body) = send(&app, "GET", "/api/hall-events", Some(&asha), None).await;
    assert_eq!(body["data"][0]["registrations"], 1);
    assert_eq!(body["data"][0]["registered"], true);
}
