use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use gym_class_api::models::Role;
use gym_class_api::settings::Settings;
use gym_class_api::{AppState, build_router};
use serde_json::{Value, json};
use tower::Service;
use uuid::Uuid;

fn test_settings() -> Settings {
    Settings {
        debug: true,
        enable_swagger: false,
        port: 8080,
        class_capacity: 10,
        daily_class_limit: 5,
        access_token_secret: "access-test-secret".to_string(),
        refresh_token_secret: "refresh-test-secret".to_string(),
        access_token_ttl_minutes: 15,
        refresh_token_ttl_days: 10,
        admin_email: None,
        admin_password: None,
    }
}

/// Helper to create the app state plus a logged-in admin and trainee.
async fn create_test_state() -> (AppState, String, String) {
    let state = AppState::new(test_settings());

    state
        .identity
        .bootstrap_admin("admin@example.com", "admin-pw")
        .await
        .unwrap();
    let admin = state
        .identity
        .login("admin@example.com", "admin-pw")
        .await
        .unwrap();

    state
        .identity
        .register("Member One", "member@example.com", "member-pw")
        .await
        .unwrap();
    let member = state
        .identity
        .login("member@example.com", "member-pw")
        .await
        .unwrap();

    (state, admin.access_token, member.access_token)
}

/// Helper to extract the response body as JSON
async fn response_body_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

fn send_json(method: &str, uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn delete(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("DELETE").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

fn class_body(name: &str, hour: u32) -> Value {
    json!({
        "className": name,
        "trainerId": Uuid::new_v4(),
        "duration": 60,
        "schedule": format!("2026-09-01T{hour:02}:00:00Z"),
    })
}

#[tokio::test]
async fn test_root_endpoint() {
    // Arrange
    let (state, _, _) = create_test_state().await;
    let mut app = build_router(state);

    // Act
    let response = app.call(get("/", None)).await.unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_body_json(response.into_body()).await;
    assert_eq!(body["message"], "Gym Class Scheduling API");
}

#[tokio::test]
async fn test_healthz_endpoints() {
    // Arrange
    let (state, _, _) = create_test_state().await;
    let mut app = build_router(state);

    // Act / Assert
    for uri in ["/healthz/live", "/healthz/ready"] {
        let response = app.call(get(uri, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response_body_json(response.into_body()).await;
        assert_eq!(body["status"], "ok");
    }
}

#[tokio::test]
async fn test_register_returns_envelope_without_credentials() {
    // Arrange
    let (state, _, _) = create_test_state().await;
    let mut app = build_router(state);

    // Act
    let response = app
        .call(send_json(
            "POST",
            "/users/register",
            None,
            &json!({"fullName": "Jane Doe", "email": "jane@example.com", "password": "secret-pw"}),
        ))
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_body_json(response.into_body()).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["statusCode"], 201);
    assert_eq!(body["data"]["email"], "jane@example.com");
    assert_eq!(body["data"]["role"], "trainee");
    assert!(body["data"].get("passwordHash").is_none());
    assert!(body["data"].get("refreshToken").is_none());
}

#[tokio::test]
async fn test_register_duplicate_email_conflicts() {
    // Arrange
    let (state, _, _) = create_test_state().await;
    let mut app = build_router(state);
    let payload =
        json!({"fullName": "Jane", "email": "jane@example.com", "password": "secret-pw"});

    // Act
    app.call(send_json("POST", "/users/register", None, &payload))
        .await
        .unwrap();
    let response = app
        .call(send_json("POST", "/users/register", None, &payload))
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = response_body_json(response.into_body()).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["data"], Value::Null);
}

#[tokio::test]
async fn test_login_wrong_password_is_unauthorized() {
    // Arrange
    let (state, _, _) = create_test_state().await;
    let mut app = build_router(state);

    // Act
    let response = app
        .call(send_json(
            "POST",
            "/users/login",
            None,
            &json!({"email": "member@example.com", "password": "wrong"}),
        ))
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = response_body_json(response.into_body()).await;
    assert_eq!(body["message"], "Invalid user credentials");
}

#[tokio::test]
async fn test_protected_route_requires_token() {
    // Arrange
    let (state, _, _) = create_test_state().await;
    let mut app = build_router(state);

    // Act
    let response = app.call(get("/booking/get-user-bookings", None)).await.unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_route_rejects_trainee_token() {
    // Arrange
    let (state, _, member_token) = create_test_state().await;
    let mut app = build_router(state);

    // Act
    let response = app
        .call(get("/class/get-all-classes", Some(&member_token)))
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = response_body_json(response.into_body()).await;
    assert_eq!(body["message"], "Access denied. Admins only.");
}

#[tokio::test]
async fn test_create_class_and_fetch_it() {
    // Arrange
    let (state, admin_token, _) = create_test_state().await;
    let mut app = build_router(state);

    // Act
    let response = app
        .call(send_json(
            "POST",
            "/class/create-class",
            Some(&admin_token),
            &class_body("WOD", 6),
        ))
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_body_json(response.into_body()).await;
    let class_id = body["data"]["id"].as_str().unwrap().to_string();

    let response = app
        .call(get(
            &format!("/class/get-single-class/{class_id}"),
            Some(&admin_token),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_body_json(response.into_body()).await;
    assert_eq!(body["data"]["className"], "WOD");
}

#[tokio::test]
async fn test_create_class_blank_name_is_bad_request() {
    // Arrange
    let (state, admin_token, _) = create_test_state().await;
    let mut app = build_router(state);

    // Act
    let response = app
        .call(send_json(
            "POST",
            "/class/create-class",
            Some(&admin_token),
            &class_body("  ", 6),
        ))
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_body_json(response.into_body()).await;
    assert_eq!(body["message"], "All fields are required");
}

#[tokio::test]
async fn test_sixth_class_on_same_day_conflicts() {
    // Arrange
    let (state, admin_token, _) = create_test_state().await;
    let mut app = build_router(state);
    for hour in 6..11 {
        let response = app
            .call(send_json(
                "POST",
                "/class/create-class",
                Some(&admin_token),
                &class_body("WOD", hour),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    // Act - different name, trainer and time, but the same day
    let response = app
        .call(send_json(
            "POST",
            "/class/create-class",
            Some(&admin_token),
            &class_body("Mobility", 18),
        ))
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = response_body_json(response.into_body()).await;
    assert_eq!(
        body["message"],
        "Cannot create more than 5 classes on the same day"
    );
}

#[tokio::test]
async fn test_duplicate_schedule_conflicts() {
    // Arrange
    let (state, admin_token, _) = create_test_state().await;
    let mut app = build_router(state);
    let payload = class_body("WOD", 6);
    app.call(send_json(
        "POST",
        "/class/create-class",
        Some(&admin_token),
        &payload,
    ))
    .await
    .unwrap();

    // Act
    let response = app
        .call(send_json(
            "POST",
            "/class/create-class",
            Some(&admin_token),
            &payload,
        ))
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = response_body_json(response.into_body()).await;
    assert_eq!(body["message"], "Class schedule already exists");
}

#[tokio::test]
async fn test_booking_unknown_class_is_not_found() {
    // Arrange
    let (state, _, member_token) = create_test_state().await;
    let mut app = build_router(state);

    // Act
    let response = app
        .call(send_json(
            "POST",
            "/booking/create-booking",
            Some(&member_token),
            &json!({"classId": Uuid::new_v4()}),
        ))
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = response_body_json(response.into_body()).await;
    assert_eq!(body["message"], "Class not found");
}

#[tokio::test]
async fn test_double_booking_conflicts() {
    // Arrange
    let (state, admin_token, member_token) = create_test_state().await;
    let mut app = build_router(state);
    let response = app
        .call(send_json(
            "POST",
            "/class/create-class",
            Some(&admin_token),
            &class_body("WOD", 6),
        ))
        .await
        .unwrap();
    let body = response_body_json(response.into_body()).await;
    let class_id = body["data"]["id"].as_str().unwrap().to_string();
    let payload = json!({"classId": class_id});

    // Act
    let first = app
        .call(send_json(
            "POST",
            "/booking/create-booking",
            Some(&member_token),
            &payload,
        ))
        .await
        .unwrap();
    let second = app
        .call(send_json(
            "POST",
            "/booking/create-booking",
            Some(&member_token),
            &payload,
        ))
        .await
        .unwrap();

    // Assert
    assert_eq!(first.status(), StatusCode::CREATED);
    assert_eq!(second.status(), StatusCode::CONFLICT);
    let body = response_body_json(second.into_body()).await;
    assert_eq!(body["message"], "You have already booked this class");
}

#[tokio::test]
async fn test_eleventh_booking_is_class_full() {
    // Arrange
    let (state, admin_token, member_token) = create_test_state().await;
    let mut app = build_router(state.clone());
    let response = app
        .call(send_json(
            "POST",
            "/class/create-class",
            Some(&admin_token),
            &class_body("WOD", 6),
        ))
        .await
        .unwrap();
    let body = response_body_json(response.into_body()).await;
    let class_id: Uuid = body["data"]["id"].as_str().unwrap().parse().unwrap();

    // Fill the class with ten other members directly through the service.
    for _ in 0..10 {
        state.booking.create(Uuid::new_v4(), class_id).await.unwrap();
    }

    // Act
    let response = app
        .call(send_json(
            "POST",
            "/booking/create-booking",
            Some(&member_token),
            &json!({"classId": class_id}),
        ))
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = response_body_json(response.into_body()).await;
    assert_eq!(body["message"], "Class is fully booked");
}

#[tokio::test]
async fn test_delete_booking_owner_then_not_found() {
    // Arrange
    let (state, admin_token, member_token) = create_test_state().await;
    let mut app = build_router(state);
    let response = app
        .call(send_json(
            "POST",
            "/class/create-class",
            Some(&admin_token),
            &class_body("WOD", 6),
        ))
        .await
        .unwrap();
    let body = response_body_json(response.into_body()).await;
    let class_id = body["data"]["id"].as_str().unwrap().to_string();

    let response = app
        .call(send_json(
            "POST",
            "/booking/create-booking",
            Some(&member_token),
            &json!({"classId": class_id}),
        ))
        .await
        .unwrap();
    let body = response_body_json(response.into_body()).await;
    let booking_id = body["data"]["id"].as_str().unwrap().to_string();

    // Act
    let first = app
        .call(delete(
            &format!("/booking/delete-booking/{booking_id}"),
            Some(&member_token),
        ))
        .await
        .unwrap();
    let second = app
        .call(delete(
            &format!("/booking/delete-booking/{booking_id}"),
            Some(&member_token),
        ))
        .await
        .unwrap();

    // Assert - delete once, then the id is gone
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_booking_stranger_forbidden_admin_allowed() {
    // Arrange
    let (state, admin_token, member_token) = create_test_state().await;
    state
        .identity
        .register("Other", "other@example.com", "other-pw")
        .await
        .unwrap();
    let other = state
        .identity
        .login("other@example.com", "other-pw")
        .await
        .unwrap();
    let mut app = build_router(state);

    let response = app
        .call(send_json(
            "POST",
            "/class/create-class",
            Some(&admin_token),
            &class_body("WOD", 6),
        ))
        .await
        .unwrap();
    let body = response_body_json(response.into_body()).await;
    let class_id = body["data"]["id"].as_str().unwrap().to_string();

    let response = app
        .call(send_json(
            "POST",
            "/booking/create-booking",
            Some(&member_token),
            &json!({"classId": class_id}),
        ))
        .await
        .unwrap();
    let body = response_body_json(response.into_body()).await;
    let booking_id = body["data"]["id"].as_str().unwrap().to_string();
    let uri = format!("/booking/delete-booking/{booking_id}");

    // Act / Assert - another trainee may not delete it
    let response = app
        .call(delete(&uri, Some(&other.access_token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // An admin may
    let response = app.call(delete(&uri, Some(&admin_token))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_delete_class_cascades_bookings() {
    // Arrange
    let (state, admin_token, member_token) = create_test_state().await;
    let mut app = build_router(state);
    let response = app
        .call(send_json(
            "POST",
            "/class/create-class",
            Some(&admin_token),
            &class_body("WOD", 6),
        ))
        .await
        .unwrap();
    let body = response_body_json(response.into_body()).await;
    let class_id = body["data"]["id"].as_str().unwrap().to_string();

    app.call(send_json(
        "POST",
        "/booking/create-booking",
        Some(&member_token),
        &json!({"classId": class_id}),
    ))
    .await
    .unwrap();

    // Act
    let response = app
        .call(delete(
            &format!("/class/delete-class/{class_id}"),
            Some(&admin_token),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Assert - the member's booking went with the class
    let response = app
        .call(get("/booking/get-user-bookings", Some(&member_token)))
        .await
        .unwrap();
    let body = response_body_json(response.into_body()).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_delete_missing_class_is_not_found() {
    // Arrange
    let (state, admin_token, _) = create_test_state().await;
    let mut app = build_router(state);

    // Act
    let response = app
        .call(delete(
            &format!("/class/delete-class/{}", Uuid::new_v4()),
            Some(&admin_token),
        ))
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_path_id_is_bad_request() {
    // Arrange
    let (state, admin_token, _) = create_test_state().await;
    let mut app = build_router(state);

    // Act
    let response = app
        .call(get("/class/get-single-class/not-a-uuid", Some(&admin_token)))
        .await
        .unwrap();

    // Assert - rejection is rendered in the failure envelope
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_body_json(response.into_body()).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_get_all_bookings_joins_user_and_class() {
    // Arrange
    let (state, admin_token, member_token) = create_test_state().await;
    let mut app = build_router(state);
    let response = app
        .call(send_json(
            "POST",
            "/class/create-class",
            Some(&admin_token),
            &class_body("WOD", 6),
        ))
        .await
        .unwrap();
    let body = response_body_json(response.into_body()).await;
    let class_id = body["data"]["id"].as_str().unwrap().to_string();

    app.call(send_json(
        "POST",
        "/booking/create-booking",
        Some(&member_token),
        &json!({"classId": class_id}),
    ))
    .await
    .unwrap();

    // Act
    let response = app
        .call(get("/booking/get-all-bookings", Some(&admin_token)))
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_body_json(response.into_body()).await;
    let bookings = body["data"].as_array().unwrap();
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0]["user"]["email"], "member@example.com");
    assert_eq!(bookings[0]["class"]["className"], "WOD");
}

#[tokio::test]
async fn test_export_bookings() {
    // Arrange
    let (state, admin_token, member_token) = create_test_state().await;
    let mut app = build_router(state);

    // No bookings yet
    let response = app
        .call(get("/booking/export-bookings", Some(&member_token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .call(send_json(
            "POST",
            "/class/create-class",
            Some(&admin_token),
            &class_body("WOD", 6),
        ))
        .await
        .unwrap();
    let body = response_body_json(response.into_body()).await;
    let class_id = body["data"]["id"].as_str().unwrap().to_string();
    app.call(send_json(
        "POST",
        "/booking/create-booking",
        Some(&member_token),
        &json!({"classId": class_id}),
    ))
    .await
    .unwrap();

    // Act
    let response = app
        .call(get("/booking/export-bookings", Some(&member_token)))
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "text/calendar"
    );
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("BEGIN:VEVENT"));
    assert!(text.contains("Gym class: WOD"));
}

#[tokio::test]
async fn test_refresh_rotation_via_routes() {
    // Arrange
    let (state, _, _) = create_test_state().await;
    let mut app = build_router(state);
    let response = app
        .call(send_json(
            "POST",
            "/users/login",
            None,
            &json!({"email": "member@example.com", "password": "member-pw"}),
        ))
        .await
        .unwrap();
    let body = response_body_json(response.into_body()).await;
    let old_refresh = body["data"]["refreshToken"].as_str().unwrap().to_string();

    // Act - rotate, then replay the old token
    let response = app
        .call(send_json(
            "POST",
            "/users/refresh-token",
            None,
            &json!({"refreshToken": old_refresh}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_body_json(response.into_body()).await;
    assert!(body["data"]["accessToken"].as_str().is_some());

    let replay = app
        .call(send_json(
            "POST",
            "/users/refresh-token",
            None,
            &json!({"refreshToken": old_refresh}),
        ))
        .await
        .unwrap();

    // Assert
    assert_eq!(replay.status(), StatusCode::UNAUTHORIZED);
    let body = response_body_json(replay.into_body()).await;
    assert_eq!(body["message"], "Refresh token is expired or used");
}

#[tokio::test]
async fn test_update_user_details() {
    // Arrange
    let (state, _, member_token) = create_test_state().await;
    let mut app = build_router(state);

    // Act
    let response = app
        .call(send_json(
            "PATCH",
            "/users/update-user",
            Some(&member_token),
            &json!({"fullName": "Member Renamed", "email": "renamed@example.com"}),
        ))
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_body_json(response.into_body()).await;
    assert_eq!(body["data"]["fullName"], "Member Renamed");
    assert_eq!(body["data"]["email"], "renamed@example.com");

    // Taking the admin's email is a conflict
    let response = app
        .call(send_json(
            "PATCH",
            "/users/update-user",
            Some(&member_token),
            &json!({"fullName": "Member Renamed", "email": "admin@example.com"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_update_role_promotes_trainer() {
    // Arrange
    let (state, admin_token, _) = create_test_state().await;
    let member = state
        .identity
        .login("member@example.com", "member-pw")
        .await
        .unwrap()
        .user;
    let mut app = build_router(state);

    // Act
    let response = app
        .call(send_json(
            "PATCH",
            "/users/update-role",
            Some(&admin_token),
            &json!({"userId": member.id, "newRole": "trainer"}),
        ))
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_body_json(response.into_body()).await;
    assert_eq!(body["data"]["role"], "trainer");

    // The trainer now shows up in the admin listing
    let response = app
        .call(get("/users/get-all-trainers", Some(&admin_token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_body_json(response.into_body()).await;
    assert_eq!(body["data"][0]["role"], json!(Role::Trainer));
    assert_eq!(body["data"][0]["email"], "member@example.com");
}
