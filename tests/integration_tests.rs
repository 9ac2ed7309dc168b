// HTTP flows for Swipe Match against the in-memory store

use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use serde_json::{json, Value};
use std::sync::Arc;
use swipe_match::config::LimitSettings;
use swipe_match::core::SystemClock;
use swipe_match::error::handle_json_payload_error;
use swipe_match::routes::{self, AppState};
use swipe_match::services::{MemoryStore, TokenService};

macro_rules! test_app {
    ($daily_view_limit:expr) => {{
        let state = AppState::new(
            Arc::new(MemoryStore::with_seed(7)),
            Arc::new(SystemClock),
            TokenService::new("integration-secret", "swipe-match", 3600),
            &LimitSettings {
                daily_view_limit: $daily_view_limit,
                subscription_months: 1,
            },
        );
        test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
                .configure(routes::configure_routes),
        )
        .await
    }};
}

/// Register, log in and resolve the caller's profile id
macro_rules! sign_up {
    ($app:expr, $name:expr) => {{
        let email = format!("{}@example.com", $name);

        let req = test::TestRequest::post()
            .uri("/api/v1/auth/register")
            .set_json(json!({ "name": $name, "email": email, "password": "correct-horse" }))
            .to_request();
        let resp = test::call_service(&$app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let req = test::TestRequest::post()
            .uri("/api/v1/auth/login")
            .set_json(json!({ "email": email, "password": "correct-horse" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&$app, req).await;
        let token = body["access_token"].as_str().unwrap().to_string();

        let req = test::TestRequest::get()
            .uri("/api/v1/me")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();
        let me: Value = test::call_and_read_body_json(&$app, req).await;
        let profile_id = me["profile"]["id"].as_i64().unwrap();

        (token, profile_id)
    }};
}

fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {token}"))
}

#[actix_web::test]
async fn test_health_check() {
    let app = test_app!(10);

    let req = test::TestRequest::get().uri("/api/v1/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["status"], "healthy");
}

#[actix_web::test]
async fn test_register_and_login() {
    let app = test_app!(10);
    let (token, _) = sign_up!(app, "alice");
    assert!(!token.is_empty());

    // Emails are unique regardless of case
    let req = test::TestRequest::post()
        .uri("/api/v1/auth/register")
        .set_json(json!({ "name": "Alice", "email": "ALICE@example.com", "password": "another-pass" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/register")
        .set_json(json!({ "name": "Bob", "email": "not-an-email", "password": "correct-horse" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(json!({ "email": "alice@example.com", "password": "wrong-horse" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(json!({ "email": "nobody@example.com", "password": "correct-horse" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_protected_routes_require_token() {
    let app = test_app!(10);

    let req = test::TestRequest::get().uri("/api/v1/me").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get()
        .uri("/api/v1/profiles/next")
        .insert_header(bearer("not.a.token"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status_code"], 401);
}

#[actix_web::test]
async fn test_me_and_profile_update() {
    let app = test_app!(10);
    let (token, profile_id) = sign_up!(app, "carol");

    let req = test::TestRequest::get()
        .uri("/api/v1/me")
        .insert_header(bearer(&token))
        .to_request();
    let me: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(me["email"], "carol@example.com");
    assert_eq!(me["is_premium"], false);
    assert!(me.get("password_hash").is_none());

    let req = test::TestRequest::put()
        .uri("/api/v1/me")
        .insert_header(bearer(&token))
        .set_json(json!({ "description": "Climber and cook" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri("/api/v1/me")
        .insert_header(bearer(&token))
        .to_request();
    let me: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(me["profile"]["id"], profile_id);
    assert_eq!(me["profile"]["description"], "Climber and cook");

    let req = test::TestRequest::put()
        .uri("/api/v1/me")
        .insert_header(bearer(&token))
        .set_json(json!({}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_mutual_likes_become_a_match() {
    let app = test_app!(10);
    let (alice, alice_profile) = sign_up!(app, "alice");
    let (bob, bob_profile) = sign_up!(app, "bob");

    let req = test::TestRequest::post()
        .uri("/api/v1/swipe")
        .insert_header(bearer(&alice))
        .set_json(json!({ "profile_id": bob_profile, "swipe": true }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["outcome"], "match_pending");
    assert_eq!(body["match"]["status"], "pending");
    assert_eq!(body["daily_limit_reached"], false);

    // Liking again is refused while the like is still pending
    let req = test::TestRequest::post()
        .uri("/api/v1/swipe")
        .insert_header(bearer(&alice))
        .set_json(json!({ "profile_id": bob_profile, "swipe": true }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::post()
        .uri("/api/v1/swipe")
        .insert_header(bearer(&bob))
        .set_json(json!({ "profile_id": alice_profile, "swipe": true }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["outcome"], "match_created");
    assert_eq!(body["match"]["status"], "accepted");

    let req = test::TestRequest::post()
        .uri("/api/v1/swipe")
        .insert_header(bearer(&bob))
        .set_json(json!({ "profile_id": alice_profile, "swipe": true }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    for (token, partner) in [(&alice, bob_profile), (&bob, alice_profile)] {
        let req = test::TestRequest::get()
            .uri("/api/v1/matches")
            .insert_header(bearer(token))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["total"], 1);
        assert_eq!(body["matches"][0]["id"], partner);
    }
}

#[actix_web::test]
async fn test_pass_rejects_pending_like() {
    let app = test_app!(10);
    let (alice, alice_profile) = sign_up!(app, "alice");
    let (bob, bob_profile) = sign_up!(app, "bob");

    let req = test::TestRequest::post()
        .uri("/api/v1/swipe")
        .insert_header(bearer(&alice))
        .set_json(json!({ "profile_id": bob_profile, "swipe": true }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::post()
        .uri("/api/v1/swipe")
        .insert_header(bearer(&bob))
        .set_json(json!({ "profile_id": alice_profile, "swipe": false }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["outcome"], "rejected");
    assert_eq!(body["match"]["status"], "rejected");

    let req = test::TestRequest::get()
        .uri("/api/v1/matches")
        .insert_header(bearer(&alice))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["total"], 0);
}

#[actix_web::test]
async fn test_invalid_swipes() {
    let app = test_app!(10);
    let (alice, alice_profile) = sign_up!(app, "alice");

    let req = test::TestRequest::post()
        .uri("/api/v1/swipe")
        .insert_header(bearer(&alice))
        .set_json(json!({ "profile_id": alice_profile, "swipe": true }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/v1/swipe")
        .insert_header(bearer(&alice))
        .set_json(json!({ "profile_id": 424_242, "swipe": true }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::post()
        .uri("/api/v1/swipe")
        .insert_header(bearer(&alice))
        .set_json(json!({ "profile_id": "two", "swipe": "yes" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_daily_limit_and_premium() {
    let app = test_app!(2);
    let (viewer, _) = sign_up!(app, "viewer");
    let (_, first) = sign_up!(app, "first");
    sign_up!(app, "second");
    sign_up!(app, "third");

    for _ in 0..2 {
        let req = test::TestRequest::get()
            .uri("/api/v1/profiles/next")
            .insert_header(bearer(&viewer))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let req = test::TestRequest::get()
        .uri("/api/v1/profiles/next")
        .insert_header(bearer(&viewer))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // Swipes still go through, without a follow-up profile
    let req = test::TestRequest::post()
        .uri("/api/v1/swipe")
        .insert_header(bearer(&viewer))
        .set_json(json!({ "profile_id": first, "swipe": false }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["outcome"], "no_op");
    assert_eq!(body["daily_limit_reached"], true);
    assert!(body["next_profile"].is_null());

    let req = test::TestRequest::post()
        .uri("/api/v1/subscribe")
        .insert_header(bearer(&viewer))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri("/api/v1/profiles/next")
        .insert_header(bearer(&viewer))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    // Everyone else has now been shown today
    let req = test::TestRequest::get()
        .uri("/api/v1/profiles/next")
        .insert_header(bearer(&viewer))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::post()
        .uri("/api/v1/subscribe")
        .insert_header(bearer(&viewer))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get()
        .uri("/api/v1/me")
        .insert_header(bearer(&viewer))
        .to_request();
    let me: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(me["is_premium"], true);
}
