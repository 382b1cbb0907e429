//! Candidate listing and management.

use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use cv_core::FingerprintPolicy;
use integration_tests::{test_app, TestContext};
use serde_json::{json, Value};

fn bearer(token: &str) -> (&'static str, String) {
    ("authorization", format!("Bearer {token}"))
}

#[actix_web::test]
async fn public_listing_hides_tallies() {
    let ctx = TestContext::new(FingerprintPolicy::Required).await;
    let (alice, bob, cara) = ctx.royal_field().await;
    let app = test_app!(ctx);

    let req = TestRequest::post()
        .uri("/api/vote")
        .set_json(json!({ "kingId": alice.id, "queenId": cara.id, "fingerprint": "fp-a" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let body: Value =
        test::call_and_read_body_json(&app, TestRequest::get().uri("/api/candidates").to_request())
            .await;
    let kings = body["kings"].as_array().unwrap();
    assert_eq!(kings.len(), 2);
    assert_eq!(kings[0]["id"], alice.id);
    assert_eq!(kings[1]["id"], bob.id);
    assert!(kings[0].get("voteCount").is_none());
    assert_eq!(body["queens"][0]["name"], "Cara");

    let body: Value = test::call_and_read_body_json(
        &app,
        TestRequest::get()
            .uri(&format!("/api/candidates/{}", cara.id))
            .to_request(),
    )
    .await;
    assert_eq!(body["category"], "queen");
    assert!(body.get("voteCount").is_none());

    let resp = test::call_service(
        &app,
        TestRequest::get().uri("/api/candidates/9999").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = test::call_service(
        &app,
        TestRequest::get().uri("/api/candidates/abc").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn create_and_update_candidates() {
    let ctx = TestContext::new(FingerprintPolicy::Required).await;
    let token = ctx.admin_token().await;
    let app = test_app!(ctx);

    let req = TestRequest::post()
        .uri("/api/candidates")
        .set_json(json!({ "name": "Dan", "category": "king" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

    let req = TestRequest::post()
        .uri("/api/candidates")
        .insert_header(bearer(&token))
        .set_json(json!({ "name": "Dan", "category": "jester" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = TestRequest::post()
        .uri("/api/candidates")
        .insert_header(bearer(&token))
        .set_json(json!({ "category": "king" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = TestRequest::post()
        .uri("/api/candidates")
        .insert_header(bearer(&token))
        .set_json(json!({ "name": "  Dan  ", "category": "king", "photoUrl": "/uploads/candidates/dan.jpg" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let id = body["candidate"]["id"].as_i64().unwrap();
    assert_eq!(body["candidate"]["name"], "Dan");
    assert_eq!(body["candidate"]["voteCount"], 0);

    let req = TestRequest::put()
        .uri(&format!("/api/candidates/{id}"))
        .insert_header(bearer(&token))
        .set_json(json!({ "category": "queen", "photoUrl": null }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["candidate"]["name"], "Dan");
    assert_eq!(body["candidate"]["category"], "queen");
    assert!(body["candidate"]["photoUrl"].is_null());

    let req = TestRequest::put()
        .uri("/api/candidates/9999")
        .insert_header(bearer(&token))
        .set_json(json!({ "name": "Ghost" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn candidates_with_ballots_cannot_be_deleted() {
    let ctx = TestContext::new(FingerprintPolicy::Required).await;
    let (alice, bob, cara) = ctx.royal_field().await;
    let token = ctx.admin_token().await;
    let app = test_app!(ctx);

    let req = TestRequest::post()
        .uri("/api/vote")
        .set_json(json!({ "kingId": alice.id, "queenId": cara.id, "fingerprint": "fp-a" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let req = TestRequest::delete()
        .uri(&format!("/api/candidates/{}", alice.id))
        .insert_header(bearer(&token))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);

    let req = TestRequest::delete()
        .uri(&format!("/api/candidates/{}", bob.id))
        .insert_header(bearer(&token))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = TestRequest::delete()
        .uri(&format!("/api/candidates/{}", bob.id))
        .insert_header(bearer(&token))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}
