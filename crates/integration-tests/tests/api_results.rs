//! The results board and its announcement gate.

use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use cv_core::FingerprintPolicy;
use integration_tests::{test_app, TestContext};
use serde_json::{json, Value};

#[actix_web::test]
async fn public_board_waits_for_announcement() {
    let ctx = TestContext::new(FingerprintPolicy::Required).await;
    let (alice, bob, cara) = ctx.royal_field().await;
    let token = ctx.admin_token().await;
    let app = test_app!(ctx);

    let req = TestRequest::post()
        .uri("/api/vote")
        .set_json(json!({ "kingId": alice.id, "queenId": cara.id, "fingerprint": "fp-a" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let resp = test::call_service(&app, TestRequest::get().uri("/api/results").to_request()).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["announced"], false);

    // Staff see the board early.
    let req = TestRequest::get()
        .uri("/api/results")
        .insert_header(("authorization", format!("Bearer {token}")))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["totalVotes"], 1);
    assert_eq!(body["kings"][0]["id"], alice.id);
    assert_eq!(body["kings"][0]["voteCount"], 1);
    assert_eq!(body["kings"][0]["percentage"], 100.0);
    assert_eq!(body["kings"][1]["id"], bob.id);
    assert_eq!(body["kings"][1]["percentage"], 0.0);
    assert_eq!(body["queens"][0]["name"], "Cara");
    assert_eq!(body["queens"][0]["percentage"], 100.0);

    ctx.state.gate.set_results_announced(true).await.unwrap();

    let body: Value = test::call_and_read_body_json(
        &app,
        TestRequest::get().uri("/api/results").to_request(),
    )
    .await;
    assert_eq!(body["totalVotes"], 1);
    assert!(body["timestamp"].is_string());

    let body: Value = test::call_and_read_body_json(
        &app,
        TestRequest::get().uri("/api/results/summary").to_request(),
    )
    .await;
    assert_eq!(body["king"]["name"], "Alice");
    assert_eq!(body["queen"]["name"], "Cara");
    assert_eq!(body["totalVotes"], 1);
}

#[actix_web::test]
async fn empty_board_has_zero_percentages() {
    let ctx = TestContext::new(FingerprintPolicy::Required).await;
    ctx.royal_field().await;
    ctx.state.gate.set_results_announced(true).await.unwrap();
    let app = test_app!(ctx);

    let body: Value = test::call_and_read_body_json(
        &app,
        TestRequest::get().uri("/api/results").to_request(),
    )
    .await;
    assert_eq!(body["totalVotes"], 0);
    for entry in body["kings"].as_array().unwrap().iter().chain(body["queens"].as_array().unwrap()) {
        assert_eq!(entry["percentage"], 0.0);
    }
}

#[actix_web::test]
async fn admin_results_need_a_token() {
    let ctx = TestContext::new(FingerprintPolicy::Required).await;
    let token = ctx.admin_token().await;
    let app = test_app!(ctx);

    let resp = test::call_service(
        &app,
        TestRequest::get().uri("/api/admin/results").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = TestRequest::get()
        .uri("/api/admin/results")
        .insert_header(("authorization", format!("Bearer {token}")))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}

#[actix_web::test]
async fn many_voters_rank_by_tally() {
    let ctx = TestContext::new(FingerprintPolicy::Required).await;
    let (alice, bob, cara) = ctx.royal_field().await;
    ctx.state.gate.set_results_announced(true).await.unwrap();
    let app = test_app!(ctx);

    for (fp, king) in [("fp-1", bob.id), ("fp-2", bob.id), ("fp-3", alice.id)] {
        let req = TestRequest::post()
            .uri("/api/vote")
            .set_json(json!({ "kingId": king, "queenId": cara.id, "fingerprint": fp }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
    }

    let body: Value = test::call_and_read_body_json(
        &app,
        TestRequest::get().uri("/api/results").to_request(),
    )
    .await;
    assert_eq!(body["totalVotes"], 3);
    assert_eq!(body["kings"][0]["name"], "Bob");
    assert_eq!(body["kings"][0]["percentage"], 66.7);
    assert_eq!(body["kings"][1]["percentage"], 33.3);
    assert_eq!(body["queens"][0]["voteCount"], 3);
}
