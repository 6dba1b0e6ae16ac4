mod common;

use actix_session::{storage::CookieSessionStore, SessionMiddleware};
use actix_web::cookie::Key;
use actix_web::http::StatusCode;
use actix_web::{test, App};
use serde_json::json;
use uuid::Uuid;

macro_rules! app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data($state.clone())
                .wrap(SessionMiddleware::new(
                    CookieSessionStore::default(),
                    Key::generate(),
                ))
                .configure(sv_api::configure_routes),
        )
        .await
    };
}

#[actix_web::test]
async fn vote_succeeds_then_duplicate_is_a_noop() {
    let state = common::state(100).await;
    let post = common::post_fixture("judged");
    state.repo.create_post(post.clone()).await.unwrap();
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri(&format!("/post/{}/vote", post.id))
        .peer_addr("7.0.0.1:4000".parse().unwrap())
        .set_json(json!({ "isBad": true }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert!(body["vote"]["id"].is_string());
    assert_eq!(body["currentVoteCounts"]["bad"], 1);
    assert_eq!(body["currentVoteCounts"]["notBad"], 0);

    // same identity, same post: accepted but not recorded, flag notwithstanding
    let req = test::TestRequest::post()
        .uri(&format!("/post/{}/vote", post.id))
        .peer_addr("7.0.0.1:4000".parse().unwrap())
        .set_json(json!({ "isBad": false }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::ACCEPTED);
}

#[actix_web::test]
async fn counts_accumulate_across_distinct_clients() {
    let state = common::state(100).await;
    let post = common::post_fixture("tallied");
    state.repo.create_post(post.clone()).await.unwrap();
    let app = app!(state);

    let mut last = None;
    for (peer, is_bad) in [("7.0.1.1:4000", true), ("7.0.1.2:4000", true), ("7.0.1.3:4000", false)] {
        let req = test::TestRequest::post()
            .uri(&format!("/post/{}/vote", post.id))
            .peer_addr(peer.parse().unwrap())
            .set_json(json!({ "isBad": is_bad }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        last = Some(test::read_body_json::<serde_json::Value, _>(resp).await);
    }

    let counts = &last.unwrap()["currentVoteCounts"];
    assert_eq!(counts["bad"], 2);
    assert_eq!(counts["notBad"], 1);
}

#[actix_web::test]
async fn vote_without_identity_is_forbidden() {
    let state = common::state(100).await;
    let post = common::post_fixture("guarded");
    state.repo.create_post(post.clone()).await.unwrap();
    let app = app!(state);

    // no peer address, no proxy headers: nothing to key the vote on
    let req = test::TestRequest::post()
        .uri(&format!("/post/{}/vote", post.id))
        .set_json(json!({ "isBad": true }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn missing_flag_is_rejected() {
    let state = common::state(100).await;
    let post = common::post_fixture("flagless");
    state.repo.create_post(post.clone()).await.unwrap();
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri(&format!("/post/{}/vote", post.id))
        .peer_addr("7.0.0.2:4000".parse().unwrap())
        .set_json(json!({}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(
        body["message"],
        "validation error: isBad must be one of 'true' or 'false'"
    );
}

#[actix_web::test]
async fn vote_on_missing_post_is_not_found() {
    let state = common::state(100).await;
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri(&format!("/post/{}/vote", Uuid::now_v7()))
        .peer_addr("7.0.0.3:4000".parse().unwrap())
        .set_json(json!({ "isBad": true }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn forwarded_for_and_peer_resolve_to_the_same_identity() {
    let state = common::state(100).await;
    let post = common::post_fixture("proxied");
    state.repo.create_post(post.clone()).await.unwrap();
    let app = app!(state);

    // vote arrives through a proxy: first forwarded-for entry wins
    let req = test::TestRequest::post()
        .uri(&format!("/post/{}/vote", post.id))
        .insert_header(("X-Forwarded-For", "1.2.3.4, 5.6.7.8"))
        .peer_addr("10.0.0.1:4000".parse().unwrap())
        .set_json(json!({ "isBad": true }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    // the same visitor, now connecting directly
    let req = test::TestRequest::post()
        .uri(&format!("/post/{}/vote", post.id))
        .peer_addr("1.2.3.4:4000".parse().unwrap())
        .set_json(json!({ "isBad": true }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::ACCEPTED);
}
