mod common;

use actix_session::{storage::CookieSessionStore, SessionMiddleware};
use actix_web::cookie::Key;
use actix_web::http::StatusCode;
use actix_web::{test, App};
use serde_json::json;

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
async fn submit_page_flags_submission() {
    let state = common::state(100).await;
    let app = app!(state);

    let req = test::TestRequest::get()
        .uri("/post/submit")
        .peer_addr("8.0.0.1:4000".parse().unwrap())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["submission"], true);
}

#[actix_web::test]
async fn valid_submission_redirects_home() {
    let state = common::state(100).await;
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/post/submit")
        .peer_addr("8.0.0.2:4000".parse().unwrap())
        .set_json(json!({ "title": "identity function", "code": "def f(x): return x" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers().get("location").unwrap(), "/");

    // the snippet is now served by the index
    let req = test::TestRequest::get()
        .uri("/")
        .peer_addr("8.0.0.2:4000".parse().unwrap())
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["post"]["title"], "identity function");
}

#[actix_web::test]
async fn missing_fields_are_rejected() {
    let state = common::state(100).await;
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/post/submit")
        .peer_addr("8.0.0.3:4000".parse().unwrap())
        .set_json(json!({ "title": "no code here" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "validation error: must submit code and title!");
}

#[actix_web::test]
async fn unparsable_body_is_rejected() {
    let state = common::state(100).await;
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/post/submit")
        .peer_addr("8.0.0.4:4000".parse().unwrap())
        .set_payload("definitely not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn snippet_that_fails_to_parse_reports_line_and_reason() {
    let state = common::state(100).await;
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/post/submit")
        .peer_addr("8.0.0.5:4000".parse().unwrap())
        .set_json(json!({ "title": "broken", "code": "def f(:" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: serde_json::Value = test::read_body_json(resp).await;
    let errors = body["errors"].as_array().expect("errors array");
    assert!(!errors.is_empty());
    assert!(errors[0]["lineNum"].as_u64().unwrap() >= 1);
    assert!(!errors[0]["reason"].as_str().unwrap().is_empty());
}
