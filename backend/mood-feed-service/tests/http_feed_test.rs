mod common;

use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use common::Fixture;
use mood_feed_service::handlers::{self, FeedHandlerState, PostHandlerState, UserHandlerState};
use mood_feed_service::middleware::{Claims, JwtAuthMiddleware, JwtValidator};
use mood_feed_service::models::Mood;

const SECRET: &str = "http-test-secret";

fn bearer(user_id: Uuid) -> (&'static str, String) {
    let claims = Claims {
        sub: user_id.to_string(),
        exp: (chrono::Utc::now().timestamp() + 600) as usize,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();
    ("Authorization", format!("Bearer {}", token))
}

macro_rules! init_app {
    ($fx:expr) => {{
        let fx: &Fixture = &$fx;
        test::init_service(
            App::new()
                .app_data(web::Data::new(FeedHandlerState {
                    feed: Arc::new(fx.feed()),
                    request_timeout: Duration::from_secs(2),
                }))
                .app_data(web::Data::new(PostHandlerState {
                    posts: Arc::new(fx.posts()),
                }))
                .app_data(web::Data::new(UserHandlerState {
                    users: fx.store.clone(),
                }))
                .configure(handlers::configure(JwtAuthMiddleware::new(Arc::new(
                    JwtValidator::from_secret(SECRET),
                )))),
        )
        .await
    }};
}

#[actix_web::test]
async fn feed_requires_a_valid_token() {
    let fx = Fixture::new();
    let app = init_app!(fx);

    let req = test::TestRequest::get().uri("/api/v1/feed").to_request();
    let err = test::try_call_service(&app, req).await.unwrap_err();
    assert_eq!(
        err.as_response_error().status_code(),
        StatusCode::UNAUTHORIZED
    );

    let req = test::TestRequest::get()
        .uri("/api/v1/feed")
        .insert_header(("Authorization", "Bearer not-a-token"))
        .to_request();
    let err = test::try_call_service(&app, req).await.unwrap_err();
    assert_eq!(
        err.as_response_error().status_code(),
        StatusCode::UNAUTHORIZED
    );
}

#[actix_web::test]
async fn malformed_paging_falls_back_to_defaults() {
    let fx = Fixture::new();
    let viewer = fx.user("viewer", Mood::Neutral).await;
    let author = fx.user("author", Mood::Happy).await;
    for minutes in 0..7 {
        fx.post(author, Mood::Happy, 0, minutes).await;
    }
    let app = init_app!(fx);

    let req = test::TestRequest::get()
        .uri("/api/v1/feed?page=abc&limit=-4")
        .insert_header(bearer(viewer))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["currentPage"], 1);
    assert_eq!(body["totalPosts"], 7);
    assert_eq!(body["totalPages"], 2);
    assert_eq!(body["posts"].as_array().unwrap().len(), 5);

    let req = test::TestRequest::get()
        .uri("/api/v1/feed?page=2&limit=500")
        .insert_header(bearer(viewer))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["currentPage"], 2);
    assert_eq!(body["totalPages"], 1);
    assert!(body["posts"].as_array().unwrap().is_empty());
}

#[actix_web::test]
async fn page_beyond_any_offset_is_an_empty_page() {
    let fx = Fixture::new();
    let viewer = fx.user("viewer", Mood::Neutral).await;
    let author = fx.user("author", Mood::Happy).await;
    fx.post(author, Mood::Happy, 0, 1).await;
    let app = init_app!(fx);

    let req = test::TestRequest::get()
        .uri("/api/v1/feed?page=9223372036854775807")
        .insert_header(bearer(viewer))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["posts"].as_array().unwrap().is_empty());
    assert_eq!(body["totalPosts"], 1);
    assert_eq!(body["totalPages"], 1);
}

#[actix_web::test]
async fn feed_entries_use_camel_case_fields() {
    let fx = Fixture::new();
    let viewer = fx.user("viewer", Mood::Happy).await;
    let author = fx.user("author", Mood::Happy).await;
    let post = fx.post(author, Mood::Happy, 3, 1).await;
    fx.comment(post.id, viewer, "yay", 0).await;
    let app = init_app!(fx);

    let req = test::TestRequest::get()
        .uri("/api/v1/feed")
        .insert_header(bearer(viewer))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    let entry = &body["posts"][0];
    assert_eq!(entry["id"], post.id.to_string());
    assert_eq!(entry["authorId"], author.to_string());
    assert_eq!(entry["mood"], "happy");
    assert_eq!(entry["likeCount"], 3);
    assert_eq!(entry["source"], "ranked");
    assert_eq!(entry["author"]["username"], "author");
    assert_eq!(entry["comments"][0]["content"], "yay");
    assert_eq!(entry["score"]["moodMatch"], true);
}

#[actix_web::test]
async fn legacy_mood_route_uses_the_stored_mood() {
    let fx = Fixture::new();
    let viewer = fx.user("viewer", Mood::Happy).await;
    let author = fx.user("author", Mood::Sad).await;
    fx.post(author, Mood::Sad, 0, 1).await;
    let happy = fx.post(author, Mood::Happy, 0, 2).await;
    let app = init_app!(fx);

    let req = test::TestRequest::get()
        .uri("/api/v1/posts/mood/sad")
        .insert_header(bearer(viewer))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["totalPosts"], 1);
    assert_eq!(body["posts"][0]["id"], happy.id.to_string());
}

#[actix_web::test]
async fn unknown_viewer_and_outage_map_to_status_codes() {
    let fx = Fixture::new();
    let viewer = fx.user("viewer", Mood::Happy).await;
    let app = init_app!(fx);

    let req = test::TestRequest::get()
        .uri("/api/v1/feed")
        .insert_header(bearer(Uuid::new_v4()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    fx.store.set_unavailable(true);
    let req = test::TestRequest::get()
        .uri("/api/v1/feed")
        .insert_header(bearer(viewer))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], 503);
}

#[actix_web::test]
async fn post_lifecycle_over_http() {
    let fx = Fixture::new();
    let author = fx.user("author", Mood::Happy).await;
    let fan = fx.user("fan", Mood::Happy).await;
    let app = init_app!(fx);

    let req = test::TestRequest::post()
        .uri("/api/v1/posts")
        .insert_header(bearer(author))
        .set_json(serde_json::json!({ "description": "hello", "mood": "excited" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    assert_eq!(created["mood"], "excited");
    let post_id = created["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri("/api/v1/posts")
        .insert_header(bearer(author))
        .set_json(serde_json::json!({ "description": "" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let like_uri = format!("/api/v1/posts/like/{}", post_id);
    let req = test::TestRequest::post()
        .uri(&like_uri)
        .insert_header(bearer(fan))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    let req = test::TestRequest::post()
        .uri(&like_uri)
        .insert_header(bearer(fan))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::BAD_REQUEST
    );

    let post_uri = format!("/api/v1/posts/{}", post_id);
    let req = test::TestRequest::get()
        .uri(&post_uri)
        .insert_header(bearer(fan))
        .to_request();
    let detail: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(detail["likeCount"], 1);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/posts/user/{}", author))
        .insert_header(bearer(fan))
        .to_request();
    let listing: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listing.as_array().unwrap().len(), 1);

    let req = test::TestRequest::delete()
        .uri(&post_uri)
        .insert_header(bearer(fan))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::FORBIDDEN
    );

    let req = test::TestRequest::delete()
        .uri(&post_uri)
        .insert_header(bearer(author))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NO_CONTENT
    );

    let req = test::TestRequest::get()
        .uri(&post_uri)
        .insert_header(bearer(author))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[actix_web::test]
async fn unknown_mood_on_a_new_post_is_rejected() {
    let fx = Fixture::new();
    let author = fx.user("author", Mood::Happy).await;
    let app = init_app!(fx);

    let req = test::TestRequest::post()
        .uri("/api/v1/posts")
        .insert_header(bearer(author))
        .set_json(serde_json::json!({ "description": "hi", "mood": "hapy" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(fx.posts().posts_by_author(author).await.unwrap().is_empty());
    assert_eq!(fx.store.user(author).await.unwrap().points, 0);

    let req = test::TestRequest::post()
        .uri("/api/v1/posts")
        .insert_header(bearer(author))
        .set_json(serde_json::json!({ "description": "hi" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    assert_eq!(created["mood"], "neutral");
}

#[actix_web::test]
async fn mood_update_validates_input() {
    let fx = Fixture::new();
    let viewer = fx.user("viewer", Mood::Happy).await;
    let app = init_app!(fx);

    let req = test::TestRequest::put()
        .uri("/api/v1/users/me/mood")
        .insert_header(bearer(viewer))
        .set_json(serde_json::json!({ "mood": "grumpy" }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::BAD_REQUEST
    );

    let req = test::TestRequest::put()
        .uri("/api/v1/users/me/mood")
        .insert_header(bearer(viewer))
        .set_json(serde_json::json!({ "mood": "Sad" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["currentMood"], "sad");
    assert_eq!(fx.store.user(viewer).await.unwrap().current_mood, Mood::Sad);
}
