//! HTTP-level integration tests for the annotation API and its access control.

mod common;

use axum::http::StatusCode;
use axum::Router;
use common::{body_json, delete_auth, get, get_auth, patch_json_auth, post_json_auth};
use serde_json::{json, Value};
use sqlx::PgPool;

const PAGE: &str = "https://example.com/article/?utm_source=feed";

fn annotation_body(shared: bool) -> Value {
    json!({
        "uri": PAGE,
        "text": "Some **bold** claim <script>alert(1)</script>",
        "tags": ["rust", " rust ", "notes", ""],
        "shared": shared,
        "target": [{
            "source": PAGE,
            "selector": [{ "type": "TextQuoteSelector", "exact": "claim" }]
        }],
        "document": { "title": "An Article" },
        "extra": { "client": "test" }
    })
}

async fn create(app: Router, token: &str, body: Value) -> Value {
    let response = post_json_auth(app, "/api/v1/annotations", body, token).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"].clone()
}

fn id_of(annotation: &Value) -> String {
    annotation["id"].as_str().unwrap().to_string()
}

// ---------------------------------------------------------------------------
// Create / read
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_derives_rendered_text_normalized_uri_and_acl(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let token = common::user_token(&pool, app.clone(), "alice").await;

    let data = create(app.clone(), &token, annotation_body(true)).await;

    assert_eq!(data["id"].as_str().unwrap().len(), 22);
    assert_eq!(data["user"], "acct:alice@example.org");
    assert_eq!(data["group"], "__world__");
    assert_eq!(data["tags"], json!(["rust", "notes"]));
    let rendered = data["text_rendered"].as_str().unwrap();
    assert!(rendered.contains("<strong>bold</strong>"));
    assert!(!rendered.contains("<script"));
    assert_eq!(data["target"][0]["selector"][0]["exact"], "claim");
    assert_eq!(data["document"]["title"], "An Article");
    assert_eq!(data["extra"]["client"], "test");
    assert_eq!(data["references"], json!([]));
    assert_eq!(data["permissions"]["read"], json!(["system.Everyone"]));
    assert_eq!(data["permissions"]["update"], json!(["acct:alice@example.org"]));

    // Anonymous callers can read shared public annotations.
    let response = get(app, &format!("/api/v1/annotations/{}", id_of(&data))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["id"], data["id"]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_requires_authentication(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = common::post_json(app, "/api/v1/annotations", annotation_body(true)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn invalid_selector_is_rejected(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let token = common::user_token(&pool, app.clone(), "alice").await;

    let mut body = annotation_body(true);
    body["target"][0]["selector"] = json!(["not an object"]);
    let response = post_json_auth(app, "/api/v1/annotations", body, &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn posting_to_a_foreign_group_is_rejected(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let token = common::user_token(&pool, app.clone(), "alice").await;

    let mut body = annotation_body(true);
    body["group"] = json!("nosuchgr");
    let response = post_json_auth(app, "/api/v1/annotations", body, &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Visibility
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn private_annotations_are_invisible_to_others(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let alice = common::user_token(&pool, app.clone(), "alice").await;
    let bob = common::user_token(&pool, app.clone(), "bob").await;

    let private = create(app.clone(), &alice, annotation_body(false)).await;
    let path = format!("/api/v1/annotations/{}", id_of(&private));
    assert_eq!(
        private["permissions"]["read"],
        json!(["acct:alice@example.org"])
    );

    assert_eq!(get_auth(app.clone(), &path, &alice).await.status(), StatusCode::OK);
    assert_eq!(get_auth(app.clone(), &path, &bob).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(get(app.clone(), &path).await.status(), StatusCode::NOT_FOUND);

    let search = format!("/api/v1/annotations?uri={}", "http://example.com/article");
    let as_bob = body_json(get_auth(app.clone(), &search, &bob).await).await;
    assert_eq!(as_bob["total"], 0);
    let as_alice = body_json(get_auth(app, &search, &alice).await).await;
    assert_eq!(as_alice["total"], 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn search_filters_by_tag_and_user(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let alice = common::user_token(&pool, app.clone(), "alice").await;
    let bob = common::user_token(&pool, app.clone(), "bob").await;

    create(app.clone(), &alice, annotation_body(true)).await;
    let mut other = annotation_body(true);
    other["tags"] = json!(["rust"]);
    create(app.clone(), &bob, other).await;

    let both = body_json(get(app.clone(), "/api/v1/annotations?tag=rust").await).await;
    assert_eq!(both["total"], 2);

    let narrowed =
        body_json(get(app.clone(), "/api/v1/annotations?tag=rust&tag=notes").await).await;
    assert_eq!(narrowed["total"], 1);
    assert_eq!(narrowed["data"][0]["user"], "acct:alice@example.org");

    let by_user = body_json(get(app.clone(), "/api/v1/annotations?user=bob").await).await;
    assert_eq!(by_user["total"], 1);
    assert_eq!(by_user["data"][0]["user"], "acct:bob@example.org");

    let paged = body_json(get(app, "/api/v1/annotations?limit=1").await).await;
    assert_eq!(paged["total"], 2);
    assert_eq!(paged["data"].as_array().unwrap().len(), 1);
}

// ---------------------------------------------------------------------------
// Update / delete
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn owner_can_update_and_derived_fields_follow(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let alice = common::user_token(&pool, app.clone(), "alice").await;

    let created = create(app.clone(), &alice, annotation_body(false)).await;
    let path = format!("/api/v1/annotations/{}", id_of(&created));

    let patch = json!({
        "text": "_edited_",
        "shared": true,
        "uri": "https://other.org/page/"
    });
    let response = patch_json_auth(app.clone(), &path, patch, &alice).await;
    assert_eq!(response.status(), StatusCode::OK);

    let data = body_json(response).await["data"].clone();
    assert!(data["text_rendered"].as_str().unwrap().contains("<em>edited</em>"));
    assert_eq!(data["uri"], "https://other.org/page/");
    assert_eq!(data["permissions"]["read"], json!(["system.Everyone"]));
    assert_eq!(data["tags"], created["tags"]);

    let search = body_json(get(app.clone(), "/api/v1/annotations?uri=http://other.org/page").await).await;
    assert_eq!(search["total"], 1);

    let cleared = patch_json_auth(app, &path, json!({ "text": null }), &alice).await;
    let data = body_json(cleared).await["data"].clone();
    assert!(data["text"].is_null());
    assert!(data["text_rendered"].is_null());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn empty_patch_leaves_annotation_untouched(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let alice = common::user_token(&pool, app.clone(), "alice").await;

    let created = create(app.clone(), &alice, annotation_body(false)).await;
    let path = format!("/api/v1/annotations/{}", id_of(&created));

    let response = patch_json_auth(app, &path, json!({}), &alice).await;
    assert_eq!(response.status(), StatusCode::OK);
    let data = body_json(response).await["data"].clone();
    assert_eq!(data["updated"], created["updated"]);
    assert_eq!(data["text"], created["text"]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn non_owner_gets_403_on_readable_annotation(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let alice = common::user_token(&pool, app.clone(), "alice").await;
    let bob = common::user_token(&pool, app.clone(), "bob").await;

    let shared = create(app.clone(), &alice, annotation_body(true)).await;
    let path = format!("/api/v1/annotations/{}", id_of(&shared));

    let response = patch_json_auth(app.clone(), &path, json!({ "text": "mine now" }), &bob).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = delete_auth(app, &path, &bob).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn non_owner_gets_404_on_private_annotation(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let alice = common::user_token(&pool, app.clone(), "alice").await;
    let bob = common::user_token(&pool, app.clone(), "bob").await;

    let private = create(app.clone(), &alice, annotation_body(false)).await;
    let path = format!("/api/v1/annotations/{}", id_of(&private));

    let response = delete_auth(app, &path, &bob).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn owner_can_delete(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let alice = common::user_token(&pool, app.clone(), "alice").await;

    let created = create(app.clone(), &alice, annotation_body(true)).await;
    let path = format!("/api/v1/annotations/{}", id_of(&created));

    assert_eq!(
        delete_auth(app.clone(), &path, &alice).await.status(),
        StatusCode::NO_CONTENT
    );
    assert_eq!(get(app, &path).await.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Replies
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn replies_extend_the_thread_and_inherit_the_group(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let alice = common::user_token(&pool, app.clone(), "alice").await;
    let bob = common::user_token(&pool, app.clone(), "bob").await;

    let root = create(app.clone(), &alice, annotation_body(true)).await;

    let mut reply_body = annotation_body(true);
    reply_body["references"] = json!([root["id"]]);
    reply_body["group"] = json!("ignored");
    let reply = create(app.clone(), &bob, reply_body).await;
    assert_eq!(reply["references"], json!([root["id"]]));
    assert_eq!(reply["group"], "__world__");

    let mut nested_body = annotation_body(true);
    nested_body["references"] = json!([reply["id"]]);
    let nested = create(app.clone(), &alice, nested_body).await;
    assert_eq!(nested["references"], json!([root["id"], reply["id"]]));

    let response = get(app, &format!("/api/v1/annotations/{}/replies", id_of(&root))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let replies = body_json(response).await["data"].clone();
    let ids: Vec<&str> = replies
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec![reply["id"].as_str().unwrap(), nested["id"].as_str().unwrap()]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn cannot_reply_to_an_unreadable_annotation(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let alice = common::user_token(&pool, app.clone(), "alice").await;
    let bob = common::user_token(&pool, app.clone(), "bob").await;

    let private = create(app.clone(), &alice, annotation_body(false)).await;

    let mut body = annotation_body(true);
    body["references"] = json!([private["id"]]);
    let response = post_json_auth(app, "/api/v1/annotations", body, &bob).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
