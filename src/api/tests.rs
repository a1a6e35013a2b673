//! End-to-end API tests over an in-memory database

use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{json, Value};

use super::{build_router, AppState};
use crate::cache::Cache;
use crate::config::AdminBootstrap;
use crate::db::{create_test_pool, migrations};
use crate::services::email::RecordingMailer;

struct TestApp {
    server: TestServer,
    state: AppState,
    mailer: Arc<RecordingMailer>,
}

async fn setup() -> TestApp {
    let pool = create_test_pool().await.expect("Failed to create test pool");
    migrations::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    let mailer = Arc::new(RecordingMailer::default());
    let state = AppState::new(pool, Arc::new(Cache::new()), mailer.clone(), 1);
    let app = build_router(state.clone(), "http://localhost:3000").expect("Failed to build router");

    TestApp {
        server: TestServer::new(app).expect("Failed to start test server"),
        state,
        mailer,
    }
}

impl TestApp {
    /// Run the signup + confirmation flow and return a bearer token
    async fn sign_in(&self, username: &str) -> String {
        let email = format!("{}@example.com", username);
        self.server
            .post("/api/v1/auth/signup")
            .json(&json!({"username": username, "email": email}))
            .await
            .assert_status_ok();

        let code = self.mailer.last_code_for(&email).expect("Code was emailed");
        let response = self
            .server
            .post("/api/v1/auth/token")
            .json(&json!({"username": username, "confirmation_code": code}))
            .await;
        response.assert_status_ok();
        response.json::<Value>()["token"]
            .as_str()
            .expect("Token in response")
            .to_string()
    }

    async fn sign_in_admin(&self) -> String {
        self.state
            .user_service
            .ensure_superuser(&AdminBootstrap {
                username: "root".to_string(),
                email: "root@example.com".to_string(),
            })
            .await
            .expect("Failed to create superuser");
        self.sign_in("root").await
    }

    async fn sign_in_moderator(&self, admin: &str, username: &str) -> String {
        let token = self.sign_in(username).await;
        self.server
            .patch(&format!("/api/v1/users/{}", username))
            .authorization_bearer(admin)
            .json(&json!({"role": "moderator"}))
            .await
            .assert_status_ok();
        token
    }

    async fn seed_catalog(&self, admin: &str) -> i64 {
        for (path, name, slug) in [
            ("/api/v1/categories", "Film", "film"),
            ("/api/v1/genres", "Drama", "drama"),
            ("/api/v1/genres", "Comedy", "comedy"),
        ] {
            let response = self
                .server
                .post(path)
                .authorization_bearer(admin)
                .json(&json!({"name": name, "slug": slug}))
                .await;
            assert_eq!(response.status_code(), StatusCode::CREATED);
        }

        let response = self
            .server
            .post("/api/v1/titles")
            .authorization_bearer(admin)
            .json(&json!({
                "name": "Amelie",
                "year": 2001,
                "category": "film",
                "genre": ["drama", "comedy"]
            }))
            .await;
        assert_eq!(response.status_code(), StatusCode::CREATED);
        response.json::<Value>()["id"].as_i64().expect("Title id")
    }

    async fn post_review(&self, token: &str, title_id: i64, score: i64) -> axum_test::TestResponse {
        self.server
            .post(&format!("/api/v1/titles/{}/reviews", title_id))
            .authorization_bearer(token)
            .json(&json!({"text": "Worth watching", "score": score}))
            .await
    }
}

fn error_code(body: &Value) -> &str {
    body["error"]["code"].as_str().unwrap_or_default()
}

#[tokio::test]
async fn test_signup_and_token_flow() {
    let app = setup().await;

    let response = app
        .server
        .post("/api/v1/auth/signup")
        .json(&json!({"username": "alice", "email": "alice@example.com"}))
        .await;
    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>(),
        json!({"username": "alice", "email": "alice@example.com"})
    );
    assert_eq!(app.mailer.sent_count(), 1);

    let code = app.mailer.last_code_for("alice@example.com").unwrap();
    let response = app
        .server
        .post("/api/v1/auth/token")
        .json(&json!({"username": "alice", "confirmation_code": code}))
        .await;
    response.assert_status_ok();
    let token = response.json::<Value>()["token"].as_str().unwrap().to_string();

    let me = app.server.get("/api/v1/users/me").authorization_bearer(&token).await;
    me.assert_status_ok();
    assert_eq!(me.json::<Value>()["username"], "alice");
    assert_eq!(me.json::<Value>()["role"], "user");

    // A consumed code cannot be exchanged again
    let reuse = app
        .server
        .post("/api/v1/auth/token")
        .json(&json!({"username": "alice", "confirmation_code": code}))
        .await;
    assert_eq!(reuse.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_token_errors() {
    let app = setup().await;
    app.sign_in("alice").await;

    let wrong = app
        .server
        .post("/api/v1/auth/token")
        .json(&json!({"username": "alice", "confirmation_code": "nope"}))
        .await;
    assert_eq!(wrong.status_code(), StatusCode::BAD_REQUEST);

    let unknown = app
        .server
        .post("/api/v1/auth/token")
        .json(&json!({"username": "nobody", "confirmation_code": "nope"}))
        .await;
    assert_eq!(unknown.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_signup_validation() {
    let app = setup().await;

    let reserved = app
        .server
        .post("/api/v1/auth/signup")
        .json(&json!({"username": "me", "email": "me@example.com"}))
        .await;
    assert_eq!(reserved.status_code(), StatusCode::BAD_REQUEST);
    assert!(reserved.json::<Value>()["error"]["details"]["username"].is_array());

    let bad_email = app
        .server
        .post("/api/v1/auth/signup")
        .json(&json!({"username": "bob", "email": "not-an-email"}))
        .await;
    assert_eq!(bad_email.status_code(), StatusCode::BAD_REQUEST);

    let missing_field = app
        .server
        .post("/api/v1/auth/signup")
        .json(&json!({"username": "bob"}))
        .await;
    assert_eq!(missing_field.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&missing_field.json::<Value>()), "VALIDATION_ERROR");

    app.sign_in("carol").await;
    let taken = app
        .server
        .post("/api/v1/auth/signup")
        .json(&json!({"username": "carol", "email": "other@example.com"}))
        .await;
    assert_eq!(taken.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(app.mailer.sent_count(), 1);
}

#[tokio::test]
async fn test_taxonomy_permissions() {
    let app = setup().await;
    let admin = app.sign_in_admin().await;
    let user = app.sign_in("alice").await;
    let body = json!({"name": "Film", "slug": "film"});

    app.server.get("/api/v1/categories").await.assert_status_ok();

    let anonymous = app.server.post("/api/v1/categories").json(&body).await;
    assert_eq!(anonymous.status_code(), StatusCode::UNAUTHORIZED);

    let regular = app
        .server
        .post("/api/v1/categories")
        .authorization_bearer(&user)
        .json(&body)
        .await;
    assert_eq!(regular.status_code(), StatusCode::FORBIDDEN);

    let created = app
        .server
        .post("/api/v1/categories")
        .authorization_bearer(&admin)
        .json(&body)
        .await;
    assert_eq!(created.status_code(), StatusCode::CREATED);
    assert_eq!(created.json::<Value>(), json!({"name": "Film", "slug": "film"}));

    let duplicate = app
        .server
        .post("/api/v1/categories")
        .authorization_bearer(&admin)
        .json(&body)
        .await;
    assert_eq!(duplicate.status_code(), StatusCode::BAD_REQUEST);

    let deleted = app
        .server
        .delete("/api/v1/categories/film")
        .authorization_bearer(&admin)
        .await;
    assert_eq!(deleted.status_code(), StatusCode::NO_CONTENT);

    let again = app
        .server
        .delete("/api/v1/categories/film")
        .authorization_bearer(&admin)
        .await;
    assert_eq!(again.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_taxonomy_search() {
    let app = setup().await;
    let admin = app.sign_in_admin().await;
    for (name, slug) in [("Drama", "drama"), ("Documentary", "doc"), ("Horror", "horror")] {
        app.server
            .post("/api/v1/genres")
            .authorization_bearer(&admin)
            .json(&json!({"name": name, "slug": slug}))
            .await;
    }

    let page = app
        .server
        .get("/api/v1/genres")
        .add_query_param("search", "Do")
        .await
        .json::<Value>();
    assert_eq!(page["count"], 1);
    assert_eq!(page["results"][0]["slug"], "doc");
}

#[tokio::test]
async fn test_titles_embed_taxonomy_and_filter() {
    let app = setup().await;
    let admin = app.sign_in_admin().await;
    let title_id = app.seed_catalog(&admin).await;

    let title = app
        .server
        .get(&format!("/api/v1/titles/{}", title_id))
        .await
        .json::<Value>();
    assert_eq!(title["category"], json!({"name": "Film", "slug": "film"}));
    assert_eq!(title["genre"].as_array().unwrap().len(), 2);
    assert_eq!(title["rating"], Value::Null);

    let by_genre = app
        .server
        .get("/api/v1/titles")
        .add_query_param("genre", "drama")
        .await
        .json::<Value>();
    assert_eq!(by_genre["count"], 1);

    let by_year = app
        .server
        .get("/api/v1/titles")
        .add_query_param("year", "1999")
        .await
        .json::<Value>();
    assert_eq!(by_year["count"], 0);

    let unknown_slug = app
        .server
        .post("/api/v1/titles")
        .authorization_bearer(&admin)
        .json(&json!({"name": "Heat", "year": 1995, "category": "opera"}))
        .await;
    assert_eq!(unknown_slug.status_code(), StatusCode::BAD_REQUEST);

    let renamed = app
        .server
        .patch(&format!("/api/v1/titles/{}", title_id))
        .authorization_bearer(&admin)
        .json(&json!({"name": "Le Fabuleux Destin"}))
        .await;
    renamed.assert_status_ok();
    assert_eq!(renamed.json::<Value>()["genre"].as_array().unwrap().len(), 2);

    let missing = app.server.get("/api/v1/titles/999").await;
    assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deleting_category_clears_cached_titles() {
    let app = setup().await;
    let admin = app.sign_in_admin().await;
    let title_id = app.seed_catalog(&admin).await;
    let path = format!("/api/v1/titles/{}", title_id);

    assert_eq!(app.server.get(&path).await.json::<Value>()["category"]["slug"], "film");

    app.server
        .delete("/api/v1/categories/film")
        .authorization_bearer(&admin)
        .await;
    app.server
        .delete("/api/v1/genres/drama")
        .authorization_bearer(&admin)
        .await;

    let title = app.server.get(&path).await.json::<Value>();
    assert_eq!(title["category"], Value::Null);
    assert_eq!(title["genre"], json!([{"name": "Comedy", "slug": "comedy"}]));
}

#[tokio::test]
async fn test_patch_null_clears_title_category() {
    let app = setup().await;
    let admin = app.sign_in_admin().await;
    let title_id = app.seed_catalog(&admin).await;
    let path = format!("/api/v1/titles/{}", title_id);

    let response = app
        .server
        .patch(&path)
        .authorization_bearer(&admin)
        .json(&json!({"category": null}))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["category"], Value::Null);

    let response = app
        .server
        .patch(&path)
        .authorization_bearer(&admin)
        .json(&json!({"year": 2002}))
        .await;
    let title = response.json::<Value>();
    assert_eq!(title["category"], Value::Null);
    assert_eq!(title["year"], 2002);
}

#[tokio::test]
async fn test_title_name_filter_is_literal() {
    let app = setup().await;
    let admin = app.sign_in_admin().await;
    app.seed_catalog(&admin).await;

    let body = app
        .server
        .get("/api/v1/titles")
        .add_query_param("name", "%")
        .await
        .json::<Value>();
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn test_reviews_update_rating() {
    let app = setup().await;
    let admin = app.sign_in_admin().await;
    let title_id = app.seed_catalog(&admin).await;
    let alice = app.sign_in("alice").await;
    let bob = app.sign_in("bob").await;

    let first = app.post_review(&alice, title_id, 8).await;
    assert_eq!(first.status_code(), StatusCode::CREATED);
    assert_eq!(first.json::<Value>()["author"], "alice");
    assert_eq!(first.json::<Value>()["title"], title_id);

    assert_eq!(app.post_review(&bob, title_id, 7).await.status_code(), StatusCode::CREATED);

    let title = app
        .server
        .get(&format!("/api/v1/titles/{}", title_id))
        .await
        .json::<Value>();
    assert_eq!(title["rating"], 8);

    let duplicate = app.post_review(&alice, title_id, 1).await;
    assert_eq!(duplicate.status_code(), StatusCode::BAD_REQUEST);

    let out_of_range = app.post_review(&admin, title_id, 11).await;
    assert_eq!(out_of_range.status_code(), StatusCode::BAD_REQUEST);

    let anonymous = app
        .server
        .post(&format!("/api/v1/titles/{}/reviews", title_id))
        .json(&json!({"text": "x", "score": 5}))
        .await;
    assert_eq!(anonymous.status_code(), StatusCode::UNAUTHORIZED);

    let page = app
        .server
        .get(&format!("/api/v1/titles/{}/reviews", title_id))
        .await
        .json::<Value>();
    assert_eq!(page["count"], 2);

    let missing_title = app.post_review(&alice, 999, 5).await;
    assert_eq!(missing_title.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_review_object_permissions() {
    let app = setup().await;
    let admin = app.sign_in_admin().await;
    let title_id = app.seed_catalog(&admin).await;
    let alice = app.sign_in("alice").await;
    let bob = app.sign_in("bob").await;
    let moderator = app.sign_in_moderator(&admin, "mod").await;

    let review_id = app.post_review(&alice, title_id, 9).await.json::<Value>()["id"]
        .as_i64()
        .unwrap();
    let path = format!("/api/v1/titles/{}/reviews/{}", title_id, review_id);

    let by_other = app
        .server
        .patch(&path)
        .authorization_bearer(&bob)
        .json(&json!({"score": 1}))
        .await;
    assert_eq!(by_other.status_code(), StatusCode::FORBIDDEN);

    let by_moderator = app
        .server
        .patch(&path)
        .authorization_bearer(&moderator)
        .json(&json!({"score": 3}))
        .await;
    by_moderator.assert_status_ok();
    assert_eq!(by_moderator.json::<Value>()["score"], 3);
    assert_eq!(by_moderator.json::<Value>()["author"], "alice");

    let title = app
        .server
        .get(&format!("/api/v1/titles/{}", title_id))
        .await
        .json::<Value>();
    assert_eq!(title["rating"], 3);

    let anonymous = app.server.delete(&path).await;
    assert_eq!(anonymous.status_code(), StatusCode::UNAUTHORIZED);

    let by_author = app.server.delete(&path).authorization_bearer(&alice).await;
    assert_eq!(by_author.status_code(), StatusCode::NO_CONTENT);

    let title = app
        .server
        .get(&format!("/api/v1/titles/{}", title_id))
        .await
        .json::<Value>();
    assert_eq!(title["rating"], Value::Null);
}

#[tokio::test]
async fn test_comments_are_scoped_to_review() {
    let app = setup().await;
    let admin = app.sign_in_admin().await;
    let title_id = app.seed_catalog(&admin).await;
    let alice = app.sign_in("alice").await;
    let bob = app.sign_in("bob").await;

    let review_id = app.post_review(&alice, title_id, 9).await.json::<Value>()["id"]
        .as_i64()
        .unwrap();
    let comments = format!("/api/v1/titles/{}/reviews/{}/comments", title_id, review_id);

    let anonymous = app.server.post(&comments).json(&json!({"text": "Hi"})).await;
    assert_eq!(anonymous.status_code(), StatusCode::UNAUTHORIZED);

    let created = app
        .server
        .post(&comments)
        .authorization_bearer(&bob)
        .json(&json!({"text": "Agreed"}))
        .await;
    assert_eq!(created.status_code(), StatusCode::CREATED);
    let comment = created.json::<Value>();
    assert_eq!(comment["author"], "bob");
    assert_eq!(comment["review"], review_id);
    let comment_path = format!("{}/{}", comments, comment["id"]);

    let by_review_author = app
        .server
        .patch(&comment_path)
        .authorization_bearer(&alice)
        .json(&json!({"text": "Edited"}))
        .await;
    assert_eq!(by_review_author.status_code(), StatusCode::FORBIDDEN);

    let by_admin = app
        .server
        .patch(&comment_path)
        .authorization_bearer(&admin)
        .json(&json!({"text": "Moderated"}))
        .await;
    by_admin.assert_status_ok();

    let wrong_title = app
        .server
        .get(&format!("/api/v1/titles/{}/reviews/{}/comments", title_id + 1, review_id))
        .await;
    assert_eq!(wrong_title.status_code(), StatusCode::NOT_FOUND);

    let page = app.server.get(&comments).await.json::<Value>();
    assert_eq!(page["count"], 1);
    assert_eq!(page["results"][0]["text"], "Moderated");
}

#[tokio::test]
async fn test_user_management_is_admin_only() {
    let app = setup().await;
    let admin = app.sign_in_admin().await;
    let alice = app.sign_in("alice").await;

    let anonymous = app.server.get("/api/v1/users").await;
    assert_eq!(anonymous.status_code(), StatusCode::UNAUTHORIZED);

    let regular = app.server.get("/api/v1/users").authorization_bearer(&alice).await;
    assert_eq!(regular.status_code(), StatusCode::FORBIDDEN);

    let created = app
        .server
        .post("/api/v1/users")
        .authorization_bearer(&admin)
        .json(&json!({"username": "dave", "email": "dave@example.com", "role": "moderator"}))
        .await;
    assert_eq!(created.status_code(), StatusCode::CREATED);
    assert_eq!(created.json::<Value>()["role"], "moderator");

    let page = app
        .server
        .get("/api/v1/users")
        .authorization_bearer(&admin)
        .add_query_param("search", "da")
        .await
        .json::<Value>();
    assert_eq!(page["count"], 1);
    assert_eq!(page["results"][0]["username"], "dave");

    let fetched = app.server.get("/api/v1/users/dave").authorization_bearer(&admin).await;
    fetched.assert_status_ok();
    assert!(fetched.json::<Value>().get("confirmation_code").is_none());

    let deleted = app.server.delete("/api/v1/users/dave").authorization_bearer(&admin).await;
    assert_eq!(deleted.status_code(), StatusCode::NO_CONTENT);

    let gone = app.server.get("/api/v1/users/dave").authorization_bearer(&admin).await;
    assert_eq!(gone.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deleting_reviewer_refreshes_rating() {
    let app = setup().await;
    let admin = app.sign_in_admin().await;
    let title_id = app.seed_catalog(&admin).await;
    let alice = app.sign_in("alice").await;
    let bob = app.sign_in("bob").await;
    app.post_review(&alice, title_id, 10).await;
    app.post_review(&bob, title_id, 4).await;

    let title_path = format!("/api/v1/titles/{}", title_id);
    assert_eq!(app.server.get(&title_path).await.json::<Value>()["rating"], 7);

    let deleted = app.server.delete("/api/v1/users/alice").authorization_bearer(&admin).await;
    assert_eq!(deleted.status_code(), StatusCode::NO_CONTENT);

    assert_eq!(app.server.get(&title_path).await.json::<Value>()["rating"], 4);

    // The deleted account's token no longer authenticates
    let me = app.server.get("/api/v1/users/me").authorization_bearer(&alice).await;
    assert_eq!(me.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_self_edit_cannot_change_role() {
    let app = setup().await;
    let alice = app.sign_in("alice").await;

    let response = app
        .server
        .patch("/api/v1/users/me")
        .authorization_bearer(&alice)
        .json(&json!({"bio": "Film buff", "role": "admin"}))
        .await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["bio"], "Film buff");
    assert_eq!(body["role"], "user");

    let anonymous = app.server.get("/api/v1/users/me").await;
    assert_eq!(anonymous.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_token_is_anonymous() {
    let app = setup().await;

    let response = app
        .server
        .post("/api/v1/genres")
        .authorization_bearer("not-a-real-token")
        .json(&json!({"name": "Drama", "slug": "drama"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    let reads = app
        .server
        .get("/api/v1/genres")
        .authorization_bearer("not-a-real-token")
        .await;
    reads.assert_status_ok();
}

#[tokio::test]
async fn test_unknown_route_uses_error_envelope() {
    let app = setup().await;

    let response = app.server.get("/api/v1/nothing-here").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(error_code(&response.json::<Value>()), "NOT_FOUND");
}
