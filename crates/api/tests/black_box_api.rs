use std::sync::Arc;

use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use habitlog_api::app::services::AppServices;
use habitlog_auth::{Claims, Hs256Jwt, PasswordHasher};
use habitlog_core::{FixedClock, UserId};
use habitlog_infra::images::InMemoryImageHost;
use habitlog_infra::store::InMemoryStore;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde_json::{json, Value};

const JWT_SECRET: &str = "test-secret";

/// 2025-01-15 is a Wednesday (ISO weekday 3).
fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
}

struct TestServer {
    base_url: String,
    images: Arc<InMemoryImageHost>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        Self::spawn_with_images(Arc::new(InMemoryImageHost::new())).await
    }

    async fn spawn_with_images(images: Arc<InMemoryImageHost>) -> Self {
        // Same router as prod, in-memory backends, bound to an ephemeral port.
        let services = Arc::new(AppServices {
            store: InMemoryStore::arc(),
            images: images.clone(),
            tokens: Arc::new(Hs256Jwt::new(JWT_SECRET)),
            hasher: PasswordHasher::new(4).unwrap(),
            clock: Arc::new(FixedClock(today())),
        });
        let app = habitlog_api::app::build_app(services);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            images,
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(user_id: UserId, expires_in: ChronoDuration) -> String {
    let now = Utc::now();
    let claims = Claims {
        user_id,
        iat: now.timestamp(),
        exp: (now + expires_in).timestamp(),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

async fn signup(client: &reqwest::Client, srv: &TestServer, email: &str) -> reqwest::Response {
    client
        .post(srv.url("/api/signup"))
        .json(&json!({"name": "Ada", "email": email, "password": "secret123"}))
        .send()
        .await
        .unwrap()
}

/// Register and sign in, returning a bearer token.
async fn login(client: &reqwest::Client, srv: &TestServer, email: &str) -> String {
    assert_eq!(signup(client, srv, email).await.status(), StatusCode::CREATED);
    let res = client
        .post(srv.url("/api/signin"))
        .json(&json!({"email": email, "password": "secret123"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    body["result"].as_str().unwrap().to_string()
}

async fn create_goal(client: &reqwest::Client, srv: &TestServer, token: &str, body: Value) -> reqwest::Response {
    client
        .post(srv.url("/api/goals"))
        .bearer_auth(token)
        .json(&body)
        .send()
        .await
        .unwrap()
}

async fn create_goal_id(client: &reqwest::Client, srv: &TestServer, token: &str, weekdays: Value) -> i64 {
    let res = create_goal(
        client,
        srv,
        token,
        json!({"name": "Run", "description": "5k", "tags": ["health"], "weekdays": weekdays}),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    body["result"]["goal_id"].as_i64().unwrap()
}

fn image_form() -> Form {
    Form::new().part(
        "image",
        Part::bytes(vec![0x89, 0x50, 0x4e, 0x47]).file_name("proof.png"),
    )
}

async fn complete(
    client: &reqwest::Client,
    srv: &TestServer,
    token: &str,
    goal_id: i64,
    form: Form,
) -> reqwest::Response {
    client
        .post(srv.url(&format!("/api/goals/{goal_id}/activities")))
        .bearer_auth(token)
        .multipart(form)
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(srv.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    for path in ["/api/profile", "/api/goals", "/api/activities"] {
        let res = client.get(srv.url(path)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{path}");
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["error"], "unauthorized");
    }

    let expired = mint_jwt(UserId::new(), ChronoDuration::minutes(-10));
    let res = client
        .get(srv.url("/api/goals"))
        .bearer_auth(expired)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn signup_validates_input() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let cases = [
        json!({"name": "Ada", "email": "not-an-email", "password": "secret123"}),
        json!({"name": "Ada", "email": "ada@example.com", "password": "short"}),
        json!({"name": "Ada", "email": "ada@example.com", "password": "seventeen-chars!!"}),
        json!({"name": "  ", "email": "ada@example.com", "password": "secret123"}),
    ];
    for body in cases {
        let res = client
            .post(srv.url("/api/signup"))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{body}");
    }

    let res = client
        .post(srv.url("/api/signup"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn signup_then_duplicate_email_conflicts() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = signup(&client, &srv, "ada@example.com").await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["result"], json!({"email": "ada@example.com", "name": "Ada"}));
    assert!(body["message"].is_string());

    let res = signup(&client, &srv, "ada@example.com").await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn signin_issues_a_token_for_the_user() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = login(&client, &srv, "ada@example.com").await;

    let res = client
        .get(srv.url("/api/profile"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(
        body["result"],
        json!({"name": "Ada", "email": "ada@example.com", "profile_image": ""})
    );

    let wrong_password = client
        .post(srv.url("/api/signin"))
        .json(&json!({"email": "ada@example.com", "password": "wrong-pass"}))
        .send()
        .await
        .unwrap();
    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);

    let unknown = client
        .post(srv.url("/api/signin"))
        .json(&json!({"email": "nobody@example.com", "password": "secret123"}))
        .send()
        .await
        .unwrap();
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn profile_of_unknown_user_is_not_found() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(UserId::new(), ChronoDuration::minutes(10));

    let res = reqwest::Client::new()
        .get(srv.url("/api/profile"))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn profile_image_upload_and_url_update() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = login(&client, &srv, "ada@example.com").await;

    let res = client
        .post(srv.url("/api/profile"))
        .bearer_auth(&token)
        .multipart(image_form())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let url = body["result"]["profile_image"].as_str().unwrap().to_string();

    let uploads = srv.images.uploads();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].url, url);
    assert!(uploads[0].file_name.starts_with("avatar-"));
    assert!(uploads[0].file_name.ends_with(".png"));

    let res = client
        .post(srv.url("/api/profile"))
        .bearer_auth(&token)
        .json(&json!({"profile_image": "https://cdn.example.com/me.jpg"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let profile: Value = client
        .get(srv.url("/api/profile"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(profile["result"]["profile_image"], "https://cdn.example.com/me.jpg");

    let res = client
        .post(srv.url("/api/profile"))
        .bearer_auth(&token)
        .json(&json!({"profile_image": ""}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .post(srv.url("/api/profile"))
        .bearer_auth(&token)
        .multipart(Form::new().text("caption", "no file"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn profile_url_is_accepted_without_a_json_content_type() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = login(&client, &srv, "ada@example.com").await;

    for content_type in [None, Some("text/plain")] {
        let mut req = client
            .post(srv.url("/api/profile"))
            .bearer_auth(&token)
            .body(r#"{"profile_image": "https://cdn.example.com/raw.png"}"#);
        if let Some(ct) = content_type {
            req = req.header("content-type", ct);
        }
        let res = req.send().await.unwrap();
        assert_eq!(res.status(), StatusCode::OK, "content type {content_type:?}");
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["result"]["profile_image"], "https://cdn.example.com/raw.png");
    }

    let res = client
        .post(srv.url("/api/profile"))
        .bearer_auth(&token)
        .body("not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_payload");
}

#[tokio::test]
async fn goal_crud_lifecycle() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = login(&client, &srv, "ada@example.com").await;

    let goal_id = create_goal_id(&client, &srv, &token, json!([5, 1, 3])).await;

    let body: Value = client
        .get(srv.url("/api/goals"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        body["result"],
        json!([{
            "goal_id": goal_id,
            "name": "Run",
            "description": "5k",
            "tags": ["health"],
            "weekdays": [1, 3, 5],
        }])
    );

    let res = client
        .put(srv.url(&format!("/api/goals/{goal_id}")))
        .bearer_auth(&token)
        .json(&json!({"name": "Swim", "description": "", "tags": ["b", "a"], "weekdays": [7]}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = client
        .get(srv.url("/api/goals"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["result"][0]["name"], "Swim");
    assert_eq!(body["result"][0]["tags"], json!(["a", "b"]));
    assert_eq!(body["result"][0]["weekdays"], json!([7]));

    let res = client
        .delete(srv.url(&format!("/api/goals/{goal_id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .delete(srv.url(&format!("/api/goals/{goal_id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .delete(srv.url("/api/goals/abc"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn goal_validation_caps_tags_and_weekdays() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = login(&client, &srv, "ada@example.com").await;

    let six_tags = json!({"name": "Run", "tags": ["a", "b", "c", "d", "e", "f"], "weekdays": [1]});
    assert_eq!(
        create_goal(&client, &srv, &token, six_tags).await.status(),
        StatusCode::BAD_REQUEST
    );

    let five_tags = json!({"name": "Run", "tags": ["a", "b", "c", "d", "e"], "weekdays": [1]});
    assert_eq!(
        create_goal(&client, &srv, &token, five_tags).await.status(),
        StatusCode::CREATED
    );

    let bad_day = json!({"name": "Run", "weekdays": [0]});
    assert_eq!(
        create_goal(&client, &srv, &token, bad_day).await.status(),
        StatusCode::BAD_REQUEST
    );

    let no_name = json!({"name": "", "weekdays": [1]});
    assert_eq!(
        create_goal(&client, &srv, &token, no_name).await.status(),
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn other_users_cannot_modify_goals() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let owner = login(&client, &srv, "owner@example.com").await;
    let intruder = login(&client, &srv, "intruder@example.com").await;
    let goal_id = create_goal_id(&client, &srv, &owner, json!([3])).await;

    let res = client
        .put(srv.url(&format!("/api/goals/{goal_id}")))
        .bearer_auth(&intruder)
        .json(&json!({"name": "Mine", "weekdays": [1]}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = complete(&client, &srv, &intruder, goal_id, image_form()).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let body: Value = client
        .get(srv.url("/api/goals"))
        .bearer_auth(&intruder)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["result"], json!([]));
}

#[tokio::test]
async fn listings_keep_order_and_stay_per_user() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let ada = login(&client, &srv, "ada@example.com").await;
    let bob = login(&client, &srv, "bob@example.com").await;

    let mut ids = Vec::new();
    for name in ["Zumba", "Archery", "Maths"] {
        let res = create_goal(
            &client,
            &srv,
            &ada,
            json!({"name": name, "description": "", "tags": [], "weekdays": [3]}),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = res.json().await.unwrap();
        ids.push(body["result"]["goal_id"].as_i64().unwrap());
    }
    let bobs_goal = create_goal_id(&client, &srv, &bob, json!([3])).await;

    let body: Value = client
        .get(srv.url("/api/goals"))
        .bearer_auth(&ada)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let names: Vec<&str> = body["result"]
        .as_array()
        .unwrap()
        .iter()
        .map(|g| g["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Zumba", "Archery", "Maths"]);

    // Archery is completed before Zumba on the same day.
    for goal in [ids[1], ids[0]] {
        assert_eq!(complete(&client, &srv, &ada, goal, image_form()).await.status(), StatusCode::OK);
    }
    assert_eq!(complete(&client, &srv, &bob, bobs_goal, image_form()).await.status(), StatusCode::OK);

    let activity_names = |body: Value| -> Vec<String> {
        body["result"]["result"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["name"].as_str().unwrap().to_string())
            .collect()
    };
    let ada_log: Value = client
        .get(srv.url("/api/activities"))
        .bearer_auth(&ada)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(activity_names(ada_log), ["Archery", "Zumba"]);

    let bob_log: Value = client
        .get(srv.url("/api/activities"))
        .bearer_auth(&bob)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(activity_names(bob_log), ["Run"]);
}

#[tokio::test]
async fn activity_completion_rules() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = login(&client, &srv, "ada@example.com").await;
    let wednesday_goal = create_goal_id(&client, &srv, &token, json!([3])).await;
    let monday_goal = create_goal_id(&client, &srv, &token, json!([1])).await;

    assert_eq!(
        complete(&client, &srv, &token, 9999, image_form()).await.status(),
        StatusCode::NOT_FOUND
    );

    let res = client
        .post(srv.url(&format!("/api/goals/{wednesday_goal}/activities")))
        .bearer_auth(&token)
        .json(&json!({"note": "not multipart"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let yesterday = image_form().text("date", "2025-01-14");
    assert_eq!(
        complete(&client, &srv, &token, wednesday_goal, yesterday).await.status(),
        StatusCode::BAD_REQUEST
    );

    assert_eq!(
        complete(&client, &srv, &token, monday_goal, image_form()).await.status(),
        StatusCode::BAD_REQUEST
    );

    let no_image = Form::new().text("note", "forgot the photo");
    assert_eq!(
        complete(&client, &srv, &token, wednesday_goal, no_image).await.status(),
        StatusCode::BAD_REQUEST
    );

    let ok = image_form().text("date", "2025-01-15").text("note", "felt good");
    assert_eq!(
        complete(&client, &srv, &token, wednesday_goal, ok).await.status(),
        StatusCode::OK
    );

    assert_eq!(
        complete(&client, &srv, &token, wednesday_goal, image_form()).await.status(),
        StatusCode::CONFLICT
    );

    let res = client
        .get(srv.url("/api/activities"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let log = body["result"]["result"].as_array().unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0]["name"], "Run");
    assert_eq!(log[0]["date"], "2025-01-15");
    assert_eq!(log[0]["note"], "felt good");
    assert!(log[0]["image"].as_str().unwrap().starts_with("memory://"));
    assert!(body["result"]["id"].is_string());
}

#[tokio::test]
async fn failed_upload_is_a_server_error() {
    let srv = TestServer::spawn_with_images(Arc::new(InMemoryImageHost::failing())).await;
    let client = reqwest::Client::new();
    let token = login(&client, &srv, "ada@example.com").await;
    let goal_id = create_goal_id(&client, &srv, &token, json!([3])).await;

    let res = complete(&client, &srv, &token, goal_id, image_form()).await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = client
        .get(srv.url("/api/activities"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["result"]["result"], json!([]));
}
