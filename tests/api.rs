use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::{Value, json};
use tempfile::TempDir;

use localizard::server::{AppState, create_router};
use localizard::store::{SqliteStore, Store};

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    _temp_dir: TempDir,
}

impl TestServer {
    async fn start() -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let store = SqliteStore::new(temp_dir.path().join("localizard.db")).expect("open store");
        store.initialize().expect("initialize store");

        let state = Arc::new(AppState {
            store: Arc::new(store),
        });
        let app = create_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });

        Self {
            base_url: format!("http://{addr}"),
            client: reqwest::Client::new(),
            _temp_dir: temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn register(&self, email: &str) -> String {
        let resp: Value = self
            .client
            .post(self.url("/api/v1/auth/register"))
            .json(&json!({ "email": email, "password": "hunter42" }))
            .send()
            .await
            .expect("register")
            .json()
            .await
            .expect("parse register response");
        resp["data"]["token"].as_str().expect("token").to_string()
    }

    async fn create_project(&self, token: &str, name: &str) {
        let resp = self
            .client
            .post(self.url("/api/v1/projects"))
            .bearer_auth(token)
            .json(&json!({ "name": name }))
            .send()
            .await
            .expect("create project");
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    async fn create_locale(&self, token: &str, project: &str, name: &str) -> String {
        let resp: Value = self
            .client
            .post(self.url(&format!("/api/v1/projects/{project}/locales")))
            .bearer_auth(token)
            .json(&json!({ "name": name }))
            .send()
            .await
            .expect("create locale")
            .json()
            .await
            .expect("parse locale response");
        resp["data"]["id"].as_str().expect("locale id").to_string()
    }

    async fn create_label(&self, token: &str, project: &str, key: &str) -> String {
        let resp: Value = self
            .client
            .post(self.url(&format!("/api/v1/projects/{project}/labels")))
            .bearer_auth(token)
            .json(&json!({ "key": key }))
            .send()
            .await
            .expect("create label")
            .json()
            .await
            .expect("parse label response");
        resp["data"]["id"].as_str().expect("label id").to_string()
    }

    async fn put_translations(
        &self,
        token: &str,
        label_id: &str,
        translations: Value,
    ) -> Value {
        self.client
            .put(self.url(&format!("/api/v1/labels/{label_id}/translations")))
            .bearer_auth(token)
            .json(&json!({ "translations": translations }))
            .send()
            .await
            .expect("put translations")
            .json()
            .await
            .expect("parse upsert response")
    }

    async fn api_key(&self, token: &str, project: &str) -> String {
        let resp: Value = self
            .client
            .get(self.url(&format!("/api/v1/projects/{project}/api-key")))
            .bearer_auth(token)
            .send()
            .await
            .expect("get api key")
            .json()
            .await
            .expect("parse api key response");
        resp["data"]["key"].as_str().expect("key").to_string()
    }
}

/// Seeds the scenario used across the read tests: project `acme` with locales
/// `en` and `it`, label `greeting.hello` translated in `en` and left empty in
/// `it`. Returns (owner token, api key).
async fn seed_acme(server: &TestServer) -> (String, String) {
    let token = server.register("alice@example.com").await;
    server.create_project(&token, "acme").await;
    let en = server.create_locale(&token, "acme", "en").await;
    let it = server.create_locale(&token, "acme", "it").await;
    let label = server.create_label(&token, "acme", "greeting.hello").await;

    server
        .put_translations(
            &token,
            &label,
            json!([
                { "locale_id": en, "value": "Hello" },
                { "locale_id": it, "value": "" },
            ]),
        )
        .await;

    let key = server.api_key(&token, "acme").await;
    (token, key)
}

#[tokio::test]
async fn test_register_login_and_list_projects() {
    let server = TestServer::start().await;
    let token = server.register("alice@example.com").await;
    server.create_project(&token, "acme").await;

    // A second registration with the same email is a conflict.
    let resp = server
        .client
        .post(server.url("/api/v1/auth/register"))
        .json(&json!({ "email": "alice@example.com", "password": "hunter42" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let login: Value = server
        .client
        .post(server.url("/api/v1/auth/login"))
        .json(&json!({ "email": "alice@example.com", "password": "hunter42" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let login_token = login["data"]["token"].as_str().unwrap();

    let projects: Value = server
        .client
        .get(server.url("/api/v1/projects"))
        .bearer_auth(login_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let names: Vec<&str> = projects["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["acme"]);
}

#[tokio::test]
async fn test_login_failures_are_uniform() {
    let server = TestServer::start().await;
    server.register("alice@example.com").await;

    for (email, password) in [
        ("alice@example.com", "wrong-password"),
        ("nobody@example.com", "hunter42"),
    ] {
        let resp = server
            .client
            .post(server.url("/api/v1/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"], "invalid email or password");
    }
}

#[tokio::test]
async fn test_project_name_validation_and_conflict() {
    let server = TestServer::start().await;
    let alice = server.register("alice@example.com").await;
    let bob = server.register("bob@example.com").await;

    for bad in ["ab", "Acme", "acme.app"] {
        let resp = server
            .client
            .post(server.url("/api/v1/projects"))
            .bearer_auth(&alice)
            .json(&json!({ "name": bad }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "name: {bad}");
        let body: Value = resp.json().await.unwrap();
        assert!(body["field_errors"]["name"].is_string());
    }

    server.create_project(&alice, "acme").await;

    // Project names are global, so bob collides with alice.
    let resp = server
        .client
        .post(server.url("/api/v1/projects"))
        .bearer_auth(&bob)
        .json(&json!({ "name": "acme" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_label_key_conflicts() {
    let server = TestServer::start().await;
    let token = server.register("alice@example.com").await;
    server.create_project(&token, "acme").await;
    server.create_label(&token, "acme", "greeting.hello").await;

    // Duplicate key.
    let resp = server
        .client
        .post(server.url("/api/v1/projects/acme/labels"))
        .bearer_auth(&token)
        .json(&json!({ "key": "greeting.hello" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    // A key that is a dot-boundary prefix of an existing key.
    let resp = server
        .client
        .post(server.url("/api/v1/projects/acme/labels"))
        .bearer_auth(&token)
        .json(&json!({ "key": "greeting" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    // ...and one that extends an existing key.
    let resp = server
        .client
        .post(server.url("/api/v1/projects/acme/labels"))
        .bearer_auth(&token)
        .json(&json!({ "key": "greeting.hello.again" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    // Sharing a non-boundary prefix is fine.
    let resp = server
        .client
        .post(server.url("/api/v1/projects/acme/labels"))
        .bearer_auth(&token)
        .json(&json!({ "key": "greeting.hellos" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_public_api_flat_and_nested() {
    let server = TestServer::start().await;
    let (_token, key) = seed_acme(&server).await;

    let flat: Value = server
        .client
        .get(server.url("/api/v1/projects/acme?mode=flat"))
        .header("X-Api-Key", &key)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        flat["project"]["translations"],
        json!({ "en": { "greeting.hello": "Hello" }, "it": {} })
    );
    assert_eq!(flat["project"]["name"], "acme");
    assert!(flat["project"]["createdAt"].is_string());

    let nested: Value = server
        .client
        .get(server.url("/api/v1/projects/acme?mode=nested"))
        .header("X-Api-Key", &key)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        nested["project"]["translations"]["en"],
        json!({ "greeting": { "hello": "Hello" } })
    );
}

#[tokio::test]
async fn test_public_api_single_locale() {
    let server = TestServer::start().await;
    let (_token, key) = seed_acme(&server).await;

    let resp = server
        .client
        .get(server.url("/api/v1/projects/acme/en"))
        .header("X-Api-Key", &key)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()
            .get("Access-Control-Allow-Origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body["project"]["translations"],
        json!({ "greeting.hello": "Hello" })
    );

    // Known locale with no translations is an empty map, not an error.
    let body: Value = server
        .client
        .get(server.url("/api/v1/projects/acme/it"))
        .header("X-Api-Key", &key)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["project"]["translations"], json!({}));

    // Unknown locale is 404.
    let resp = server
        .client
        .get(server.url("/api/v1/projects/acme/xx"))
        .header("X-Api-Key", &key)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_access_control_outcomes() {
    let server = TestServer::start().await;
    let (token, key) = seed_acme(&server).await;

    // No credential at all: 401.
    let resp = server
        .client
        .get(server.url("/api/v1/projects/acme"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // Wrong key and nonexistent project are indistinguishable: 404.
    let wrong_key = server
        .client
        .get(server.url("/api/v1/projects/acme"))
        .header("X-Api-Key", "not-the-key")
        .send()
        .await
        .unwrap();
    let missing_project = server
        .client
        .get(server.url("/api/v1/projects/ghost"))
        .header("X-Api-Key", "not-the-key")
        .send()
        .await
        .unwrap();
    assert_eq!(wrong_key.status(), StatusCode::NOT_FOUND);
    assert_eq!(missing_project.status(), StatusCode::NOT_FOUND);

    // The right key and the owner session both succeed.
    for req in [
        server
            .client
            .get(server.url("/api/v1/projects/acme"))
            .header("X-Api-Key", &key),
        server
            .client
            .get(server.url("/api/v1/projects/acme"))
            .bearer_auth(&token),
    ] {
        assert_eq!(req.send().await.unwrap().status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn test_public_flag_allows_anonymous_reads() {
    let server = TestServer::start().await;
    let (token, _key) = seed_acme(&server).await;

    let resp = server
        .client
        .patch(server.url("/api/v1/projects/acme"))
        .bearer_auth(&token)
        .json(&json!({ "public": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = server
        .client
        .get(server.url("/api/v1/projects/acme"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // A wrong key is irrelevant once the project is public.
    let resp = server
        .client
        .get(server.url("/api/v1/projects/acme"))
        .header("X-Api-Key", "whatever")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_upsert_is_idempotent() {
    let server = TestServer::start().await;
    let token = server.register("alice@example.com").await;
    server.create_project(&token, "acme").await;
    let en = server.create_locale(&token, "acme", "en").await;
    let label = server.create_label(&token, "acme", "title").await;

    let updates = json!([{ "locale_id": en, "value": "Acme" }]);
    let first = server.put_translations(&token, &label, updates.clone()).await;
    assert_eq!(first["data"]["applied"], 1);

    let second = server.put_translations(&token, &label, updates).await;
    assert_eq!(second["data"]["applied"], 0);
}

#[tokio::test]
async fn test_rotate_api_key_invalidates_old_key() {
    let server = TestServer::start().await;
    let (token, old_key) = seed_acme(&server).await;

    let rotated: Value = server
        .client
        .post(server.url("/api/v1/projects/acme/api-key"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let new_key = rotated["data"]["key"].as_str().unwrap();
    assert_ne!(new_key, old_key);

    let resp = server
        .client
        .get(server.url("/api/v1/projects/acme"))
        .header("X-Api-Key", &old_key)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = server
        .client
        .get(server.url("/api/v1/projects/acme"))
        .header("X-Api-Key", new_key)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_non_owner_dashboard_access_is_hidden() {
    let server = TestServer::start().await;
    let (alice, _key) = seed_acme(&server).await;
    let mallory = server.register("mallory@example.com").await;

    // Listing labels, mutating, and deleting all 404 for a non-owner.
    let resp = server
        .client
        .get(server.url("/api/v1/projects/acme/labels"))
        .bearer_auth(&mallory)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = server
        .client
        .delete(server.url("/api/v1/projects/acme"))
        .bearer_auth(&mallory)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // Without any session the dashboard routes are 401.
    let resp = server
        .client
        .get(server.url("/api/v1/projects/acme/labels"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // The owner still sees everything.
    let resp = server
        .client
        .get(server.url("/api/v1/projects/acme/labels"))
        .bearer_auth(&alice)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_delete_locale_cascades_into_public_output() {
    let server = TestServer::start().await;
    let (token, key) = seed_acme(&server).await;

    let resp = server
        .client
        .delete(server.url("/api/v1/projects/acme/locales/en"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let body: Value = server
        .client
        .get(server.url("/api/v1/projects/acme"))
        .header("X-Api-Key", &key)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["project"]["translations"], json!({ "it": {} }));
}

#[tokio::test]
async fn test_logout_revokes_session() {
    let server = TestServer::start().await;
    let token = server.register("alice@example.com").await;

    let resp = server
        .client
        .delete(server.url("/api/v1/auth/session"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = server
        .client
        .get(server.url("/api/v1/projects"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
