use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use procura_api::config::AppConfig;
use procura_auth::{JwtClaims, PrincipalId, Role};
use procura_core::TenantId;
use reqwest::StatusCode;
use serde_json::{json, Value};

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(jwt_secret: &str) -> Self {
        // Same router as prod, in-memory stores, ephemeral port.
        let app = procura_api::app::build_app(&AppConfig::in_memory(jwt_secret))
            .await
            .expect("failed to build app");
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
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

fn mint_jwt(jwt_secret: &str, tenant_id: TenantId, roles: Vec<Role>) -> String {
    let now = Utc::now();
    let claims = JwtClaims {
        sub: PrincipalId::new(),
        tenant_id,
        roles,
        issued_at: now - ChronoDuration::seconds(5),
        expires_at: now + ChronoDuration::minutes(10),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

async fn send_json(
    client: &reqwest::Client,
    req: reqwest::RequestBuilder,
) -> (StatusCode, Value) {
    let res = client.execute(req.build().unwrap()).await.unwrap();
    let status = res.status();
    let body = res.json::<Value>().await.unwrap_or(Value::Null);
    (status, body)
}

/// Project `code` with an allowance in minor units.
async fn seed(
    srv: &TestServer,
    client: &reqwest::Client,
    token: &str,
    code: &str,
    allowance: i64,
) {
    let (status, _) = send_json(
        client,
        client
            .post(srv.url("/projects"))
            .bearer_auth(token)
            .json(&json!({
                "name": format!("Project {code}"),
                "code": code,
                "label": "it",
                "purchase_allowance": allowance,
            })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

async fn priced_line(
    srv: &TestServer,
    client: &reqwest::Client,
    token: &str,
    unit_price: i64,
    quantity: u32,
) -> Value {
    let product_id = uuid::Uuid::now_v7().to_string();
    let vendor_id = uuid::Uuid::now_v7().to_string();
    let (status, _) = send_json(
        client,
        client
            .put(srv.url("/catalog/prices"))
            .bearer_auth(token)
            .json(&json!({
                "product_id": product_id,
                "vendor_id": vendor_id,
                "unit_price": unit_price,
            })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    json!({ "product_id": product_id, "vendor_id": vendor_id, "quantity": quantity })
}

async fn create_requisition(
    srv: &TestServer,
    client: &reqwest::Client,
    token: &str,
    code: &str,
    lines: Vec<Value>,
) -> String {
    let (status, body) = send_json(
        client,
        client
            .post(srv.url("/requisitions"))
            .bearer_auth(token)
            .json(&json!({
                "name": "Laptops",
                "priority": "HIGH",
                "project_code": code,
                "target_date": "01-06-2026",
                "due_date": "15-06-2026",
                "lines": lines,
            })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "body={body}");
    assert_eq!(body["status"], "DRAFT");
    body["id"].as_str().unwrap().to_string()
}

async fn post_status(
    srv: &TestServer,
    client: &reqwest::Client,
    token: &str,
    id: &str,
    status: &str,
) -> (StatusCode, Value) {
    send_json(
        client,
        client
            .post(srv.url(&format!("/requisitions/{id}/set-status")))
            .bearer_auth(token)
            .json(&json!({ "status": status })),
    )
    .await
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn("test-secret").await;
    let res = reqwest::get(srv.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/whoami")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let forged = mint_jwt("other-secret", TenantId::new(), vec![Role::MANAGER]);
    let res = client
        .get(srv.url("/projects"))
        .bearer_auth(forged)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn tenant_context_is_derived_from_token() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;

    let tenant_id = TenantId::new();
    let token = mint_jwt(jwt_secret, tenant_id, vec![Role::MANAGER]);

    let client = reqwest::Client::new();
    let (status, body) = send_json(&client, client.get(srv.url("/whoami")).bearer_auth(token)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tenant_id"].as_str().unwrap(), tenant_id.to_string());
    assert!(body["roles"].as_array().unwrap().iter().any(|r| r == "MANAGER"));
}

#[tokio::test]
async fn requisition_lifecycle_commits_budget() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let token = mint_jwt(jwt_secret, TenantId::new(), vec![Role::MANAGER]);
    let client = reqwest::Client::new();

    seed(&srv, &client, &token, "OPS", 100_000).await;
    let line = priced_line(&srv, &client, &token, 20_000, 3).await;
    let id = create_requisition(&srv, &client, &token, "OPS", vec![line]).await;

    // Completion before approval is refused.
    let (status, body) = post_status(&srv, &client, &token, &id, "COMPLETED").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "not_approved");

    let (status, _) = post_status(&srv, &client, &token, &id, "WAITING_TO_APPROVAL").await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send_json(
        &client,
        client
            .post(srv.url(&format!("/requisitions/{id}/approve")))
            .bearer_auth(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].is_string());

    let (status, _) = post_status(&srv, &client, &token, &id, "COMPLETED").await;
    assert_eq!(status, StatusCode::OK);

    let (status, project) =
        send_json(&client, client.get(srv.url("/projects/OPS")).bearer_auth(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(project["current_purchase"], 60_000);
    assert_eq!(project["purchase_count"], 1);
    assert_eq!(project["is_default"], true);

    let (status, details) = send_json(
        &client,
        client
            .get(srv.url(&format!("/requisitions/{id}")))
            .bearer_auth(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(details["status"], "COMPLETED");
    assert_eq!(details["total"], 60_000);
    assert_eq!(details["due_date"], "15-06-2026");
}

#[tokio::test]
async fn completion_over_allowance_is_rejected() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let token = mint_jwt(jwt_secret, TenantId::new(), vec![Role::MANAGER]);
    let client = reqwest::Client::new();

    seed(&srv, &client, &token, "LAB", 1_000).await;
    let line = priced_line(&srv, &client, &token, 1_500, 1).await;
    let id = create_requisition(&srv, &client, &token, "LAB", vec![line]).await;

    post_status(&srv, &client, &token, &id, "WAITING_TO_APPROVAL").await;
    client
        .post(srv.url(&format!("/requisitions/{id}/approve")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();

    let (status, body) = post_status(&srv, &client, &token, &id, "COMPLETED").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "budget_exceeded");

    let (_, project) =
        send_json(&client, client.get(srv.url("/projects/LAB")).bearer_auth(&token)).await;
    assert_eq!(project["current_purchase"], 0);
}

#[tokio::test]
async fn reject_requires_comment() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let token = mint_jwt(jwt_secret, TenantId::new(), vec![Role::SUPERVISOR]);
    let client = reqwest::Client::new();

    // Supervisors cannot create projects.
    let (status, _) = send_json(
        &client,
        client
            .post(srv.url("/projects"))
            .bearer_auth(&token)
            .json(&json!({"name": "X", "code": "X", "purchase_allowance": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send_json(
        &client,
        client
            .post(srv.url(&format!("/requisitions/{}/reject", uuid::Uuid::now_v7())))
            .bearer_auth(&token)
            .json(&json!({ "comment": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn rejected_requisition_is_cancelled_and_listed() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let token = mint_jwt(jwt_secret, TenantId::new(), vec![Role::ADMINISTRATOR]);
    let client = reqwest::Client::new();

    seed(&srv, &client, &token, "OPS", 10_000).await;
    let id = create_requisition(&srv, &client, &token, "OPS", vec![]).await;

    let (status, _) = send_json(
        &client,
        client
            .post(srv.url(&format!("/requisitions/{id}/reject")))
            .bearer_auth(&token)
            .json(&json!({ "comment": "budget too high" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // The list comes from the read model; poll until it catches up.
    for _ in 0..50 {
        let (status, body) =
            send_json(&client, client.get(srv.url("/requisitions")).bearer_auth(&token)).await;
        assert_eq!(status, StatusCode::OK);
        if let Some(row) = body["items"].as_array().and_then(|items| items.first()) {
            if row["status"] == "CANCELLED" {
                assert_eq!(row["is_rejected"], true);
                return;
            }
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    panic!("rejection did not reach the read model within timeout");
}

#[tokio::test]
async fn comments_flow() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let token = mint_jwt(jwt_secret, TenantId::new(), vec![Role::MANAGER]);
    let client = reqwest::Client::new();

    seed(&srv, &client, &token, "OPS", 10_000).await;
    let id = create_requisition(&srv, &client, &token, "OPS", vec![]).await;

    let (status, comment) = send_json(
        &client,
        client
            .post(srv.url(&format!("/requisitions/{id}/comments")))
            .bearer_auth(&token)
            .json(&json!({ "content": "please hurry" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let comment_id = comment["id"].as_str().unwrap().to_string();

    let (status, edited) = send_json(
        &client,
        client
            .patch(srv.url(&format!("/requisitions/{id}/comments/{comment_id}")))
            .bearer_auth(&token)
            .json(&json!({ "content": "please hurry, really" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(edited["is_updated"], true);

    let (status, listed) = send_json(
        &client,
        client
            .get(srv.url(&format!("/requisitions/{id}/comments")))
            .bearer_auth(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["items"].as_array().unwrap().len(), 1);

    let (status, _) = send_json(
        &client,
        client
            .delete(srv.url(&format!("/requisitions/{id}/comments/{comment_id}")))
            .bearer_auth(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn default_project_cannot_be_deleted_while_others_remain() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let token = mint_jwt(jwt_secret, TenantId::new(), vec![Role::MANAGER]);
    let client = reqwest::Client::new();

    seed(&srv, &client, &token, "MAIN", 1_000).await;
    seed(&srv, &client, &token, "SIDE", 1_000).await;

    let (status, body) = send_json(
        &client,
        client.delete(srv.url("/projects/MAIN")).bearer_auth(&token),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, _) = send_json(
        &client,
        client.delete(srv.url("/projects/SIDE")).bearer_auth(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send_json(
        &client,
        client.get(srv.url("/projects/SIDE")).bearer_auth(&token),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send_json(
        &client,
        client.delete(srv.url("/projects/MAIN")).bearer_auth(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) =
        send_json(&client, client.get(srv.url("/projects")).bearer_auth(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn viewers_cannot_write() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let token = mint_jwt(jwt_secret, TenantId::new(), vec![Role::VIEWER]);
    let client = reqwest::Client::new();

    let (status, body) = send_json(
        &client,
        client
            .put(srv.url("/catalog/prices"))
            .bearer_auth(&token)
            .json(&json!({
                "product_id": uuid::Uuid::now_v7().to_string(),
                "vendor_id": uuid::Uuid::now_v7().to_string(),
                "unit_price": 100,
            })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    let (status, _) =
        send_json(&client, client.get(srv.url("/projects")).bearer_auth(&token)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn tenant_isolation_blocks_cross_tenant_reads_and_writes() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let token1 = mint_jwt(jwt_secret, TenantId::new(), vec![Role::MANAGER]);
    let token2 = mint_jwt(jwt_secret, TenantId::new(), vec![Role::MANAGER]);
    let client = reqwest::Client::new();

    seed(&srv, &client, &token1, "OPS", 10_000).await;
    let id = create_requisition(&srv, &client, &token1, "OPS", vec![]).await;

    let (status, _) = send_json(
        &client,
        client
            .get(srv.url(&format!("/requisitions/{id}")))
            .bearer_auth(&token2),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = post_status(&srv, &client, &token2, &id, "READY").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) =
        send_json(&client, client.get(srv.url("/projects/OPS")).bearer_auth(&token2)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_input_is_a_bad_request() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let token = mint_jwt(jwt_secret, TenantId::new(), vec![Role::MANAGER]);
    let client = reqwest::Client::new();

    let (status, body) = send_json(
        &client,
        client
            .get(srv.url("/requisitions/not-a-uuid"))
            .bearer_auth(&token),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_id");

    seed(&srv, &client, &token, "OPS", 10_000).await;
    let (status, body) = send_json(
        &client,
        client
            .post(srv.url("/requisitions"))
            .bearer_auth(&token)
            .json(&json!({
                "name": "Desks",
                "priority": "LOW",
                "project_code": "OPS",
                "target_date": "2026-06-01",
                "due_date": "15-06-2026",
            })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_date");
}
