use chrono::{Duration as ChronoDuration, Utc};
use itrax_api::{app::build_app, config::AppConfig};
use itrax_auth::{Role, TokenClaims, TokenKind};
use itrax_core::{OrgId, RecordId};
use itrax_infra::{BackendMode, Stores};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::{StatusCode, header};
use serde_json::{Value, json};

const JWT_SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        let config = AppConfig {
            port: 0,
            mongo_uri: String::new(),
            mongo_db: String::new(),
            store_backend: BackendMode::Memory,
            jwt_secret: JWT_SECRET.to_string(),
            jwt_refresh_secret: format!("{JWT_SECRET}_refresh"),
            default_org_id: OrgId::new(),
            client_url: "http://localhost:5173".to_string(),
            production: false,
            bcrypt_cost: 4,
        };

        // Build app (same router as prod), but bind to an ephemeral port.
        let app = build_app(config, Stores::in_memory());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn signup(&self, first_name: &str, email: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/auth/signup"))
            .json(&json!({
                "firstName": first_name,
                "lastName": "Tester",
                "email": email,
                "password": "hunter22",
            }))
            .send()
            .await
            .unwrap()
    }

    /// Sign up and return the access token.
    async fn token_for(&self, first_name: &str, email: &str) -> String {
        let res = self.signup(first_name, email).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = res.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }

    async fn send(&self, req: reqwest::RequestBuilder, token: &str) -> (StatusCode, Value) {
        let res = req.bearer_auth(token).send().await.unwrap();
        let status = res.status();
        let body = res.json().await.unwrap_or(Value::Null);
        (status, body)
    }

    async fn get(&self, path: &str, token: &str) -> (StatusCode, Value) {
        self.send(self.client.get(self.url(path)), token).await
    }

    async fn post(&self, path: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(self.client.post(self.url(path)).json(&body), token).await
    }

    async fn patch(&self, path: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(self.client.patch(self.url(path)).json(&body), token).await
    }

    async fn put(&self, path: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(self.client.put(self.url(path)).json(&body), token).await
    }

    async fn delete(&self, path: &str, token: &str) -> (StatusCode, Value) {
        self.send(self.client.delete(self.url(path)), token).await
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(secret: &str, user: RecordId, org_id: OrgId, role: Role) -> String {
    let now = Utc::now();
    let claims = TokenClaims {
        sub: user,
        org_id,
        role,
        kind: TokenKind::Access,
        iat: now.timestamp(),
        exp: (now + ChronoDuration::minutes(10)).timestamp(),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

fn widget_order() -> Value {
    json!({
        "assetName": "Widget",
        "quantity": 3,
        "supplier": "Acme",
        "estimatedDelivery": "2025-01-01",
        "currentLocation": "WH1",
    })
}

fn refresh_cookie(res: &reqwest::Response) -> Option<String> {
    res.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("refreshToken="))
        .map(|v| v.split(';').next().unwrap_or_default().to_string())
}

#[tokio::test]
async fn root_and_health_are_public() {
    let srv = TestServer::spawn().await;

    let res = srv.client.get(srv.url("/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "ok": true, "app": "ITraX API" }));

    let res = srv.client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["backend"], "memory");
}

#[tokio::test]
async fn first_signup_is_admin_and_later_ones_are_employees() {
    let srv = TestServer::spawn().await;

    let res = srv.signup("Ada", "ada@example.com").await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(refresh_cookie(&res).is_some());
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["user"]["role"], "ADMIN");
    assert_eq!(body["user"]["name"], "Ada Tester");
    assert!(body["user"].get("passwordHash").is_none());

    let res = srv.signup("Bob", "bob@example.com").await;
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["user"]["role"], "EMPLOYEE");

    let res = srv.signup("Bob", "BOB@example.com").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "User already exists");
}

#[tokio::test]
async fn login_checks_credentials() {
    let srv = TestServer::spawn().await;
    srv.token_for("Ada", "ada@example.com").await;

    let login = |password: &'static str| {
        srv.client
            .post(srv.url("/api/auth/login"))
            .json(&json!({ "email": "Ada@Example.com", "password": password }))
            .send()
    };

    let res = login("wrong-password").await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Invalid credentials");

    let res = login("hunter22").await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let token = body["token"].as_str().unwrap();

    let (status, me) = srv.get("/api/auth/me", token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["user"]["email"], "ada@example.com");
}

#[tokio::test]
async fn protected_endpoints_require_a_valid_token() {
    let srv = TestServer::spawn().await;

    let res = srv.client.get(srv.url("/api/orders")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let forged = mint_jwt("not-the-secret", RecordId::new(), OrgId::new(), Role::Admin);
    let (status, body) = srv.get("/api/orders", &forged).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid token");

    // Correctly signed, but nobody by that id exists.
    let ghost = mint_jwt(JWT_SECRET, RecordId::new(), OrgId::new(), Role::Admin);
    let (status, _) = srv.get("/api/orders", &ghost).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_routes_are_not_found() {
    let srv = TestServer::spawn().await;
    let res = srv.client.get(srv.url("/api/nope")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn employees_cannot_use_admin_routes() {
    let srv = TestServer::spawn().await;
    srv.token_for("Ada", "ada@example.com").await;
    let employee = srv.token_for("Bob", "bob@example.com").await;

    let (status, body) = srv.post("/api/orders", &employee, widget_order()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Forbidden");

    let (status, _) = srv.get("/api/admin/employees", &employee).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Reads stay open.
    let (status, _) = srv.get("/api/orders", &employee).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn order_lifecycle_tracks_every_status_change() {
    let srv = TestServer::spawn().await;
    let admin = srv.token_for("Ada", "ada@example.com").await;

    let (status, body) = srv.post("/api/orders", &admin, widget_order()).await;
    assert_eq!(status, StatusCode::CREATED);
    let order = &body["order"];
    assert_eq!(order["status"], "Ordered");
    assert_eq!(order["trackingHistory"].as_array().unwrap().len(), 1);
    assert!(order["orderId"].as_str().unwrap().starts_with("ORD-"));
    assert_eq!(order["createdBy"]["email"], "ada@example.com");
    let id = order["_id"].as_str().unwrap().to_string();

    let (status, body) = srv
        .patch(&format!("/api/orders/{id}/status"), &admin, json!({ "status": "Processing" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["order"]["status"], "Processing");

    let (status, body) = srv
        .patch(&format!("/api/orders/{id}/status"), &admin, json!({ "status": "Shipped" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["order"]["status"], "Shipped");
    let history = body["order"]["trackingHistory"].as_array().unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(history.last().unwrap()["stage"], "Shipped");

    for bad in [json!({ "status": "Teleported" }), json!({ "status": 7 }), json!({})] {
        let (status, _) = srv.patch(&format!("/api/orders/{id}/status"), &admin, bad).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    let (_, body) = srv.get(&format!("/api/orders/{id}"), &admin).await;
    assert_eq!(body["order"]["status"], "Shipped");
    assert_eq!(body["order"]["trackingHistory"].as_array().unwrap().len(), 3);

    // The creator hears about each stage.
    let (status, body) = srv.get("/api/notifications", &admin).await;
    assert_eq!(status, StatusCode::OK);
    let feed = body["data"].as_array().unwrap();
    assert_eq!(feed.len(), 2);
    let shipped = feed
        .iter()
        .find(|n| n["message"].as_str().unwrap().ends_with("is now Shipped"))
        .expect("no notification for the Shipped stage");
    assert_eq!(shipped["read"], false);

    let note = shipped["_id"].as_str().unwrap();
    let (status, body) = srv
        .patch(&format!("/api/notifications/{note}/read"), &admin, json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);

    let (status, body) = srv.delete(&format!("/api/orders/{id}"), &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Order deleted successfully");
    let (status, _) = srv.get(&format!("/api/orders/{id}"), &admin).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn order_validation_and_duplicate_ids() {
    let srv = TestServer::spawn().await;
    let admin = srv.token_for("Ada", "ada@example.com").await;

    let (status, body) = srv
        .post("/api/orders", &admin, json!({ "quantity": 0, "estimatedDelivery": "soon" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Validation error");
    assert!(body["errors"]["assetName"].is_string());
    assert!(body["errors"]["quantity"].is_string());

    let mut order = widget_order();
    order["orderId"] = json!("ORD-FIXED-1");
    let (status, _) = srv.post("/api/orders", &admin, order.clone()).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = srv.post("/api/orders", &admin, order).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Order ID already exists");

    let (_, body) = srv.get("/api/orders", &admin).await;
    assert_eq!(body["total"], 1);
}

#[tokio::test]
async fn order_export_has_a_line_per_order() {
    let srv = TestServer::spawn().await;
    let admin = srv.token_for("Ada", "ada@example.com").await;

    for _ in 0..3 {
        let (status, _) = srv.post("/api/orders", &admin, widget_order()).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let res = srv
        .client
        .get(srv.url("/api/orders/export/download"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()[header::CONTENT_TYPE], "text/csv");
    assert_eq!(
        res.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=orders-export.csv"
    );

    let csv = res.text().await.unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(
        lines[0],
        "orderId,assetName,quantity,supplier,orderDate,estimatedDelivery,currentLocation,status"
    );
}

#[tokio::test]
async fn refresh_and_logout_use_the_cookie() {
    let srv = TestServer::spawn().await;
    let res = srv.signup("Ada", "ada@example.com").await;
    let cookie = refresh_cookie(&res).unwrap();

    let res = srv.client.post(srv.url("/api/auth/refresh")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = srv
        .client
        .post(srv.url("/api/auth/refresh"))
        .header(header::COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert!(body["token"].is_string());

    let res = srv.client.post(srv.url("/api/auth/logout")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let cleared = res.headers()[header::SET_COOKIE].to_str().unwrap().to_string();
    assert!(cleared.contains("Max-Age=0"));
}

#[tokio::test]
async fn asset_crud_and_pagination() {
    let srv = TestServer::spawn().await;
    let admin = srv.token_for("Ada", "ada@example.com").await;

    for n in 0..3 {
        let (status, _) = srv
            .post(
                "/api/assets",
                &admin,
                json!({ "assetTag": format!("LAP-{n}"), "name": format!("Laptop {n}") }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = srv.post("/api/assets", &admin, json!({ "assetTag": "LAP-0" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Asset tag already exists");

    let (status, body) = srv.get("/api/assets?page=2&limit=2", &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["pagination"], json!({ "page": 2, "limit": 2, "total": 3, "pages": 2 }));

    let (_, body) = srv.get("/api/assets?search=lap-1", &admin).await;
    assert_eq!(body["pagination"]["total"], 1);
    let id = body["data"][0]["_id"].as_str().unwrap().to_string();

    let (status, body) = srv
        .put(
            &format!("/api/assets/{id}"),
            &admin,
            json!({ "assetTag": "LAP-1", "name": "Laptop 1", "assignedTo": "Bob Tester" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Assigned");

    let (status, _) = srv.delete(&format!("/api/assets/{id}"), &admin).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = srv.get(&format!("/api/assets/{id}"), &admin).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = srv.get("/api/assets/not-an-id", &admin).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn employees_carry_assignment_figures() {
    let srv = TestServer::spawn().await;
    let admin = srv.token_for("Ada", "ada@example.com").await;

    let (status, body) = srv
        .post(
            "/api/admin/employees",
            &admin,
            json!({ "firstName": "Cleo", "lastName": "Park", "email": "cleo@example.com" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["tempPassword"].as_str().unwrap().len() >= 8);
    assert_eq!(body["data"]["locationName"], "N/A");
    let id = body["data"]["_id"].as_str().unwrap().to_string();

    let (status, _) = srv
        .post("/api/assets", &admin, json!({ "assetTag": "PH-1", "assignedTo": "Cleo Park" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = srv.get("/api/admin/employees", &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["data"][0]["assignedAssets"], 1);

    let (status, body) = srv
        .post(
            "/api/admin/employees",
            &admin,
            json!({ "firstName": "Cleo", "lastName": "Again", "email": "cleo@example.com" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Email already exists");

    let (status, body) = srv.delete(&format!("/api/admin/employees/{id}"), &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Employee deleted successfully");
}

#[tokio::test]
async fn reports_summarize_by_status() {
    let srv = TestServer::spawn().await;
    let admin = srv.token_for("Ada", "ada@example.com").await;

    srv.post("/api/orders", &admin, widget_order()).await;
    srv.post("/api/orders", &admin, widget_order()).await;

    let (status, body) = srv.get("/api/reports/tracking", &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reportId"], "tracking-master");
    assert_eq!(body["summary"]["Ordered"], 2);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (_, body) = srv.get("/api/reports/assets?reportId=q3-audit", &admin).await;
    assert_eq!(body["reportId"], "q3-audit");
}

#[tokio::test]
async fn category_and_location_names_are_unique() {
    let srv = TestServer::spawn().await;
    let admin = srv.token_for("Ada", "ada@example.com").await;

    for (path, duplicate) in [
        ("/api/categories", "Category already exists"),
        ("/api/locations", "Location already exists"),
    ] {
        let (status, body) = srv.post(path, &admin, json!({ "name": "Head Office" })).await;
        assert_eq!(status, StatusCode::CREATED, "{path}");
        assert_eq!(body["name"], "Head Office");

        let (status, body) = srv.post(path, &admin, json!({ "name": "Head Office" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{path}");
        assert_eq!(body["message"], duplicate);
    }

    let (_, body) = srv.get("/api/categories", &admin).await;
    assert_eq!(body["pagination"]["total"], 1);
}

#[tokio::test]
async fn catalogue_lists_share_the_pagination_envelope() {
    let srv = TestServer::spawn().await;
    let admin = srv.token_for("Ada", "ada@example.com").await;

    for name in ["Laptops", "Monitors", "Phones"] {
        let (status, _) = srv.post("/api/categories", &admin, json!({ "name": name })).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = srv.get("/api/categories?page=1&limit=2", &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["pagination"], json!({ "page": 1, "limit": 2, "total": 3, "pages": 2 }));

    let (status, body) = srv
        .get("/api/categories?page=9223372036854775807&limit=99999999999999999999", &admin)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].as_array().unwrap().is_empty());
    assert_eq!(body["pagination"]["page"], json!(9_223_372_036_854_775_807u64));
    assert_eq!(body["pagination"]["limit"], 100);
    assert_eq!(body["pagination"]["total"], 3);
}

#[tokio::test]
async fn inventory_items_carry_stock_figures() {
    let srv = TestServer::spawn().await;
    let admin = srv.token_for("Ada", "ada@example.com").await;

    let (status, body) = srv
        .post(
            "/api/inventory",
            &admin,
            json!({ "name": "Toner", "quantity": 2, "reorderLevel": 5, "costPerItem": 10 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["lowStock"], true);
    assert_eq!(body["totalValue"], 20.0);

    let (_, body) = srv.get("/api/inventory", &admin).await;
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["data"][0]["lowStock"], true);

    let (status, body) = srv
        .post("/api/inventory", &admin, json!({ "name": "Paper", "quantity": 1e30 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"]["quantity"], "Quantity is too large");
}

#[tokio::test]
async fn license_status_follows_the_expiration_date() {
    let srv = TestServer::spawn().await;
    let admin = srv.token_for("Ada", "ada@example.com").await;

    let (status, body) = srv
        .post(
            "/api/licenses",
            &admin,
            json!({ "name": "Office", "licenseKey": "K-1", "expirationDate": "2020-01-01", "status": "Active" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "Expired");
    let id = body["_id"].as_str().unwrap().to_string();

    let (status, _) = srv
        .post("/api/licenses", &admin, json!({ "name": "IDE", "licenseKey": "K-2" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = srv.get(&format!("/api/licenses/{id}"), &admin).await;
    assert_eq!(body["status"], "Expired");

    let (_, body) = srv.get("/api/licenses?status=Expired", &admin).await;
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["data"][0]["name"], "Office");

    let (_, body) = srv.get("/api/licenses?status=Active", &admin).await;
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["data"][0]["name"], "IDE");

    let (_, body) = srv.get("/api/licenses?status=Lapsed", &admin).await;
    assert_eq!(body["pagination"]["total"], 0);
}

#[tokio::test]
async fn order_export_with_no_matches_is_just_the_header() {
    let srv = TestServer::spawn().await;
    let admin = srv.token_for("Ada", "ada@example.com").await;
    let (status, _) = srv.post("/api/orders", &admin, widget_order()).await;
    assert_eq!(status, StatusCode::CREATED);

    let res = srv
        .client
        .get(srv.url("/api/orders/export/download?search=nothing-matches"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let csv = res.text().await.unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines,
        ["orderId,assetName,quantity,supplier,orderDate,estimatedDelivery,currentLocation,status"]
    );
}
