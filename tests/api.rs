//! HTTP contract checks that never reach MongoDB: every request here is
//! answered by a guard, a validator or a catcher before the first query.

use evently_api::config::Config;
use evently_api::models::Role;
use evently_api::services::JwtService;
use evently_api::{build, db};
use mongodb::bson::oid::ObjectId;
use rocket::figment::Figment;
use rocket::figment::providers::Serialized;
use rocket::http::{ContentType, Header, Status};
use rocket::local::asynchronous::{Client, LocalResponse};
use serde_json::{Value, json};

fn figment() -> Figment {
    Config::figment()
        .merge(Serialized::global("mongo_uri", "mongodb://127.0.0.1:27017/evently_test"))
        .merge(Serialized::global("jwt_secret", "integration-test-secret"))
        .merge(Serialized::global("jwt_expires_in", "1h"))
        .merge(Serialized::global("log_level", "off"))
}

struct TestApp {
    client: Client,
    config: Config,
}

impl TestApp {
    async fn new() -> Self {
        let figment = figment();
        let config = Config::from_figment(&figment).expect("test config");

        // The driver connects lazily, so no server is needed until a query runs.
        let mongo = mongodb::Client::with_uri_str(&config.mongo_uri)
            .await
            .expect("mongo client");
        let database = db::database(&mongo, &config);

        let client = Client::tracked(build(figment).manage(database))
            .await
            .expect("valid rocket instance");

        TestApp { client, config }
    }

    fn token(&self, user_id: ObjectId, role: Role) -> Header<'static> {
        let token = JwtService::generate_access_token(&self.config, &user_id, role).unwrap();
        Header::new("Authorization", format!("Bearer {}", token))
    }

    fn bearer(&self, role: Role) -> Header<'static> {
        self.token(ObjectId::new(), role)
    }
}

async fn json_body(response: LocalResponse<'_>) -> Value {
    response.into_json::<Value>().await.expect("JSON body")
}

#[rocket::async_test]
async fn health_is_ok() {
    let app = TestApp::new().await;
    let response = app.client.get("/health").dispatch().await;

    assert_eq!(response.status(), Status::Ok);
    assert_eq!(json_body(response).await, json!({ "ok": true }));
}

#[rocket::async_test]
async fn missing_token_is_unauthorized() {
    let app = TestApp::new().await;
    let response = app.client.get("/api/auth/me").dispatch().await;

    assert_eq!(response.status(), Status::Unauthorized);
    assert_eq!(json_body(response).await, json!({ "error": "Missing token" }));
}

#[rocket::async_test]
async fn garbage_token_is_unauthorized() {
    let app = TestApp::new().await;
    let response = app
        .client
        .get("/api/auth/me")
        .header(Header::new("Authorization", "Bearer not.a.jwt"))
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::Unauthorized);
    assert_eq!(json_body(response).await["error"], "Invalid or expired token");
}

#[rocket::async_test]
async fn wrong_role_is_forbidden() {
    let app = TestApp::new().await;

    for (path, role) in [
        ("/api/vendors/me/packages", Role::Customer),
        ("/api/vendors/me/bookings", Role::Admin),
        ("/api/events", Role::Vendor),
        ("/api/bookings", Role::Vendor),
        ("/api/admin/users", Role::Customer),
        ("/api/admin/vendors", Role::Vendor),
    ] {
        let response = app.client.get(path).header(app.bearer(role)).dispatch().await;
        assert_eq!(response.status(), Status::Forbidden, "{path} as {role}");
        assert_eq!(json_body(response).await["error"], "Insufficient role");
    }
}

#[rocket::async_test]
async fn invalid_registration_reports_fields() {
    let app = TestApp::new().await;
    let response = app
        .client
        .post("/api/auth/register/customer")
        .header(ContentType::JSON)
        .body(
            json!({
                "fullName": "A",
                "email": "not-an-email",
                "password": "123"
            })
            .to_string(),
        )
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::BadRequest);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Validation failed");
    for field in ["full_name", "email", "password"] {
        assert!(body["details"].get(field).is_some(), "missing {field}");
    }
}

#[rocket::async_test]
async fn vendor_registration_validates_nested_sections() {
    let app = TestApp::new().await;
    let response = app
        .client
        .post("/api/auth/register/vendor")
        .header(ContentType::JSON)
        .body(
            json!({
                "account": {
                    "fullName": "Asha Studio",
                    "email": "asha@example.com",
                    "password": "secret123"
                },
                "business": { "businessName": "A" }
            })
            .to_string(),
        )
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::BadRequest);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Validation failed");
    assert!(body["details"].get("business").is_some());
}

#[rocket::async_test]
async fn malformed_json_is_a_bad_request() {
    let app = TestApp::new().await;
    let response = app
        .client
        .post("/api/auth/login")
        .header(ContentType::JSON)
        .body("{\"email\": ")
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::BadRequest);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Invalid request body");
    assert!(body["details"].is_string());
}

#[rocket::async_test]
async fn pagination_is_bounded() {
    let app = TestApp::new().await;
    let response = app.client.get("/api/vendors?limit=500").dispatch().await;

    assert_eq!(response.status(), Status::BadRequest);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Validation failed");
    assert!(body["details"].get("limit").is_some());

    let response = app.client.get("/api/vendors?page=0").dispatch().await;
    assert_eq!(response.status(), Status::BadRequest);

    let response = app
        .client
        .get("/api/vendors?page=9223372036854775807")
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::BadRequest);
    assert!(json_body(response).await["details"].get("page").is_some());
}

#[rocket::async_test]
async fn malformed_path_ids_are_not_found() {
    let app = TestApp::new().await;

    let response = app.client.get("/api/vendors/not-an-id").dispatch().await;
    assert_eq!(response.status(), Status::NotFound);
    assert_eq!(json_body(response).await["error"], "Vendor not found");

    let response = app
        .client
        .get("/api/events/nope")
        .header(app.bearer(Role::Customer))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::NotFound);
    assert_eq!(json_body(response).await["error"], "Event not found");

    let response = app
        .client
        .patch("/api/bookings/nope/confirm")
        .header(app.bearer(Role::Customer))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::NotFound);
    assert_eq!(json_body(response).await["error"], "Booking not found");
}

#[rocket::async_test]
async fn malformed_body_ids_are_bad_requests() {
    let app = TestApp::new().await;
    let response = app
        .client
        .post("/api/bookings")
        .header(ContentType::JSON)
        .header(app.bearer(Role::Customer))
        .body(json!({ "vendorId": "abc", "eventId": "def" }).to_string())
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::BadRequest);
    assert_eq!(json_body(response).await["error"], "Invalid vendorId");

    let response = app
        .client
        .post("/api/bookings")
        .header(ContentType::JSON)
        .header(app.bearer(Role::Customer))
        .body(
            json!({
                "vendorId": ObjectId::new().to_hex(),
                "eventId": ObjectId::new().to_hex(),
                "packageId": "xyz"
            })
            .to_string(),
        )
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::BadRequest);
    assert_eq!(json_body(response).await["error"], "Invalid packageId");
}

#[rocket::async_test]
async fn unknown_decision_is_rejected() {
    let app = TestApp::new().await;
    let path = format!("/api/vendors/me/bookings/{}/decision", ObjectId::new());
    let response = app
        .client
        .patch(path)
        .header(ContentType::JSON)
        .header(app.bearer(Role::Vendor))
        .body(json!({ "decision": "MAYBE" }).to_string())
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::BadRequest);
    assert_eq!(json_body(response).await["error"], "Invalid request body");
}

#[rocket::async_test]
async fn malformed_cancel_body_is_rejected() {
    let app = TestApp::new().await;
    let path = format!("/api/bookings/{}/cancel", ObjectId::new());
    let response = app
        .client
        .patch(path)
        .header(ContentType::JSON)
        .header(app.bearer(Role::Customer))
        .body(json!({ "reason": 5 }).to_string())
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::BadRequest);
    assert_eq!(json_body(response).await["error"], "Invalid request body");
}

#[rocket::async_test]
async fn invalid_event_is_rejected() {
    let app = TestApp::new().await;
    let response = app
        .client
        .post("/api/events")
        .header(ContentType::JSON)
        .header(app.bearer(Role::Customer))
        .body(
            json!({
                "title": "Launch party",
                "eventType": "PARTY",
                "eventDate": "someday",
                "guestCount": 0
            })
            .to_string(),
        )
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::BadRequest);
    let body = json_body(response).await;
    assert!(body["details"].get("event_date").is_some());
    assert!(body["details"].get("guest_count").is_some());
}

#[rocket::async_test]
async fn invalid_verification_status() {
    let app = TestApp::new().await;
    let path = format!("/api/admin/vendors/{}/verification", ObjectId::new());
    let response = app
        .client
        .patch(path)
        .header(ContentType::JSON)
        .header(app.bearer(Role::Admin))
        .body(json!({ "status": "MAYBE" }).to_string())
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::BadRequest);
    assert_eq!(
        json_body(response).await["error"],
        "Invalid verification status"
    );
}

#[rocket::async_test]
async fn admin_cannot_change_own_status() {
    let app = TestApp::new().await;
    let admin_id = ObjectId::new();
    let response = app
        .client
        .patch(format!("/api/admin/users/{}/status", admin_id))
        .header(ContentType::JSON)
        .header(app.token(admin_id, Role::Admin))
        .body(json!({ "status": "SUSPENDED" }).to_string())
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::BadRequest);
    assert_eq!(
        json_body(response).await["error"],
        "You cannot change your own status"
    );
}

#[rocket::async_test]
async fn unknown_routes_render_json() {
    let app = TestApp::new().await;
    let response = app.client.get("/api/nothing/here").dispatch().await;

    assert_eq!(response.status(), Status::NotFound);
    assert_eq!(response.content_type(), Some(ContentType::JSON));
    assert_eq!(json_body(response).await, json!({ "error": "Route not found" }));
}

#[rocket::async_test]
async fn cors_echoes_origin() {
    let app = TestApp::new().await;
    let response = app
        .client
        .options("/api/vendors")
        .header(Header::new("Origin", "http://localhost:5173"))
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::Ok);
    let headers = response.headers();
    assert_eq!(
        headers.get_one("Access-Control-Allow-Origin"),
        Some("http://localhost:5173")
    );
    assert_eq!(
        headers.get_one("Access-Control-Allow-Credentials"),
        Some("true")
    );
}

#[rocket::async_test]
async fn openapi_document_lists_routes() {
    let app = TestApp::new().await;
    let response = app.client.get("/api/openapi.json").dispatch().await;

    assert_eq!(response.status(), Status::Ok);
    let document = json_body(response).await;
    let paths = document["paths"].as_object().expect("paths");
    // Paths are recorded relative to the mount point, with `/api` as the server base.
    for path in [
        "/auth/login",
        "/vendors/me/packages",
        "/bookings/{id}/cancel",
        "/admin/vendors/{id}/verification",
    ] {
        assert!(
            paths.keys().any(|key| key.ends_with(path)),
            "{path} missing from OpenAPI document"
        );
    }
}
