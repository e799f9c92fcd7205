mod common;

use axum::http::{Method, StatusCode};
use common::{identity_json, session_json, TestApp};
use serde_json::{json, Value};
use wiremock::{
    matchers::{body_partial_json, method, path, query_param},
    Mock, ResponseTemplate,
};

fn identities(count: usize) -> Value {
    Value::Array(
        (1..=count)
            .map(|i| identity_json(&format!("id-{:02}", i), "active"))
            .collect(),
    )
}

#[tokio::test]
async fn list_identities_pages_locally_and_reports_total() {
    let app = TestApp::spawn().await;

    Mock::given(method("GET"))
        .and(path("/admin/identities"))
        .and(query_param("per_page", "10000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(identities(15)))
        .expect(1)
        .mount(&app.kratos)
        .await;

    let (status, body) = app
        .authed(Method::GET, "/api/identities?page=2&per_page=10", None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["page"], 2);
    assert_eq!(body["per_page"], 10);
    assert_eq!(body["total"], 15);

    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 5);
    assert_eq!(data[0]["id"], "id-11");
    assert_eq!(data[4]["id"], "id-15");
}

#[tokio::test]
async fn list_identities_past_the_end_is_empty() {
    let app = TestApp::spawn().await;

    Mock::given(method("GET"))
        .and(path("/admin/identities"))
        .respond_with(ResponseTemplate::new(200).set_body_json(identities(3)))
        .mount(&app.kratos)
        .await;

    let (status, body) = app
        .authed(Method::GET, "/api/identities?page=5&per_page=10", None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));
    assert_eq!(body["total"], 3);
}

#[tokio::test]
async fn list_identities_uses_default_paging() {
    let app = TestApp::spawn().await;

    Mock::given(method("GET"))
        .and(path("/admin/identities"))
        .respond_with(ResponseTemplate::new(200).set_body_json(identities(25)))
        .mount(&app.kratos)
        .await;

    let (status, body) = app.authed(Method::GET, "/api/identities", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["page"], 1);
    assert_eq!(body["per_page"], 20);
    assert_eq!(body["data"].as_array().unwrap().len(), 20);
}

#[tokio::test]
async fn list_identities_rejects_zero_page_without_calling_kratos() {
    let app = TestApp::spawn().await;

    Mock::given(method("GET"))
        .and(path("/admin/identities"))
        .respond_with(ResponseTemplate::new(200).set_body_json(identities(1)))
        .expect(0)
        .mount(&app.kratos)
        .await;

    let (status, body) = app
        .authed(Method::GET, "/api/identities?page=0", None)
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "page must be at least 1");
}

#[tokio::test]
async fn upstream_failure_is_reported_with_details() {
    let app = TestApp::spawn().await;

    Mock::given(method("GET"))
        .and(path("/admin/identities"))
        .respond_with(ResponseTemplate::new(503).set_body_string("kratos down"))
        .mount(&app.kratos)
        .await;

    let (status, body) = app.authed(Method::GET, "/api/identities", None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to fetch identities");
    let details = body["details"].as_str().unwrap();
    assert!(details.contains("503"));
    assert!(details.contains("kratos down"));
}

#[tokio::test]
async fn collection_404_is_an_upstream_error_not_a_missing_record() {
    let app = TestApp::spawn().await;

    Mock::given(method("GET"))
        .and(path("/admin/identities"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no route"))
        .mount(&app.kratos)
        .await;

    let (status, body) = app.authed(Method::GET, "/api/identities", None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to fetch identities");
    assert!(body["details"].as_str().unwrap().contains("404"));
}

#[tokio::test]
async fn get_identity_passes_unknown_fields_through() {
    let app = TestApp::spawn().await;

    let mut identity = identity_json("abc", "active");
    identity["metadata_admin"] = json!({ "note": "vip" });

    Mock::given(method("GET"))
        .and(path("/admin/identities/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&identity))
        .mount(&app.kratos)
        .await;

    let (status, body) = app.authed(Method::GET, "/api/identities/abc", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "abc");
    assert_eq!(body["metadata_admin"]["note"], "vip");
}

#[tokio::test]
async fn get_identity_with_credentials_requests_every_type() {
    let app = TestApp::spawn().await;

    let mut identity = identity_json("abc", "active");
    identity["credentials"] = json!({ "password": { "type": "password" } });

    Mock::given(method("GET"))
        .and(path("/admin/identities/abc"))
        .and(query_param("include_credential", "totp"))
        .and(query_param("include_credential", "lookup_secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&identity))
        .expect(1)
        .mount(&app.kratos)
        .await;

    let (status, body) = app
        .authed(
            Method::GET,
            "/api/identities/abc?include_credentials=true",
            None,
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["credentials"]["password"]["type"], "password");
}

#[tokio::test]
async fn missing_identity_is_404() {
    let app = TestApp::spawn().await;

    Mock::given(method("GET"))
        .and(path("/admin/identities/nope"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&app.kratos)
        .await;

    let (status, body) = app.authed(Method::GET, "/api/identities/nope", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("nope"));
}

#[tokio::test]
async fn create_identity_returns_201() {
    let app = TestApp::spawn().await;

    Mock::given(method("POST"))
        .and(path("/admin/identities"))
        .and(body_partial_json(json!({
            "schema_id": "default",
            "traits": { "email": "new@example.com" },
            "state": "active"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(identity_json("new", "active")))
        .expect(1)
        .mount(&app.kratos)
        .await;

    let (status, body) = app
        .authed(
            Method::POST,
            "/api/identities",
            Some(json!({
                "schema_id": "default",
                "traits": { "email": "new@example.com" },
                "state": "active"
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], "new");
}

#[tokio::test]
async fn create_identity_rejects_unknown_state() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .authed(
            Method::POST,
            "/api/identities",
            Some(json!({
                "schema_id": "default",
                "traits": {},
                "state": "banned"
            })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid request body");
}

#[tokio::test]
async fn create_identity_requires_schema_id() {
    let app = TestApp::spawn().await;

    let (status, _) = app
        .authed(
            Method::POST,
            "/api/identities",
            Some(json!({ "schema_id": "", "traits": {} })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_identity_puts_without_credentials() {
    let app = TestApp::spawn().await;

    Mock::given(method("PUT"))
        .and(path("/admin/identities/abc"))
        .and(body_partial_json(json!({ "state": "inactive" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(identity_json("abc", "inactive")))
        .expect(1)
        .mount(&app.kratos)
        .await;

    let (status, body) = app
        .authed(
            Method::PUT,
            "/api/identities/abc",
            Some(json!({
                "schema_id": "default",
                "traits": { "email": "abc@example.com" },
                "state": "inactive"
            })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "inactive");

    let requests = app.kratos.received_requests().await.unwrap();
    let sent: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert!(sent.get("credentials").is_none());
}

#[tokio::test]
async fn delete_identity_returns_204() {
    let app = TestApp::spawn().await;

    Mock::given(method("DELETE"))
        .and(path("/admin/identities/abc"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&app.kratos)
        .await;

    let (status, body) = app.authed(Method::DELETE, "/api/identities/abc", None).await;

    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);
}

#[tokio::test]
async fn identity_sessions_are_wrapped_in_data() {
    let app = TestApp::spawn().await;

    Mock::given(method("GET"))
        .and(path("/admin/identities/abc/sessions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([session_json("s1", true), session_json("s2", false)])),
        )
        .mount(&app.kratos)
        .await;

    let (status, body) = app
        .authed(Method::GET, "/api/identities/abc/sessions", None)
        .await;

    assert_eq!(status, StatusCode::OK);
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    assert_eq!(data[1]["active"], false);
}

#[tokio::test]
async fn reset_password_rewrites_identity_with_password_credential() {
    let app = TestApp::spawn().await;

    Mock::given(method("GET"))
        .and(path("/admin/identities/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(identity_json("abc", "active")))
        .expect(1)
        .mount(&app.kratos)
        .await;

    Mock::given(method("PUT"))
        .and(path("/admin/identities/abc"))
        .and(body_partial_json(json!({
            "schema_id": "default",
            "traits": { "email": "abc@example.com" },
            "credentials": { "password": { "config": { "password": "new-password-1" } } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(identity_json("abc", "active")))
        .expect(1)
        .mount(&app.kratos)
        .await;

    let (status, _) = app
        .authed(
            Method::POST,
            "/api/identities/abc/password",
            Some(json!({ "password": "new-password-1" })),
        )
        .await;

    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn short_password_is_rejected_before_kratos() {
    let app = TestApp::spawn().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(identity_json("abc", "active")))
        .expect(0)
        .mount(&app.kratos)
        .await;

    let (status, _) = app
        .authed(
            Method::POST,
            "/api/identities/abc/password",
            Some(json!({ "password": "short" })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unsupported_credential_type_never_reaches_kratos() {
    let app = TestApp::spawn().await;

    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&app.kratos)
        .await;

    for credential_type in ["oidc", "password"] {
        let (status, body) = app
            .authed(
                Method::DELETE,
                &format!("/api/identities/abc/credentials/{}", credential_type),
                None,
            )
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains(credential_type));
    }
}

#[tokio::test]
async fn second_factor_credential_is_deleted_once() {
    let app = TestApp::spawn().await;

    Mock::given(method("DELETE"))
        .and(path("/admin/identities/abc/credentials/totp"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&app.kratos)
        .await;

    let (status, _) = app
        .authed(Method::DELETE, "/api/identities/abc/credentials/totp", None)
        .await;

    assert_eq!(status, StatusCode::NO_CONTENT);
}
