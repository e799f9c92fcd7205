//! Shared setup for admin-service integration tests.
//!
//! Kratos is replaced by a wiremock server serving both the admin and the
//! public API; requests go through the real router via `oneshot`.

#![allow(dead_code)]

use admin_service::{
    build_router,
    config::{AdminConfig, AuthConfig, KratosConfig, SecurityConfig},
    AppState,
};
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use secrecy::Secret;
use serde_json::{json, Value};
use service_core::observability::LogFormat;
use tower::util::ServiceExt;
use wiremock::MockServer;

pub const TEST_ADMIN_PASSWORD: &str = "correct-horse-battery";
pub const TEST_JWT_SECRET: &str = "test-signing-secret";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub kratos: MockServer,
}

pub fn test_config(kratos_url: &str) -> AdminConfig {
    AdminConfig {
        common: service_core::config::Config { port: 0 },
        service_name: "admin-service-test".to_string(),
        service_version: "test".to_string(),
        log_level: "error".to_string(),
        log_format: LogFormat::Pretty,
        otlp_endpoint: None,
        auth: AuthConfig {
            admin_password: Secret::new(TEST_ADMIN_PASSWORD.to_string()),
            jwt_secret: Secret::new(TEST_JWT_SECRET.to_string()),
            token_ttl_hours: 24,
        },
        kratos: KratosConfig {
            admin_url: kratos_url.to_string(),
            public_url: Some(kratos_url.to_string()),
            identity_fetch_cap: 10_000,
            timeout_seconds: 5,
        },
        security: SecurityConfig {
            allowed_origins: vec!["*".to_string()],
        },
    }
}

impl TestApp {
    pub async fn spawn() -> Self {
        let kratos = MockServer::start().await;
        Self::spawn_with(kratos, |_| {}).await
    }

    /// Spawns against `kratos`, letting the caller adjust the config first.
    pub async fn spawn_with(kratos: MockServer, adjust: impl FnOnce(&mut AdminConfig)) -> Self {
        let mut config = test_config(&kratos.uri());
        adjust(&mut config);

        let state = AppState::new(config, None).expect("Failed to build app state");
        let router = build_router(state.clone())
            .await
            .expect("Failed to build router");

        Self {
            router,
            state,
            kratos,
        }
    }

    pub fn token(&self) -> String {
        self.state
            .jwt
            .issue(TEST_ADMIN_PASSWORD)
            .expect("Failed to issue test token")
            .token
    }

    /// Sends a request with a valid bearer token.
    pub async fn authed(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let token = self.token();
        self.send(method, uri, Some(&token), body).await
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        (status, value)
    }
}

pub fn identity_json(id: &str, state: &str) -> Value {
    json!({
        "id": id,
        "schema_id": "default",
        "state": state,
        "traits": { "email": format!("{}@example.com", id) },
        "created_at": "2024-01-01T00:00:00Z",
        "updated_at": "2024-01-01T00:00:00Z",
        "metadata_public": null
    })
}

pub fn session_json(id: &str, active: bool) -> Value {
    json!({
        "id": id,
        "active": active,
        "expires_at": "2030-01-01T00:00:00Z",
        "authenticated_at": "2024-01-01T00:00:00Z",
        "identity": identity_json("owner", "active")
    })
}
