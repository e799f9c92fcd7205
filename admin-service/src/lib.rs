pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post},
    Json, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use service_core::error::AppError;
use service_core::middleware::{
    metrics_middleware, request_id_middleware, security_headers_middleware, REQUEST_ID_HEADER,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::config::AdminConfig;
use crate::services::{JwtService, KratosClient};

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health_check,
        handlers::auth::login,
        handlers::identities::list_identities,
        handlers::identities::get_identity,
        handlers::identities::create_identity,
        handlers::identities::update_identity,
        handlers::identities::delete_identity,
        handlers::identities::get_identity_sessions,
        handlers::identities::reset_password,
        handlers::identities::delete_credential,
        handlers::sessions::list_sessions,
        handlers::sessions::revoke_session,
        handlers::schemas::list_schemas,
        handlers::stats::get_stats,
    ),
    components(
        schemas(
            dtos::ErrorResponse,
            dtos::HealthResponse,
            dtos::auth::LoginRequest,
            dtos::auth::LoginResponse,
            dtos::identity::IdentityRequest,
            dtos::identity::ResetPasswordRequest,
            dtos::session::StatsResponse,
            models::IdentityState,
            models::IdentitySchema,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Admin login"),
        (name = "Identities", description = "Identity management"),
        (name = "Sessions", description = "Session management"),
        (name = "Schemas", description = "Identity schemas"),
        (name = "Stats", description = "Dashboard statistics"),
        (name = "Observability", description = "Service health and monitoring"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Everything a handler needs. Cheap to clone; immutable after startup.
#[derive(Clone)]
pub struct AppState {
    pub config: AdminConfig,
    pub jwt: JwtService,
    pub kratos: KratosClient,
    /// Present when a Prometheus recorder was installed.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(config: AdminConfig, metrics: Option<PrometheusHandle>) -> Result<Self, AppError> {
        let jwt = JwtService::new(&config.auth);
        let kratos = KratosClient::new(&config.kratos)
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?;

        Ok(Self {
            config,
            jwt,
            kratos,
            metrics,
        })
    }
}

pub async fn build_router(state: AppState) -> Result<Router, AppError> {
    let cors = cors_layer(&state.config)?;

    // Protected routes: bearer token checked before the handler runs
    let protected = Router::new()
        .route(
            "/api/identities",
            get(handlers::list_identities).post(handlers::create_identity),
        )
        .route(
            "/api/identities/:id",
            get(handlers::get_identity)
                .put(handlers::update_identity)
                .delete(handlers::delete_identity),
        )
        .route(
            "/api/identities/:id/sessions",
            get(handlers::get_identity_sessions),
        )
        .route(
            "/api/identities/:id/password",
            post(handlers::reset_password),
        )
        .route(
            "/api/identities/:id/credentials/:credential_type",
            delete(handlers::delete_credential),
        )
        .route("/api/sessions", get(handlers::list_sessions))
        .route("/api/sessions/:id", delete(handlers::revoke_session))
        .route("/api/schemas", get(handlers::list_schemas))
        .route("/api/stats", get(handlers::get_stats))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    let app = Router::new()
        .route("/api/health", get(handlers::health_check))
        .route("/api/auth/login", post(handlers::login))
        .route("/api/metrics", get(handlers::metrics::metrics))
        .route(
            "/api/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .merge(protected)
        .with_state(state)
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &axum::http::Request<axum::body::Body>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            },
        ))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors);

    Ok(app)
}

/// `*` mirrors the caller's origin so credentials can still be allowed; an
/// explicit allow-list only admits the listed origins.
fn cors_layer(config: &AdminConfig) -> Result<CorsLayer, AppError> {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::ORIGIN, header::CONTENT_TYPE, header::AUTHORIZATION])
        .expose_headers([header::CONTENT_LENGTH])
        .allow_credentials(true);

    if config.allows_any_origin() {
        return Ok(layer.allow_origin(AllowOrigin::mirror_request()));
    }

    let origins = config
        .security
        .allowed_origins
        .iter()
        .map(|o| {
            o.parse::<HeaderValue>().map_err(|e| {
                AppError::ConfigError(anyhow::anyhow!("Invalid CORS origin '{}': {}", o, e))
            })
        })
        .collect::<Result<Vec<HeaderValue>, AppError>>()?;

    tracing::info!(origins = ?config.security.allowed_origins, "CORS allow-list configured");

    Ok(layer.allow_origin(AllowOrigin::list(origins)))
}
