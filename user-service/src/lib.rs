pub mod config;
pub mod db;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod scopes;
pub mod services;
pub mod utils;

use axum::{
    extract::{Request, State},
    http::{HeaderName, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state, Next},
    routing::{get, post},
    Json, Router,
};
use service_core::error::AppError;
use service_core::middleware::{request_id_middleware, security_headers_middleware};
use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::Instrument;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::{SecurityConfig, UserServiceConfig};
use crate::middleware::{require_scopes, REPORTING_USER, SUPER_ADMIN};
use crate::services::{
    AuthService, EmailProvider, JwtService, RoleService, Store, UserService,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<UserServiceConfig>,
    pub store: Arc<dyn Store>,
    pub email: Arc<dyn EmailProvider>,
    pub jwt: JwtService,
    pub auth_service: AuthService,
    pub user_service: UserService,
    pub role_service: RoleService,
}

impl AppState {
    /// Wires the services on top of a store and an email provider.
    pub fn new(
        config: UserServiceConfig,
        store: Arc<dyn Store>,
        email: Arc<dyn EmailProvider>,
    ) -> Self {
        let jwt = JwtService::new(&config.jwt);
        let auth_service = AuthService::new(store.clone(), jwt.clone());
        let user_service = UserService::new(
            store.clone(),
            email.clone(),
            jwt.clone(),
            config.onboarding.clone(),
        );
        let role_service = RoleService::new(store.clone());

        Self {
            config: Arc::new(config),
            store,
            email,
            jwt,
            auth_service,
            user_service,
            role_service,
        }
    }
}

pub fn build_router(state: AppState) -> Result<Router, AppError> {
    let cors = cors_layer(&state.config.security)?;

    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/login/", post(handlers::auth::login))
        .route("/refresh/", post(handlers::auth::refresh))
        .route("/user/create/", post(handlers::user::create_user))
        .route("/user/set_password/", post(handlers::user::set_password))
        .route(
            "/user/request/reset_password/",
            post(handlers::user::request_reset_password),
        )
        .route("/user/reset_password/", post(handlers::user::reset_password));

    let super_admin_routes = Router::new()
        .route("/role/create/", post(handlers::role::create_role))
        .route("/role/", get(handlers::role::list_roles))
        .route(
            "/role/:role_id/",
            get(handlers::role::get_role)
                .put(handlers::role::update_role)
                .patch(handlers::role::patch_role)
                .delete(handlers::role::delete_role),
        )
        .route("/user/", get(handlers::user::list_users))
        .route("/user/set_role/", post(handlers::user::set_role))
        .route_layer(from_fn_with_state(
            state.clone(),
            |s: State<AppState>, req: Request, next: Next| require_scopes(s, SUPER_ADMIN, req, next),
        ));

    let reporting_user_routes = Router::new()
        .route(
            "/user/:user_id/",
            get(handlers::user::get_user)
                .put(handlers::user::update_user)
                .patch(handlers::user::patch_user)
                .delete(handlers::user::delete_user),
        )
        .route(
            "/user/change_password/:user_id/",
            post(handlers::user::change_password),
        )
        .route_layer(from_fn_with_state(
            state.clone(),
            |s: State<AppState>, req: Request, next: Next| {
                require_scopes(s, REPORTING_USER, req, next)
            },
        ));

    let app = Router::new()
        .merge(public_routes)
        .merge(super_admin_routes)
        .merge(reporting_user_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            let request_id = request
                .headers()
                .get(service_core::middleware::REQUEST_ID_HEADER)
                .and_then(|value| value.to_str().ok())
                .unwrap_or("-");

            tracing::info_span!(
                "http_request",
                request_id = %request_id,
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
            )
        }))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors);

    Ok(app)
}

/// Runs the server until `shutdown` resolves. Everything logged while
/// serving, including per-request spans, is nested under `span`.
pub async fn serve<F>(
    listener: TcpListener,
    app: Router,
    span: tracing::Span,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    span.in_scope(|| match listener.local_addr() {
        Ok(addr) => tracing::info!(address = %addr, "Listening"),
        Err(e) => tracing::warn!(error = %e, "Listening on unknown address"),
    });

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .into_future()
    .instrument(span)
    .await
}

/// `*` in any CORS list means "allow all" for that list.
fn cors_layer(security: &SecurityConfig) -> Result<CorsLayer, AppError> {
    let wildcard = |list: &[String]| list.iter().any(|v| v == "*");

    let origins = if wildcard(&security.allowed_origins) {
        AllowOrigin::any()
    } else {
        let parsed = security
            .allowed_origins
            .iter()
            .map(|o| {
                o.parse::<HeaderValue>().map_err(|e| {
                    AppError::ConfigError(anyhow::anyhow!("Invalid CORS origin '{}': {}", o, e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        AllowOrigin::list(parsed)
    };

    let methods = if wildcard(&security.allowed_methods) {
        AllowMethods::any()
    } else {
        let parsed = security
            .allowed_methods
            .iter()
            .map(|m| {
                Method::from_bytes(m.to_uppercase().as_bytes()).map_err(|e| {
                    AppError::ConfigError(anyhow::anyhow!("Invalid CORS method '{}': {}", m, e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        AllowMethods::list(parsed)
    };

    let headers = if wildcard(&security.allowed_headers) {
        AllowHeaders::any()
    } else {
        let parsed = security
            .allowed_headers
            .iter()
            .map(|h| {
                HeaderName::from_bytes(h.to_lowercase().as_bytes()).map_err(|e| {
                    AppError::ConfigError(anyhow::anyhow!("Invalid CORS header '{}': {}", h, e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        AllowHeaders::list(parsed)
    };

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(methods)
        .allow_headers(headers))
}

/// Service health check
pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.store.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Database health check failed");
        AppError::DatabaseError(anyhow::anyhow!(e))
    })?;

    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "environment": format!("{:?}", state.config.environment),
        "checks": {
            "database": "up"
        }
    })))
}
