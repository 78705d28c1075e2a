//! 路由注册
//! 创建所有 API 路由并应用中间件

use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::{handlers, middleware::AppState};

/// 创建应用路由
pub fn create_router(state: Arc<AppState>) -> Router {
    // 公开端点（健康检查与指标）
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .route("/metrics", get(handlers::metrics::metrics_export));

    // 认证路由（无需令牌）
    let auth_routes = Router::new()
        .route(
            "/api/auth/job-seeker/register",
            post(handlers::auth::register_job_seeker),
        )
        .route(
            "/api/auth/employer/register",
            post(handlers::auth::register_employer),
        )
        .route(
            "/api/auth/job-seeker/login",
            post(handlers::auth::login_job_seeker),
        )
        .route("/api/auth/employer/login", post(handlers::auth::login_employer))
        .route("/api/auth/admin/login", post(handlers::auth::login_admin))
        .route("/api/auth/login", post(handlers::auth::login))
        .route(
            "/api/auth/request-password-reset",
            post(handlers::auth::request_password_reset),
        )
        .route("/api/auth/reset-password", post(handlers::auth::reset_password));

    // 需要认证的路由
    let authenticated_routes = Router::new()
        .route("/api/auth/me", get(handlers::auth::get_current_user))
        .route("/api/auth/change-password", put(handlers::auth::change_password))
        .layer(axum::middleware::from_fn_with_state(
            state.jwt_service.clone(),
            crate::auth::middleware::jwt_auth_middleware,
        ));

    // 组合所有路由
    Router::new()
        .merge(public_routes)
        .merge(auth_routes)
        .merge(authenticated_routes)
        .layer(CorsLayer::permissive())
        .layer(axum::middleware::from_fn(crate::middleware::request_tracking_middleware))
        .with_state(state)
}
