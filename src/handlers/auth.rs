//! 认证相关的 HTTP 处理器
//!
//! 处理器只做参数提取与委派，业务规则集中在 AuthService。

use crate::{
    auth::middleware::AuthContext, error::AppError, middleware::AppState,
    models::account::Role, models::auth::*,
};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;

/// 求职者注册
pub async fn register_job_seeker(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterJobSeekerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = state.auth_service.register_job_seeker(req).await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// 雇主注册
pub async fn register_employer(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterEmployerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = state.auth_service.register_employer(req).await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// 求职者登录
pub async fn login_job_seeker(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = state.auth_service.login(Role::JobSeeker, req).await?;

    Ok(Json(response))
}

/// 雇主登录
pub async fn login_employer(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = state.auth_service.login(Role::Employer, req).await?;

    Ok(Json(response))
}

/// 管理员登录
pub async fn login_admin(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = state.auth_service.login(Role::Admin, req).await?;

    Ok(Json(response))
}

/// 统一登录：调用方不声明角色，由服务按分区顺序探测
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = state.auth_service.login_any(req).await?;

    Ok(Json(response))
}

/// 获取当前用户信息
pub async fn get_current_user(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
) -> Result<impl IntoResponse, AppError> {
    let profile = state
        .auth_service
        .current_user(auth_context.role, auth_context.account_id)
        .await?;

    Ok(Json(profile))
}

/// 修改密码
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .auth_service
        .change_password(auth_context.role, auth_context.account_id, req)
        .await?;

    Ok(Json(json!({"message": "Password updated successfully"})))
}

/// 发起密码重置
pub async fn request_password_reset(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RequestPasswordResetRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.auth_service.request_password_reset(req).await?;

    // 令牌落库即报告成功，邮件投递结果不影响响应
    Ok(Json(json!({"message": "Password reset email sent"})))
}

/// 使用重置令牌设置新密码
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.auth_service.reset_password(req).await?;

    Ok(Json(json!({"message": "Password has been reset"})))
}
