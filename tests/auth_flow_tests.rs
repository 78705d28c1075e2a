//! 认证工作流集成测试
//!
//! 覆盖注册、登录、统一登录、密码修改与重置的核心契约。
//! 需要可用的 PostgreSQL（TEST_DATABASE_URL），因此默认忽略。

use jobboard_system::{
    auth::jwt::JwtService,
    auth::reset_token::{generate_reset_token, hash_token},
    models::account::Role,
    models::auth::*,
    repository::AccountRepository,
    services::{AuthService, MailerService},
};
use std::sync::Arc;

mod common;

fn build_auth_service(pool: sqlx::PgPool) -> AuthService {
    let config = common::create_test_config();
    let jwt_service = Arc::new(JwtService::from_config(&config).unwrap());
    let mailer = Arc::new(MailerService::from_config(&config.mail).unwrap());
    AuthService::new(pool, jwt_service, mailer, Arc::new(config))
}

fn login_req(email: &str, password: &str) -> LoginRequest {
    LoginRequest {
        email: email.to_string(),
        password: password.to_string(),
    }
}

#[tokio::test]
#[ignore] // 需要数据库
async fn test_register_job_seeker_returns_profile_and_token() {
    let config = common::create_test_config();
    let pool = common::setup_test_db(&config).await;
    let service = build_auth_service(pool);

    let response = service
        .register_job_seeker(RegisterJobSeekerRequest {
            full_name: "Jane Doe".to_string(),
            email: "jane@example.com".to_string(),
            password: "Password1".to_string(),
            phone: None,
        })
        .await
        .unwrap();

    assert_eq!(response.role, "jobSeeker");
    assert_eq!(response.user.email, "jane@example.com");
    assert!(!response.token.is_empty());
}

#[tokio::test]
#[ignore] // 需要数据库
async fn test_duplicate_email_across_partitions_rejected() {
    let config = common::create_test_config();
    let pool = common::setup_test_db(&config).await;

    // 雇主分区已占用该邮箱
    common::create_test_employer(&pool, "Acme HR", "Acme", "taken@example.com", "Password1").await;

    let service = build_auth_service(pool.clone());

    // 求职者分区注册同一邮箱必须失败
    let result = service
        .register_job_seeker(RegisterJobSeekerRequest {
            full_name: "Jane Doe".to_string(),
            email: "taken@example.com".to_string(),
            password: "Password1".to_string(),
            phone: None,
        })
        .await;

    match result {
        Err(jobboard_system::error::AppError::BadRequest(msg)) => {
            assert_eq!(msg, "Email already registered");
        }
        other => panic!("expected BadRequest, got {:?}", other.map(|_| ())),
    }

    // 管理员分区占用的邮箱同样阻止注册
    common::create_test_admin(&pool, "Root", "root@example.com", "Password1", None).await;
    let result = service
        .register_employer(RegisterEmployerRequest {
            full_name: "Eve".to_string(),
            company_name: "Evil Corp".to_string(),
            email: "root@example.com".to_string(),
            password: "Password1".to_string(),
            phone: None,
        })
        .await;
    assert!(result.is_err());
}

#[tokio::test]
#[ignore] // 需要数据库
async fn test_login_failure_message_identical_for_unknown_and_wrong() {
    let config = common::create_test_config();
    let pool = common::setup_test_db(&config).await;

    common::create_test_job_seeker(&pool, "Jane", "jane@example.com", "Password1").await;

    let service = build_auth_service(pool);

    let unknown = service
        .login(Role::JobSeeker, login_req("nobody@example.com", "Password1"))
        .await
        .unwrap_err();
    let wrong = service
        .login(Role::JobSeeker, login_req("jane@example.com", "WrongPass1"))
        .await
        .unwrap_err();

    // 未知邮箱与错误密码不可区分
    assert_eq!(unknown.user_message(), wrong.user_message());
    assert_eq!(unknown.user_message(), "Invalid credentials");
    assert_eq!(unknown.status_code(), wrong.status_code());
}

#[tokio::test]
#[ignore] // 需要数据库
async fn test_soft_deleted_account_cannot_login() {
    let config = common::create_test_config();
    let pool = common::setup_test_db(&config).await;

    let id = common::create_test_job_seeker(&pool, "Jane", "jane@example.com", "Password1").await;
    common::soft_delete_account(&pool, "job_seekers", id).await;

    let service = build_auth_service(pool);

    let result = service
        .login(Role::JobSeeker, login_req("jane@example.com", "Password1"))
        .await;

    let err = result.unwrap_err();
    assert_eq!(err.user_message(), "Invalid credentials");
}

#[tokio::test]
#[ignore] // 需要数据库
async fn test_unified_login_resolves_partition() {
    let config = common::create_test_config();
    let pool = common::setup_test_db(&config).await;

    common::create_test_job_seeker(&pool, "Jane", "seeker@example.com", "Password1").await;
    common::create_test_employer(&pool, "Acme HR", "Acme", "hr@example.com", "Password1").await;
    common::create_test_admin(&pool, "Root", "root@example.com", "Password1", Some("SuperAdmin"))
        .await;

    let service = build_auth_service(pool);

    let seeker = service
        .login_any(login_req("seeker@example.com", "Password1"))
        .await
        .unwrap();
    assert_eq!(seeker.role, "jobSeeker");

    let employer = service
        .login_any(login_req("hr@example.com", "Password1"))
        .await
        .unwrap();
    assert_eq!(employer.role, "employer");

    // 管理员返回账户上更细粒度的角色标签
    let admin = service
        .login_any(login_req("root@example.com", "Password1"))
        .await
        .unwrap();
    assert_eq!(admin.role, "SuperAdmin");

    let unknown = service
        .login_any(login_req("ghost@example.com", "Password1"))
        .await
        .unwrap_err();
    assert_eq!(unknown.user_message(), "Invalid credentials");
}

#[tokio::test]
#[ignore] // 需要数据库
async fn test_unified_login_short_circuits_on_first_matching_partition() {
    let config = common::create_test_config();
    let pool = common::setup_test_db(&config).await;

    // 邮箱唯一性不变量被绕过的情况下，解析顺序仍然必须确定：
    // 求职者分区优先于雇主分区
    common::create_test_job_seeker(&pool, "Jane", "both@example.com", "SeekerPass1").await;
    common::create_test_employer(&pool, "Acme HR", "Acme", "both@example.com", "EmployerPass1")
        .await;

    let service = build_auth_service(pool);

    let hit = service
        .login_any(login_req("both@example.com", "SeekerPass1"))
        .await
        .unwrap();
    assert_eq!(hit.role, "jobSeeker");

    // 命中求职者分区后即短路：雇主密码不再被尝试
    let miss = service
        .login_any(login_req("both@example.com", "EmployerPass1"))
        .await;
    assert!(miss.is_err());
}

#[tokio::test]
#[ignore] // 需要数据库
async fn test_change_password_invalidates_old_password() {
    let config = common::create_test_config();
    let pool = common::setup_test_db(&config).await;

    let id = common::create_test_job_seeker(&pool, "Jane", "jane@example.com", "Password1").await;

    let service = build_auth_service(pool);

    // 当前密码错误被拒绝
    let bad = service
        .change_password(
            Role::JobSeeker,
            id,
            ChangePasswordRequest {
                current_password: "WrongPass1".to_string(),
                new_password: "NewPassword2".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(bad.user_message(), "Current password is incorrect");

    service
        .change_password(
            Role::JobSeeker,
            id,
            ChangePasswordRequest {
                current_password: "Password1".to_string(),
                new_password: "NewPassword2".to_string(),
            },
        )
        .await
        .unwrap();

    // 旧密码失效，新密码生效
    assert!(service
        .login(Role::JobSeeker, login_req("jane@example.com", "Password1"))
        .await
        .is_err());
    assert!(service
        .login(Role::JobSeeker, login_req("jane@example.com", "NewPassword2"))
        .await
        .is_ok());
}

#[tokio::test]
#[ignore] // 需要数据库
async fn test_request_password_reset_persists_token() {
    let config = common::create_test_config();
    let pool = common::setup_test_db(&config).await;

    common::create_test_job_seeker(&pool, "Jane", "jane@example.com", "Password1").await;

    let service = build_auth_service(pool.clone());

    service
        .request_password_reset(RequestPasswordResetRequest {
            email: "jane@example.com".to_string(),
            role: Role::JobSeeker,
        })
        .await
        .unwrap();

    let (token, expires_at): (Option<String>, Option<chrono::DateTime<chrono::Utc>>) =
        sqlx::query_as(
            "SELECT reset_token, reset_token_expires_at FROM job_seekers WHERE email = $1",
        )
        .bind("jane@example.com")
        .fetch_one(&pool)
        .await
        .unwrap();

    assert!(token.is_some(), "reset token must be persisted");
    let expires_at = expires_at.expect("expiry must be persisted");
    let window = expires_at - chrono::Utc::now();
    assert!(window.num_seconds() > 840 && window.num_seconds() <= 900);
}

#[tokio::test]
#[ignore] // 需要数据库
async fn test_reset_password_consumes_token() {
    let config = common::create_test_config();
    let pool = common::setup_test_db(&config).await;

    let id = common::create_test_job_seeker(&pool, "Jane", "jane@example.com", "Password1").await;

    // 直接落库一个已知令牌，模拟邮件送达
    let repo = AccountRepository::new(pool.clone());
    let token = generate_reset_token();
    let expires_at = chrono::Utc::now() + chrono::Duration::minutes(15);
    repo.store_reset_token(Role::JobSeeker, id, &hash_token(&token), expires_at)
        .await
        .unwrap();

    let service = build_auth_service(pool);

    service
        .reset_password(ResetPasswordRequest {
            token: token.clone(),
            role: Role::JobSeeker,
            new_password: "FreshPassword3".to_string(),
        })
        .await
        .unwrap();

    // 旧密码失效，新密码生效
    assert!(service
        .login(Role::JobSeeker, login_req("jane@example.com", "Password1"))
        .await
        .is_err());
    assert!(service
        .login(Role::JobSeeker, login_req("jane@example.com", "FreshPassword3"))
        .await
        .is_ok());

    // 令牌单次使用：重放必须失败
    let replay = service
        .reset_password(ResetPasswordRequest {
            token,
            role: Role::JobSeeker,
            new_password: "AnotherPass4".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(replay.user_message(), "Invalid or expired reset token");
}

#[tokio::test]
#[ignore] // 需要数据库
async fn test_expired_reset_token_rejected() {
    let config = common::create_test_config();
    let pool = common::setup_test_db(&config).await;

    let id = common::create_test_job_seeker(&pool, "Jane", "jane@example.com", "Password1").await;

    let repo = AccountRepository::new(pool.clone());
    let token = generate_reset_token();
    let expires_at = chrono::Utc::now() - chrono::Duration::minutes(1);
    repo.store_reset_token(Role::JobSeeker, id, &hash_token(&token), expires_at)
        .await
        .unwrap();

    let service = build_auth_service(pool);

    let result = service
        .reset_password(ResetPasswordRequest {
            token,
            role: Role::JobSeeker,
            new_password: "FreshPassword3".to_string(),
        })
        .await
        .unwrap_err();

    // 错误令牌与过期令牌不可区分
    assert_eq!(result.user_message(), "Invalid or expired reset token");
}

#[tokio::test]
#[ignore] // 需要数据库
async fn test_admin_excluded_from_password_reset() {
    let config = common::create_test_config();
    let pool = common::setup_test_db(&config).await;

    common::create_test_admin(&pool, "Root", "root@example.com", "Password1", None).await;

    let service = build_auth_service(pool);

    let result = service
        .request_password_reset(RequestPasswordResetRequest {
            email: "root@example.com".to_string(),
            role: Role::Admin,
        })
        .await;

    assert!(matches!(
        result,
        Err(jobboard_system::error::AppError::BadRequest(_))
    ));
}

#[tokio::test]
#[ignore] // 需要数据库
async fn test_current_user_not_found_after_row_removed() {
    let config = common::create_test_config();
    let pool = common::setup_test_db(&config).await;

    let id = common::create_test_job_seeker(&pool, "Jane", "jane@example.com", "Password1").await;

    sqlx::query("DELETE FROM job_seekers WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .unwrap();

    let service = build_auth_service(pool);

    let result = service.current_user(Role::JobSeeker, id).await;
    assert!(matches!(
        result,
        Err(jobboard_system::error::AppError::NotFound(_))
    ));
}

/// 端到端场景：注册 → 登录 → 重置 → 旧密码失效 → 新密码登录
#[tokio::test]
#[ignore] // 需要数据库
async fn test_end_to_end_register_login_reset_cycle() {
    let config = common::create_test_config();
    let pool = common::setup_test_db(&config).await;
    let service = build_auth_service(pool.clone());

    // 注册
    let registered = service
        .register_job_seeker(RegisterJobSeekerRequest {
            full_name: "A".to_string(),
            email: "a@x.com".to_string(),
            password: "Password1".to_string(),
            phone: None,
        })
        .await
        .unwrap();
    let account_id = registered.user.id;

    // 正确密码登录返回同一账户
    let login = service
        .login_any(login_req("a@x.com", "Password1"))
        .await
        .unwrap();
    assert_eq!(login.user.id, account_id);

    // 错误密码被拒绝
    assert!(service.login_any(login_req("a@x.com", "wrong")).await.is_err());

    // 发起重置：令牌落库
    service
        .request_password_reset(RequestPasswordResetRequest {
            email: "a@x.com".to_string(),
            role: Role::JobSeeker,
        })
        .await
        .unwrap();

    let stored: Option<String> =
        sqlx::query_scalar("SELECT reset_token FROM job_seekers WHERE id = $1")
            .bind(account_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert!(stored.is_some());

    // 测试侧写入已知令牌完成重置
    let repo = AccountRepository::new(pool.clone());
    let token = generate_reset_token();
    repo.store_reset_token(
        Role::JobSeeker,
        account_id,
        &hash_token(&token),
        chrono::Utc::now() + chrono::Duration::minutes(15),
    )
    .await
    .unwrap();

    service
        .reset_password(ResetPasswordRequest {
            token,
            role: Role::JobSeeker,
            new_password: "Password2".to_string(),
        })
        .await
        .unwrap();

    // 旧密码失效，新密码生效
    assert!(service.login_any(login_req("a@x.com", "Password1")).await.is_err());
    let relogin = service
        .login_any(login_req("a@x.com", "Password2"))
        .await
        .unwrap();
    assert_eq!(relogin.user.id, account_id);
}
