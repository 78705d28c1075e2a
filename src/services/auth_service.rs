//! 认证服务：注册、登录、密码修改与重置
//!
//! 三个账户分区共用同一套凭证校验与令牌签发流程。所有凭证失败
//! 返回同一条 "Invalid credentials" 消息，避免泄露邮箱是否注册。

use crate::{
    auth::jwt::JwtService,
    auth::password::PasswordHasher,
    auth::reset_token::{generate_reset_token, hash_token},
    config::AppConfig,
    error::AppError,
    models::account::{Account, AccountResponse, Role},
    models::auth::*,
    repository::AccountRepository,
    services::mailer::MailerService,
};
use chrono::Utc;
use sqlx::PgPool;
use std::sync::Arc;
use validator::Validate;

pub struct AuthService {
    db: PgPool,
    jwt_service: Arc<JwtService>,
    mailer: Arc<MailerService>,
    config: Arc<AppConfig>,
}

impl AuthService {
    pub fn new(
        db: PgPool,
        jwt_service: Arc<JwtService>,
        mailer: Arc<MailerService>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            db,
            jwt_service,
            mailer,
            config,
        }
    }

    /// 注册求职者账户
    pub async fn register_job_seeker(
        &self,
        req: RegisterJobSeekerRequest,
    ) -> Result<AuthResponse, AppError> {
        req.validate()?;
        PasswordHasher::validate_password_policy(&req.password, &self.config.security)?;

        let repo = AccountRepository::new(self.db.clone());

        // 邮箱唯一性横跨三个分区
        if repo.email_exists(&req.email).await? {
            return Err(AppError::BadRequest("Email already registered".to_string()));
        }

        let password_hash = Self::hash_password(req.password).await?;

        let account = repo
            .create_job_seeker(&req.full_name, &req.email, req.phone.as_deref(), &password_hash)
            .await?;

        tracing::info!(account_id = %account.id, "Job seeker registered");

        self.issue_response(account, Role::JobSeeker)
    }

    /// 注册雇主账户
    pub async fn register_employer(
        &self,
        req: RegisterEmployerRequest,
    ) -> Result<AuthResponse, AppError> {
        req.validate()?;
        PasswordHasher::validate_password_policy(&req.password, &self.config.security)?;

        let repo = AccountRepository::new(self.db.clone());

        if repo.email_exists(&req.email).await? {
            return Err(AppError::BadRequest("Email already registered".to_string()));
        }

        let password_hash = Self::hash_password(req.password).await?;

        let account = repo
            .create_employer(
                &req.full_name,
                &req.company_name,
                &req.email,
                req.phone.as_deref(),
                &password_hash,
            )
            .await?;

        tracing::info!(account_id = %account.id, "Employer registered");

        self.issue_response(account, Role::Employer)
    }

    /// 指定分区登录
    pub async fn login(&self, role: Role, req: LoginRequest) -> Result<AuthResponse, AppError> {
        let repo = AccountRepository::new(self.db.clone());

        let account = repo
            .find_by_email(role, &req.email)
            .await?
            .ok_or_else(Self::invalid_credentials)?;

        self.authenticate(role, account, req.password).await
    }

    /// 统一登录：按固定顺序探测分区，命中邮箱即短路
    ///
    /// 命中分区后密码错误不再继续探测其他分区。
    pub async fn login_any(&self, req: LoginRequest) -> Result<AuthResponse, AppError> {
        let repo = AccountRepository::new(self.db.clone());

        for role in Role::LOGIN_PROBE_ORDER {
            if let Some(account) = repo.find_by_email(role, &req.email).await? {
                return self.authenticate(role, account, req.password).await;
            }
        }

        Err(Self::invalid_credentials())
    }

    /// 根据令牌身份获取当前账户
    pub async fn current_user(
        &self,
        role: Role,
        account_id: uuid::Uuid,
    ) -> Result<AccountResponse, AppError> {
        let repo = AccountRepository::new(self.db.clone());

        let account = repo
            .find_by_id(role, account_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Account".to_string()))?;

        Ok(AccountResponse::from_account(account, role))
    }

    /// 修改密码（不轮换令牌）
    pub async fn change_password(
        &self,
        role: Role,
        account_id: uuid::Uuid,
        req: ChangePasswordRequest,
    ) -> Result<(), AppError> {
        req.validate()?;

        let repo = AccountRepository::new(self.db.clone());

        let account = repo
            .find_by_id(role, account_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Account".to_string()))?;

        // 校验当前密码
        let verified =
            Self::verify_password(req.current_password, account.password_hash.clone()).await?;
        if !verified {
            return Err(AppError::Authentication(
                "Current password is incorrect".to_string(),
            ));
        }

        PasswordHasher::validate_password_policy(&req.new_password, &self.config.security)?;

        let new_hash = Self::hash_password(req.new_password).await?;
        repo.update_password(role, account_id, &new_hash).await?;

        tracing::info!(account_id = %account_id, role = %role, "Password changed");
        Ok(())
    }

    /// 发起密码重置：落库令牌哈希，异步发送邮件
    ///
    /// 令牌落库后即视为成功。邮件发送失败只记录日志与指标，
    /// 不回滚令牌，也不改变响应。
    pub async fn request_password_reset(
        &self,
        req: RequestPasswordResetRequest,
    ) -> Result<(), AppError> {
        req.validate()?;

        // Admin 分区不提供自助重置
        if !req.role.supports_password_reset() {
            return Err(AppError::BadRequest(
                "Password reset is not available for this account type".to_string(),
            ));
        }

        let repo = AccountRepository::new(self.db.clone());

        let account = repo
            .find_by_email(req.role, &req.email)
            .await?
            .ok_or_else(|| AppError::NotFound("Account".to_string()))?;

        let token = generate_reset_token();
        let token_hash = hash_token(&token);
        let expires_at = Utc::now()
            + chrono::Duration::seconds(self.config.security.reset_token_exp_secs as i64);

        repo.store_reset_token(req.role, account.id, &token_hash, expires_at)
            .await?;

        tracing::info!(account_id = %account.id, role = %req.role, "Password reset token issued");

        // 邮件发送不阻塞请求
        let mailer = self.mailer.clone();
        let role = req.role;
        let email = account.email.clone();
        let full_name = account.full_name.clone();
        tokio::spawn(async move {
            if let Err(e) = mailer.send_password_reset(&email, &full_name, role, &token).await {
                metrics::counter!("auth.reset_email_failures").increment(1);
                tracing::error!(error = %e, "Failed to send password reset email");
            }
        });

        Ok(())
    }

    /// 消费重置令牌并写入新密码
    ///
    /// 令牌错误与令牌过期返回同一条消息，不提供区分信号。
    pub async fn reset_password(&self, req: ResetPasswordRequest) -> Result<(), AppError> {
        req.validate()?;

        if !req.role.supports_password_reset() {
            return Err(AppError::BadRequest(
                "Password reset is not available for this account type".to_string(),
            ));
        }

        PasswordHasher::validate_password_policy(&req.new_password, &self.config.security)?;

        let new_hash = Self::hash_password(req.new_password).await?;

        let repo = AccountRepository::new(self.db.clone());
        let consumed = repo
            .consume_reset_token(req.role, &hash_token(&req.token), &new_hash)
            .await?;

        match consumed {
            Some(account_id) => {
                tracing::info!(account_id = %account_id, role = %req.role, "Password reset completed");
                Ok(())
            }
            None => Err(AppError::BadRequest(
                "Invalid or expired reset token".to_string(),
            )),
        }
    }

    /// 分区命中后的共同校验：软删除检查、密码验证、令牌签发
    async fn authenticate(
        &self,
        role: Role,
        account: Account,
        password: String,
    ) -> Result<AuthResponse, AppError> {
        // 软删除账户拒绝登录（Admin 分区没有该标志）
        if role.has_soft_delete() && account.deleted {
            return Err(Self::invalid_credentials());
        }

        let verified = Self::verify_password(password, account.password_hash.clone()).await?;
        if !verified {
            return Err(Self::invalid_credentials());
        }

        self.issue_response(account, role)
    }

    /// 签发令牌并组装响应。role 声明始终来自命中的分区
    fn issue_response(&self, account: Account, role: Role) -> Result<AuthResponse, AppError> {
        let token = self
            .jwt_service
            .issue_token(account.id, &account.email, role)?;

        Ok(AuthResponse {
            role: account.role_label(role),
            user: AccountResponse::from_account(account, role),
            token,
        })
    }

    /// 所有凭证失败共用的错误，避免区分"邮箱不存在"与"密码错误"
    fn invalid_credentials() -> AppError {
        AppError::Authentication("Invalid credentials".to_string())
    }

    /// Argon2 哈希为 CPU 密集操作，移出异步核心线程
    async fn hash_password(password: String) -> Result<String, AppError> {
        tokio::task::spawn_blocking(move || PasswordHasher::new().hash(&password))
            .await
            .map_err(|e| AppError::Internal(format!("Hashing task failed: {}", e)))?
    }

    /// 密码校验同样移出异步核心线程
    async fn verify_password(password: String, hash: String) -> Result<bool, AppError> {
        tokio::task::spawn_blocking(move || PasswordHasher::new().verify(&password, &hash))
            .await
            .map_err(|e| AppError::Internal(format!("Verification task failed: {}", e)))?
    }
}
