//! Account repository (数据库访问层)
//!
//! 三个账户分区（job_seekers / employers / admins）各自独立存储，
//! 通过列别名映射到统一的 Account 形状。

use crate::{error::AppError, models::account::{Account, Role}};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// job_seekers 分区的统一查询列
const JOB_SEEKER_COLUMNS: &str = "id, email, password_hash, full_name, phone, \
     NULL::text AS company_name, NULL::text AS admin_label, deleted, \
     reset_token, reset_token_expires_at, created_at, updated_at";

/// employers 分区的统一查询列
const EMPLOYER_COLUMNS: &str = "id, email, password_hash, full_name, phone, \
     company_name, NULL::text AS admin_label, deleted, \
     reset_token, reset_token_expires_at, created_at, updated_at";

/// admins 分区的统一查询列（无软删除、无重置令牌字段）
const ADMIN_COLUMNS: &str = "id, email, password_hash, full_name, NULL::text AS phone, \
     NULL::text AS company_name, role AS admin_label, FALSE AS deleted, \
     NULL::text AS reset_token, NULL::timestamptz AS reset_token_expires_at, \
     created_at, updated_at";

pub struct AccountRepository {
    db: PgPool,
}

impl AccountRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// 分区对应的表名
    fn table(role: Role) -> &'static str {
        match role {
            Role::JobSeeker => "job_seekers",
            Role::Employer => "employers",
            Role::Admin => "admins",
        }
    }

    /// 分区对应的统一查询列
    fn columns(role: Role) -> &'static str {
        match role {
            Role::JobSeeker => JOB_SEEKER_COLUMNS,
            Role::Employer => EMPLOYER_COLUMNS,
            Role::Admin => ADMIN_COLUMNS,
        }
    }

    /// 根据邮箱在指定分区查找账户
    pub async fn find_by_email(&self, role: Role, email: &str) -> Result<Option<Account>, AppError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE email = $1",
            Self::columns(role),
            Self::table(role)
        );

        let account = sqlx::query_as::<_, Account>(&sql)
            .bind(email)
            .fetch_optional(&self.db)
            .await?;

        Ok(account)
    }

    /// 根据 ID 在指定分区查找账户
    pub async fn find_by_id(&self, role: Role, id: Uuid) -> Result<Option<Account>, AppError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = $1",
            Self::columns(role),
            Self::table(role)
        );

        let account = sqlx::query_as::<_, Account>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(account)
    }

    /// 检查邮箱是否存在于任一分区
    ///
    /// 软删除的账户仍然占用邮箱。并发注册竞态由各表的唯一约束兜底。
    pub async fn email_exists(&self, email: &str) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(SELECT 1 FROM job_seekers WHERE email = $1)
                OR EXISTS(SELECT 1 FROM employers WHERE email = $1)
                OR EXISTS(SELECT 1 FROM admins WHERE email = $1)
            "#,
        )
        .bind(email)
        .fetch_one(&self.db)
        .await?;

        Ok(exists)
    }

    /// 创建求职者账户
    pub async fn create_job_seeker(
        &self,
        full_name: &str,
        email: &str,
        phone: Option<&str>,
        password_hash: &str,
    ) -> Result<Account, AppError> {
        let sql = format!(
            r#"
            INSERT INTO job_seekers (full_name, email, phone, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            JOB_SEEKER_COLUMNS
        );

        sqlx::query_as::<_, Account>(&sql)
            .bind(full_name)
            .bind(email)
            .bind(phone)
            .bind(password_hash)
            .fetch_one(&self.db)
            .await
            .map_err(Self::map_insert_error)
    }

    /// 创建雇主账户
    pub async fn create_employer(
        &self,
        full_name: &str,
        company_name: &str,
        email: &str,
        phone: Option<&str>,
        password_hash: &str,
    ) -> Result<Account, AppError> {
        let sql = format!(
            r#"
            INSERT INTO employers (full_name, company_name, email, phone, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            EMPLOYER_COLUMNS
        );

        sqlx::query_as::<_, Account>(&sql)
            .bind(full_name)
            .bind(company_name)
            .bind(email)
            .bind(phone)
            .bind(password_hash)
            .fetch_one(&self.db)
            .await
            .map_err(Self::map_insert_error)
    }

    /// 更新密码并刷新修改时间戳
    pub async fn update_password(
        &self,
        role: Role,
        id: Uuid,
        password_hash: &str,
    ) -> Result<bool, AppError> {
        let sql = format!(
            "UPDATE {} SET password_hash = $2, updated_at = NOW() WHERE id = $1",
            Self::table(role)
        );

        let result = sqlx::query(&sql)
            .bind(id)
            .bind(password_hash)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// 写入重置令牌哈希与过期时间
    pub async fn store_reset_token(
        &self,
        role: Role,
        id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        if !role.supports_password_reset() {
            return Err(AppError::Internal(
                "admin accounts do not carry reset tokens".to_string(),
            ));
        }

        let sql = format!(
            r#"
            UPDATE {}
            SET reset_token = $2, reset_token_expires_at = $3, updated_at = NOW()
            WHERE id = $1
            "#,
            Self::table(role)
        );

        sqlx::query(&sql)
            .bind(id)
            .bind(token_hash)
            .bind(expires_at)
            .execute(&self.db)
            .await?;

        Ok(())
    }

    /// 消费重置令牌并写入新密码
    ///
    /// 令牌匹配、过期检查、密码更新与令牌清除在同一条语句内完成，
    /// 保证令牌单次使用。返回 None 表示令牌无效或已过期。
    pub async fn consume_reset_token(
        &self,
        role: Role,
        token_hash: &str,
        new_password_hash: &str,
    ) -> Result<Option<Uuid>, AppError> {
        if !role.supports_password_reset() {
            return Err(AppError::Internal(
                "admin accounts do not carry reset tokens".to_string(),
            ));
        }

        let sql = format!(
            r#"
            UPDATE {}
            SET password_hash = $2,
                reset_token = NULL,
                reset_token_expires_at = NULL,
                updated_at = NOW()
            WHERE reset_token = $1 AND reset_token_expires_at > NOW()
            RETURNING id
            "#,
            Self::table(role)
        );

        let id: Option<Uuid> = sqlx::query_scalar(&sql)
            .bind(token_hash)
            .bind(new_password_hash)
            .fetch_optional(&self.db)
            .await?;

        Ok(id)
    }

    /// 唯一约束冲突映射为重复邮箱错误
    fn map_insert_error(e: sqlx::Error) -> AppError {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.is_unique_violation() {
                return AppError::BadRequest("Email already registered".to_string());
            }
        }
        AppError::Database(e)
    }
}
