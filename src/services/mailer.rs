//! SMTP 邮件服务
//! 基于 lettre 的异步 SMTP 发送，用于密码重置通知

use crate::{config::MailConfig, error::AppError, models::account::Role};
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use secrecy::ExposeSecret;

pub struct MailerService {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    frontend_base_url: String,
}

impl MailerService {
    /// 从配置构建 SMTP 传输（STARTTLS）
    pub fn from_config(config: &MailConfig) -> Result<Self, AppError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| AppError::Mail(format!("Failed to create SMTP transport: {}", e)))?
            .port(config.smtp_port);

        if !config.smtp_username.is_empty() {
            let credentials = Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.expose_secret().clone(),
            );
            builder = builder.credentials(credentials);
        }

        let from: Mailbox = config
            .from_address
            .parse()
            .map_err(|e| AppError::Mail(format!("Invalid from address: {}", e)))?;

        Ok(Self {
            transport: builder.build(),
            from,
            frontend_base_url: config.frontend_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// 异步验证 SMTP 连通性
    /// 失败只记录日志，不影响服务启动
    pub fn spawn_connectivity_check(&self) {
        let transport = self.transport.clone();
        tokio::spawn(async move {
            match transport.test_connection().await {
                Ok(true) => tracing::info!("SMTP connection verified"),
                Ok(false) => tracing::warn!("SMTP server is not responding"),
                Err(e) => tracing::warn!(error = %e, "SMTP connectivity check failed"),
            }
        });
    }

    /// 拼接密码重置链接
    fn reset_link(&self, token: &str, role: Role) -> String {
        format!(
            "{}/reset-password?token={}&role={}",
            self.frontend_base_url,
            token,
            role.as_str()
        )
    }

    /// 发送密码重置邮件
    pub async fn send_password_reset(
        &self,
        to: &str,
        full_name: &str,
        role: Role,
        token: &str,
    ) -> Result<(), AppError> {
        let to_mailbox: Mailbox = to
            .parse()
            .map_err(|e| AppError::Mail(format!("Invalid recipient address: {}", e)))?;

        let link = self.reset_link(token, role);
        let body = format!(
            "Hello {},\n\n\
             We received a request to reset the password for your account.\n\
             Use the link below to choose a new password. The link expires in 15 minutes.\n\n\
             {}\n\n\
             If you did not request a password reset, you can safely ignore this email.\n",
            full_name, link
        );

        let message = Message::builder()
            .from(self.from.clone())
            .to(to_mailbox)
            .subject("Password reset request")
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| AppError::Mail(format!("Failed to build message: {}", e)))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::Mail(format!("Failed to send email: {}", e)))?;

        tracing::debug!(recipient = %to, "Password reset email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::Secret;

    fn test_mail_config() -> MailConfig {
        MailConfig {
            smtp_host: "localhost".to_string(),
            smtp_port: 587,
            smtp_username: "".to_string(),
            smtp_password: Secret::new("".to_string()),
            from_address: "no-reply@jobboard.local".to_string(),
            frontend_base_url: "https://jobs.example.com/".to_string(),
        }
    }

    #[test]
    fn test_reset_link_format() {
        let mailer = MailerService::from_config(&test_mail_config()).unwrap();
        let link = mailer.reset_link("abc123", Role::Employer);
        assert_eq!(
            link,
            "https://jobs.example.com/reset-password?token=abc123&role=employer"
        );
    }

    #[test]
    fn test_invalid_from_address_rejected() {
        let mut config = test_mail_config();
        config.from_address = "not-an-address".to_string();
        assert!(MailerService::from_config(&config).is_err());
    }
}
