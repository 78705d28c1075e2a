//! Business logic services layer

pub mod auth_service;
pub mod mailer;

pub use auth_service::AuthService;
pub use mailer::MailerService;
