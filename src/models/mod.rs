//! 数据模型模块
//! 账户分区模型与认证请求/响应模型

pub mod account;
pub mod auth;
