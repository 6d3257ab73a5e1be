//! Token 模块
//!
//! 申请 token 的 HTTP API 与本地持久化

pub mod api;
pub mod dao;

pub use api::TokenApi;
pub use dao::{TokenDao, TOKEN_KEY};
