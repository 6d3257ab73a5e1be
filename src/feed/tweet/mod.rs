//! 推文模块
//!
//! 推文模型、发布请求 DTO 以及推文 HTTP API

pub mod api;
pub mod models;
pub mod types;

// 重新导出主要类型
pub use api::TweetApi;
pub use models::{CreateTweetInput, Tweet};
pub use types::PostTweetReq;
