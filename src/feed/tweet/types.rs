//! 推文 API DTO（请求结构体）

use crate::feed::tweet::models::CreateTweetInput;
use serde::{Deserialize, Serialize};

/// 发布推文请求体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostTweetReq {
    pub text: String,
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    pub likes: i64,
}

impl PostTweetReq {
    /// 由输入构建请求体，新推文点赞数固定为 0
    pub fn from_input(input: &CreateTweetInput, created_at: String) -> Self {
        Self {
            text: input.text.clone(),
            image: input.image.clone(),
            author: input.author.clone(),
            handle: input.handle.clone(),
            avatar: input.avatar.clone(),
            created_at,
            likes: 0,
        }
    }
}
