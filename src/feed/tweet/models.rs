//! 推文本地模型定义

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// 规范化后的推文（所有界面共用的统一结构）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tweet {
    /// 推文 ID，仅在一次拉取的快照内唯一；乐观插入的推文使用负数
    pub id: i64,
    /// 作者显示名
    pub author: String,
    /// 用户名（身份键，忽略大小写比较）
    pub handle: String,
    /// 正文
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// 创建时间（ISO-8601 字符串），缺失或无法解析时视为 epoch 0
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// 点赞数，缺失时按 0 处理
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub likes: Option<i64>,
}

impl Tweet {
    /// 用于与 Profile 匹配的身份键：handle 为空时回退到 author，统一小写
    pub fn identity_key(&self) -> String {
        let key = if self.handle.trim().is_empty() {
            &self.author
        } else {
            &self.handle
        };
        key.to_lowercase()
    }

    /// 有效时间戳（毫秒），缺失或无法解析时为 0
    pub fn timestamp_millis(&self) -> i64 {
        self.created_at
            .as_deref()
            .and_then(parse_timestamp_millis)
            .unwrap_or(0)
    }

    /// 有效点赞数
    pub fn like_count(&self) -> i64 {
        self.likes.unwrap_or(0)
    }
}

/// 解析 ISO-8601 风格的时间字符串为毫秒时间戳
///
/// 依次尝试 RFC 3339、无时区的日期时间（按 UTC）以及纯日期。
pub fn parse_timestamp_millis(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp_millis());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.and_utc().timestamp_millis());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
}

/// 发布推文的输入
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateTweetInput {
    pub text: String,
    #[serde(default)]
    pub image: Option<String>,
    /// 以下三个字段用于在服务器确认前把本地身份写进新推文
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

impl CreateTweetInput {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}
