//! 同步引擎的状态与配置

use crate::feed::profile::models::Profile;
use crate::feed::tweet::models::Tweet;
use serde::Serialize;
use std::time::Duration;

/// 同步引擎配置
#[derive(Debug, Clone)]
pub struct FeedSyncerConfig {
    /// 示例 API 根地址
    pub api_root: String,
    /// 数据库路径（SQLite URL），例如 `sqlite://feed.db?mode=rwc`
    pub db_path: String,
    /// 单个 HTTP 请求超时，None 表示不设超时
    pub request_timeout: Option<Duration>,
}

/// 界面可观察的引擎状态
#[derive(Debug, Clone, Default, Serialize)]
pub struct FeedState {
    pub tweets: Vec<Tweet>,
    pub tweets_loading: bool,
    pub profiles: Vec<Profile>,
    pub profiles_loading: bool,
    pub token: Option<String>,
    /// 正在按邮箱申请 token
    pub requesting_token: bool,
    /// 尚未读取本地保存的 token
    pub initializing: bool,
}

/// 已乐观插入、尚未在服务器列表中确认的推文
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingPost {
    /// 随发布请求发送的客户端操作 ID
    #[serde(rename = "operationID")]
    pub operation_id: String,
    pub tweet: Tweet,
    /// 之后的拉取中连续没有找到它的次数
    pub misses: u32,
}

/// 一次发布的结果
#[derive(Debug, Clone, PartialEq)]
pub enum PublishOutcome {
    /// 没有 token 或正文为空，什么也没做
    Skipped,
    /// 重新拉取的列表中找到了对应推文，乐观条目被服务器版本取代
    Confirmed(Tweet),
    /// 重新拉取成功但没有找到，乐观条目被放回列表头部
    Unconfirmed(Tweet),
    /// 重新拉取失败（或期间 token 已变化），结果没有写入列表
    RefetchFailed(Tweet),
}

impl PublishOutcome {
    /// 乐观插入的推文（Skipped 时为 None）
    pub fn tweet(&self) -> Option<&Tweet> {
        match self {
            Self::Skipped => None,
            Self::Confirmed(t) | Self::Unconfirmed(t) | Self::RefetchFailed(t) => Some(t),
        }
    }
}
