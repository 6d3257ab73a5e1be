//! 推文 SDK 客户端
//!
//! 组装配置、SQLite 连接池、身份协作方、监听器与同步器，对外提供界面需要的全部操作。

use crate::feed::db::create_sqlite_pool_with_migration;
use crate::feed::identity::{IdentityProvider, NoIdentity};
use crate::feed::profile::models::Profile;
use crate::feed::sync::{
    EmptyFeedListener, FeedListener, FeedState, FeedSyncer, FeedSyncerConfig, PublishOutcome,
};
use crate::feed::tweet::models::{CreateTweetInput, Tweet};
use crate::feed::types::{DEFAULT_API_ROOT, DEFAULT_EMAIL};
use crate::feed::view::{
    find_profile_by_handle, sort_by_recency, tweets_by_handle, SearchPage, SearchView,
};
use anyhow::{Context, Result};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// 客户端配置
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// 示例 API 根地址
    pub api_root: String,
    /// 本地 SQLite 数据库 URL
    ///
    /// 例如：`sqlite://feed.db?mode=rwc`
    pub db_url: String,
    /// 申请 token 时默认使用的邮箱
    pub default_email: String,
    /// 单个 HTTP 请求超时，None 表示不设超时
    pub request_timeout: Option<Duration>,
}

impl ClientConfig {
    /// 创建默认配置
    pub fn new(db_url: impl Into<String>) -> Self {
        Self {
            api_root: DEFAULT_API_ROOT.to_string(),
            db_url: db_url.into(),
            default_email: DEFAULT_EMAIL.to_string(),
            request_timeout: None,
        }
    }

    fn syncer_config(&self) -> FeedSyncerConfig {
        FeedSyncerConfig {
            api_root: self.api_root.clone(),
            db_path: self.db_url.clone(),
            request_timeout: self.request_timeout,
        }
    }
}

/// 用户主页：资料与该用户的推文
#[derive(Debug, Clone, Serialize)]
pub struct UserPage {
    pub handle: String,
    pub profile: Option<Profile>,
    pub tweets: Vec<Tweet>,
}

/// 推文 SDK 客户端
#[derive(Clone)]
pub struct FeedClient {
    config: ClientConfig,
    identity: Arc<dyn IdentityProvider>,
    listener: Arc<dyn FeedListener>,
    syncer: Option<Arc<FeedSyncer>>,
}

impl FeedClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            identity: Arc::new(NoIdentity),
            listener: Arc::new(EmptyFeedListener),
            syncer: None,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// 注册身份协作方（需在 `connect` 之前调用）
    pub fn set_identity_provider(&mut self, identity: Arc<dyn IdentityProvider>) {
        self.identity = identity;
    }

    /// 注册监听器（需在 `connect` 之前调用）
    pub fn set_feed_listener(&mut self, listener: Arc<dyn FeedListener>) {
        self.listener = listener;
    }

    /// 打开本地数据库、创建同步器并读取保存的 token
    pub async fn connect(&mut self) -> Result<()> {
        info!(
            "[Client] 连接中，API: {}, 数据库: {}",
            self.config.api_root, self.config.db_url
        );
        let db = create_sqlite_pool_with_migration(&self.config.db_url).await?;
        let syncer = FeedSyncer::with_listener_and_db(
            self.config.syncer_config(),
            self.identity.clone(),
            self.listener.clone(),
            db,
        )?;
        syncer.load_persisted_token().await?;
        self.syncer = Some(Arc::new(syncer));
        info!("[Client] ✅ 客户端已就绪");
        Ok(())
    }

    fn syncer(&self) -> Result<&Arc<FeedSyncer>> {
        self.syncer
            .as_ref()
            .context("客户端尚未连接，请先调用 connect")
    }

    /// 状态快照
    pub async fn state(&self) -> Result<FeedState> {
        Ok(self.syncer()?.state().await)
    }

    /// 按邮箱申请 token，`email` 为 None 时使用配置中的默认邮箱
    pub async fn request_token(&self, email: Option<&str>) -> Result<bool> {
        let email = email.unwrap_or(&self.config.default_email);
        self.syncer()?.request_token(email).await
    }

    pub async fn set_token_manually(&self, token: &str) -> Result<()> {
        self.syncer()?.set_token_manually(token).await
    }

    pub async fn clear_token(&self) -> Result<()> {
        self.syncer()?.clear_token().await
    }

    pub async fn refresh_tweets(&self) -> Result<()> {
        self.syncer()?.refresh_tweets().await;
        Ok(())
    }

    pub async fn refresh_profiles(&self) -> Result<()> {
        self.syncer()?.refresh_profiles().await;
        Ok(())
    }

    pub async fn publish_tweet(&self, input: CreateTweetInput) -> Result<PublishOutcome> {
        Ok(self.syncer()?.publish_tweet(input).await)
    }

    /// 首页：按时间倒序的全部推文
    pub async fn home_feed(&self) -> Result<Vec<Tweet>> {
        Ok(sort_by_recency(&self.syncer()?.tweets().await))
    }

    /// 搜索页：按界面状态计算当前页
    pub async fn search(&self, view: &mut SearchView) -> Result<SearchPage> {
        Ok(view.apply(&self.syncer()?.tweets().await))
    }

    /// 用户主页
    ///
    /// 列表为空时先各刷新一次。
    pub async fn user_page(&self, handle: &str) -> Result<UserPage> {
        let syncer = self.syncer()?;
        let mut profiles = syncer.profiles().await;
        if profiles.is_empty() {
            syncer.refresh_profiles().await;
            profiles = syncer.profiles().await;
        }
        let mut tweets = syncer.tweets().await;
        if tweets.is_empty() {
            syncer.refresh_tweets().await;
            tweets = syncer.tweets().await;
        }

        Ok(UserPage {
            handle: handle.to_string(),
            profile: find_profile_by_handle(&profiles, handle).cloned(),
            tweets: tweets_by_handle(&tweets, handle),
        })
    }
}
