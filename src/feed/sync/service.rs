//! 推文同步服务层
//!
//! 持有内存中的推文/资料列表与 token，负责刷新、乐观发布与对账。
//! 所有远端调用都是尽力而为：失败只表现为“列表没有变化”，不会向调用方抛错；
//! 只有本地 token 持久化的错误会返回给调用方。
//!
//! 状态放在内部的互斥锁里，锁只在读写状态时短暂持有，网络请求期间不持锁，
//! 所以请求进行中其它调用方仍能读到最新状态（包括乐观插入的推文和加载标记）。
//! 并发写入按完成顺序生效，后写入者覆盖先写入者。

use crate::feed::db::create_sqlite_pool_with_migration;
use crate::feed::identity::{resolve_identity, IdentityProvider, NoIdentity};
use crate::feed::profile::api::ProfileApi;
use crate::feed::profile::models::Profile;
use crate::feed::sync::listener::{EmptyFeedListener, FeedListener};
use crate::feed::sync::models::{FeedState, FeedSyncerConfig, PendingPost, PublishOutcome};
use crate::feed::sync::reconcile::{PendingTable, Settlement};
use crate::feed::token::api::TokenApi;
use crate::feed::token::dao::TokenDao;
use crate::feed::tweet::api::TweetApi;
use crate::feed::tweet::models::{CreateTweetInput, Tweet};
use crate::feed::types::build_http_client;
use anyhow::Result;
use chrono::{SecondsFormat, Utc};
use sqlx::{Pool, Sqlite};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// 锁内的可变状态
#[derive(Default)]
struct SyncInner {
    state: FeedState,
    /// 尚未在服务器列表中确认的乐观推文
    pending: PendingTable,
    /// 最近一次分配的乐观 ID（保证严格递减）
    last_optimistic_id: i64,
    /// 每次设置或清除 token 加一；请求返回时代数变了就丢弃结果
    token_generation: u64,
    tweets_in_flight: usize,
    profiles_in_flight: usize,
}

impl SyncInner {
    /// 分配乐观 ID：当前毫秒时间戳取负，同一毫秒内继续递减
    fn next_optimistic_id(&mut self) -> i64 {
        let candidate = -Utc::now().timestamp_millis();
        let id = if candidate < self.last_optimistic_id {
            candidate
        } else {
            self.last_optimistic_id - 1
        };
        self.last_optimistic_id = id;
        id
    }

    /// 当前 token 及其代数
    fn token_ticket(&self) -> Option<(String, u64)> {
        self.state
            .token
            .clone()
            .map(|token| (token, self.token_generation))
    }

    /// 用拉取结果对账并写入推文列表
    fn apply_fetched_tweets(&mut self, fetched: Vec<Tweet>) -> Settlement {
        let settlement = self.pending.settle(&fetched);
        self.state.tweets = self.pending.merge(fetched);
        settlement
    }

    fn tweets_json(&self) -> Option<String> {
        serde_json::to_string(&self.state.tweets).ok()
    }

    fn profiles_json(&self) -> Option<String> {
        serde_json::to_string(&self.state.profiles).ok()
    }
}

fn log_settlement(settlement: &Settlement) {
    if !settlement.confirmed.is_empty() {
        debug!(
            "[FeedSync] 已确认 {} 条待定推文: {:?}",
            settlement.confirmed.len(),
            settlement.confirmed
        );
    }
    for post in &settlement.evicted {
        warn!(
            "[FeedSync] 推文 {} 连续 {} 次未出现在服务器列表中，放弃等待，操作ID: {}",
            post.tweet.id, post.misses, post.operation_id
        );
    }
}

/// 推文同步器
///
/// 方法都只需要 `&self`，可以放进 `Arc` 在多个任务间共享。
pub struct FeedSyncer {
    tweet_api: TweetApi,
    profile_api: ProfileApi,
    token_api: TokenApi,
    token_dao: TokenDao,
    identity: Arc<dyn IdentityProvider>,
    listener: Arc<dyn FeedListener>,
    inner: Mutex<SyncInner>,
}

impl FeedSyncer {
    /// 创建同步器（无身份协作方、空监听器，内部创建连接池）
    pub async fn new(config: FeedSyncerConfig) -> Result<Self> {
        info!(
            "[FeedSync] 创建推文同步器，API: {}, SQLite数据库: {}",
            config.api_root, config.db_path
        );
        let db = create_sqlite_pool_with_migration(&config.db_path).await?;
        Self::with_listener_and_db(
            config,
            Arc::new(NoIdentity),
            Arc::new(EmptyFeedListener),
            db,
        )
    }

    /// 创建同步器（使用共享连接池）
    pub fn with_listener_and_db(
        config: FeedSyncerConfig,
        identity: Arc<dyn IdentityProvider>,
        listener: Arc<dyn FeedListener>,
        db: Pool<Sqlite>,
    ) -> Result<Self> {
        let http_client = build_http_client(config.request_timeout)?;
        let api_root = config.api_root.clone();

        Ok(Self {
            tweet_api: TweetApi::new(http_client.clone(), api_root.clone()),
            profile_api: ProfileApi::new(http_client.clone(), api_root.clone()),
            token_api: TokenApi::new(http_client, api_root),
            token_dao: TokenDao::new(db),
            identity,
            listener,
            inner: Mutex::new(SyncInner {
                state: FeedState {
                    initializing: true,
                    ..Default::default()
                },
                ..Default::default()
            }),
        })
    }

    /// 状态快照
    pub async fn state(&self) -> FeedState {
        self.inner.lock().await.state.clone()
    }

    pub async fn tweets(&self) -> Vec<Tweet> {
        self.inner.lock().await.state.tweets.clone()
    }

    pub async fn profiles(&self) -> Vec<Profile> {
        self.inner.lock().await.state.profiles.clone()
    }

    pub async fn token(&self) -> Option<String> {
        self.inner.lock().await.state.token.clone()
    }

    pub async fn tweets_loading(&self) -> bool {
        self.inner.lock().await.state.tweets_loading
    }

    pub async fn profiles_loading(&self) -> bool {
        self.inner.lock().await.state.profiles_loading
    }

    /// 尚未确认的乐观推文
    pub async fn pending_posts(&self) -> Vec<PendingPost> {
        self.inner.lock().await.pending.posts().to_vec()
    }

    /// 某条推文是否仍在等待服务器确认
    pub async fn is_pending(&self, tweet_id: i64) -> bool {
        self.inner.lock().await.pending.is_pending(tweet_id)
    }

    // ========== token ==========

    /// 启动时读取本地保存的 token，存在则刷新两个列表
    pub async fn load_persisted_token(&self) -> Result<()> {
        let stored = self.token_dao.get_token().await;
        let stored = {
            let mut inner = self.inner.lock().await;
            inner.state.initializing = false;
            let stored = stored?.filter(|t| !t.is_empty());
            if let Some(token) = &stored {
                inner.state.token = Some(token.clone());
                inner.token_generation += 1;
            }
            stored
        };

        match stored {
            Some(_) => {
                info!("[FeedSync] 已读取本地 token");
                self.listener.on_token_changed(true).await;
                self.refresh_all().await;
            }
            None => debug!("[FeedSync] 本地没有 token"),
        }
        Ok(())
    }

    /// 按邮箱申请 token，成功时保存并刷新；返回是否拿到了 token
    pub async fn request_token(&self, email: &str) -> Result<bool> {
        self.inner.lock().await.state.requesting_token = true;
        let token = self.token_api.fetch_token_for_email(email).await;
        let saved = if token.is_empty() {
            warn!("[FeedSync] 未能为 {} 申请到 token", email.trim());
            Ok(false)
        } else {
            self.apply_token(token).await.map(|_| true)
        };
        self.inner.lock().await.state.requesting_token = false;

        if matches!(saved, Ok(true)) {
            self.refresh_all().await;
        }
        saved
    }

    /// 手动设置 token（空字符串忽略）
    pub async fn set_token_manually(&self, token: &str) -> Result<()> {
        let token = token.trim();
        if token.is_empty() {
            debug!("[FeedSync] 忽略空 token");
            return Ok(());
        }
        self.apply_token(token.to_string()).await?;
        self.refresh_all().await;
        Ok(())
    }

    /// 持久化并写入状态
    async fn apply_token(&self, token: String) -> Result<()> {
        self.token_dao.save_token(&token).await?;
        {
            let mut inner = self.inner.lock().await;
            inner.state.token = Some(token);
            inner.token_generation += 1;
        }
        self.listener.on_token_changed(true).await;
        info!("[FeedSync] 🔑 token 已更新");
        Ok(())
    }

    /// 清除 token（登出示例 API 身份）：删除本地保存的值并清空两个列表
    ///
    /// 清除前已发出的请求返回后不会再写入列表。
    pub async fn clear_token(&self) -> Result<()> {
        self.token_dao.remove_token().await?;
        let (tweets_json, profiles_json) = {
            let mut inner = self.inner.lock().await;
            inner.state.token = None;
            inner.token_generation += 1;
            inner.pending.clear();
            inner.state.tweets.clear();
            inner.state.profiles.clear();
            (inner.tweets_json(), inner.profiles_json())
        };

        self.listener.on_token_changed(false).await;
        if let Some(json) = tweets_json {
            self.listener.on_tweets_changed(json).await;
        }
        if let Some(json) = profiles_json {
            self.listener.on_profiles_changed(json).await;
        }
        info!("[FeedSync] token 已清除，推文与资料已清空");
        Ok(())
    }

    // ========== 刷新 ==========

    /// 同时刷新推文与资料
    pub async fn refresh_all(&self) {
        tokio::join!(self.refresh_tweets(), self.refresh_profiles());
    }

    /// 刷新推文列表：成功则整体替换（仍待确认的乐观推文放在最前），失败保留原列表
    pub async fn refresh_tweets(&self) {
        let (token, generation, loading_changed) = {
            let mut inner = self.inner.lock().await;
            let Some((token, generation)) = inner.token_ticket() else {
                debug!("[FeedSync] 没有 token，跳过推文刷新");
                return;
            };
            inner.tweets_in_flight += 1;
            let changed = !inner.state.tweets_loading;
            inner.state.tweets_loading = true;
            (token, generation, changed)
        };
        if loading_changed {
            self.listener.on_tweets_loading_changed(true).await;
        }

        info!("[FeedSync] 🔄 刷新推文...");
        let result = self.tweet_api.fetch_tweets(Some(&token)).await;

        let (json, loading_cleared) = {
            let mut inner = self.inner.lock().await;
            let json = match result {
                Ok(_) if inner.token_generation != generation => {
                    debug!("[FeedSync] token 已变化，丢弃本次推文结果");
                    None
                }
                Ok(tweets) => {
                    info!("[FeedSync] ✅ 推文刷新完成，条目数: {}", tweets.len());
                    let settlement = inner.apply_fetched_tweets(tweets);
                    log_settlement(&settlement);
                    inner.tweets_json()
                }
                Err(e) => {
                    error!("[FeedSync] 推文刷新失败，保留原列表: {:?}", e);
                    None
                }
            };
            inner.tweets_in_flight = inner.tweets_in_flight.saturating_sub(1);
            let cleared = inner.tweets_in_flight == 0 && inner.state.tweets_loading;
            if cleared {
                inner.state.tweets_loading = false;
            }
            (json, cleared)
        };

        if let Some(json) = json {
            self.listener.on_tweets_changed(json).await;
        }
        if loading_cleared {
            self.listener.on_tweets_loading_changed(false).await;
        }
    }

    /// 刷新资料列表（与推文刷新相同的约定）
    pub async fn refresh_profiles(&self) {
        let (token, generation, loading_changed) = {
            let mut inner = self.inner.lock().await;
            let Some((token, generation)) = inner.token_ticket() else {
                debug!("[FeedSync] 没有 token，跳过资料刷新");
                return;
            };
            inner.profiles_in_flight += 1;
            let changed = !inner.state.profiles_loading;
            inner.state.profiles_loading = true;
            (token, generation, changed)
        };
        if loading_changed {
            self.listener.on_profiles_loading_changed(true).await;
        }

        info!("[FeedSync] 🔄 刷新资料...");
        let result = self.profile_api.fetch_profiles(Some(&token)).await;

        let (json, loading_cleared) = {
            let mut inner = self.inner.lock().await;
            let json = match result {
                Ok(_) if inner.token_generation != generation => {
                    debug!("[FeedSync] token 已变化，丢弃本次资料结果");
                    None
                }
                Ok(profiles) => {
                    info!("[FeedSync] ✅ 资料刷新完成，条目数: {}", profiles.len());
                    inner.state.profiles = profiles;
                    inner.profiles_json()
                }
                Err(e) => {
                    error!("[FeedSync] 资料刷新失败，保留原列表: {:?}", e);
                    None
                }
            };
            inner.profiles_in_flight = inner.profiles_in_flight.saturating_sub(1);
            let cleared = inner.profiles_in_flight == 0 && inner.state.profiles_loading;
            if cleared {
                inner.state.profiles_loading = false;
            }
            (json, cleared)
        };

        if let Some(json) = json {
            self.listener.on_profiles_changed(json).await;
        }
        if loading_cleared {
            self.listener.on_profiles_loading_changed(false).await;
        }
    }

    // ========== 发布 ==========

    /// 乐观发布推文
    ///
    /// 先把本地推文插到列表头部并通知监听器，再提交到服务器，最后重新拉取并对账。
    /// 提交失败不会回滚乐观条目。
    pub async fn publish_tweet(&self, input: CreateTweetInput) -> PublishOutcome {
        let Some((token, generation)) = self.inner.lock().await.token_ticket() else {
            debug!("[FeedSync] 没有 token，跳过发布");
            return PublishOutcome::Skipped;
        };
        if input.text.trim().is_empty() {
            debug!("[FeedSync] 正文为空，跳过发布");
            return PublishOutcome::Skipped;
        }

        let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let identity = resolve_identity(self.identity.as_ref(), &input).await;
        let operation_id = Uuid::new_v4().to_string();

        let (optimistic, json) = {
            let mut inner = self.inner.lock().await;
            if inner.token_generation != generation {
                debug!("[FeedSync] token 已变化，取消发布");
                return PublishOutcome::Skipped;
            }
            let optimistic = Tweet {
                id: inner.next_optimistic_id(),
                author: identity.author.clone(),
                handle: identity.handle.clone(),
                text: input.text.clone(),
                avatar: identity.avatar.clone(),
                image: input.image.clone(),
                created_at: Some(created_at),
                likes: Some(0),
            };
            inner
                .pending
                .record(operation_id.clone(), optimistic.clone());
            inner.state.tweets.insert(0, optimistic.clone());
            (optimistic, inner.tweets_json())
        };
        info!(
            "[FeedSync] 📝 乐观插入推文，ID: {}, 操作ID: {}",
            optimistic.id, operation_id
        );
        if let Some(json) = json {
            self.listener.on_tweets_changed(json).await;
        }

        let submission = CreateTweetInput {
            text: input.text,
            image: input.image,
            author: Some(identity.author),
            handle: Some(identity.handle),
            avatar: identity.avatar,
        };
        if let Err(e) = self
            .tweet_api
            .post_tweet(&token, &submission, &operation_id)
            .await
        {
            warn!("[FeedSync] 提交推文失败，保留乐观条目: {:?}", e);
        }

        let fetched = match self.tweet_api.fetch_tweets(Some(&token)).await {
            Ok(tweets) => tweets,
            Err(e) => {
                warn!("[FeedSync] 发布后重新拉取失败，乐观条目保留: {:?}", e);
                return PublishOutcome::RefetchFailed(optimistic);
            }
        };

        let (settlement, json) = {
            let mut inner = self.inner.lock().await;
            if inner.token_generation != generation {
                debug!("[FeedSync] token 已变化，丢弃发布后的拉取结果");
                return PublishOutcome::RefetchFailed(optimistic);
            }
            let settlement = inner.apply_fetched_tweets(fetched);
            (settlement, inner.tweets_json())
        };
        log_settlement(&settlement);
        if let Some(json) = json {
            self.listener.on_tweets_changed(json).await;
        }

        if settlement.is_confirmed(&operation_id) {
            info!("[FeedSync] ✅ 推文已在服务器列表中确认，操作ID: {}", operation_id);
            PublishOutcome::Confirmed(optimistic)
        } else {
            warn!(
                "[FeedSync] 服务器列表中未找到新推文，保留乐观条目，操作ID: {}",
                operation_id
            );
            PublishOutcome::Unconfirmed(optimistic)
        }
    }
}
