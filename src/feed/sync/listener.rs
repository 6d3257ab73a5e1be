//! 同步引擎监听器回调接口

use async_trait::async_trait;

/// 同步引擎监听器：状态每次变化都会回调，列表参数为 JSON 数组字符串
#[async_trait]
pub trait FeedListener: Send + Sync {
    /// 推文列表变更
    async fn on_tweets_changed(&self, tweets_json: String);

    /// 推文加载状态变更
    async fn on_tweets_loading_changed(&self, loading: bool);

    /// 资料列表变更
    async fn on_profiles_changed(&self, profiles_json: String);

    /// 资料加载状态变更
    async fn on_profiles_loading_changed(&self, loading: bool);

    /// token 被设置或清除
    async fn on_token_changed(&self, has_token: bool);
}

/// 默认空实现（无操作）
pub struct EmptyFeedListener;

#[async_trait]
impl FeedListener for EmptyFeedListener {
    async fn on_tweets_changed(&self, _tweets_json: String) {}
    async fn on_tweets_loading_changed(&self, _loading: bool) {}
    async fn on_profiles_changed(&self, _profiles_json: String) {}
    async fn on_profiles_loading_changed(&self, _loading: bool) {}
    async fn on_token_changed(&self, _has_token: bool) {}
}
