//! 推文同步模块
//!
//! 内存中的推文/资料列表是所有界面唯一的数据来源，只由 [`FeedSyncer`] 修改。

pub mod listener;
pub mod models;
pub mod reconcile;
pub mod service;

// 重新导出主要类型
pub use listener::{EmptyFeedListener, FeedListener};
pub use models::{FeedState, FeedSyncerConfig, PendingPost, PublishOutcome};
pub use reconcile::{ContentMatch, PendingTable, Settlement, MAX_PENDING_MISSES};
pub use service::FeedSyncer;
