pub mod feed;

// 重新导出常用类型和函数，方便外部使用
pub use feed::{
    client::{ClientConfig, FeedClient},
    sync::{FeedListener, FeedSyncer, FeedSyncerConfig, PublishOutcome},
    tweet::{CreateTweetInput, Tweet},
    view::{SearchView, SortOption},
};
