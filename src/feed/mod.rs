pub mod client;
pub mod db;
pub mod identity;
pub mod profile;
pub mod serialization;
pub mod sync;
pub mod token;
pub mod tweet;
pub mod types;
pub mod view;

// 重新导出常用类型
pub use client::{ClientConfig, FeedClient, UserPage};
pub use identity::{IdentityProvider, NoIdentity, SessionIdentity, StaticIdentity, StoredProfile};
pub use profile::Profile;
pub use sync::{FeedListener, FeedState, FeedSyncer, PublishOutcome};
pub use tweet::{CreateTweetInput, Tweet};
pub use view::{SearchPage, SearchView, SortOption};
