//! 派生视图层
//!
//! 对同步引擎持有的推文列表做纯函数投影：排序、搜索过滤、分页、资料匹配。
//! 输入变化时重新计算即可，这里不持有任何共享状态。

use crate::feed::profile::models::Profile;
use crate::feed::tweet::models::Tweet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 每页条数
pub const PAGE_SIZE: usize = 5;

/// 搜索页的排序方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOption {
    /// 按创建时间倒序
    #[default]
    Newest,
    /// 按创建时间正序
    Oldest,
    /// 按点赞数倒序
    MostLiked,
}

impl SortOption {
    pub const ALL: [SortOption; 3] = [Self::Newest, Self::Oldest, Self::MostLiked];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::Oldest => "oldest",
            Self::MostLiked => "most_liked",
        }
    }

    /// 界面显示名
    pub fn label(&self) -> &'static str {
        match self {
            Self::Newest => "Newest",
            Self::Oldest => "Oldest",
            Self::MostLiked => "Most liked",
        }
    }
}

impl fmt::Display for SortOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOption {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "newest" => Ok(Self::Newest),
            "oldest" => Ok(Self::Oldest),
            "most_liked" | "most-liked" => Ok(Self::MostLiked),
            other => Err(anyhow::anyhow!("未知的排序方式: {}", other)),
        }
    }
}

/// 首页：按创建时间倒序，缺失时间视为最早
pub fn sort_by_recency(tweets: &[Tweet]) -> Vec<Tweet> {
    sort_tweets(tweets.to_vec(), SortOption::Newest)
}

/// 按排序方式排序（稳定排序，相等元素保持原顺序）
pub fn sort_tweets(mut tweets: Vec<Tweet>, sort: SortOption) -> Vec<Tweet> {
    match sort {
        SortOption::Newest => {
            tweets.sort_by_key(|t| std::cmp::Reverse(t.timestamp_millis()))
        }
        SortOption::Oldest => tweets.sort_by_key(|t| t.timestamp_millis()),
        SortOption::MostLiked => tweets.sort_by_key(|t| std::cmp::Reverse(t.like_count())),
    }
    tweets
}

/// 忽略大小写的子串搜索，匹配正文、作者、handle；空查询返回全部
pub fn filter_tweets(tweets: &[Tweet], query: &str) -> Vec<Tweet> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return tweets.to_vec();
    }
    tweets
        .iter()
        .filter(|t| {
            t.text.to_lowercase().contains(&query)
                || t.author.to_lowercase().contains(&query)
                || t.handle.to_lowercase().contains(&query)
        })
        .cloned()
        .collect()
}

/// 总页数，至少为 1
pub fn page_count(len: usize) -> usize {
    len.div_ceil(PAGE_SIZE).max(1)
}

/// 取第 `page` 页（从 1 开始）；页码超出范围时为空
pub fn paginate(tweets: &[Tweet], page: usize) -> &[Tweet] {
    let start = page.saturating_sub(1).saturating_mul(PAGE_SIZE);
    if start >= tweets.len() {
        return &[];
    }
    let end = (start + PAGE_SIZE).min(tweets.len());
    &tweets[start..end]
}

/// 按 handle 查找资料（忽略大小写）
pub fn find_profile_by_handle<'a>(profiles: &'a [Profile], handle: &str) -> Option<&'a Profile> {
    profiles.iter().find(|p| p.matches_handle(handle))
}

/// 查找推文作者的资料：handle 为空时用 author 匹配
pub fn find_profile_for_tweet<'a>(profiles: &'a [Profile], tweet: &Tweet) -> Option<&'a Profile> {
    find_profile_by_handle(profiles, &tweet.identity_key())
}

/// 某个用户的推文（用户主页）
pub fn tweets_by_handle(tweets: &[Tweet], handle: &str) -> Vec<Tweet> {
    let handle = handle.to_lowercase();
    tweets
        .iter()
        .filter(|t| t.identity_key() == handle)
        .cloned()
        .collect()
}

/// 一页搜索结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchPage {
    pub items: Vec<Tweet>,
    /// 当前页（从 1 开始）
    pub page: usize,
    pub page_count: usize,
    /// 过滤后的总条数
    pub total: usize,
}

/// 搜索页的界面状态：查询词、排序、当前页
///
/// 查询词、排序或推文条数变化时回到第 1 页；结果变少时当前页向下收敛。
#[derive(Debug, Clone)]
pub struct SearchView {
    query: String,
    sort: SortOption,
    current_page: usize,
    seen_len: Option<usize>,
}

impl Default for SearchView {
    fn default() -> Self {
        Self {
            query: String::new(),
            sort: SortOption::default(),
            current_page: 1,
            seen_len: None,
        }
    }
}

impl SearchView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn sort(&self) -> SortOption {
        self.sort
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        let query = query.into();
        if query != self.query {
            self.query = query;
            self.current_page = 1;
        }
    }

    pub fn set_sort(&mut self, sort: SortOption) {
        if sort != self.sort {
            self.sort = sort;
            self.current_page = 1;
        }
    }

    /// 提交搜索：回到第 1 页
    pub fn submit_search(&mut self) {
        self.current_page = 1;
    }

    pub fn set_page(&mut self, page: usize) {
        self.current_page = page.max(1);
    }

    /// 基于当前推文列表计算这一页
    pub fn apply(&mut self, tweets: &[Tweet]) -> SearchPage {
        if self.seen_len.is_some_and(|len| len != tweets.len()) {
            self.current_page = 1;
        }
        self.seen_len = Some(tweets.len());

        let sorted = sort_tweets(filter_tweets(tweets, &self.query), self.sort);
        let pages = page_count(sorted.len());
        if self.current_page > pages {
            self.current_page = pages;
        }

        SearchPage {
            items: paginate(&sorted, self.current_page).to_vec(),
            page: self.current_page,
            page_count: pages,
            total: sorted.len(),
        }
    }
}
