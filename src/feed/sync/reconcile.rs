//! 乐观发布的对账策略
//!
//! 示例 API 不回传客户端操作 ID，也不同步返回新推文的 ID，只能按内容匹配（[`ContentMatch`]）：
//! 去掉首尾空白后的正文完全相同，且 handle 忽略大小写相同。
//! 这是启发式规则，同一用户连续发布相同内容时可能误判。
//!
//! 待确认的推文记录在 [`PendingTable`] 中，以操作 ID 为键。每次拉取到新列表时：
//! 找到匹配的条目视为已确认并移除；没找到的条目累计一次未命中，仍放在列表头部；
//! 连续 [`MAX_PENDING_MISSES`] 次未命中后淘汰，不再放回列表。

use crate::feed::sync::models::PendingPost;
use crate::feed::tweet::models::Tweet;

/// 未确认推文最多保留的拉取次数
pub const MAX_PENDING_MISSES: u32 = 3;

/// 按内容匹配的对账策略
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentMatch;

impl ContentMatch {
    /// 正文（trim 后）相同且 handle 忽略大小写相同
    pub fn matches(optimistic: &Tweet, candidate: &Tweet) -> bool {
        candidate.text.trim() == optimistic.text.trim()
            && candidate.handle.to_lowercase() == optimistic.handle.to_lowercase()
    }
}

/// 一次对账的结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settlement {
    /// 已在服务器列表中找到的操作 ID
    pub confirmed: Vec<String>,
    /// 因多次未命中被淘汰的条目
    pub evicted: Vec<PendingPost>,
}

impl Settlement {
    pub fn is_confirmed(&self, operation_id: &str) -> bool {
        self.confirmed.iter().any(|id| id == operation_id)
    }
}

/// 待确认推文表（按插入顺序，最新的在最后）
#[derive(Debug, Clone, Default)]
pub struct PendingTable {
    entries: Vec<PendingPost>,
}

impl PendingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一条乐观推文；同一操作 ID 重复记录时覆盖旧条目
    pub fn record(&mut self, operation_id: String, tweet: Tweet) {
        self.entries.retain(|p| p.operation_id != operation_id);
        self.entries.push(PendingPost {
            operation_id,
            tweet,
            misses: 0,
        });
    }

    /// 用拉取到的列表对账：确认匹配的条目，其余累计未命中并淘汰超限条目
    pub fn settle(&mut self, fetched: &[Tweet]) -> Settlement {
        let mut settlement = Settlement::default();
        let mut kept = Vec::with_capacity(self.entries.len());

        for mut post in self.entries.drain(..) {
            if fetched.iter().any(|t| ContentMatch::matches(&post.tweet, t)) {
                settlement.confirmed.push(post.operation_id);
                continue;
            }
            post.misses += 1;
            if post.misses >= MAX_PENDING_MISSES {
                settlement.evicted.push(post);
            } else {
                kept.push(post);
            }
        }

        self.entries = kept;
        settlement
    }

    /// 仍待确认的推文（最新的在前）放在拉取结果前面
    pub fn merge(&self, fetched: Vec<Tweet>) -> Vec<Tweet> {
        if self.entries.is_empty() {
            return fetched;
        }
        let mut tweets = Vec::with_capacity(self.entries.len() + fetched.len());
        tweets.extend(self.entries.iter().rev().map(|p| p.tweet.clone()));
        tweets.extend(fetched);
        tweets
    }

    /// 某条推文是否仍在等待服务器确认
    pub fn is_pending(&self, tweet_id: i64) -> bool {
        self.entries.iter().any(|p| p.tweet.id == tweet_id)
    }

    pub fn posts(&self) -> &[PendingPost] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tweet(id: i64, text: &str, handle: &str) -> Tweet {
        Tweet {
            id,
            author: handle.to_string(),
            handle: handle.to_string(),
            text: text.to_string(),
            avatar: None,
            image: None,
            created_at: None,
            likes: Some(0),
        }
    }

    fn table_with(entries: &[(&str, Tweet)]) -> PendingTable {
        let mut table = PendingTable::new();
        for (op, t) in entries {
            table.record(op.to_string(), t.clone());
        }
        table
    }

    #[test]
    fn match_drops_optimistic_entry() {
        let mut table = table_with(&[("op-1", tweet(-1, "hello", "alice"))]);
        let fetched = vec![tweet(10, "hello", "ALICE"), tweet(11, "other", "bob")];

        let settlement = table.settle(&fetched);
        assert!(settlement.is_confirmed("op-1"));
        assert!(table.is_empty());
        assert_eq!(table.merge(fetched.clone()), fetched);
    }

    #[test]
    fn text_is_compared_after_trimming() {
        let optimistic = tweet(-1, "  hello ", "alice");
        assert!(ContentMatch::matches(&optimistic, &tweet(3, "hello", "Alice")));
        assert!(!ContentMatch::matches(&optimistic, &tweet(3, "Hello", "alice")));
    }

    #[test]
    fn miss_prepends_optimistic_entry() {
        let optimistic = tweet(-1, "hello", "alice");
        let mut table = table_with(&[("op-1", optimistic.clone())]);
        let fetched = vec![tweet(10, "hello", "bob"), tweet(11, "bye", "alice")];

        let settlement = table.settle(&fetched);
        assert!(!settlement.is_confirmed("op-1"));
        assert!(table.is_pending(-1));

        let mut expected = vec![optimistic];
        expected.extend(fetched.clone());
        assert_eq!(table.merge(fetched), expected);
    }

    #[test]
    fn miss_on_empty_list() {
        let optimistic = tweet(-1, "hello", "alice");
        let mut table = table_with(&[("op-1", optimistic.clone())]);
        table.settle(&[]);
        assert_eq!(table.merge(Vec::new()), vec![optimistic]);
    }

    #[test]
    fn newest_pending_post_comes_first() {
        let mut table = table_with(&[
            ("op-1", tweet(-1, "first", "me")),
            ("op-2", tweet(-2, "second", "me")),
        ]);
        table.settle(&[]);
        let ids: Vec<i64> = table.merge(vec![tweet(5, "x", "y")]).iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![-2, -1, 5]);
    }

    #[test]
    fn entries_are_evicted_after_repeated_misses() {
        let mut table = table_with(&[("op-1", tweet(-1, "lost", "me"))]);

        for _ in 1..MAX_PENDING_MISSES {
            let settlement = table.settle(&[]);
            assert!(settlement.evicted.is_empty());
            assert_eq!(table.len(), 1);
        }

        let settlement = table.settle(&[]);
        assert_eq!(settlement.evicted.len(), 1);
        assert_eq!(settlement.evicted[0].operation_id, "op-1");
        assert_eq!(settlement.evicted[0].misses, MAX_PENDING_MISSES);
        assert!(table.is_empty());
        assert!(!table.is_pending(-1));
    }

    #[test]
    fn recording_same_operation_replaces_entry() {
        let mut table = table_with(&[("op-1", tweet(-1, "draft", "me"))]);
        table.record("op-1".to_string(), tweet(-2, "final", "me"));
        assert_eq!(table.len(), 1);
        assert_eq!(table.posts()[0].tweet.text, "final");
    }
}
