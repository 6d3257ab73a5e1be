//! 远端记录的容错规范化
//!
//! 示例 API 返回的推文/资料字段名并不固定，这里用一张声明式的别名表描述
//! 每个逻辑字段可接受的字段名（按优先级），每条记录只按表求值一次。

use crate::feed::profile::models::Profile;
use crate::feed::tweet::models::Tweet;
use serde_json::{Map, Value};

/// 一个逻辑字段的候选字段名，按优先级排列
pub type Aliases = &'static [&'static str];

/// 缺少作者/姓名时的默认显示名
pub const UNKNOWN_USER: &str = "Unknown user";

/// 推文字段别名表
pub struct TweetFieldMap {
    pub id: Aliases,
    pub author: Aliases,
    pub handle: Aliases,
    pub text: Aliases,
    pub avatar: Aliases,
    pub image: Aliases,
    pub created_at: Aliases,
    pub likes: Aliases,
}

pub const TWEET_FIELDS: TweetFieldMap = TweetFieldMap {
    id: &["id"],
    author: &["author", "user", "username", "name"],
    handle: &["handle", "username"],
    text: &["text", "tweet", "message"],
    avatar: &["avatar", "profileImage", "image"],
    image: &["image", "media", "photo"],
    created_at: &["createdAt", "created_at", "date", "time"],
    likes: &["likes", "favorites"],
};

/// 资料字段别名表
pub struct ProfileFieldMap {
    pub id: Aliases,
    pub name: Aliases,
    pub handle: Aliases,
    pub bio: Aliases,
    pub avatar: Aliases,
    pub banner: Aliases,
    pub location: Aliases,
    pub followers: Aliases,
    pub following: Aliases,
}

pub const PROFILE_FIELDS: ProfileFieldMap = ProfileFieldMap {
    id: &["id"],
    name: &["name", "fullName", "username"],
    handle: &["handle", "username"],
    bio: &["bio", "description"],
    avatar: &["avatar", "avatarUrl", "photo", "image"],
    banner: &["banner", "bannerUrl", "cover"],
    location: &["location", "city", "country"],
    followers: &["followers"],
    following: &["following"],
};

/// 对单条原始 JSON 记录的只读视图；非对象记录的所有字段都视为缺失
struct RawRecord<'a> {
    fields: Option<&'a Map<String, Value>>,
}

impl<'a> RawRecord<'a> {
    fn new(value: &'a Value) -> Self {
        Self {
            fields: value.as_object(),
        }
    }

    /// 第一个存在且非 null 的别名值
    fn first(&self, aliases: Aliases) -> Option<&'a Value> {
        let fields = self.fields?;
        aliases
            .iter()
            .filter_map(|name| fields.get(*name))
            .find(|v| !v.is_null())
    }

    /// 取第一个非 null 值并转成字符串；标量直接转换，数组/对象视为缺失
    fn string(&self, aliases: Aliases) -> Option<String> {
        self.first(aliases).and_then(scalar_to_string)
    }

    /// 取第一个数值类型的别名值（非数值的同名字段会被跳过）
    fn number(&self, aliases: Aliases) -> Option<i64> {
        let fields = self.fields?;
        aliases
            .iter()
            .filter_map(|name| fields.get(*name))
            .find_map(json_number)
    }

    /// 记录 ID：整数、浮点（截断）或数字字符串，否则使用位置下标
    fn id(&self, aliases: Aliases, index: usize) -> i64 {
        self.first(aliases)
            .and_then(|v| match v {
                Value::String(s) => {
                    let s = s.trim();
                    s.parse::<i64>()
                        .ok()
                        .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f as i64))
                }
                other => json_number(other),
            })
            .unwrap_or(index as i64)
    }

    /// 缺少 handle 时合成 `user{id}`，id 缺失时用下标
    fn synthetic_handle(&self, id_aliases: Aliases, index: usize) -> String {
        let suffix = self
            .string(id_aliases)
            .unwrap_or_else(|| index.to_string());
        format!("user{}", suffix)
    }
}

fn scalar_to_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn json_number(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
        _ => None,
    }
}

/// 按 [`TWEET_FIELDS`] 把一条原始记录规范化为 [`Tweet`]
pub fn normalize_tweet(value: &Value, index: usize) -> Tweet {
    let raw = RawRecord::new(value);
    let f = &TWEET_FIELDS;
    Tweet {
        id: raw.id(f.id, index),
        author: raw
            .string(f.author)
            .unwrap_or_else(|| UNKNOWN_USER.to_string()),
        handle: raw
            .string(f.handle)
            .unwrap_or_else(|| raw.synthetic_handle(f.id, index)),
        text: raw.string(f.text).unwrap_or_default(),
        avatar: raw.string(f.avatar),
        image: raw.string(f.image),
        created_at: raw.string(f.created_at),
        likes: Some(raw.number(f.likes).unwrap_or(0)),
    }
}

/// 按 [`PROFILE_FIELDS`] 把一条原始记录规范化为 [`Profile`]
pub fn normalize_profile(value: &Value, index: usize) -> Profile {
    let raw = RawRecord::new(value);
    let f = &PROFILE_FIELDS;
    Profile {
        id: raw.id(f.id, index),
        name: raw
            .string(f.name)
            .unwrap_or_else(|| UNKNOWN_USER.to_string()),
        handle: raw
            .string(f.handle)
            .unwrap_or_else(|| raw.synthetic_handle(f.id, index)),
        bio: raw.string(f.bio).unwrap_or_default(),
        avatar: raw.string(f.avatar),
        banner: raw.string(f.banner),
        location: raw.string(f.location).unwrap_or_default(),
        followers: raw.number(f.followers),
        following: raw.number(f.following),
    }
}

/// 数组载荷逐条规范化；非数组返回 None
pub fn normalize_list<T>(payload: &Value, normalize: fn(&Value, usize) -> T) -> Option<Vec<T>> {
    payload
        .as_array()
        .map(|items| items.iter().enumerate().map(|(i, v)| normalize(v, i)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tweet_aliases_are_tried_in_order() {
        let t = normalize_tweet(
            &json!({
                "id": 7,
                "username": "bobby",
                "tweet": "hi there",
                "profileImage": "http://img/a.png",
                "media": "http://img/m.png",
                "created_at": "2024-05-01T10:00:00Z",
                "favorites": 12
            }),
            3,
        );
        assert_eq!(t.id, 7);
        assert_eq!(t.author, "bobby");
        assert_eq!(t.handle, "bobby");
        assert_eq!(t.text, "hi there");
        assert_eq!(t.avatar.as_deref(), Some("http://img/a.png"));
        assert_eq!(t.image.as_deref(), Some("http://img/m.png"));
        assert_eq!(t.created_at.as_deref(), Some("2024-05-01T10:00:00Z"));
        assert_eq!(t.likes, Some(12));
    }

    #[test]
    fn tweet_fallbacks_when_fields_missing() {
        let t = normalize_tweet(&json!({}), 4);
        assert_eq!(t.id, 4);
        assert_eq!(t.author, UNKNOWN_USER);
        assert_eq!(t.handle, "user4");
        assert_eq!(t.text, "");
        assert_eq!(t.avatar, None);
        assert_eq!(t.created_at, None);
        assert_eq!(t.likes, Some(0));
    }

    #[test]
    fn null_values_fall_through_to_next_alias() {
        let t = normalize_tweet(&json!({"author": null, "user": "carol", "likes": "5", "favorites": 9}), 0);
        assert_eq!(t.author, "carol");
        // "likes" 不是数值，回退到 favorites
        assert_eq!(t.likes, Some(9));
    }

    #[test]
    fn image_doubles_as_avatar() {
        let t = normalize_tweet(&json!({"image": "pic.png"}), 0);
        assert_eq!(t.avatar.as_deref(), Some("pic.png"));
        assert_eq!(t.image.as_deref(), Some("pic.png"));
    }

    #[test]
    fn ids_accept_numeric_strings_and_fall_back_to_index() {
        assert_eq!(normalize_tweet(&json!({"id": "42"}), 0).id, 42);
        assert_eq!(normalize_tweet(&json!({"id": 3.9}), 0).id, 3);
        assert_eq!(normalize_tweet(&json!({"id": "abc"}), 8).id, 8);
        // 合成 handle 使用原始 id
        assert_eq!(normalize_tweet(&json!({"id": "abc"}), 8).handle, "userabc");
    }

    #[test]
    fn numeric_created_at_is_stringified() {
        let t = normalize_tweet(&json!({"time": 1700000000}), 0);
        assert_eq!(t.created_at.as_deref(), Some("1700000000"));
    }

    #[test]
    fn profile_normalization() {
        let p = normalize_profile(
            &json!({
                "fullName": "Alice A.",
                "username": "alice",
                "description": "hello",
                "avatarUrl": "a.png",
                "cover": "c.png",
                "city": "Antwerp",
                "followers": 10,
                "following": "many"
            }),
            1,
        );
        assert_eq!(p.id, 1);
        assert_eq!(p.name, "Alice A.");
        assert_eq!(p.handle, "alice");
        assert_eq!(p.bio, "hello");
        assert_eq!(p.avatar.as_deref(), Some("a.png"));
        assert_eq!(p.banner.as_deref(), Some("c.png"));
        assert_eq!(p.location, "Antwerp");
        assert_eq!(p.followers, Some(10));
        assert_eq!(p.following, None);
    }

    #[test]
    fn non_object_records_use_fallbacks() {
        let p = normalize_profile(&json!("garbage"), 2);
        assert_eq!(p.name, UNKNOWN_USER);
        assert_eq!(p.handle, "user2");
        assert_eq!(p.location, "");
    }

    #[test]
    fn normalize_list_rejects_non_arrays() {
        assert!(normalize_list(&json!({"data": []}), normalize_tweet).is_none());
        let list = normalize_list(&json!([{"text": "a"}, {"text": "b"}]), normalize_tweet).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[1].id, 1);
    }
}
