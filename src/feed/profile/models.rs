//! 用户资料本地模型定义

use serde::{Deserialize, Serialize};

/// 规范化后的用户资料
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: i64,
    /// 显示名
    pub name: String,
    /// 用户名（身份键，与推文的 handle/author 忽略大小写匹配）
    pub handle: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner: Option<String>,
    #[serde(default)]
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub followers: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub following: Option<i64>,
}

impl Profile {
    /// 忽略大小写比较 handle
    pub fn matches_handle(&self, handle: &str) -> bool {
        self.handle.to_lowercase() == handle.to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_comparison_ignores_case() {
        let profile: Profile =
            serde_json::from_value(serde_json::json!({"id": 1, "name": "Bob", "handle": "Bob"}))
                .unwrap();
        assert!(profile.matches_handle("bob"));
        assert!(profile.matches_handle("BOB"));
        assert!(!profile.matches_handle("bobby"));
    }
}
