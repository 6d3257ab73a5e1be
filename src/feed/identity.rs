//! 身份协作方接口
//!
//! 登录会话与用户资料表由外部托管服务提供，这里只定义 SDK 需要的最小能力：
//! 读取当前会话、按用户 ID 读取已保存的资料行。发布推文时据此补全作者信息。

use crate::feed::tweet::models::CreateTweetInput;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// 当前登录会话
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionIdentity {
    pub user_id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// 资料表中与发推相关的列（name, handle, avatar_url）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoredProfile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// 身份协作方
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// 当前会话，未登录时为 None
    async fn current_session(&self) -> Result<Option<SessionIdentity>>;

    /// 按用户 ID 读取资料行
    async fn stored_profile(&self, user_id: &str) -> Result<Option<StoredProfile>>;
}

/// 默认实现：没有会话
pub struct NoIdentity;

#[async_trait]
impl IdentityProvider for NoIdentity {
    async fn current_session(&self) -> Result<Option<SessionIdentity>> {
        Ok(None)
    }

    async fn stored_profile(&self, _user_id: &str) -> Result<Option<StoredProfile>> {
        Ok(None)
    }
}

/// 固定身份（CLI 与测试使用）
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity {
    pub session: Option<SessionIdentity>,
    pub profile: Option<StoredProfile>,
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn current_session(&self) -> Result<Option<SessionIdentity>> {
        Ok(self.session.clone())
    }

    async fn stored_profile(&self, user_id: &str) -> Result<Option<StoredProfile>> {
        let same_user = self
            .session
            .as_ref()
            .is_some_and(|s| s.user_id == user_id);
        Ok(if same_user { self.profile.clone() } else { None })
    }
}

/// 补全后的作者信息
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedIdentity {
    pub author: String,
    pub handle: String,
    pub avatar: Option<String>,
}

fn non_blank(value: Option<&String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty()).cloned()
}

fn email_local_part(email: &str) -> Option<String> {
    email
        .split('@')
        .next()
        .filter(|local| !local.is_empty())
        .map(str::to_string)
}

/// 把邮箱本地部分转成 handle：非 `[A-Za-z0-9_]` 字符替换为下划线
pub fn sanitize_handle(local: &str) -> String {
    local
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// 内嵌 data URI 头像不回写到推文中
pub fn is_inline_data(avatar: &str) -> bool {
    avatar.starts_with("data:")
}

/// 补全发推的作者信息
///
/// 优先使用调用方传入的值；缺失时查询当前会话用户的资料行；再回退到邮箱本地部分或
/// 截断的用户 ID；最后是 "You"/"you"。协作方的任何错误都被吞掉。
pub async fn resolve_identity(
    provider: &dyn IdentityProvider,
    input: &CreateTweetInput,
) -> ResolvedIdentity {
    let mut author = non_blank(input.author.as_ref());
    let mut handle = non_blank(input.handle.as_ref());
    let mut avatar = non_blank(input.avatar.as_ref());

    if author.is_none() || handle.is_none() || avatar.is_none() {
        match provider.current_session().await {
            Ok(Some(session)) if !session.user_id.is_empty() => {
                let row = match provider.stored_profile(&session.user_id).await {
                    Ok(row) => row.unwrap_or_default(),
                    Err(e) => {
                        warn!("[Identity] 查询资料行失败，使用兜底身份: {:?}", e);
                        StoredProfile::default()
                    }
                };
                let local = session.email.as_deref().and_then(email_local_part);

                author = author
                    .or_else(|| non_blank(row.name.as_ref()))
                    .or_else(|| local.clone());
                handle = handle
                    .or_else(|| non_blank(row.handle.as_ref()))
                    .or_else(|| local.as_deref().map(sanitize_handle))
                    .or_else(|| {
                        let prefix: String = session.user_id.chars().take(8).collect();
                        Some(format!("user_{}", prefix))
                    });
                avatar = avatar.or_else(|| non_blank(row.avatar_url.as_ref()));
            }
            Ok(_) => debug!("[Identity] 无登录会话，使用兜底身份"),
            Err(e) => warn!("[Identity] 读取会话失败，使用兜底身份: {:?}", e),
        }
    }

    ResolvedIdentity {
        author: author.unwrap_or_else(|| "You".to_string()),
        handle: handle.unwrap_or_else(|| "you".to_string()),
        avatar: avatar.filter(|a| !is_inline_data(a)),
    }
}
