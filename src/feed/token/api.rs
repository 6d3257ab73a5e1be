//! Token HTTP API 客户端
//!
//! 按邮箱向示例 API 申请 Bearer token

use serde_json::Value;
use tracing::{debug, error, info, warn};

/// 对象形式响应中可能携带 token 的字段名，按优先级排列
pub const TOKEN_FIELDS: &[&str] = &["token", "access_token", "key", "bearer"];

/// Token 相关的 HTTP API 客户端
#[derive(Clone)]
pub struct TokenApi {
    client: reqwest::Client,
    api_root: String,
}

impl TokenApi {
    pub fn new(client: reqwest::Client, api_root: String) -> Self {
        Self { client, api_root }
    }

    /// 按邮箱申请 token
    ///
    /// 从不返回错误：任何失败（网络、非 2xx、缺少字段）都以空字符串表示。
    pub async fn fetch_token_for_email(&self, email: &str) -> String {
        let email = email.trim();
        let url = format!("{}/token", self.api_root.trim_end_matches('/'));
        info!("[TokenAPI] 🔐 申请 token");
        debug!("[TokenAPI]   请求URL: {}, 邮箱: {}", url, email);

        let response = match self.client.get(&url).query(&[("email", email)]).send().await {
            Ok(r) => r,
            Err(e) => {
                error!("[TokenAPI] 申请 token 请求失败: {:?}", e);
                return String::new();
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!("[TokenAPI] 申请 token 失败，HTTP状态: {}", status);
            return String::new();
        }

        let text = match response.text().await {
            Ok(t) => t,
            Err(e) => {
                error!("[TokenAPI] 读取 token 响应失败: {:?}", e);
                return String::new();
            }
        };

        let token = extract_token(&text);
        if token.is_empty() {
            warn!("[TokenAPI] 响应中没有可识别的 token 字段");
        } else {
            info!("[TokenAPI] ✅ 已获取 token");
        }
        token
    }
}

/// 从响应文本中提取 token：JSON 字符串、带 token 字段的对象，或原始文本
pub fn extract_token(text: &str) -> String {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::String(s)) => s,
        Ok(Value::Object(fields)) => TOKEN_FIELDS
            .iter()
            .filter_map(|name| fields.get(*name))
            .find(|v| !v.is_null())
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .unwrap_or_default(),
        Ok(_) => String::new(),
        Err(_) => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn extract_token_shapes() {
        assert_eq!(extract_token(r#""abc""#), "abc");
        assert_eq!(extract_token("raw-token"), "raw-token");
        assert_eq!(extract_token(r#"{"token":"t1"}"#), "t1");
        assert_eq!(extract_token(r#"{"access_token":"t2"}"#), "t2");
        assert_eq!(extract_token(r#"{"token":null,"key":"t3"}"#), "t3");
        assert_eq!(extract_token(r#"{"bearer":"t4"}"#), "t4");
        assert_eq!(extract_token(r#"{"other":"x"}"#), "");
        assert_eq!(extract_token("[1,2]"), "");
    }

    #[tokio::test]
    async fn fetch_token_trims_email_and_reads_object() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/token"))
            .and(query_param("email", "me@example.com"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "secret"})))
            .mount(&server)
            .await;

        let api = TokenApi::new(reqwest::Client::new(), server.uri());
        assert_eq!(api.fetch_token_for_email("  me@example.com ").await, "secret");
    }

    #[tokio::test]
    async fn fetch_token_failure_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(401).set_body_string("\"nope\""))
            .mount(&server)
            .await;

        let api = TokenApi::new(reqwest::Client::new(), server.uri());
        assert_eq!(api.fetch_token_for_email("x@y.z").await, "");

        let offline = TokenApi::new(reqwest::Client::new(), "http://127.0.0.1:1".to_string());
        assert_eq!(offline.fetch_token_for_email("x@y.z").await, "");
    }
}
