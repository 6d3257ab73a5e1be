//! 推文 HTTP API 客户端
//!
//! 负责推文列表的拉取与发布

use crate::feed::serialization::{normalize_list, normalize_tweet};
use crate::feed::tweet::models::{CreateTweetInput, Tweet};
use crate::feed::tweet::types::PostTweetReq;
use crate::feed::types::{read_json_array, with_bearer, OPERATION_ID_HEADER};
use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use tracing::{debug, info, warn};

/// 推文相关的 HTTP API 客户端
#[derive(Clone)]
pub struct TweetApi {
    client: reqwest::Client,
    api_root: String,
}

impl TweetApi {
    pub fn new(client: reqwest::Client, api_root: String) -> Self {
        Self { client, api_root }
    }

    fn tweets_url(&self) -> String {
        format!("{}/twitter/tweets", self.api_root.trim_end_matches('/'))
    }

    /// 拉取推文列表并规范化
    ///
    /// 非 2xx 或载荷不是数组时返回空列表；只有网络层失败才返回错误。
    pub async fn fetch_tweets(&self, token: Option<&str>) -> Result<Vec<Tweet>> {
        let url = self.tweets_url();
        info!("[TweetAPI] 📡 请求推文列表");
        debug!("[TweetAPI]   请求URL: {}", url);

        let request = self
            .client
            .get(&url)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json");
        let response = with_bearer(request, token)
            .send()
            .await
            .context("请求推文列表失败")?;

        let Some(payload) = read_json_array(response, "推文列表").await? else {
            return Ok(Vec::new());
        };
        let tweets = normalize_list(&payload, normalize_tweet).unwrap_or_default();

        info!("[TweetAPI] ✅ 推文列表响应，条目数: {}", tweets.len());
        Ok(tweets)
    }

    /// 发布推文
    ///
    /// 不解析响应体，也不代表服务器已经落库；非 2xx 仅记录日志。
    pub async fn post_tweet(
        &self,
        token: &str,
        input: &CreateTweetInput,
        operation_id: &str,
    ) -> Result<()> {
        let url = self.tweets_url();
        let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let body = PostTweetReq::from_input(input, created_at);

        info!("[TweetAPI] 📤 发布推文");
        debug!("[TweetAPI]   请求URL: {}, 操作ID: {}", url, operation_id);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header(OPERATION_ID_HEADER, operation_id)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .context("发布推文请求失败")?;

        let status = response.status();
        if !status.is_success() {
            warn!(
                "[TweetAPI] 发布推文未成功，HTTP状态: {}, 操作ID: {}",
                status, operation_id
            );
        } else {
            debug!("[TweetAPI] 发布推文完成，HTTP状态: {}", status);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn api(server: &MockServer) -> TweetApi {
        TweetApi::new(reqwest::Client::new(), server.uri())
    }

    #[tokio::test]
    async fn fetch_tweets_normalizes_records() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/twitter/tweets"))
            .and(header("Authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 1, "author": "Alice", "handle": "alice", "text": "hello", "likes": 3},
                {"user": "Bob", "message": "yo"}
            ])))
            .mount(&server)
            .await;

        let tweets = api(&server).fetch_tweets(Some("tok")).await.unwrap();
        assert_eq!(tweets.len(), 2);
        assert_eq!(tweets[0].handle, "alice");
        assert_eq!(tweets[0].likes, Some(3));
        assert_eq!(tweets[1].id, 1);
        assert_eq!(tweets[1].author, "Bob");
        assert_eq!(tweets[1].handle, "user1");
        assert_eq!(tweets[1].text, "yo");
    }

    #[tokio::test]
    async fn fetch_tweets_on_error_status_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/twitter/tweets"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!([{"text": "x"}])))
            .mount(&server)
            .await;

        let tweets = api(&server).fetch_tweets(None).await.unwrap();
        assert!(tweets.is_empty());
    }

    #[tokio::test]
    async fn fetch_tweets_on_non_array_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/twitter/tweets"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"tweets": []})))
            .mount(&server)
            .await;
        assert!(api(&server).fetch_tweets(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn fetch_tweets_on_invalid_json_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/twitter/tweets"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;
        assert!(api(&server).fetch_tweets(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn fetch_tweets_transport_failure_is_error() {
        // 端口 1 上没有服务
        let api = TweetApi::new(reqwest::Client::new(), "http://127.0.0.1:1".to_string());
        assert!(api.fetch_tweets(None).await.is_err());
    }

    #[tokio::test]
    async fn post_tweet_sends_expected_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/twitter/tweets"))
            .and(header("Authorization", "Bearer tok"))
            .and(header_exists(OPERATION_ID_HEADER))
            .and(body_partial_json(json!({
                "text": "hello",
                "image": null,
                "author": "Alice",
                "handle": "alice",
                "likes": 0
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let input = CreateTweetInput {
            author: Some("Alice".to_string()),
            handle: Some("alice".to_string()),
            ..CreateTweetInput::new("hello")
        };
        api(&server).post_tweet("tok", &input, "op-1").await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert!(body["createdAt"].as_str().unwrap().ends_with('Z'));
    }

    #[tokio::test]
    async fn post_tweet_ignores_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/twitter/tweets"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;
        assert!(api(&server)
            .post_tweet("tok", &CreateTweetInput::new("x"), "op")
            .await
            .is_ok());
    }
}
