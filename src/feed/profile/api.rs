//! 用户资料 HTTP API 客户端

use crate::feed::profile::models::Profile;
use crate::feed::serialization::{normalize_list, normalize_profile};
use crate::feed::types::{read_json_array, with_bearer};
use anyhow::{Context, Result};
use tracing::{debug, info};

/// 用户资料相关的 HTTP API 客户端
#[derive(Clone)]
pub struct ProfileApi {
    client: reqwest::Client,
    api_root: String,
}

impl ProfileApi {
    pub fn new(client: reqwest::Client, api_root: String) -> Self {
        Self { client, api_root }
    }

    /// 拉取资料列表并规范化（与推文列表同样的容错约定）
    pub async fn fetch_profiles(&self, token: Option<&str>) -> Result<Vec<Profile>> {
        let url = format!("{}/twitter/profiles", self.api_root.trim_end_matches('/'));
        info!("[ProfileAPI] 📡 请求资料列表");
        debug!("[ProfileAPI]   请求URL: {}", url);

        let request = self
            .client
            .get(&url)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json");
        let response = with_bearer(request, token)
            .send()
            .await
            .context("请求资料列表失败")?;

        let Some(payload) = read_json_array(response, "资料列表").await? else {
            return Ok(Vec::new());
        };
        let profiles = normalize_list(&payload, normalize_profile).unwrap_or_default();

        info!("[ProfileAPI] ✅ 资料列表响应，条目数: {}", profiles.len());
        Ok(profiles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn fetch_profiles_normalizes_and_fails_soft() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/twitter/profiles"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 9, "name": "Bob", "handle": "bob", "followers": 4}
            ])))
            .mount(&server)
            .await;

        let api = ProfileApi::new(reqwest::Client::new(), format!("{}/", server.uri()));
        let profiles = api.fetch_profiles(Some("tok")).await.unwrap();
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].id, 9);
        assert_eq!(profiles[0].followers, Some(4));
        assert_eq!(profiles[0].following, None);
    }

    #[tokio::test]
    async fn fetch_profiles_on_not_found_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/twitter/profiles"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let api = ProfileApi::new(reqwest::Client::new(), server.uri());
        assert!(api.fetch_profiles(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn fetch_profiles_on_non_array_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/twitter/profiles"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"profiles": [{"handle": "bob"}]})),
            )
            .mount(&server)
            .await;

        let api = ProfileApi::new(reqwest::Client::new(), server.uri());
        assert!(api.fetch_profiles(Some("tok")).await.unwrap().is_empty());
    }
}
