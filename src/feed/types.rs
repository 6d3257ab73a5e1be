//! 网关共用的 HTTP 辅助函数与常量

use anyhow::{Context, Result};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

/// 示例 API 根地址
pub const DEFAULT_API_ROOT: &str = "https://sampleapis.assimilate.be";

/// 申请 token 时默认使用的邮箱
pub const DEFAULT_EMAIL: &str = "s145651@ap.be";

/// 客户端生成的操作 ID 请求头（用于追踪一次发布）
pub const OPERATION_ID_HEADER: &str = "operationID";

/// 创建 HTTP 客户端；`timeout` 为 None 时不设超时
pub fn build_http_client(timeout: Option<Duration>) -> Result<reqwest::Client> {
    let mut builder = reqwest::ClientBuilder::new();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().context("创建 HTTP 客户端失败")
}

/// 有 token 时附加 `Authorization: Bearer`
pub fn with_bearer(
    builder: reqwest::RequestBuilder,
    token: Option<&str>,
) -> reqwest::RequestBuilder {
    match token.filter(|t| !t.is_empty()) {
        Some(token) => builder.bearer_auth(token),
        None => builder,
    }
}

/// 读取响应并取出 JSON 数组
///
/// 非 2xx、非 JSON 或非数组的响应返回 `Ok(None)`；只有读取 body 失败才返回错误。
pub async fn read_json_array(
    response: reqwest::Response,
    operation_name: &str,
) -> Result<Option<Value>> {
    let status = response.status();
    let body_bytes = response.bytes().await.context("读取响应 body 失败")?;
    let body_str = String::from_utf8_lossy(&body_bytes);
    debug!("[HTTP] {}响应 Body: {}", operation_name, body_str);

    if !status.is_success() {
        warn!(
            "[HTTP] {}请求失败，HTTP状态: {}, 响应: {}",
            operation_name, status, body_str
        );
        return Ok(None);
    }

    let payload: Value = match serde_json::from_slice(&body_bytes) {
        Ok(v) => v,
        Err(e) => {
            warn!("[HTTP] {}响应不是合法 JSON: {:?}", operation_name, e);
            return Ok(None);
        }
    };

    if !payload.is_array() {
        warn!("[HTTP] {}响应不是数组，按空列表处理", operation_name);
        return Ok(None);
    }

    info!("[HTTP] {}请求成功，HTTP状态: {}", operation_name, status);
    Ok(Some(payload))
}
