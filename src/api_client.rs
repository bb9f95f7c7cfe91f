use anyhow::{Context, Result};
use reqwest::multipart::Form;
use reqwest::{Client, Method};
use serde_json::Value;
use std::time::Duration;
use crate::error::{ClientError, ClientResult};
use crate::logger::Logger;

/// 默认 API 服务地址
pub const DEFAULT_API_BASE_URL: &str = "http://159.75.236.29:8080/api";

/// 视频帧提取服务的 HTTP 客户端
///
/// 所有请求都基于固定的 base URL，发送前后都会写日志面板。
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    logger: Logger,
}

impl ApiClient {
    /// 创建客户端
    ///
    /// `timeout` 为 `None` 时不设置客户端超时
    pub fn new(base_url: impl Into<String>, logger: Logger, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build().context("创建 HTTP 客户端失败")?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            logger,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// 发送请求并解析 JSON 响应
    ///
    /// 非 2xx 与网络错误都记录为“请求失败”并返回给调用方；
    /// 成功时不校验响应结构，原样返回 JSON。
    pub async fn request(&self, method: Method, url: &str, body: Option<Form>) -> ClientResult<Value> {
        self.logger.info(format!("发送请求: {} {}", method, url));

        match self.send(method, url, body).await {
            Ok(data) => {
                self.logger.success(format!("请求成功: {}", url));
                Ok(data)
            }
            Err(e) => {
                self.logger.error(format!("请求失败: {}", e));
                Err(e)
            }
        }
    }

    async fn send(&self, method: Method, url: &str, body: Option<Form>) -> ClientResult<Value> {
        let mut builder = self.client.request(method, url);
        // multipart 自带 boundary 的 Content-Type，不再手动设置
        if let Some(form) = body {
            builder = builder.multipart(form);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or("").to_string(),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }

    pub async fn get(&self, endpoint: &str) -> ClientResult<Value> {
        self.request(Method::GET, &self.url(endpoint), None).await
    }

    pub async fn post(&self, endpoint: &str, form: Form) -> ClientResult<Value> {
        self.request(Method::POST, &self.url(endpoint), Some(form)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash() {
        let client = ApiClient::new("http://localhost:8080/api/", Logger::new(), None).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080/api");
        assert_eq!(client.url("/video/health"), "http://localhost:8080/api/video/health");
    }

    #[tokio::test]
    async fn test_network_error_is_logged() {
        let logger = Logger::new();
        // 端口 1 上没有服务
        let client = ApiClient::new("http://127.0.0.1:1/api", logger.clone(), Some(Duration::from_secs(5))).unwrap();

        let result = client.get("/video/health").await;
        assert!(matches!(result, Err(ClientError::Network(_))));
        assert!(logger.contains("发送请求: GET http://127.0.0.1:1/api/video/health"));
        assert!(logger.contains("请求失败"));
    }
}
