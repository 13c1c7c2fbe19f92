//! HTTP 执行器 - 基础设施层
//!
//! 持有唯一的 HTTP 客户端，只暴露"带凭证发请求"的能力

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{ApiError, ApiResult};
use crate::infrastructure::credential::Credential;
use crate::utils::logging::truncate_text;

/// HTTP 执行器
///
/// 职责：
/// - 持有 reqwest 客户端和 API 地址
/// - 把 HTTP 状态码翻译成 `ApiError`
/// - 对网络失败、5xx、429 做有限次数的重试
/// - 不认识题目 / 试卷
pub struct HttpExecutor {
    client: Client,
    base_url: String,
    max_retries: usize,
    retry_backoff: Duration,
}

impl HttpExecutor {
    /// 创建新的 HTTP 执行器
    pub fn new(config: &Config) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ApiError::RequestFailed {
                endpoint: config.api_base_url.clone(),
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            max_retries: config.max_retries,
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// 由路径段拼出完整 URL，每段单独转义
    ///
    /// ID 中的 `/`、`?`、`#` 不会改变请求的资源
    pub fn url(&self, segments: &[&str]) -> ApiResult<Url> {
        let invalid = |message: String| ApiError::RequestFailed {
            endpoint: self.base_url.clone(),
            message,
        };
        let mut url = Url::parse(&self.base_url).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| invalid("API 地址不能作为基础路径".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// GET 并把响应体反序列化为指定类型
    ///
    /// # 参数
    /// - `segments`: 路径段，如 `["api", "tests", id, "questions"]`
    /// - `params`: URL 查询参数
    /// - `credential`: 本次调用使用的凭证
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        params: &[(&str, String)],
        credential: &Credential,
    ) -> ApiResult<T> {
        let url = self.url(segments)?;
        let endpoint = url.path().to_string();
        let response = self
            .send_with_retry(&endpoint, || {
                self.client
                    .get(url.clone())
                    .query(params)
                    .bearer_auth(credential.token())
            })
            .await?;

        Self::parse_json(&endpoint, response).await
    }

    /// PUT JSON 请求体，忽略响应体
    pub async fn put_json<B: Serialize + ?Sized>(
        &self,
        segments: &[&str],
        body: &B,
        credential: &Credential,
    ) -> ApiResult<()> {
        let url = self.url(segments)?;
        let endpoint = url.path().to_string();
        self.send_with_retry(&endpoint, || {
            self.client
                .put(url.clone())
                .json(body)
                .bearer_auth(credential.token())
        })
        .await?;
        Ok(())
    }

    /// 发送请求（带重试逻辑）
    async fn send_with_retry<F>(&self, endpoint: &str, build: F) -> ApiResult<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let attempts = self.max_retries + 1;
        let mut last_error = None;
        let mut wait = Duration::ZERO;

        for attempt in 0..attempts {
            if attempt > 0 {
                sleep(wait).await;
            }

            debug!("请求 {} (尝试 {}/{})", endpoint, attempt + 1, attempts);

            let result = match build().send().await {
                Ok(response) => Self::check_status(endpoint, response).await,
                Err(e) => Err(ApiError::RequestFailed {
                    endpoint: endpoint.to_string(),
                    message: e.to_string(),
                }),
            };

            match result {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && attempt + 1 < attempts => {
                    wait = self.retry_wait(attempt + 1, &e);
                    warn!(
                        "请求 {} 失败 (尝试 {}/{}): {}，{:?} 后重试...",
                        endpoint,
                        attempt + 1,
                        attempts,
                        e,
                        wait
                    );
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| ApiError::RequestFailed {
            endpoint: endpoint.to_string(),
            message: "没有发出任何请求".to_string(),
        }))
    }

    /// 第 `retry` 次重试前的等待时间
    ///
    /// 线性退避；429 带 Retry-After 时至少等到服务端要求的秒数
    fn retry_wait(&self, retry: usize, err: &ApiError) -> Duration {
        let backoff = self.retry_backoff * retry as u32;
        match err {
            ApiError::RateLimited {
                retry_after: Some(secs),
                ..
            } => backoff.max(Duration::from_secs(*secs)),
            _ => backoff,
        }
    }

    /// 把非 2xx 响应翻译成 `ApiError`
    async fn check_status(endpoint: &str, response: Response) -> ApiResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let endpoint = endpoint.to_string();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(ApiError::Unauthorized { endpoint })
            }
            StatusCode::NOT_FOUND => Err(ApiError::NotFound { endpoint }),
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse().ok());
                Err(ApiError::RateLimited {
                    endpoint,
                    retry_after,
                })
            }
            _ => {
                let body = response.text().await.unwrap_or_default();
                let message = if body.trim().is_empty() {
                    None
                } else {
                    Some(truncate_text(body.trim(), 200))
                };
                Err(ApiError::BadResponse {
                    endpoint,
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }

    async fn parse_json<T: DeserializeOwned>(endpoint: &str, response: Response) -> ApiResult<T> {
        let body = response.text().await.map_err(|e| ApiError::RequestFailed {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })?;

        serde_json::from_str(&body).map_err(|e| ApiError::JsonParseFailed {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })
    }
}
