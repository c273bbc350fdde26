//! 出站调用模块
//!
//! 按逻辑服务名查地址表、改写请求目标后发送，并解析统一的响应信封 `{code, message, data}`。
//! 不做超时、重试和响应缓存，调用方需要自行控制时延。

use bytes::Bytes;
use http::header::{ACCEPT, ACCEPT_CHARSET, HeaderValue};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::discovery::{AddressTable, Endpoint};
use crate::error::{DiscoveryError, Result};

/// 对端统一响应信封
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Envelope<T> {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
    pub data: T,
}

/// 基于服务发现的出站调用客户端
#[derive(Clone)]
pub struct ServiceClient {
    http: reqwest::Client,
    table: Arc<AddressTable>,
}

impl ServiceClient {
    /// 使用默认 HTTP 客户端创建
    pub fn new(table: Arc<AddressTable>) -> Self {
        Self::with_http_client(reqwest::Client::new(), table)
    }

    /// 使用共享的 HTTP 客户端创建
    pub fn with_http_client(http: reqwest::Client, table: Arc<AddressTable>) -> Self {
        Self { http, table }
    }

    /// 调用逻辑服务，返回信封中的 `data`
    ///
    /// # 参数
    /// * `request` - 请求，URI 只需包含路径和查询参数（如 `/one/1`）
    /// * `service_name` - 逻辑服务名
    ///
    /// # 错误
    /// * `ServiceUnresolved` - 地址表中没有该服务，不会发起任何网络请求
    /// * `Http` - 发送或读取响应失败
    /// * `DecodeFailed` - 响应体不是合法的信封
    pub async fn call<T>(&self, request: http::Request<Bytes>, service_name: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        Ok(self.call_envelope(request, service_name).await?.data)
    }

    /// 调用逻辑服务，返回完整的响应信封
    pub async fn call_envelope<T>(
        &self,
        request: http::Request<Bytes>,
        service_name: &str,
    ) -> Result<Envelope<T>>
    where
        T: DeserializeOwned,
    {
        let endpoint = self
            .table
            .resolve(service_name)
            .await
            .ok_or_else(|| DiscoveryError::ServiceUnresolved(service_name.to_string()))?;

        let request = rewrite_request(request, &endpoint)?;
        debug!(
            service = %service_name,
            method = %request.method(),
            uri = %request.uri(),
            "dispatching outbound call"
        );

        let request = reqwest::Request::try_from(request)
            .map_err(|e| DiscoveryError::InvalidRequest(e.to_string()))?;
        let response = self.http.execute(request).await?;
        let body = response.bytes().await?;

        decode_envelope(&body)
    }
}

/// 将请求目标改写为已解析的端点，并设置默认的 Accept 头
pub fn rewrite_request(
    mut request: http::Request<Bytes>,
    endpoint: &Endpoint,
) -> Result<http::Request<Bytes>> {
    let path_and_query = request
        .uri()
        .path_and_query()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "/".to_string());

    let uri = http::Uri::builder()
        .scheme(endpoint.scheme.as_str())
        .authority(endpoint.authority().as_str())
        .path_and_query(path_and_query.as_str())
        .build()
        .map_err(|e| DiscoveryError::InvalidRequest(format!("{}: {}", endpoint, e)))?;
    *request.uri_mut() = uri;

    let headers = request.headers_mut();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT_CHARSET, HeaderValue::from_static("utf-8"));

    Ok(request)
}

/// 解析响应信封
pub fn decode_envelope<T>(body: &[u8]) -> Result<Envelope<T>>
where
    T: DeserializeOwned,
{
    serde_json::from_slice(body).map_err(|e| DiscoveryError::DecodeFailed(e.to_string()))
}
