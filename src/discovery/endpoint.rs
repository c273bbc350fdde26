//! 已解析的服务地址

use serde::{Deserialize, Serialize};
use std::fmt;

/// 服务端点
///
/// 一个逻辑服务名当前对应的 scheme/host/port，只整体替换，不原地修改。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    /// 协议（如 "http"）
    pub scheme: String,

    /// 主机（IP 或域名）
    pub host: String,

    /// 端口
    pub port: u16,

    /// 逻辑服务名
    pub service_name: String,
}

impl Endpoint {
    /// 创建新的端点
    pub fn new(
        scheme: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        service_name: impl Into<String>,
    ) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
            port,
            service_name: service_name.into(),
        }
    }

    /// `host:port`
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// `scheme://host:port`
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.scheme, self.authority())
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.service_name, self.base_url())
    }
}
