//! Nacos 命名服务客户端
//!
//! [`NamingClient`] 抽象了后端需要的四个命名服务操作（注册、注销、列出服务、查询实例）以及心跳，
//! [`HttpNamingClient`] 基于 Nacos v1 Open API 实现。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::{NacosConfig, RegistryConfig};
use crate::error::{DiscoveryError, Result};

pub(crate) const BACKEND: &str = "nacos";

/// 心跳返回码：实例在服务端不存在，需要重新注册
pub const BEAT_RESOURCE_NOT_FOUND: i32 = 20404;

/// 登录响应未携带有效期时使用的默认值（秒）
const DEFAULT_TOKEN_TTL_SECS: u64 = 18000;

/// 待注册的本地实例
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceRegistration {
    pub service_name: String,
    pub ip: String,
    pub port: u16,
    pub weight: f64,
    pub ephemeral: bool,
}

impl InstanceRegistration {
    pub fn from_config(cfg: &RegistryConfig) -> Self {
        Self {
            service_name: cfg.application.name.clone(),
            ip: cfg.application.ip.clone(),
            port: cfg.application.port,
            weight: 1.0,
            ephemeral: true,
        }
    }
}

/// 服务名分页
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServicePage {
    /// 服务总数
    #[serde(default)]
    pub count: u64,
    /// 本页服务名
    #[serde(default)]
    pub doms: Vec<String>,
}

/// 服务实例
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NacosInstance {
    pub ip: String,
    pub port: u16,
    #[serde(default = "default_true")]
    pub healthy: bool,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

/// 心跳结果
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeatResult {
    #[serde(default)]
    pub code: i32,
    /// 服务端建议的心跳间隔（毫秒）
    #[serde(default)]
    pub client_beat_interval: Option<u64>,
}

impl BeatResult {
    /// 服务端建议的心跳间隔，缺省或为 0 时返回 `None`
    pub fn beat_interval(&self) -> Option<Duration> {
        self.client_beat_interval
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }
}

/// 命名服务客户端
///
/// 命名空间和分组在连接时确定，之后的调用都在该命名空间/分组内进行。
#[async_trait]
pub trait NamingClient: Send + Sync {
    /// 注册实例（健康、临时）
    async fn register_instance(&self, instance: &InstanceRegistration) -> Result<()>;

    /// 注销实例
    async fn deregister_instance(&self, instance: &InstanceRegistration) -> Result<()>;

    /// 发送实例心跳
    async fn send_beat(&self, instance: &InstanceRegistration) -> Result<BeatResult>;

    /// 分页列出服务名，`page_no` 从 1 开始
    async fn list_services(&self, page_no: u32, page_size: u32) -> Result<ServicePage>;

    /// 查询服务实例
    async fn select_instances(
        &self,
        service_name: &str,
        healthy_only: bool,
    ) -> Result<Vec<NacosInstance>>;

    /// 关闭连接
    async fn close(&self) {}
}

/// 命名服务连接器
///
/// 每次注册时根据配置创建一个新的客户端
#[async_trait]
pub trait NamingConnector: Send + Sync {
    async fn connect(&self, cfg: &NacosConfig) -> Result<Arc<dyn NamingClient>>;
}

/// 基于 HTTP Open API 的连接器
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpNamingConnector;

#[async_trait]
impl NamingConnector for HttpNamingConnector {
    async fn connect(&self, cfg: &NacosConfig) -> Result<Arc<dyn NamingClient>> {
        let client = HttpNamingClient::connect(cfg).await?;
        Ok(Arc::new(client))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    access_token: String,
    #[serde(default = "default_token_ttl")]
    token_ttl: u64,
}

fn default_token_ttl() -> u64 {
    DEFAULT_TOKEN_TTL_SECS
}

struct Credentials {
    username: String,
    password: String,
}

/// 登录获得的 access token
struct AccessToken {
    value: String,
    /// 到达该时间后先重新登录再发请求
    refresh_at: Instant,
}

impl AccessToken {
    /// 在有效期的 90% 处刷新
    fn new(value: String, ttl_secs: u64) -> Self {
        let ttl = Duration::from_secs(ttl_secs);
        let now = Instant::now();
        let refresh_at = now
            .checked_add(ttl - ttl / 10)
            .unwrap_or_else(|| now + Duration::from_secs(DEFAULT_TOKEN_TTL_SECS));
        Self { value, refresh_at }
    }

    fn is_fresh(&self) -> bool {
        Instant::now() < self.refresh_at
    }
}

#[derive(Deserialize)]
struct InstanceList {
    #[serde(default)]
    hosts: Vec<NacosInstance>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BeatInfo<'a> {
    service_name: String,
    ip: &'a str,
    port: u16,
    cluster: &'a str,
    weight: f64,
    ephemeral: bool,
}

/// Nacos HTTP 命名服务客户端
pub struct HttpNamingClient {
    http: reqwest::Client,
    server_url: String,
    namespace: String,
    group: String,
    credentials: Option<Credentials>,
    token: Mutex<Option<AccessToken>>,
}

impl HttpNamingClient {
    /// 创建客户端；配置了用户名时先登录获取 access token
    ///
    /// token 临近过期或被服务端拒绝（403）时自动重新登录。
    pub async fn connect(cfg: &NacosConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(cfg.timeout())
            .build()
            .map_err(|e| DiscoveryError::connection(BACKEND, e.to_string()))?;

        let credentials = cfg
            .username
            .as_deref()
            .filter(|u| !u.is_empty())
            .map(|username| Credentials {
                username: username.to_string(),
                password: cfg.password.clone().unwrap_or_default(),
            });

        let client = Self {
            http,
            server_url: cfg.server_url(),
            namespace: cfg.namespace.clone(),
            group: cfg.group.clone(),
            credentials,
            token: Mutex::new(None),
        };

        if client.credentials.is_some() {
            client.access_token(true).await?;
        }

        Ok(client)
    }

    /// 当前可用的 token；未配置用户名时为 `None`
    async fn access_token(&self, force_refresh: bool) -> Result<Option<String>> {
        let Some(credentials) = &self.credentials else {
            return Ok(None);
        };

        let mut token = self.token.lock().await;
        if let Some(current) = token.as_ref().filter(|t| !force_refresh && t.is_fresh()) {
            return Ok(Some(current.value.clone()));
        }

        let login = self.login(credentials).await?;
        info!(
            backend = BACKEND,
            username = %credentials.username,
            ttl_secs = login.token_ttl,
            "nacos login success"
        );
        let fresh = AccessToken::new(login.access_token, login.token_ttl);
        let value = fresh.value.clone();
        *token = Some(fresh);
        Ok(Some(value))
    }

    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse> {
        let url = format!("{}/v1/auth/login", self.server_url);
        let response = self
            .http
            .post(&url)
            .form(&[
                ("username", credentials.username.as_str()),
                ("password", credentials.password.as_str()),
            ])
            .send()
            .await
            .map_err(|e| DiscoveryError::connection(BACKEND, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DiscoveryError::connection(
                BACKEND,
                format!("login rejected ({}): {}", status, body),
            ));
        }

        response
            .json()
            .await
            .map_err(|e| DiscoveryError::DecodeFailed(e.to_string()))
    }

    /// `分组@@服务名`
    fn grouped_name(&self, service_name: &str) -> String {
        format!("{}@@{}", self.group, service_name)
    }

    async fn execute(
        &self,
        builder: reqwest::RequestBuilder,
        force_refresh: bool,
    ) -> Result<reqwest::Response> {
        let builder = match self.access_token(force_refresh).await? {
            Some(token) => builder.query(&[("accessToken", token.as_str())]),
            None => builder,
        };
        builder
            .send()
            .await
            .map_err(|e| DiscoveryError::connection(BACKEND, e.to_string()))
    }

    fn instance_params(&self, instance: &InstanceRegistration) -> Vec<(&'static str, String)> {
        vec![
            ("serviceName", instance.service_name.clone()),
            ("groupName", self.group.clone()),
            ("namespaceId", self.namespace.clone()),
            ("ip", instance.ip.clone()),
            ("port", instance.port.to_string()),
            ("ephemeral", instance.ephemeral.to_string()),
        ]
    }

    /// 发送请求，传输层失败视为连接错误，非 2xx 返回 `(状态码, 响应体)`
    ///
    /// 已登录时遇到 403 会重新登录并重试一次。
    async fn send(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<std::result::Result<reqwest::Response, (reqwest::StatusCode, String)>> {
        let retry = self.credentials.as_ref().and_then(|_| builder.try_clone());
        let mut response = self.execute(builder, false).await?;

        if response.status() == reqwest::StatusCode::FORBIDDEN {
            if let Some(retry) = retry {
                warn!(backend = BACKEND, "nacos access token rejected, login again");
                response = self.execute(retry, true).await?;
            }
        }

        let status = response.status();
        if status.is_success() {
            Ok(Ok(response))
        } else {
            let body = response.text().await.unwrap_or_default();
            Ok(Err((status, body)))
        }
    }
}

#[async_trait]
impl NamingClient for HttpNamingClient {
    async fn register_instance(&self, instance: &InstanceRegistration) -> Result<()> {
        let url = format!("{}/v1/ns/instance", self.server_url);
        let mut params = self.instance_params(instance);
        params.push(("weight", instance.weight.to_string()));
        params.push(("enabled", "true".to_string()));
        params.push(("healthy", "true".to_string()));

        match self.send(self.http.post(&url).query(&params)).await? {
            Ok(_) => {
                debug!(
                    backend = BACKEND,
                    service = %instance.service_name,
                    ip = %instance.ip,
                    port = instance.port,
                    "instance registered"
                );
                Ok(())
            }
            Err((status, body)) => Err(DiscoveryError::registration(
                BACKEND,
                format!("{} ({}): {}", instance.service_name, status, body),
            )),
        }
    }

    async fn deregister_instance(&self, instance: &InstanceRegistration) -> Result<()> {
        let url = format!("{}/v1/ns/instance", self.server_url);
        let params = self.instance_params(instance);

        match self.send(self.http.delete(&url).query(&params)).await? {
            Ok(_) => Ok(()),
            Err((status, body)) => Err(DiscoveryError::registration(
                BACKEND,
                format!("deregister {} ({}): {}", instance.service_name, status, body),
            )),
        }
    }

    async fn send_beat(&self, instance: &InstanceRegistration) -> Result<BeatResult> {
        let url = format!("{}/v1/ns/instance/beat", self.server_url);
        let beat = serde_json::to_string(&BeatInfo {
            service_name: self.grouped_name(&instance.service_name),
            ip: &instance.ip,
            port: instance.port,
            cluster: "DEFAULT",
            weight: instance.weight,
            ephemeral: instance.ephemeral,
        })
        .map_err(|e| DiscoveryError::InvalidRequest(e.to_string()))?;

        let params = [
            ("serviceName", self.grouped_name(&instance.service_name)),
            ("groupName", self.group.clone()),
            ("namespaceId", self.namespace.clone()),
            ("beat", beat),
        ];

        match self.send(self.http.put(&url).query(&params)).await? {
            Ok(response) => response
                .json()
                .await
                .map_err(|e| DiscoveryError::DecodeFailed(e.to_string())),
            Err((status, body)) => Err(DiscoveryError::connection(
                BACKEND,
                format!("beat rejected ({}): {}", status, body),
            )),
        }
    }

    async fn list_services(&self, page_no: u32, page_size: u32) -> Result<ServicePage> {
        let url = format!("{}/v1/ns/service/list", self.server_url);
        let params = [
            ("pageNo", page_no.to_string()),
            ("pageSize", page_size.to_string()),
            ("groupName", self.group.clone()),
            ("namespaceId", self.namespace.clone()),
        ];

        match self.send(self.http.get(&url).query(&params)).await? {
            Ok(response) => response
                .json()
                .await
                .map_err(|e| DiscoveryError::DecodeFailed(e.to_string())),
            Err((status, body)) => Err(DiscoveryError::connection(
                BACKEND,
                format!("list services page {} ({}): {}", page_no, status, body),
            )),
        }
    }

    async fn select_instances(
        &self,
        service_name: &str,
        healthy_only: bool,
    ) -> Result<Vec<NacosInstance>> {
        let url = format!("{}/v1/ns/instance/list", self.server_url);
        let params = [
            ("serviceName", service_name.to_string()),
            ("groupName", self.group.clone()),
            ("namespaceId", self.namespace.clone()),
            ("healthyOnly", healthy_only.to_string()),
        ];

        match self.send(self.http.get(&url).query(&params)).await? {
            Ok(response) => {
                let list: InstanceList = response
                    .json()
                    .await
                    .map_err(|e| DiscoveryError::DecodeFailed(e.to_string()))?;
                Ok(list.hosts)
            }
            Err((status, body)) => Err(DiscoveryError::connection(
                BACKEND,
                format!("get instances of {} ({}): {}", service_name, status, body),
            )),
        }
    }
}
