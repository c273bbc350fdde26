//! 服务注册配置
//!
//! 注册时传入的只读快照：本地实例信息 + 各注册中心后端的开关与连接参数。

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{DiscoveryError, Result};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RegistryConfig {
    pub application: ApplicationConfig,
    #[serde(default)]
    pub cloud: CloudConfig,
}

/// 本地实例信息
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ApplicationConfig {
    pub name: String,
    pub ip: String,
    pub port: u16,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CloudConfig {
    #[serde(default)]
    pub nacos: NacosConfig,
    #[serde(default)]
    pub zookeeper: ZookeeperConfig,
}

/// Nacos 注册中心配置
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NacosConfig {
    pub enable: bool,
    pub ip: String,
    pub port: u16,
    /// 为空表示 public 命名空间
    pub namespace: String,
    pub group: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub context_path: String,
    /// 解析出的对端地址使用的协议
    pub scheme: String,
    pub refresh_interval_secs: u64,
    pub heartbeat_interval_secs: u64,
    pub page_size: u32,
    /// 单页查询失败后的重试次数，超过后放弃本轮剩余分页
    pub page_retries: u32,
    pub timeout_ms: u64,
}

impl Default for NacosConfig {
    fn default() -> Self {
        Self {
            enable: false,
            ip: "127.0.0.1".to_string(),
            port: 8848,
            namespace: String::new(),
            group: "DEFAULT_GROUP".to_string(),
            username: None,
            password: None,
            context_path: "/nacos".to_string(),
            scheme: "http".to_string(),
            refresh_interval_secs: 5,
            heartbeat_interval_secs: 5,
            page_size: 100,
            page_retries: 2,
            timeout_ms: 5000,
        }
    }
}

impl NacosConfig {
    /// 注册中心 HTTP API 根地址，例如 `http://127.0.0.1:8848/nacos`
    pub fn server_url(&self) -> String {
        format!(
            "http://{}:{}{}",
            self.ip,
            self.port,
            self.context_path.trim_end_matches('/')
        )
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs.max(1))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// ZooKeeper 注册中心配置
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ZookeeperConfig {
    pub enable: bool,
    pub ip: String,
    pub port: u16,
    /// 实例节点的父路径
    pub root_path: String,
    pub connect_timeout_secs: u64,
}

impl Default for ZookeeperConfig {
    fn default() -> Self {
        Self {
            enable: false,
            ip: "127.0.0.1".to_string(),
            port: 2181,
            root_path: "/services".to_string(),
            connect_timeout_secs: 5,
        }
    }
}

impl ZookeeperConfig {
    pub fn cluster(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl RegistryConfig {
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DiscoveryError::Config(format!("读取配置文件 {} 失败: {}", path, e)))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| DiscoveryError::Config(e.to_string()))
    }

    /// 使用环境变量 `IP` / `PORT` 覆盖本地实例地址
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(std::env::var("IP").ok(), std::env::var("PORT").ok())
    }

    fn with_overrides(mut self, ip: Option<String>, port: Option<String>) -> Result<Self> {
        if let Some(ip) = ip {
            self.application.ip = ip;
        }
        if let Some(port) = port {
            self.application.port = port
                .parse()
                .map_err(|e| DiscoveryError::Config(format!("无效的 PORT {}: {}", port, e)))?;
        }
        Ok(self)
    }

    /// 本地监听地址 `ip:port`
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.application.ip, self.application.port)
    }
}
