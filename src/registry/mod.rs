//! 服务注册模块
//!
//! 支持的注册中心后端：Nacos（注册 + 周期性服务发现）、ZooKeeper（仅注册）。
//! 后端集合在组合根中显式构造，由 [`RegistrationCoordinator`] 统一分发。

pub mod coordinator;
pub mod nacos;
pub mod zookeeper;

use async_trait::async_trait;

use crate::config::RegistryConfig;
use crate::discovery::ServiceDirectory;
use crate::error::Result;

pub use coordinator::{RegistrationCoordinator, UnregisterPolicy};
pub use nacos::NacosRegistry;
pub use zookeeper::ZookeeperRegistry;

/// 注册中心后端能力
///
/// 后端在配置中未启用时，注册和注销都是空操作。
#[async_trait]
pub trait Registrar: Send + Sync {
    /// 后端名称（用于日志）
    fn name(&self) -> &'static str;

    /// 连接注册中心并注册本地实例
    async fn register(&self, cfg: &RegistryConfig) -> Result<()>;

    /// 注销本地实例并释放连接
    async fn unregister(&self, cfg: &RegistryConfig) -> Result<()>;
}

/// 内置的注册中心后端
pub enum RegistryBackend {
    Nacos(NacosRegistry),
    Zookeeper(ZookeeperRegistry),
}

impl RegistryBackend {
    pub fn nacos(directory: ServiceDirectory) -> Self {
        RegistryBackend::Nacos(NacosRegistry::new(directory))
    }

    pub fn zookeeper() -> Self {
        RegistryBackend::Zookeeper(ZookeeperRegistry::new())
    }
}

#[async_trait]
impl Registrar for RegistryBackend {
    fn name(&self) -> &'static str {
        match self {
            RegistryBackend::Nacos(r) => r.name(),
            RegistryBackend::Zookeeper(r) => r.name(),
        }
    }

    async fn register(&self, cfg: &RegistryConfig) -> Result<()> {
        match self {
            RegistryBackend::Nacos(r) => r.register(cfg).await,
            RegistryBackend::Zookeeper(r) => r.register(cfg).await,
        }
    }

    async fn unregister(&self, cfg: &RegistryConfig) -> Result<()> {
        match self {
            RegistryBackend::Nacos(r) => r.unregister(cfg).await,
            RegistryBackend::Zookeeper(r) => r.unregister(cfg).await,
        }
    }
}
