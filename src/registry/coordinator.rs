//! 注册协调器
//!
//! 按固定顺序把注册/注销分发给各个后端。注册遇到第一个失败立即返回，后续后端不再尝试；
//! 注销的失败处理由 [`UnregisterPolicy`] 决定。

use tracing::{error, info};

use crate::config::RegistryConfig;
use crate::discovery::ServiceDirectory;
use crate::error::{DiscoveryError, Result};
use crate::registry::{Registrar, RegistryBackend};

/// 注销失败处理策略
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnregisterPolicy {
    /// 遇到第一个失败即停止，后续后端不再注销
    FailFast,
    /// 依次注销所有后端，汇总全部失败
    #[default]
    BestEffort,
}

/// 注册协调器
pub struct RegistrationCoordinator<R = RegistryBackend> {
    backends: Vec<R>,
    unregister_policy: UnregisterPolicy,
}

impl RegistrationCoordinator<RegistryBackend> {
    /// 内置后端列表：Nacos、ZooKeeper
    pub fn standard(directory: ServiceDirectory) -> Self {
        Self::new(vec![
            RegistryBackend::nacos(directory),
            RegistryBackend::zookeeper(),
        ])
    }
}

impl<R: Registrar> RegistrationCoordinator<R> {
    pub fn new(backends: Vec<R>) -> Self {
        Self {
            backends,
            unregister_policy: UnregisterPolicy::default(),
        }
    }

    pub fn with_unregister_policy(mut self, policy: UnregisterPolicy) -> Self {
        self.unregister_policy = policy;
        self
    }

    pub fn backends(&self) -> &[R] {
        &self.backends
    }

    pub fn unregister_policy(&self) -> UnregisterPolicy {
        self.unregister_policy
    }

    /// 依次注册，遇到第一个失败立即返回该错误
    pub async fn register(&self, cfg: &RegistryConfig) -> Result<()> {
        for backend in &self.backends {
            if let Err(e) = backend.register(cfg).await {
                error!(backend = backend.name(), error = %e, "register failed");
                return Err(e);
            }
        }
        info!(
            service = %cfg.application.name,
            backends = self.backends.len(),
            "service registration finished"
        );
        Ok(())
    }

    /// 依次注销
    pub async fn unregister(&self, cfg: &RegistryConfig) -> Result<()> {
        let mut failures = Vec::new();
        for backend in &self.backends {
            if let Err(e) = backend.unregister(cfg).await {
                error!(backend = backend.name(), error = %e, "unregister failed");
                match self.unregister_policy {
                    UnregisterPolicy::FailFast => return Err(e),
                    UnregisterPolicy::BestEffort => failures.push(e),
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(DiscoveryError::Unregister(failures))
        }
    }
}
