//! 服务生命周期
//!
//! 启动时通过协调器注册本地实例，等待关闭信号，退出前注销。
//! 注册失败视为致命错误：已注册成功的后端会被回滚注销，然后把注册错误返回给调用方。
//!
//! # 使用示例
//! ```rust,no_run
//! use flare_discovery_client::{RegistrationCoordinator, RegistryConfig, ServiceDirectory, ServiceRuntime};
//!
//! # async fn run() -> flare_discovery_client::Result<()> {
//! let config = RegistryConfig::load_from_file("config.toml")?.with_env_overrides()?;
//! let directory = ServiceDirectory::new();
//! directory.subscribe("work-data").await;
//!
//! let coordinator = RegistrationCoordinator::standard(directory.clone());
//! ServiceRuntime::new(config, coordinator).run().await
//! # }
//! ```

use std::future::Future;
use tokio::signal;
use tracing::{error, info, warn};

use crate::config::RegistryConfig;
use crate::error::Result;
use crate::registry::{Registrar, RegistrationCoordinator, RegistryBackend};

/// 服务运行时
pub struct ServiceRuntime<R = RegistryBackend> {
    config: RegistryConfig,
    coordinator: RegistrationCoordinator<R>,
}

impl<R: Registrar> ServiceRuntime<R> {
    pub fn new(config: RegistryConfig, coordinator: RegistrationCoordinator<R>) -> Self {
        Self {
            config,
            coordinator,
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// 注册后等待 Ctrl+C / SIGTERM，然后注销
    pub async fn run(self) -> Result<()> {
        self.run_until(shutdown_signal()).await
    }

    /// 注册后等待 `shutdown` 完成，然后注销
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        info!(
            service = %self.config.application.name,
            address = %self.config.listen_address(),
            "registering service instance"
        );

        if let Err(e) = self.coordinator.register(&self.config).await {
            error!(error = %e, "service registration failed, rolling back");
            if let Err(rollback) = self.coordinator.unregister(&self.config).await {
                warn!(error = %rollback, "rollback unregister failed");
            }
            return Err(e);
        }

        shutdown.await;
        info!("shutdown signal received, unregistering");

        self.coordinator.unregister(&self.config).await?;
        info!(service = %self.config.application.name, "service runtime stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("received Ctrl+C");
        }
        () = terminate => {
            info!("received SIGTERM");
        }
    }
}
