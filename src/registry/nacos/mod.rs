//! Nacos 注册后端
//!
//! 注册本地实例（健康、临时），注册成功后启动唯一的后台任务：周期性服务发现 + 实例心跳。

pub mod client;
pub mod discovery;

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::RegistryConfig;
use crate::discovery::ServiceDirectory;
use crate::error::Result;
use crate::registry::Registrar;

pub use client::{
    BeatResult, HttpNamingClient, HttpNamingConnector, InstanceRegistration, NacosInstance,
    NamingClient, NamingConnector, ServicePage,
};
pub use discovery::{CycleReport, DiscoveryOptions, ServiceListing, discover_once, list_all_services};

use client::BACKEND;
use discovery::{LoopSettings, run_background};

/// 已注册状态：连接句柄 + 后台任务
struct NacosSession {
    client: Arc<dyn NamingClient>,
    instance: InstanceRegistration,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Nacos 注册后端
pub struct NacosRegistry {
    directory: ServiceDirectory,
    connector: Arc<dyn NamingConnector>,
    session: Mutex<Option<NacosSession>>,
}

impl NacosRegistry {
    /// 使用 HTTP Open API 连接器创建
    pub fn new(directory: ServiceDirectory) -> Self {
        Self::with_connector(directory, Arc::new(HttpNamingConnector))
    }

    /// 使用自定义连接器创建
    pub fn with_connector(directory: ServiceDirectory, connector: Arc<dyn NamingConnector>) -> Self {
        Self {
            directory,
            connector,
            session: Mutex::new(None),
        }
    }

    pub fn directory(&self) -> &ServiceDirectory {
        &self.directory
    }

    /// 是否持有连接句柄
    pub async fn is_registered(&self) -> bool {
        self.session.lock().await.is_some()
    }
}

#[async_trait]
impl Registrar for NacosRegistry {
    fn name(&self) -> &'static str {
        BACKEND
    }

    async fn register(&self, cfg: &RegistryConfig) -> Result<()> {
        let nacos = &cfg.cloud.nacos;
        if !nacos.enable {
            return Ok(());
        }

        let mut session = self.session.lock().await;
        if session.is_some() {
            warn!(backend = BACKEND, "nacos already registered, skip");
            return Ok(());
        }

        let client = self.connector.connect(nacos).await.inspect_err(|e| {
            error!(backend = BACKEND, error = %e, "nacos connect error");
        })?;

        let instance = InstanceRegistration::from_config(cfg);
        if let Err(e) = client.register_instance(&instance).await {
            error!(backend = BACKEND, error = %e, "nacos register error");
            client.close().await;
            return Err(e);
        }

        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_background(
            client.clone(),
            instance.clone(),
            self.directory.clone(),
            LoopSettings::from_config(nacos),
            cancel.clone(),
        ));

        info!(
            backend = BACKEND,
            service = %instance.service_name,
            ip = %instance.ip,
            port = instance.port,
            group = %nacos.group,
            "nacos register success"
        );

        *session = Some(NacosSession {
            client,
            instance,
            cancel,
            task,
        });
        Ok(())
    }

    async fn unregister(&self, cfg: &RegistryConfig) -> Result<()> {
        if !cfg.cloud.nacos.enable {
            return Ok(());
        }

        let Some(session) = self.session.lock().await.take() else {
            debug!(backend = BACKEND, "nacos not registered, skip unregister");
            return Ok(());
        };

        info!(backend = BACKEND, "nacos unregister");

        // 先停掉后台任务，避免心跳把刚注销的实例重新注册回去
        session.cancel.cancel();
        if let Err(e) = session.task.await {
            warn!(backend = BACKEND, error = %e, "nacos discovery task join failed");
        }

        let result = session
            .client
            .deregister_instance(&session.instance)
            .await
            .inspect_err(|e| {
                error!(backend = BACKEND, error = %e, "nacos deregister error");
            });
        session.client.close().await;
        result
    }
}
