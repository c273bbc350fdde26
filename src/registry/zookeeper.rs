//! ZooKeeper 注册后端
//!
//! 只宣告存在，不做服务发现。实例以临时节点 `{root}/{name}/{ip}:{port}` 注册，
//! 节点生命周期绑定在一个可取消的后台任务上：取消后删除节点并关闭会话。

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use zookeeper_client as zk;

use crate::config::RegistryConfig;
use crate::error::{DiscoveryError, Result};
use crate::registry::Registrar;

const BACKEND: &str = "zookeeper";

/// 写入实例节点的数据
#[derive(Debug, Serialize)]
struct InstanceNode<'a> {
    name: &'a str,
    address: &'a str,
    port: u16,
}

struct ZookeeperSession {
    node: String,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// ZooKeeper 注册后端
#[derive(Default)]
pub struct ZookeeperRegistry {
    session: Mutex<Option<ZookeeperSession>>,
}

impl ZookeeperRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn is_registered(&self) -> bool {
        self.session.lock().await.is_some()
    }

    /// 当前注册的实例节点路径
    pub async fn node_path(&self) -> Option<String> {
        self.session.lock().await.as_ref().map(|s| s.node.clone())
    }
}

/// 实例节点路径
pub fn instance_path(root: &str, name: &str, ip: &str, port: u16) -> String {
    format!("{}/{}/{}:{}", root.trim_end_matches('/'), name, ip, port)
}

/// 逐级创建持久节点，已存在的节点忽略
async fn ensure_path(client: &zk::Client, path: &str) -> Result<()> {
    let mut current = String::new();
    for part in path.split('/').filter(|p| !p.is_empty()) {
        current.push('/');
        current.push_str(part);
        match client
            .create(
                &current,
                &[],
                &zk::CreateMode::Persistent.with_acls(zk::Acls::anyone_all()),
            )
            .await
        {
            Ok(_) | Err(zk::Error::NodeExists) => {}
            Err(e) => {
                return Err(DiscoveryError::registration(
                    BACKEND,
                    format!("create {}: {}", current, e),
                ));
            }
        }
    }
    Ok(())
}

#[async_trait]
impl Registrar for ZookeeperRegistry {
    fn name(&self) -> &'static str {
        BACKEND
    }

    async fn register(&self, cfg: &RegistryConfig) -> Result<()> {
        let zookeeper = &cfg.cloud.zookeeper;
        if !zookeeper.enable {
            return Ok(());
        }

        let mut session = self.session.lock().await;
        if session.is_some() {
            warn!(backend = BACKEND, "zookeeper already registered, skip");
            return Ok(());
        }

        let cluster = zookeeper.cluster();
        let client = tokio::time::timeout(zookeeper.connect_timeout(), zk::Client::connect(&cluster))
            .await
            .map_err(|_| DiscoveryError::connection(BACKEND, format!("connect {} timed out", cluster)))?
            .map_err(|e| DiscoveryError::connection(BACKEND, format!("connect {}: {}", cluster, e)))
            .inspect_err(|e| error!(backend = BACKEND, error = %e, "connect zookeeper failed"))?;

        let app = &cfg.application;
        let parent = format!("{}/{}", zookeeper.root_path.trim_end_matches('/'), app.name);
        ensure_path(&client, &parent).await?;

        let node = instance_path(&zookeeper.root_path, &app.name, &app.ip, app.port);
        let data = serde_json::to_vec(&InstanceNode {
            name: &app.name,
            address: &app.ip,
            port: app.port,
        })
        .map_err(|e| DiscoveryError::registration(BACKEND, e.to_string()))?;

        client
            .create(
                &node,
                &data,
                &zk::CreateMode::Ephemeral.with_acls(zk::Acls::anyone_all()),
            )
            .await
            .map_err(|e| DiscoveryError::registration(BACKEND, format!("create {}: {}", node, e)))
            .inspect_err(|e| error!(backend = BACKEND, error = %e, "zookeeper register failed"))?;

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let path = node.clone();
        let task = tokio::spawn(async move {
            token.cancelled().await;
            match client.delete(&path, None).await {
                Ok(()) | Err(zk::Error::NoNode) => {
                    debug!(backend = BACKEND, node = %path, "instance node released");
                }
                Err(e) => {
                    warn!(backend = BACKEND, node = %path, error = %e, "delete instance node failed");
                }
            }
        });

        info!(backend = BACKEND, node = %node, "zookeeper register success");
        *session = Some(ZookeeperSession { node, cancel, task });
        Ok(())
    }

    async fn unregister(&self, cfg: &RegistryConfig) -> Result<()> {
        if !cfg.cloud.zookeeper.enable {
            return Ok(());
        }

        let Some(session) = self.session.lock().await.take() else {
            debug!(backend = BACKEND, "zookeeper not registered, skip unregister");
            return Ok(());
        };

        info!(backend = BACKEND, node = %session.node, "unregister zookeeper");
        session.cancel.cancel();
        if let Err(e) = session.task.await {
            warn!(backend = BACKEND, error = %e, "zookeeper lifetime task join failed");
        }
        Ok(())
    }
}
