//! 订阅集合
//!
//! 进程打算调用的逻辑服务名。调用方在首次出站调用前订阅，运行期间只增不减；
//! 发现循环只解析已订阅的服务。

use std::collections::HashSet;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct SubscriptionSet {
    names: RwLock<HashSet<String>>,
}

impl SubscriptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 订阅服务名（幂等）
    pub async fn subscribe(&self, service_name: impl Into<String>) {
        let service_name = service_name.into();
        let mut names = self.names.write().await;
        if names.insert(service_name.clone()) {
            tracing::debug!(service = %service_name, "service subscribed");
        }
    }

    pub async fn is_subscribed(&self, service_name: &str) -> bool {
        self.names.read().await.contains(service_name)
    }

    /// 已订阅的服务名（排序后返回）
    pub async fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.names.read().await.iter().cloned().collect();
        names.sort();
        names
    }

    pub async fn len(&self) -> usize {
        self.names.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.names.read().await.is_empty()
    }
}
