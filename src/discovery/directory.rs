//! 服务目录
//!
//! 地址表与订阅集合的组合。由组合根创建一次，再以 `Arc` 显式传给注册后端与出站调用方。

use std::sync::Arc;

use crate::discovery::endpoint::Endpoint;
use crate::discovery::subscription::SubscriptionSet;
use crate::discovery::table::AddressTable;

#[derive(Debug, Clone, Default)]
pub struct ServiceDirectory {
    table: Arc<AddressTable>,
    subscriptions: Arc<SubscriptionSet>,
}

impl ServiceDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self) -> &Arc<AddressTable> {
        &self.table
    }

    pub fn subscriptions(&self) -> &Arc<SubscriptionSet> {
        &self.subscriptions
    }

    /// 声明对某个逻辑服务的依赖
    pub async fn subscribe(&self, service_name: impl Into<String>) {
        self.subscriptions.subscribe(service_name).await;
    }

    pub async fn is_subscribed(&self, service_name: &str) -> bool {
        self.subscriptions.is_subscribed(service_name).await
    }

    pub async fn resolve(&self, service_name: &str) -> Option<Endpoint> {
        self.table.resolve(service_name).await
    }
}
