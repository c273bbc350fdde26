//! 地址表
//!
//! 逻辑服务名 -> [`Endpoint`] 的并发安全映射，由发现循环整体替换，调用方只读。

use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::discovery::endpoint::Endpoint;

/// 地址表
#[derive(Debug, Default)]
pub struct AddressTable {
    entries: RwLock<HashMap<String, Endpoint>>,
}

impl AddressTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 解析逻辑服务名，只读取内存中的映射，不做任何网络 I/O
    pub async fn resolve(&self, service_name: &str) -> Option<Endpoint> {
        let entries = self.entries.read().await;
        entries.get(service_name).cloned()
    }

    /// 用一轮发现的结果整体替换地址表
    ///
    /// 在同一把写锁内清空并重新填充，读者只会看到替换前或替换后的完整快照；
    /// 本轮未出现的服务名被淘汰。同名端点以最后一个为准。
    pub async fn replace_all<I>(&self, endpoints: I)
    where
        I: IntoIterator<Item = Endpoint>,
    {
        let mut entries = self.entries.write().await;
        entries.clear();
        for endpoint in endpoints {
            entries.insert(endpoint.service_name.clone(), endpoint);
        }
    }

    /// 当前地址表的拷贝（用于诊断）
    pub async fn snapshot(&self) -> HashMap<String, Endpoint> {
        self.entries.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
