//! 测试用的 mock 命名服务、连接器与注册后端

#![allow(dead_code)]

use async_trait::async_trait;
use flare_discovery_client::config::{
    ApplicationConfig, CloudConfig, NacosConfig, RegistryConfig, ZookeeperConfig,
};
use flare_discovery_client::registry::nacos::{
    BeatResult, InstanceRegistration, NacosInstance, NamingClient, NamingConnector, ServicePage,
};
use flare_discovery_client::{DiscoveryError, Registrar, Result};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const PAGE_SIZE: u32 = 100;

pub fn instance(ip: &str, port: u16) -> NacosInstance {
    NacosInstance {
        ip: ip.to_string(),
        port,
        healthy: true,
        enabled: true,
    }
}

pub fn registry_config(nacos_enabled: bool, zookeeper_enabled: bool) -> RegistryConfig {
    RegistryConfig {
        application: ApplicationConfig {
            name: "auth".to_string(),
            ip: "127.0.0.1".to_string(),
            port: 8080,
        },
        cloud: CloudConfig {
            nacos: NacosConfig {
                enable: nacos_enabled,
                ..Default::default()
            },
            zookeeper: ZookeeperConfig {
                enable: zookeeper_enabled,
                ..Default::default()
            },
        },
    }
}

/// 内存中的命名服务
#[derive(Default)]
pub struct MockNamingClient {
    services: Mutex<Vec<String>>,
    reported_count: Mutex<Option<u64>>,
    instances: Mutex<HashMap<String, Vec<NacosInstance>>>,
    failing_lookups: Mutex<HashSet<String>>,
    /// 页码 -> 剩余失败次数
    failing_pages: Mutex<HashMap<u32, u32>>,
    reject_register: Mutex<bool>,
    beat_code: Mutex<i32>,
    beat_interval_ms: Mutex<Option<u64>>,
    lookup_delay: Mutex<Option<Duration>>,
    list_calls: AtomicUsize,
    lookups: Mutex<Vec<String>>,
    registered: AtomicUsize,
    deregistered: AtomicUsize,
    beats: AtomicUsize,
    closed: AtomicUsize,
}

impl MockNamingClient {
    pub fn with_services(names: &[&str]) -> Self {
        let client = Self::default();
        client.set_services(names);
        *client.beat_code.lock().unwrap() = 10200;
        client
    }

    pub fn with_generated_services(total: usize) -> Self {
        let names: Vec<String> = (0..total).map(|i| format!("svc-{:03}", i)).collect();
        let client = Self::default();
        *client.services.lock().unwrap() = names;
        *client.beat_code.lock().unwrap() = 10200;
        client
    }

    pub fn set_services(&self, names: &[&str]) {
        *self.services.lock().unwrap() = names.iter().map(|n| n.to_string()).collect();
    }

    pub fn report_count(&self, count: u64) {
        *self.reported_count.lock().unwrap() = Some(count);
    }

    pub fn set_instances(&self, service: &str, instances: Vec<NacosInstance>) {
        self.instances
            .lock()
            .unwrap()
            .insert(service.to_string(), instances);
    }

    pub fn fail_lookup(&self, service: &str) {
        self.failing_lookups
            .lock()
            .unwrap()
            .insert(service.to_string());
    }

    pub fn fail_page(&self, page_no: u32, times: u32) {
        self.failing_pages.lock().unwrap().insert(page_no, times);
    }

    pub fn reject_register(&self) {
        *self.reject_register.lock().unwrap() = true;
    }

    pub fn set_beat_code(&self, code: i32) {
        *self.beat_code.lock().unwrap() = code;
    }

    /// 心跳响应中携带的建议间隔（毫秒）
    pub fn set_beat_interval(&self, ms: u64) {
        *self.beat_interval_ms.lock().unwrap() = Some(ms);
    }

    /// 每次实例查询前等待的时长
    pub fn set_lookup_delay(&self, delay: Duration) {
        *self.lookup_delay.lock().unwrap() = Some(delay);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }

    pub fn registered(&self) -> usize {
        self.registered.load(Ordering::SeqCst)
    }

    pub fn deregistered(&self) -> usize {
        self.deregistered.load(Ordering::SeqCst)
    }

    pub fn beats(&self) -> usize {
        self.beats.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NamingClient for MockNamingClient {
    async fn register_instance(&self, instance: &InstanceRegistration) -> Result<()> {
        if *self.reject_register.lock().unwrap() {
            return Err(DiscoveryError::registration(
                "nacos",
                format!("duplicate instance {}", instance.service_name),
            ));
        }
        self.registered.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn deregister_instance(&self, _instance: &InstanceRegistration) -> Result<()> {
        self.deregistered.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn send_beat(&self, _instance: &InstanceRegistration) -> Result<BeatResult> {
        self.beats.fetch_add(1, Ordering::SeqCst);
        Ok(BeatResult {
            code: *self.beat_code.lock().unwrap(),
            client_beat_interval: *self.beat_interval_ms.lock().unwrap(),
        })
    }

    async fn list_services(&self, page_no: u32, page_size: u32) -> Result<ServicePage> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);

        {
            let mut failing = self.failing_pages.lock().unwrap();
            if let Some(remaining) = failing.get_mut(&page_no) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(DiscoveryError::connection("nacos", "page unavailable"));
                }
            }
        }

        let services = self.services.lock().unwrap();
        let start = ((page_no - 1) * page_size) as usize;
        let end = (start + page_size as usize).min(services.len());
        let doms = if start < end {
            services[start..end].to_vec()
        } else {
            Vec::new()
        };
        let count = self
            .reported_count
            .lock()
            .unwrap()
            .unwrap_or(services.len() as u64);
        Ok(ServicePage { count, doms })
    }

    async fn select_instances(
        &self,
        service_name: &str,
        _healthy_only: bool,
    ) -> Result<Vec<NacosInstance>> {
        self.lookups.lock().unwrap().push(service_name.to_string());
        let delay = *self.lookup_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing_lookups.lock().unwrap().contains(service_name) {
            return Err(DiscoveryError::connection("nacos", "lookup failed"));
        }
        Ok(self
            .instances
            .lock()
            .unwrap()
            .get(service_name)
            .cloned()
            .unwrap_or_default())
    }

    async fn close(&self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// 始终返回同一个 mock 客户端的连接器
pub struct MockConnector {
    client: Arc<MockNamingClient>,
    unreachable: bool,
    connects: AtomicUsize,
}

impl MockConnector {
    pub fn new(client: Arc<MockNamingClient>) -> Self {
        Self {
            client,
            unreachable: false,
            connects: AtomicUsize::new(0),
        }
    }

    pub fn unreachable(client: Arc<MockNamingClient>) -> Self {
        Self {
            client,
            unreachable: true,
            connects: AtomicUsize::new(0),
        }
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NamingConnector for MockConnector {
    async fn connect(&self, _cfg: &NacosConfig) -> Result<Arc<dyn NamingClient>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.unreachable {
            return Err(DiscoveryError::connection("nacos", "connection refused"));
        }
        Ok(self.client.clone())
    }
}

/// 记录调用顺序的注册后端
pub struct MockRegistrar {
    name: &'static str,
    fail_register: bool,
    fail_unregister: bool,
    journal: Arc<Mutex<Vec<String>>>,
}

impl MockRegistrar {
    pub fn new(name: &'static str, journal: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            name,
            fail_register: false,
            fail_unregister: false,
            journal,
        }
    }

    pub fn failing_register(mut self) -> Self {
        self.fail_register = true;
        self
    }

    pub fn failing_unregister(mut self) -> Self {
        self.fail_unregister = true;
        self
    }
}

#[async_trait]
impl Registrar for MockRegistrar {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn register(&self, _cfg: &RegistryConfig) -> Result<()> {
        self.journal
            .lock()
            .unwrap()
            .push(format!("register:{}", self.name));
        if self.fail_register {
            return Err(DiscoveryError::connection(self.name, "registry unreachable"));
        }
        Ok(())
    }

    async fn unregister(&self, _cfg: &RegistryConfig) -> Result<()> {
        self.journal
            .lock()
            .unwrap()
            .push(format!("unregister:{}", self.name));
        if self.fail_unregister {
            return Err(DiscoveryError::registration(self.name, "deregister rejected"));
        }
        Ok(())
    }
}
