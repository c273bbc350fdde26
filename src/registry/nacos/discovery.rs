//! Nacos 服务发现循环
//!
//! 每一轮：分页列出全部服务名 -> 只解析已订阅的服务 -> 一次性替换地址表。
//! 单页或单个服务查询失败只记录日志，本轮继续使用已获得的数据。
//! 后台循环在分页之间、服务查询之间检查取消信号，被取消的一轮不替换地址表。

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::NacosConfig;
use crate::discovery::{Endpoint, ServiceDirectory};
use crate::registry::nacos::client::{
    BACKEND, BEAT_RESOURCE_NOT_FOUND, InstanceRegistration, NamingClient,
};

/// 单轮发现参数
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    /// 解析出的端点使用的协议，整轮固定
    pub scheme: String,
    pub page_size: u32,
    pub page_retries: u32,
}

impl DiscoveryOptions {
    pub fn from_config(cfg: &NacosConfig) -> Self {
        Self {
            scheme: cfg.scheme.clone(),
            page_size: cfg.page_size,
            page_retries: cfg.page_retries,
        }
    }
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self::from_config(&NacosConfig::default())
    }
}

/// 分页列出的服务名
#[derive(Debug, Clone, Default)]
pub struct ServiceListing {
    pub names: Vec<String>,
    /// 成功的分页请求数
    pub pages: u32,
    /// 分页请求总数（含失败重试）
    pub requests: u32,
    /// 是否覆盖了服务端报告的总数
    pub complete: bool,
}

/// 单轮发现结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub listed: usize,
    pub resolved: usize,
    pub failed: usize,
    /// 是否替换了地址表
    pub swapped: bool,
    /// 本轮是否因取消而中止
    pub cancelled: bool,
}

/// 分页列出全部服务名
///
/// 某页失败时重试同一页，连续失败超过 `page_retries` 次后放弃剩余分页。
pub async fn list_all_services(
    client: &dyn NamingClient,
    page_size: u32,
    page_retries: u32,
) -> ServiceListing {
    list_services_until(client, page_size, page_retries, &CancellationToken::new()).await
}

async fn list_services_until(
    client: &dyn NamingClient,
    page_size: u32,
    page_retries: u32,
    cancel: &CancellationToken,
) -> ServiceListing {
    let page_size = page_size.max(1);
    let mut listing = ServiceListing::default();
    let mut page_no = 1u32;
    let mut failures = 0u32;

    loop {
        if cancel.is_cancelled() {
            return listing;
        }
        listing.requests += 1;
        match client.list_services(page_no, page_size).await {
            Ok(page) => {
                failures = 0;
                listing.pages += 1;
                let received = page.doms.len();
                listing.names.extend(page.doms);

                if page.count <= u64::from(page_no) * u64::from(page_size) {
                    listing.complete = true;
                    return listing;
                }
                if received == 0 {
                    warn!(
                        backend = BACKEND,
                        page_no,
                        count = page.count,
                        "empty page before reported total, stop listing"
                    );
                    return listing;
                }
                page_no += 1;
            }
            Err(e) => {
                failures += 1;
                warn!(
                    backend = BACKEND,
                    page_no,
                    attempt = failures,
                    error = %e,
                    "nacos list services failed"
                );
                if failures > page_retries {
                    return listing;
                }
            }
        }
    }
}

/// 执行一轮发现并替换地址表
///
/// 一页都没有拿到时不替换地址表，保留上一轮的结果。
pub async fn discover_once(
    client: &dyn NamingClient,
    directory: &ServiceDirectory,
    options: &DiscoveryOptions,
) -> CycleReport {
    discover_until(client, directory, options, &CancellationToken::new()).await
}

async fn discover_until(
    client: &dyn NamingClient,
    directory: &ServiceDirectory,
    options: &DiscoveryOptions,
    cancel: &CancellationToken,
) -> CycleReport {
    let listing =
        list_services_until(client, options.page_size, options.page_retries, cancel).await;
    let mut report = CycleReport {
        listed: listing.names.len(),
        ..Default::default()
    };

    if cancel.is_cancelled() {
        report.cancelled = true;
        return report;
    }

    if listing.pages == 0 {
        warn!(backend = BACKEND, "no service page listed, keep previous address table");
        return report;
    }

    let mut endpoints = Vec::new();
    for name in listing.names {
        if cancel.is_cancelled() {
            debug!(backend = BACKEND, "discovery cycle cancelled, keep previous address table");
            report.cancelled = true;
            return report;
        }
        if !directory.is_subscribed(&name).await {
            continue;
        }

        match client.select_instances(&name, true).await {
            Ok(instances) => match instances.into_iter().find(|i| i.healthy && i.enabled) {
                Some(instance) => {
                    let endpoint =
                        Endpoint::new(options.scheme.as_str(), instance.ip, instance.port, name);
                    debug!(backend = BACKEND, endpoint = %endpoint, "nacos discovery success");
                    endpoints.push(endpoint);
                }
                None => {
                    debug!(backend = BACKEND, service = %name, "no healthy instance");
                }
            },
            Err(e) => {
                report.failed += 1;
                warn!(backend = BACKEND, service = %name, error = %e, "nacos get service failed");
            }
        }
    }

    report.resolved = endpoints.len();
    directory.table().replace_all(endpoints).await;
    report.swapped = true;
    report
}

/// 后台循环参数
#[derive(Debug, Clone)]
pub(crate) struct LoopSettings {
    pub refresh_interval: Duration,
    pub heartbeat_interval: Duration,
    pub options: DiscoveryOptions,
}

impl LoopSettings {
    pub fn from_config(cfg: &NacosConfig) -> Self {
        Self {
            refresh_interval: cfg.refresh_interval(),
            heartbeat_interval: cfg.heartbeat_interval(),
            options: DiscoveryOptions::from_config(cfg),
        }
    }
}

/// 后台任务：立即发现一次，之后按固定间隔发现，并按心跳间隔续约实例
///
/// 等待间隔时、分页之间和服务查询之间检查取消信号，已发出的单个请求不会被打断。
/// 心跳间隔以服务端在心跳响应中建议的值为准。
pub(crate) async fn run_background(
    client: Arc<dyn NamingClient>,
    instance: InstanceRegistration,
    directory: ServiceDirectory,
    settings: LoopSettings,
    cancel: CancellationToken,
) {
    let mut refresh = tokio::time::interval(settings.refresh_interval);
    refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut beat_interval = settings.heartbeat_interval;
    let mut heartbeat = heartbeat_timer(beat_interval);

    loop {
        if cancel.is_cancelled() {
            break;
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = refresh.tick() => {
                let report =
                    discover_until(client.as_ref(), &directory, &settings.options, &cancel).await;
                debug!(
                    backend = BACKEND,
                    listed = report.listed,
                    resolved = report.resolved,
                    failed = report.failed,
                    swapped = report.swapped,
                    cancelled = report.cancelled,
                    "discovery cycle finished"
                );
            }
            _ = heartbeat.tick() => {
                if let Some(suggested) = send_heartbeat(client.as_ref(), &instance).await
                    && suggested != beat_interval
                {
                    debug!(
                        backend = BACKEND,
                        interval_ms = suggested.as_millis() as u64,
                        "nacos heartbeat interval adjusted"
                    );
                    beat_interval = suggested;
                    heartbeat = heartbeat_timer(beat_interval);
                }
            }
        }
    }

    info!(backend = BACKEND, "nacos discovery loop stopped");
}

fn heartbeat_timer(period: Duration) -> Interval {
    let mut timer = tokio::time::interval_at(Instant::now() + period, period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    timer
}

/// 发送一次心跳，返回服务端建议的心跳间隔
async fn send_heartbeat(
    client: &dyn NamingClient,
    instance: &InstanceRegistration,
) -> Option<Duration> {
    match client.send_beat(instance).await {
        Ok(beat) if beat.code == BEAT_RESOURCE_NOT_FOUND => {
            warn!(
                backend = BACKEND,
                service = %instance.service_name,
                "instance missing on server, re-registering"
            );
            if let Err(e) = client.register_instance(instance).await {
                warn!(backend = BACKEND, error = %e, "nacos re-register failed");
            }
            beat.beat_interval()
        }
        Ok(beat) => beat.beat_interval(),
        Err(e) => {
            warn!(backend = BACKEND, error = %e, "nacos heartbeat failed");
            None
        }
    }
}
