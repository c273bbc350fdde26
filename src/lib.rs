//! Flare Discovery Client
//!
//! 服务注册与发现客户端：把本进程注册到一个或多个注册中心（Nacos、ZooKeeper），
//! 周期性刷新已订阅的对端服务地址，并按逻辑服务名发起出站调用。

pub mod client;
pub mod config;
pub mod discovery;
pub mod error;
pub mod logging;
pub mod registry;
pub mod runtime;

// Re-exports
pub use client::{Envelope, ServiceClient};
pub use config::{ApplicationConfig, CloudConfig, NacosConfig, RegistryConfig, ZookeeperConfig};
pub use discovery::{AddressTable, Endpoint, ServiceDirectory, SubscriptionSet};
pub use error::{DiscoveryError, ErrorCategory, ErrorCode, Result};
pub use logging::{LogFormat, init_logging};
pub use registry::{
    NacosRegistry, Registrar, RegistrationCoordinator, RegistryBackend, UnregisterPolicy,
    ZookeeperRegistry,
};
pub use runtime::ServiceRuntime;
