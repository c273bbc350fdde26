//! 配置加载与日志初始化测试

use flare_discovery_client::{DiscoveryError, LogFormat, RegistryConfig, init_logging};
use std::time::Duration;

const CONFIG: &str = r#"
[application]
name = "auth"
ip = "10.0.0.3"
port = 8080

[cloud.nacos]
enable = true
ip = "10.0.0.10"
namespace = "dev"
username = "nacos"
password = "nacos"

[cloud.zookeeper]
enable = true
ip = "10.0.0.11"
"#;

#[test]
fn test_parse_config_with_defaults() {
    let cfg = RegistryConfig::from_toml_str(CONFIG).unwrap();

    assert_eq!(cfg.application.name, "auth");
    assert_eq!(cfg.listen_address(), "10.0.0.3:8080");

    let nacos = &cfg.cloud.nacos;
    assert!(nacos.enable);
    assert_eq!(nacos.port, 8848);
    assert_eq!(nacos.group, "DEFAULT_GROUP");
    assert_eq!(nacos.namespace, "dev");
    assert_eq!(nacos.username.as_deref(), Some("nacos"));
    assert_eq!(nacos.page_size, 100);
    assert_eq!(nacos.refresh_interval(), Duration::from_secs(5));
    assert_eq!(nacos.server_url(), "http://10.0.0.10:8848/nacos");

    let zookeeper = &cfg.cloud.zookeeper;
    assert!(zookeeper.enable);
    assert_eq!(zookeeper.cluster(), "10.0.0.11:2181");
    assert_eq!(zookeeper.root_path, "/services");
}

#[test]
fn test_missing_cloud_section_disables_backends() {
    let cfg = RegistryConfig::from_toml_str(
        r#"
[application]
name = "auth"
ip = "127.0.0.1"
port = 8080
"#,
    )
    .unwrap();

    assert!(!cfg.cloud.nacos.enable);
    assert!(!cfg.cloud.zookeeper.enable);
}

#[test]
fn test_invalid_toml_is_config_error() {
    let err = RegistryConfig::from_toml_str("[application]\nport = \"eighty\"").unwrap_err();
    assert!(matches!(err, DiscoveryError::Config(_)));
}

#[test]
fn test_missing_file_is_config_error() {
    let err = RegistryConfig::load_from_file("/nonexistent/flare/config.toml").unwrap_err();
    assert!(matches!(err, DiscoveryError::Config(_)));
}

#[test]
fn test_logging_can_only_be_installed_once() {
    init_logging(LogFormat::Json).unwrap();
    let err = init_logging(LogFormat::Text).unwrap_err();
    assert!(matches!(err, DiscoveryError::Config(_)));
}
