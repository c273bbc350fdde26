//! 日志初始化

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::error::{DiscoveryError, Result};

/// 日志输出格式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// 安装全局 tracing subscriber
///
/// 过滤规则取自 `RUST_LOG`，未设置时为 `info`。全局 subscriber 已存在时返回错误，不会 panic。
pub fn init_logging(format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let result = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    result.map_err(|e| DiscoveryError::Config(format!("初始化日志失败: {}", e)))
}
