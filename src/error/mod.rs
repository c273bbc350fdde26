//! 服务注册发现错误处理模块
//!
//! 统一的错误类型，每个变体对应一个 [`ErrorCode`]，便于调用方按类别处理：
//! 注册期间的连接/注册错误向上传播并终止启动，解析/解码错误直接返回给调用方。

pub mod code;

pub use code::{ErrorCategory, ErrorCode};

use thiserror::Error;

/// 服务注册发现统一错误类型
#[derive(Error, Debug)]
pub enum DiscoveryError {
    /// 无法连接到注册中心
    #[error("连接注册中心失败 [{backend}]: {reason}")]
    Connection {
        backend: &'static str,
        reason: String,
    },

    /// 注册中心拒绝了实例注册（重复、参数非法等）
    #[error("注册实例失败 [{backend}]: {reason}")]
    Registration {
        backend: &'static str,
        reason: String,
    },

    /// 地址表中没有该逻辑服务名的地址
    #[error("服务未解析: {0}")]
    ServiceUnresolved(String),

    /// 对端响应不是合法的 `{code, message, data}` 信封
    #[error("响应解码失败: {0}")]
    DecodeFailed(String),

    /// 出站请求发送失败（原样透传）
    #[error("HTTP 请求失败: {0}")]
    Http(#[from] reqwest::Error),

    /// 出站请求无法改写或转换
    #[error("无效请求: {0}")]
    InvalidRequest(String),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 尽力注销时各后端的失败汇总
    #[error("注销失败: {}", join_errors(.0))]
    Unregister(Vec<DiscoveryError>),
}

/// 服务注册发现结果类型
pub type Result<T> = std::result::Result<T, DiscoveryError>;

impl DiscoveryError {
    /// 创建连接错误
    pub fn connection(backend: &'static str, reason: impl Into<String>) -> Self {
        DiscoveryError::Connection {
            backend,
            reason: reason.into(),
        }
    }

    /// 创建注册错误
    pub fn registration(backend: &'static str, reason: impl Into<String>) -> Self {
        DiscoveryError::Registration {
            backend,
            reason: reason.into(),
        }
    }

    /// 获取错误代码
    pub fn code(&self) -> ErrorCode {
        match self {
            DiscoveryError::Connection { .. } => ErrorCode::ConnectionFailed,
            DiscoveryError::Registration { .. } => ErrorCode::RegistrationFailed,
            DiscoveryError::ServiceUnresolved(_) => ErrorCode::ServiceUnresolved,
            DiscoveryError::DecodeFailed(_) => ErrorCode::DecodeFailed,
            DiscoveryError::Http(e) if e.is_timeout() => ErrorCode::ConnectionTimeout,
            DiscoveryError::Http(_) => ErrorCode::RequestFailed,
            DiscoveryError::InvalidRequest(_) => ErrorCode::InvalidRequest,
            DiscoveryError::Config(_) => ErrorCode::ConfigurationError,
            DiscoveryError::Unregister(_) => ErrorCode::UnregistrationFailed,
        }
    }

    /// 获取错误类别
    pub fn category(&self) -> ErrorCategory {
        self.code().category()
    }
}

fn join_errors(errors: &[DiscoveryError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
