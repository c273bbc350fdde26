//! 错误代码和错误类别定义

use serde::{Deserialize, Serialize};
use std::fmt;

/// 错误代码枚举
///
/// 错误代码按类别分组，每个类别占用1000个代码范围：
/// - 1000-1999: 注册中心连接相关错误
/// - 2000-2999: 实例注册相关错误
/// - 3000-3999: 服务解析与调用相关错误
/// - 9000-9999: 通用错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u32)]
pub enum ErrorCode {
    // ============================================================
    // 连接相关错误 (1000-1999)
    // ============================================================
    ConnectionFailed = 1000,
    ConnectionTimeout = 1001,

    // ============================================================
    // 注册相关错误 (2000-2999)
    // ============================================================
    RegistrationFailed = 2000,
    UnregistrationFailed = 2001,

    // ============================================================
    // 解析与调用相关错误 (3000-3999)
    // ============================================================
    ServiceUnresolved = 3000,
    DecodeFailed = 3001,
    RequestFailed = 3002,
    InvalidRequest = 3003,

    // ============================================================
    // 通用错误 (9000-9999)
    // ============================================================
    ConfigurationError = 9000,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ErrorCode {
    /// 获取错误代码的数字值
    #[inline]
    pub fn as_u32(&self) -> u32 {
        *self as u32
    }

    /// 获取错误代码的英文标识符
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ConnectionFailed => "CONNECTION_FAILED",
            ErrorCode::ConnectionTimeout => "CONNECTION_TIMEOUT",
            ErrorCode::RegistrationFailed => "REGISTRATION_FAILED",
            ErrorCode::UnregistrationFailed => "UNREGISTRATION_FAILED",
            ErrorCode::ServiceUnresolved => "SERVICE_UNRESOLVED",
            ErrorCode::DecodeFailed => "DECODE_FAILED",
            ErrorCode::RequestFailed => "REQUEST_FAILED",
            ErrorCode::InvalidRequest => "INVALID_REQUEST",
            ErrorCode::ConfigurationError => "CONFIGURATION_ERROR",
        }
    }

    /// 获取错误代码的类别
    pub fn category(&self) -> ErrorCategory {
        match self.as_u32() {
            1000..=1999 => ErrorCategory::Connection,
            2000..=2999 => ErrorCategory::Registration,
            3000..=3999 => ErrorCategory::Resolution,
            _ => ErrorCategory::General,
        }
    }
}

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCategory {
    Connection,
    Registration,
    Resolution,
    General,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Connection => write!(f, "CONNECTION"),
            ErrorCategory::Registration => write!(f, "REGISTRATION"),
            ErrorCategory::Resolution => write!(f, "RESOLUTION"),
            ErrorCategory::General => write!(f, "GENERAL"),
        }
    }
}
