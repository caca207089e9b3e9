//! 协议层错误类型定义

use thiserror::Error;

/// 协议层错误类型
///
/// 覆盖设备报告的失败状态以及响应内容格式错误。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// 设备返回了非成功状态码
    #[error("Device reported failure status {code:?}")]
    DeviceStatus { code: String },

    /// 响应行为空（只收到行结束符）
    #[error("Empty response frame")]
    EmptyFrame,

    /// 状态码为成功，但没有任何采样点
    #[error("Profile contains no samples")]
    EmptyProfile,

    /// 采样点无法解析为有限实数
    #[error("Malformed sample #{index}: {token:?}")]
    MalformedSample { index: usize, token: String },

    /// 在收到行结束符之前，缓冲区超过上限
    #[error("Response frame exceeds {limit} bytes without terminator")]
    FrameTooLarge { limit: usize },

    /// 响应不是合法的 UTF-8 文本
    #[error("Response is not valid UTF-8")]
    InvalidEncoding,

    /// 登录握手的回复中未出现期望的确认文本
    #[error("Handshake rejected: expected {expected:?} in device reply")]
    HandshakeMismatch { expected: String },
}
