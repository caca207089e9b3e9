//! 链路层错误类型定义

use inspect_protocol::ProtocolError;
use std::io;
use std::time::Duration;
use thiserror::Error;

/// 建立连接失败
#[derive(Error, Debug)]
pub enum ConnectError {
    /// 地址解析失败
    #[error("Failed to resolve {endpoint}: {source}")]
    Resolve {
        endpoint: String,
        #[source]
        source: io::Error,
    },

    /// 地址解析结果为空
    #[error("No socket address found for {endpoint}")]
    NoAddress { endpoint: String },

    /// 连接超时
    #[error("Connection to {endpoint} timed out after {timeout:?}")]
    Timeout { endpoint: String, timeout: Duration },

    /// 连接被拒绝或其他传输错误（含握手期间的 IO 错误）
    #[error("Transport error on {endpoint}: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: io::Error,
    },

    /// 握手期间对端关闭连接
    #[error("Peer {endpoint} closed the connection during handshake")]
    ClosedDuringHandshake { endpoint: String },

    /// 握手回复不符合预期
    #[error("Handshake with {endpoint} failed: {source}")]
    Handshake {
        endpoint: String,
        #[source]
        source: ProtocolError,
    },
}

/// 已连接链路上的操作失败
#[derive(Error, Debug)]
pub enum LinkError {
    /// 链路未连接
    #[error("Link not connected")]
    NotConnected,

    /// 在限定时间内没有收到数据
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// 对端关闭连接（读到 0 字节）
    #[error("Peer closed the connection")]
    PeerClosed,

    /// 响应内容错误或设备报告失败
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// 判定发送失败
    #[error("Send failed: {0}")]
    Send(#[source] io::Error),

    /// 其他 IO 错误
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl LinkError {
    /// 该错误发生后传输句柄是否已失效
    ///
    /// 返回 `true` 时链路已经回到 `Disconnected`。
    pub fn breaks_link(&self) -> bool {
        matches!(
            self,
            LinkError::PeerClosed | LinkError::Send(_) | LinkError::Io(_)
        )
    }
}
