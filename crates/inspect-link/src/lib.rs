//! # Inspect Link
//!
//! 外部设备连接层：传感器（轮廓采集）与协作机器人（信号/判定）。
//!
//! 每条链路独占自己的传输句柄，只能通过 `connect()` / `close()` 改变连接状态，
//! 其他组件无法直接接触 socket。

use std::fmt;

pub mod actuator;
mod error;
pub mod sensor;
mod transport;

pub use actuator::{ActuatorLink, ActuatorLinkConfig, Signal};
pub use error::{ConnectError, LinkError};
pub use sensor::{SensorLink, SensorLinkConfig};

use inspect_protocol::{Profile, Verdict};

/// 链路连接状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// 未连接（初始状态、关闭后、或传输故障后）
    Disconnected,
    /// 正在建立连接（含握手）
    Connecting,
    /// 已连接，可以进行收发
    Connected,
}

/// 链路类别（用于日志与恢复策略）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkKind {
    Sensor,
    Actuator,
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkKind::Sensor => write!(f, "sensor"),
            LinkKind::Actuator => write!(f, "actuator"),
        }
    }
}

/// 链路生命周期
pub trait Link {
    fn kind(&self) -> LinkKind;

    /// 建立连接；失败时状态回到 `Disconnected`
    fn connect(&mut self) -> Result<(), ConnectError>;

    /// 释放传输句柄；幂等，任何状态下调用都安全
    fn close(&mut self);

    fn state(&self) -> ConnectionState;

    fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }
}

/// 轮廓采集能力
pub trait SensorPort: Link {
    /// 发送采集请求并阻塞等待完整响应
    fn acquire_profile(&mut self) -> Result<Profile, LinkError>;
}

/// 协作机器人侧能力
pub trait ActuatorPort: Link {
    /// 阻塞等待"工件就绪"信号（任意字节）
    fn await_signal(&mut self) -> Result<Signal, LinkError>;

    /// 发送判定令牌
    fn send_verdict(&mut self, verdict: Verdict) -> Result<(), LinkError>;
}
