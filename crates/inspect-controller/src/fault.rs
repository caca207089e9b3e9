//! # 故障分类与恢复策略
//!
//! 每个链路操作失败都被包装成 [`Fault`]（哪条链路、哪个操作、底层原因），
//! 再由 [`plan`] 统一决定日志级别和需要重连的链路。
//!
//! | 故障 | 级别 | 恢复 |
//! |------|------|------|
//! | 协作机器人等待信号超时 | debug | 无，继续等待 |
//! | 协作机器人对端关闭 | warn | 只重连协作机器人 |
//! | 传感器采集超时 | warn | 无，跳过判定 |
//! | 传感器协议错误 | error | 无，跳过判定 |
//! | 传感器未连接 / 对端关闭 | error | 只重连传感器 |
//! | 判定发送失败 | error | 两条都重连 |
//! | 其他 | error | 两条都重连 |

use inspect_link::{LinkError, LinkKind};
use std::fmt;

/// 链路操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOp {
    Connect,
    Acquire,
    AwaitSignal,
    SendVerdict,
}

impl fmt::Display for LinkOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LinkOp::Connect => "connect",
            LinkOp::Acquire => "acquire_profile",
            LinkOp::AwaitSignal => "await_signal",
            LinkOp::SendVerdict => "send_verdict",
        };
        f.write_str(name)
    }
}

/// 一次链路故障
#[derive(Debug)]
pub struct Fault {
    pub link: LinkKind,
    pub op: LinkOp,
    pub error: LinkError,
}

impl Fault {
    pub fn new(link: LinkKind, op: LinkOp, error: LinkError) -> Self {
        Self { link, op, error }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} failed: {}", self.link, self.op, self.error)
    }
}

/// 需要重连的链路集合
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkSet {
    Sensor,
    Actuator,
    Both,
}

impl LinkSet {
    pub fn includes(self, kind: LinkKind) -> bool {
        matches!(
            (self, kind),
            (LinkSet::Both, _)
                | (LinkSet::Sensor, LinkKind::Sensor)
                | (LinkSet::Actuator, LinkKind::Actuator)
        )
    }
}

impl fmt::Display for LinkSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkSet::Sensor => write!(f, "sensor"),
            LinkSet::Actuator => write!(f, "actuator"),
            LinkSet::Both => write!(f, "sensor+actuator"),
        }
    }
}

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Debug,
    Warn,
    Error,
}

/// 恢复策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryPlan {
    pub severity: Severity,
    /// `None` 表示不重连
    pub reconnect: Option<LinkSet>,
}

impl RecoveryPlan {
    const fn new(severity: Severity, reconnect: Option<LinkSet>) -> Self {
        Self {
            severity,
            reconnect,
        }
    }
}

/// 根据故障类别决定恢复策略
pub fn plan(fault: &Fault) -> RecoveryPlan {
    match (fault.link, fault.op, &fault.error) {
        (LinkKind::Actuator, LinkOp::AwaitSignal, LinkError::Timeout(_)) => {
            RecoveryPlan::new(Severity::Debug, None)
        },
        (LinkKind::Actuator, LinkOp::AwaitSignal, LinkError::PeerClosed) => {
            RecoveryPlan::new(Severity::Warn, Some(LinkSet::Actuator))
        },
        (LinkKind::Actuator, LinkOp::SendVerdict, _) => {
            RecoveryPlan::new(Severity::Error, Some(LinkSet::Both))
        },
        (LinkKind::Sensor, _, LinkError::Timeout(_)) => RecoveryPlan::new(Severity::Warn, None),
        (LinkKind::Sensor, _, LinkError::Protocol(_)) => RecoveryPlan::new(Severity::Error, None),
        (LinkKind::Sensor, _, LinkError::NotConnected | LinkError::PeerClosed) => {
            RecoveryPlan::new(Severity::Error, Some(LinkSet::Sensor))
        },
        _ => RecoveryPlan::new(Severity::Error, Some(LinkSet::Both)),
    }
}
