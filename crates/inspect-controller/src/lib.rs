//! # Inspect Controller
//!
//! 检测循环：等待就绪信号 → 采集轮廓 → 比较 → 回复判定 → 重复。
//!
//! 所有链路故障都在控制器边界处理（记录日志并按故障类别恢复），
//! 进程不会因为可恢复的故障退出。
//!
//! ## 模块
//!
//! - `controller` - 循环状态机与重连
//! - `fault` - 故障分类与恢复策略
//! - `shutdown` - 可中断的退出信号
//! - `stats` - 循环统计

mod controller;
mod error;
pub mod fault;
pub mod shutdown;
pub mod stats;

pub use controller::{CycleOutcome, CycleState, InspectionController, RecoveryConfig};
pub use error::StartupError;
pub use fault::{Fault, LinkOp, LinkSet, RecoveryPlan, Severity, plan};
pub use shutdown::ShutdownSignal;
pub use stats::CycleStats;
