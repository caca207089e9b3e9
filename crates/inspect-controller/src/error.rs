//! 启动阶段错误

use inspect_tools::{ConfigError, ProfileStoreError};
use thiserror::Error;

/// 致命的启动错误（在建立任何连接之前发生）
#[derive(Error, Debug)]
pub enum StartupError {
    /// 主轮廓缺失或无法解析
    #[error("Master profile unavailable: {0}")]
    MasterProfile(#[from] ProfileStoreError),

    /// 主轮廓没有采样点
    #[error("Master profile has no samples")]
    EmptyMaster,

    /// 配置无效
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

impl StartupError {
    /// 进程退出码：1 = 主轮廓不可用，2 = 配置无效
    pub fn exit_code(&self) -> i32 {
        match self {
            StartupError::MasterProfile(_) | StartupError::EmptyMaster => 1,
            StartupError::Config(_) => 2,
        }
    }
}
