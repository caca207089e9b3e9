//! 错误类型定义

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// 主轮廓加载失败
///
/// 所有变体在启动阶段都是致命的。
#[derive(Error, Debug)]
pub enum ProfileStoreError {
    #[error("Master profile not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// 无法解析的采样值（行号从 1 开始）
    #[error("Invalid sample {token:?} at {}:{line}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        token: String,
    },

    /// 文件中没有任何采样值
    #[error("Master profile {} is empty", path.display())]
    Empty { path: PathBuf },

    #[error("Failed to read master profile {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// 公差必须是有限的非负数
    #[error("Invalid tolerance {0}: must be a finite, non-negative value (mm)")]
    InvalidTolerance(f64),

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}
