//! # Inspect Tools
//!
//! 检测循环的只读协作者：
//!
//! - `store` - 主轮廓加载（启动时一次性读取）
//! - `comparator` - 轮廓比较（纯函数，无日志）
//! - `config` - 配置文件解析与校验
//!
//! **依赖原则**: 只依赖 `inspect-protocol`，不接触网络链路。

pub mod comparator;
pub mod config;
mod error;
pub mod store;

pub use comparator::{Evaluation, Tolerance, evaluate, inspect, max_deviation};
pub use config::{
    ActuatorSection, InspectionConfig, InspectionSection, RecoverySection, SensorSection,
};
pub use error::{ConfigError, ProfileStoreError};
pub use store::{ParseFailure, ProfileStore, parse_profile};
