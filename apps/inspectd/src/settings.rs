//! 配置合并：默认值 ← 配置文件 ← 命令行参数
//!
//! 合并后校验一次，再拆分成各组件自己的配置结构。

use crate::Args;
use inspect_controller::RecoveryConfig;
use inspect_link::{ActuatorLinkConfig, SensorLinkConfig};
use inspect_tools::{
    ActuatorSection, ConfigError, InspectionConfig, RecoverySection, SensorSection, Tolerance,
};

/// 合并并校验后的配置
#[derive(Debug)]
pub struct Settings {
    pub config: InspectionConfig,
    pub tolerance: Tolerance,
}

/// 生成最终配置（已校验）
pub fn resolve(args: &Args) -> Result<Settings, ConfigError> {
    let mut config = match args.config {
        Some(ref path) => InspectionConfig::load(path)?,
        None => InspectionConfig::default(),
    };

    if let Some(ref host) = args.sensor_addr {
        config.sensor.host = host.clone();
    }
    if let Some(port) = args.sensor_port {
        config.sensor.port = port;
    }
    if let Some(ref host) = args.actuator_addr {
        config.actuator.host = host.clone();
    }
    if let Some(port) = args.actuator_port {
        config.actuator.port = port;
    }
    if let Some(ref master) = args.master {
        config.inspection.master = master.clone();
    }
    if let Some(tolerance) = args.tolerance {
        config.inspection.tolerance = tolerance;
    }

    config.validate()?;
    let tolerance = config.tolerance()?;
    Ok(Settings { config, tolerance })
}

pub fn sensor_link_config(section: &SensorSection) -> SensorLinkConfig {
    let defaults = SensorLinkConfig::default();
    SensorLinkConfig {
        host: section.host.clone(),
        port: section.port,
        connect_timeout: section.connect_timeout(),
        acquire_timeout: section.acquire_timeout(),
        banner_window: section.banner_window(),
        handshake: section.handshake(),
        command: section.command.clone(),
        delimiter: section.delimiter_char().unwrap_or(defaults.delimiter),
        frame_limit: section.frame_limit,
    }
}

pub fn actuator_link_config(section: &ActuatorSection) -> ActuatorLinkConfig {
    ActuatorLinkConfig {
        host: section.host.clone(),
        port: section.port,
        connect_timeout: section.connect_timeout(),
        signal_timeout: section.signal_timeout(),
        tokens: section.verdict_tokens(),
    }
}

pub fn recovery_config(section: &RecoverySection) -> RecoveryConfig {
    RecoveryConfig {
        single_link_backoff: section.single_link_backoff(),
        full_backoff: section.full_backoff(),
        stats_interval: section.stats_interval,
    }
}
