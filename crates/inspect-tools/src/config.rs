//! # 配置
//!
//! TOML 文件，所有字段都有默认值（缺省即为现场默认设备地址）：
//!
//! ```toml
//! [sensor]
//! host = "192.168.1.100"
//! port = 23
//! acquire_timeout_ms = 5000
//!
//! [actuator]
//! host = "192.168.1.200"
//! port = 30002
//! signal_timeout_ms = 10000
//!
//! [inspection]
//! master = "perfil_maestro.csv"
//! tolerance = 0.5
//!
//! [recovery]
//! single_link_backoff_ms = 5000
//! full_backoff_ms = 10000
//! stats_interval = 100
//! ```
//!
//! 启动时加载并校验一次，之后只读。

use crate::comparator::Tolerance;
use crate::ConfigError;
use inspect_protocol::{DEFAULT_FRAME_LIMIT, Handshake, VerdictTokens};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 完整配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InspectionConfig {
    pub sensor: SensorSection,
    pub actuator: ActuatorSection,
    pub inspection: InspectionSection,
    pub recovery: RecoverySection,
}

/// `[sensor]` 轮廓传感器
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SensorSection {
    pub host: String,
    pub port: u16,
    pub connect_timeout_ms: u64,
    /// 单次采集总超时
    pub acquire_timeout_ms: u64,
    /// 握手阶段排空横幅/回复的窗口
    pub banner_window_ms: u64,
    pub user: String,
    pub password: Option<String>,
    /// 登录成功时回复中必须包含的文本（不配置则不校验）
    pub login_ack: Option<String>,
    pub command: String,
    /// 单字符分隔符
    pub delimiter: String,
    pub frame_limit: usize,
}

impl Default for SensorSection {
    fn default() -> Self {
        Self {
            host: "192.168.1.100".to_string(),
            port: 23,
            connect_timeout_ms: 5000,
            acquire_timeout_ms: 5000,
            banner_window_ms: 500,
            user: "admin".to_string(),
            password: None,
            login_ack: None,
            command: "GVProfile".to_string(),
            delimiter: "\t".to_string(),
            frame_limit: DEFAULT_FRAME_LIMIT,
        }
    }
}

impl SensorSection {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }

    pub fn banner_window(&self) -> Duration {
        Duration::from_millis(self.banner_window_ms)
    }

    pub fn handshake(&self) -> Handshake {
        Handshake {
            user: self.user.clone(),
            password: self.password.clone(),
            login_ack: self.login_ack.clone(),
        }
    }

    /// 分隔符字符（校验通过后必定存在）
    pub fn delimiter_char(&self) -> Option<char> {
        let mut chars = self.delimiter.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Some(c),
            _ => None,
        }
    }
}

/// `[actuator]` 协作机器人
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ActuatorSection {
    pub host: String,
    pub port: u16,
    pub connect_timeout_ms: u64,
    /// 等待就绪信号的读超时
    pub signal_timeout_ms: u64,
    pub good_token: String,
    pub defective_token: String,
}

impl Default for ActuatorSection {
    fn default() -> Self {
        let tokens = VerdictTokens::default();
        Self {
            host: "192.168.1.200".to_string(),
            port: 30002,
            connect_timeout_ms: 5000,
            signal_timeout_ms: 10_000,
            good_token: tokens.good,
            defective_token: tokens.defective,
        }
    }
}

impl ActuatorSection {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn signal_timeout(&self) -> Duration {
        Duration::from_millis(self.signal_timeout_ms)
    }

    pub fn verdict_tokens(&self) -> VerdictTokens {
        VerdictTokens {
            good: self.good_token.clone(),
            defective: self.defective_token.clone(),
        }
    }
}

/// `[inspection]` 主轮廓与公差
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InspectionSection {
    pub master: PathBuf,
    /// 公差（mm）
    pub tolerance: f64,
}

impl Default for InspectionSection {
    fn default() -> Self {
        Self {
            master: PathBuf::from("perfil_maestro.csv"),
            tolerance: 0.5,
        }
    }
}

/// `[recovery]` 重连退避与统计
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RecoverySection {
    /// 只重连一条链路时的等待
    pub single_link_backoff_ms: u64,
    /// 两条链路都重连时的等待
    pub full_backoff_ms: u64,
    /// 每完成多少个循环输出一次统计（0 表示只在退出时输出）
    pub stats_interval: u64,
}

impl Default for RecoverySection {
    fn default() -> Self {
        Self {
            single_link_backoff_ms: 5000,
            full_backoff_ms: 10_000,
            stats_interval: 100,
        }
    }
}

impl RecoverySection {
    pub fn single_link_backoff(&self) -> Duration {
        Duration::from_millis(self.single_link_backoff_ms)
    }

    pub fn full_backoff(&self) -> Duration {
        Duration::from_millis(self.full_backoff_ms)
    }
}

impl InspectionConfig {
    /// 从 TOML 文件加载（未校验）
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn tolerance(&self) -> Result<Tolerance, ConfigError> {
        Tolerance::new(self.inspection.tolerance)
    }

    /// 校验所有字段
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tolerance()?;

        let sensor = &self.sensor;
        check_host("sensor.host", &sensor.host)?;
        check_port("sensor.port", sensor.port)?;
        check_timeout("sensor.connect_timeout_ms", sensor.connect_timeout_ms)?;
        check_timeout("sensor.acquire_timeout_ms", sensor.acquire_timeout_ms)?;
        check_timeout("sensor.banner_window_ms", sensor.banner_window_ms)?;
        if sensor.user.trim().is_empty() {
            return Err(ConfigError::invalid("sensor.user", "must not be empty"));
        }
        if sensor.command.trim().is_empty() {
            return Err(ConfigError::invalid("sensor.command", "must not be empty"));
        }
        match sensor.delimiter_char() {
            Some(c) if c == '\r' || c == '\n' || c == '.' || c == '-' => {
                return Err(ConfigError::invalid(
                    "sensor.delimiter",
                    format!("{:?} cannot separate numeric samples", c),
                ));
            },
            Some(_) => {},
            None => {
                return Err(ConfigError::invalid(
                    "sensor.delimiter",
                    format!("expected exactly one character, got {:?}", sensor.delimiter),
                ));
            },
        }
        if sensor.frame_limit == 0 {
            return Err(ConfigError::invalid("sensor.frame_limit", "must be non-zero"));
        }

        let actuator = &self.actuator;
        check_host("actuator.host", &actuator.host)?;
        check_port("actuator.port", actuator.port)?;
        check_timeout("actuator.connect_timeout_ms", actuator.connect_timeout_ms)?;
        check_timeout("actuator.signal_timeout_ms", actuator.signal_timeout_ms)?;
        check_token("actuator.good_token", &actuator.good_token)?;
        check_token("actuator.defective_token", &actuator.defective_token)?;
        if actuator.good_token == actuator.defective_token {
            return Err(ConfigError::invalid(
                "actuator.defective_token",
                "must differ from actuator.good_token",
            ));
        }

        if self.inspection.master.as_os_str().is_empty() {
            return Err(ConfigError::invalid("inspection.master", "must not be empty"));
        }

        Ok(())
    }
}

fn check_host(field: &'static str, host: &str) -> Result<(), ConfigError> {
    if host.trim().is_empty() {
        return Err(ConfigError::invalid(field, "must not be empty"));
    }
    Ok(())
}

fn check_port(field: &'static str, port: u16) -> Result<(), ConfigError> {
    if port == 0 {
        return Err(ConfigError::invalid(field, "must be non-zero"));
    }
    Ok(())
}

fn check_timeout(field: &'static str, ms: u64) -> Result<(), ConfigError> {
    if ms == 0 {
        return Err(ConfigError::invalid(field, "must be at least 1 ms"));
    }
    Ok(())
}

fn check_token(field: &'static str, token: &str) -> Result<(), ConfigError> {
    if token.is_empty() || token.contains('\n') {
        return Err(ConfigError::invalid(
            field,
            "must be non-empty and contain no newline",
        ));
    }
    Ok(())
}
