//! # 轮廓比较
//!
//! 算法：
//! 1. 长度不同直接判为缺陷（形状无法比较）
//! 2. 两条轮廓各自减去自身均值（消除整体高度偏移）
//! 3. 取逐点差的最大绝对值
//! 4. 最大偏差 **严格大于** 公差时判为缺陷；偏差不是有限值（数值溢出）时同样判为缺陷
//!
//! 全部为纯函数，不记录日志。

use crate::ConfigError;
use inspect_protocol::Verdict;
use std::fmt;

/// 公差（mm），有限且非负
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Tolerance(f64);

impl Tolerance {
    pub fn new(value: f64) -> Result<Self, ConfigError> {
        if value.is_finite() && value >= 0.0 {
            Ok(Self(value))
        } else {
            Err(ConfigError::InvalidTolerance(value))
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Tolerance {
    type Error = ConfigError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for Tolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} mm", self.0)
    }
}

/// 一次比较的诊断结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub verdict: Verdict,
    /// 去均值后的最大逐点偏差；长度不一致时为 `None`
    pub max_deviation: Option<f64>,
    pub current_len: usize,
    pub master_len: usize,
}

fn mean(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        0.0
    } else {
        // 先除后加，避免大数求和溢出为 inf
        let n = samples.len() as f64;
        samples.iter().map(|v| v / n).sum()
    }
}

/// 去均值后的最大逐点偏差
///
/// 长度不一致时返回 `None`。中间结果溢出产生的 NaN 会保留到返回值中。
pub fn max_deviation(current: &[f64], master: &[f64]) -> Option<f64> {
    if current.len() != master.len() {
        return None;
    }

    let current_mean = mean(current);
    let master_mean = mean(master);

    Some(
        current
            .iter()
            .zip(master)
            .map(|(c, m)| ((c - current_mean) - (m - master_mean)).abs())
            .fold(0.0, |acc: f64, d| {
                if acc.is_nan() || d.is_nan() {
                    f64::NAN
                } else {
                    acc.max(d)
                }
            }),
    )
}

/// 判定当前轮廓是否合格
pub fn evaluate(current: &[f64], master: &[f64], tolerance: Tolerance) -> Verdict {
    inspect(current, master, tolerance).verdict
}

/// 判定并返回偏差等诊断信息
pub fn inspect(current: &[f64], master: &[f64], tolerance: Tolerance) -> Evaluation {
    let deviation = max_deviation(current, master);
    let verdict = match deviation {
        Some(d) if d.is_finite() && d <= tolerance.value() => Verdict::Good,
        _ => Verdict::Defective,
    };

    Evaluation {
        verdict,
        max_deviation: deviation,
        current_len: current.len(),
        master_len: master.len(),
    }
}
