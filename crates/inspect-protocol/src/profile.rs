//! 轮廓采样序列
//!
//! `Profile` 是沿扫描方向排列的有限实数序列，构造后不可变。

use crate::ProtocolError;
use std::ops::Deref;

/// 轮廓（沿扫描方向的采样点序列，单位 mm）
///
/// 构造时拒绝 NaN / ±inf，因此任何 `Profile` 中的采样点都是有限值。
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    samples: Vec<f64>,
}

impl Profile {
    /// 从采样点创建轮廓
    ///
    /// # 错误
    /// 任一采样点不是有限值时返回 `ProtocolError::MalformedSample`
    pub fn new(samples: Vec<f64>) -> Result<Self, ProtocolError> {
        if let Some((index, value)) = samples.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(ProtocolError::MalformedSample {
                index,
                token: value.to_string(),
            });
        }
        Ok(Self { samples })
    }

    /// 采样点数量
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// 采样点切片
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }
}

impl Deref for Profile {
    type Target = [f64];

    fn deref(&self) -> &Self::Target {
        &self.samples
    }
}

impl TryFrom<Vec<f64>> for Profile {
    type Error = ProtocolError;

    fn try_from(samples: Vec<f64>) -> Result<Self, Self::Error> {
        Profile::new(samples)
    }
}
