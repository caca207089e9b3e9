//! 判定结果与协作机器人侧的文本令牌

use std::fmt;

/// 单次检测的判定结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    /// 合格
    Good,
    /// 缺陷（包括采样点数量与标准轮廓不一致）
    Defective,
}

impl Verdict {
    pub fn is_defective(self) -> bool {
        matches!(self, Verdict::Defective)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Good => write!(f, "GOOD"),
            Verdict::Defective => write!(f, "DEFECTIVE"),
        }
    }
}

/// 发送给协作机器人的两个固定令牌
///
/// 令牌本身不含换行符，`encode` 时追加 `\n`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerdictTokens {
    pub good: String,
    pub defective: String,
}

impl Default for VerdictTokens {
    fn default() -> Self {
        Self {
            good: "PIEZA_BUENA".to_string(),
            defective: "PIEZA_DEFECTUOSA".to_string(),
        }
    }
}

impl VerdictTokens {
    /// 取判定对应的令牌（不含换行符）
    pub fn token(&self, verdict: Verdict) -> &str {
        match verdict {
            Verdict::Good => &self.good,
            Verdict::Defective => &self.defective,
        }
    }

    /// 编码为线路字节（令牌 + `\n`）
    pub fn encode(&self, verdict: Verdict) -> Vec<u8> {
        let token = self.token(verdict);
        let mut out = Vec::with_capacity(token.len() + 1);
        out.extend_from_slice(token.as_bytes());
        out.push(b'\n');
        out
    }
}
