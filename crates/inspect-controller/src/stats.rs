//! 循环统计（仅内存，不持久化）

use inspect_link::LinkKind;
use inspect_protocol::Verdict;
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleStats {
    /// 已发送判定的循环数
    pub cycles: u64,
    pub good: u64,
    pub defective: u64,
    /// 收到信号但采集失败、没有判定的循环数
    pub skipped: u64,
    /// 已得出判定但发送失败的循环数（令牌可能只发出了一部分）
    pub delivery_failures: u64,
    pub signal_timeouts: u64,
    pub sensor_reconnects: u64,
    pub actuator_reconnects: u64,
}

impl CycleStats {
    pub fn record_verdict(&mut self, verdict: Verdict) {
        self.cycles += 1;
        match verdict {
            Verdict::Good => self.good += 1,
            Verdict::Defective => self.defective += 1,
        }
    }

    pub fn record_skipped(&mut self) {
        self.skipped += 1;
    }

    pub fn record_delivery_failure(&mut self) {
        self.delivery_failures += 1;
    }

    pub fn record_signal_timeout(&mut self) {
        self.signal_timeouts += 1;
    }

    pub fn record_reconnect(&mut self, kind: LinkKind) {
        match kind {
            LinkKind::Sensor => self.sensor_reconnects += 1,
            LinkKind::Actuator => self.actuator_reconnects += 1,
        }
    }

    /// 缺陷率（没有循环时为 0）
    pub fn defect_rate(&self) -> f64 {
        if self.cycles == 0 {
            0.0
        } else {
            self.defective as f64 / self.cycles as f64
        }
    }
}

impl fmt::Display for CycleStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cycles={} good={} defective={} ({:.1}%) skipped={} delivery_failures={} \
             signal_timeouts={} reconnects(sensor={}, actuator={})",
            self.cycles,
            self.good,
            self.defective,
            self.defect_rate() * 100.0,
            self.skipped,
            self.delivery_failures,
            self.signal_timeouts,
            self.sensor_reconnects,
            self.actuator_reconnects
        )
    }
}
