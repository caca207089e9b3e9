//! # 检测循环控制器
//!
//! ## 状态机
//!
//! ```text
//! Idle -> AwaitingSignal -> Acquiring -> Deciding -> Reporting -> Idle
//!              |               |                        |
//!              +---------------+----- 故障 -------------+--> Recovering -> AwaitingSignal
//! ```
//!
//! 单线程顺序执行：同一时刻只有一个循环，循环内不并行访问两条链路。
//! 只在链路的阻塞调用和可中断的退避等待处挂起。
//!
//! ## 退出
//!
//! 退出信号在两次迭代之间检查；退避等待会被立即打断。
//! `run()` 返回前关闭两条链路，其他退出路径由链路自身的 `Drop` 释放。

use crate::fault::{Fault, LinkOp, LinkSet, Severity, plan};
use crate::shutdown::ShutdownSignal;
use crate::stats::CycleStats;
use crate::StartupError;
use inspect_link::{ActuatorPort, Link, LinkKind, SensorPort};
use inspect_protocol::Profile;
use inspect_tools::{Evaluation, Tolerance, inspect};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// 循环状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    /// 循环之间（或尚未启动 / 已停止）
    Idle,
    /// 等待协作机器人就绪信号
    AwaitingSignal,
    /// 向传感器请求轮廓
    Acquiring,
    /// 与主轮廓比较
    Deciding,
    /// 向协作机器人发送判定
    Reporting,
    /// 正在重连链路
    Recovering,
}

/// 重连与统计配置
#[derive(Debug, Clone)]
pub struct RecoveryConfig {
    /// 只重连一条链路时每次尝试前的等待
    pub single_link_backoff: Duration,
    /// 两条链路都重连时每次尝试前的等待
    pub full_backoff: Duration,
    /// 每完成多少个循环输出一次统计（0 = 只在退出时输出）
    pub stats_interval: u64,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            single_link_backoff: Duration::from_secs(5),
            full_backoff: Duration::from_secs(10),
            stats_interval: 100,
        }
    }
}

impl RecoveryConfig {
    fn backoff(&self, links: LinkSet) -> Duration {
        match links {
            LinkSet::Both => self.full_backoff,
            LinkSet::Sensor | LinkSet::Actuator => self.single_link_backoff,
        }
    }
}

/// 单个循环的结果
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// 判定已发送
    Reported(Evaluation),
    /// 等待信号超时（常规情况）
    NoSignal,
    /// 收到信号但没有发送判定，链路未重连
    Skipped,
    /// 发生故障，指定链路已重连
    Recovered(LinkSet),
    /// 重连期间收到退出信号
    Interrupted,
}

/// 检测循环控制器
///
/// 独占两条链路；主轮廓和公差在构造后不再改变。
pub struct InspectionController<S: SensorPort, A: ActuatorPort> {
    sensor: S,
    actuator: A,
    master: Profile,
    tolerance: Tolerance,
    recovery: RecoveryConfig,
    shutdown: ShutdownSignal,
    state: CycleState,
    stats: CycleStats,
}

impl<S: SensorPort, A: ActuatorPort> InspectionController<S, A> {
    /// 创建控制器（不建立连接）
    ///
    /// # 错误
    /// 主轮廓为空时返回 [`StartupError::EmptyMaster`]
    pub fn new(
        sensor: S,
        actuator: A,
        master: Profile,
        tolerance: Tolerance,
        recovery: RecoveryConfig,
        shutdown: ShutdownSignal,
    ) -> Result<Self, StartupError> {
        if master.is_empty() {
            return Err(StartupError::EmptyMaster);
        }
        Ok(Self {
            sensor,
            actuator,
            master,
            tolerance,
            recovery,
            shutdown,
            state: CycleState::Idle,
            stats: CycleStats::default(),
        })
    }

    pub fn state(&self) -> CycleState {
        self.state
    }

    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    pub fn sensor(&self) -> &S {
        &self.sensor
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    /// 运行直到收到退出信号
    ///
    /// 先建立两条链路（失败则按退避重试，不视为致命错误），然后进入循环。
    /// 返回前关闭两条链路。
    pub fn run(&mut self) -> CycleStats {
        info!(
            "Inspection controller starting (master: {} samples, tolerance: {})",
            self.master.len(),
            self.tolerance
        );

        if self.establish(LinkSet::Both, false) {
            info!("Both links connected, entering inspection cycle");
            while !self.shutdown.is_triggered() {
                let outcome = self.run_cycle();
                match outcome {
                    CycleOutcome::Interrupted => break,
                    CycleOutcome::Reported(_) => {
                        let interval = self.recovery.stats_interval;
                        if interval > 0 && self.stats.cycles % interval == 0 {
                            info!("Inspection statistics: {}", self.stats);
                        }
                    },
                    _ => {},
                }
            }
        }

        info!("Shutdown requested, closing links");
        self.sensor.close();
        self.actuator.close();
        self.state = CycleState::Idle;
        info!("Inspection controller stopped: {}", self.stats);
        self.stats.clone()
    }

    /// 执行一个完整循环（含故障恢复）
    ///
    /// 调用前两条链路应已连接；未连接的链路会按故障处理并重连。
    pub fn run_cycle(&mut self) -> CycleOutcome {
        self.state = CycleState::AwaitingSignal;
        let signal = match self.actuator.await_signal() {
            Ok(signal) => signal,
            Err(error) => {
                let fault = Fault::new(LinkKind::Actuator, LinkOp::AwaitSignal, error);
                return self.handle_fault(fault);
            },
        };
        debug!("Part ready signal received ({} bytes)", signal.bytes);

        self.state = CycleState::Acquiring;
        let profile = match self.sensor.acquire_profile() {
            Ok(profile) => profile,
            Err(error) => {
                return self.handle_fault(Fault::new(LinkKind::Sensor, LinkOp::Acquire, error));
            },
        };

        self.state = CycleState::Deciding;
        let evaluation = inspect(&profile, &self.master, self.tolerance);
        self.log_evaluation(&evaluation);

        self.state = CycleState::Reporting;
        if let Err(error) = self.actuator.send_verdict(evaluation.verdict) {
            return self.handle_fault(Fault::new(LinkKind::Actuator, LinkOp::SendVerdict, error));
        }

        self.stats.record_verdict(evaluation.verdict);
        self.state = CycleState::Idle;
        CycleOutcome::Reported(evaluation)
    }

    fn log_evaluation(&self, evaluation: &Evaluation) {
        match evaluation.max_deviation {
            Some(deviation) => info!(
                "Verdict {}: max deviation {:.4} mm (threshold {})",
                evaluation.verdict, deviation, self.tolerance
            ),
            None => warn!(
                "Verdict {}: profile size mismatch (current {} samples, master {} samples)",
                evaluation.verdict, evaluation.current_len, evaluation.master_len
            ),
        }
    }

    /// 统一的故障处理入口
    fn handle_fault(&mut self, fault: Fault) -> CycleOutcome {
        let recovery = plan(&fault);
        match recovery.severity {
            Severity::Debug => debug!("{}", fault),
            Severity::Warn => warn!("{}", fault),
            Severity::Error => error!("{}", fault),
        }

        match fault.op {
            LinkOp::AwaitSignal => {
                if recovery.reconnect.is_none() {
                    self.stats.record_signal_timeout();
                }
            },
            LinkOp::SendVerdict => {
                warn!("Verdict delivery failed, it will not be resent");
                self.stats.record_delivery_failure();
            },
            LinkOp::Acquire | LinkOp::Connect => {
                warn!("No verdict sent for this cycle");
                self.stats.record_skipped();
            },
        }

        match recovery.reconnect {
            None if fault.op == LinkOp::AwaitSignal => {
                self.state = CycleState::AwaitingSignal;
                CycleOutcome::NoSignal
            },
            None => {
                self.state = CycleState::AwaitingSignal;
                CycleOutcome::Skipped
            },
            Some(links) => {
                if self.establish(links, true) {
                    self.state = CycleState::AwaitingSignal;
                    CycleOutcome::Recovered(links)
                } else {
                    CycleOutcome::Interrupted
                }
            },
        }
    }

    /// 建立（或重新建立）指定链路
    ///
    /// `reconnect` 为 `true` 时先关闭链路并在第一次尝试前等待退避时间；
    /// 之后每次失败都等待相同的时间再试，直到成功或收到退出信号。
    ///
    /// # 返回
    /// 成功返回 `true`；被退出信号打断返回 `false`
    fn establish(&mut self, links: LinkSet, reconnect: bool) -> bool {
        self.state = CycleState::Recovering;
        let backoff = self.recovery.backoff(links);

        if reconnect {
            info!("Reconnecting {} link(s) in {:?}", links, backoff);
            if links.includes(LinkKind::Sensor) {
                self.sensor.close();
            }
            if links.includes(LinkKind::Actuator) {
                self.actuator.close();
            }
            if self.shutdown.wait_timeout(backoff) {
                return false;
            }
        }

        loop {
            if self.shutdown.is_triggered() {
                return false;
            }

            let sensor_ok = !links.includes(LinkKind::Sensor)
                || Self::connect_link(&mut self.sensor, reconnect, &mut self.stats);
            let actuator_ok = !links.includes(LinkKind::Actuator)
                || Self::connect_link(&mut self.actuator, reconnect, &mut self.stats);

            if sensor_ok && actuator_ok {
                return true;
            }

            warn!("Retrying connection in {:?}", backoff);
            if self.shutdown.wait_timeout(backoff) {
                return false;
            }
        }
    }

    /// 连接单条链路（已连接则跳过）
    fn connect_link<L: Link>(link: &mut L, reconnect: bool, stats: &mut CycleStats) -> bool {
        if link.is_connected() {
            return true;
        }
        match link.connect() {
            Ok(()) => {
                if reconnect {
                    stats.record_reconnect(link.kind());
                }
                true
            },
            Err(e) => {
                error!("{} {} failed: {}", link.kind(), LinkOp::Connect, e);
                false
            },
        }
    }
}
