//! 退出信号
//!
//! 原子标志 + 唤醒通道：标志供循环在每次迭代之间检查，
//! 通道让正在退避等待的线程立即醒来。

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// 可克隆的退出信号句柄
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    flag: Arc<AtomicBool>,
    wake_tx: Sender<()>,
    wake_rx: Receiver<()>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (wake_tx, wake_rx) = bounded(1);
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            wake_tx,
            wake_rx,
        }
    }

    /// 请求退出（可重复调用，可在信号处理线程中调用）
    pub fn trigger(&self) {
        if !self.flag.swap(true, Ordering::SeqCst) {
            let _ = self.wake_tx.try_send(());
        }
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// 最多等待 `timeout`
    ///
    /// # 返回
    /// 已请求退出时返回 `true`（可能提前返回）
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        if self.is_triggered() {
            return true;
        }
        match self.wake_rx.recv_timeout(timeout) {
            Ok(()) => {
                // 转发给其他等待者
                let _ = self.wake_tx.try_send(());
                true
            },
            Err(RecvTimeoutError::Timeout) => self.is_triggered(),
            Err(RecvTimeoutError::Disconnected) => true,
        }
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}
