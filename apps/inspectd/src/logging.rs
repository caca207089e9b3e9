//! 日志初始化
//!
//! - 控制台（stderr）：始终启用
//! - 文件：指定 `--log-dir` 时启用，每日轮转，非阻塞写入
//!
//! 过滤规则由 `RUST_LOG` 控制，未设置时使用 [`DEFAULT_FILTER`]。

use anyhow::Context;
use std::fs;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

pub const DEFAULT_FILTER: &str = "inspectd=info,inspect_controller=info,inspect_link=info,\
                                  inspect_tools=info,inspect_protocol=warn";

const LOG_FILE_PREFIX: &str = "inspectd.log";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// 安装全局 subscriber
///
/// 返回的 guard 必须保持到进程退出，否则文件日志的尾部可能丢失。
pub fn init(log_dir: Option<&Path>) -> anyhow::Result<Option<WorkerGuard>> {
    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(env_filter());

    let Some(dir) = log_dir else {
        tracing_subscriber::registry()
            .with(console)
            .try_init()
            .context("failed to install tracing subscriber")?;
        return Ok(None);
    };

    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create log directory {}", dir.display()))?;
    let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let file = fmt::layer()
        .with_ansi(false)
        .with_writer(writer)
        .with_filter(env_filter());

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .try_init()
        .context("failed to install tracing subscriber")?;
    Ok(Some(guard))
}
