//! 轮廓检测守护进程主入口
//!
//! 启动顺序：
//! 1. 合并并校验配置（失败退出码 2）
//! 2. 初始化日志
//! 3. 加载主轮廓（失败退出码 1，此时尚未建立任何连接）
//! 4. 获取单实例锁（失败退出码 3）
//! 5. 安装 Ctrl+C 处理，运行检测循环直到退出（退出码 0）

mod logging;
mod settings;
mod singleton;

use clap::Parser;
use inspect_controller::{InspectionController, ShutdownSignal, StartupError};
use inspect_link::{ActuatorLink, SensorLink};
use inspect_tools::ProfileStore;
use singleton::SingletonLock;
use std::path::PathBuf;
use std::process;
use tracing::{error, info};

const EXIT_OK: i32 = 0;
const EXIT_FAILURE: i32 = 1;
const EXIT_CONFIG: i32 = 2;
const EXIT_LOCKED: i32 = 3;

/// 轮廓检测守护进程
///
/// 等待协作机器人的就绪信号，从传感器采集轮廓，与主轮廓比较，
/// 把合格 / 缺陷判定发回协作机器人。链路故障时自动重连。
#[derive(Parser, Debug)]
#[command(name = "inspectd", version)]
#[command(about = "Profile inspection daemon - sensor to cobot inspection cycle", long_about = None)]
pub struct Args {
    /// TOML 配置文件
    ///
    /// 未指定的字段使用默认值；下面的命令行参数覆盖文件中的值
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// 传感器地址
    #[arg(long)]
    pub sensor_addr: Option<String>,

    /// 传感器端口（默认 23）
    #[arg(long)]
    pub sensor_port: Option<u16>,

    /// 协作机器人地址
    #[arg(long)]
    pub actuator_addr: Option<String>,

    /// 协作机器人端口（默认 30002）
    #[arg(long)]
    pub actuator_port: Option<u16>,

    /// 主轮廓文件（逗号分隔的采样值）
    #[arg(long)]
    pub master: Option<PathBuf>,

    /// 公差（mm）
    #[arg(long, allow_negative_numbers = true)]
    pub tolerance: Option<f64>,

    /// 日志目录（启用每日轮转的文件日志）
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// 锁文件路径
    ///
    /// 默认: XDG_RUNTIME_DIR 或系统临时目录下的 inspectd.lock
    #[arg(long)]
    pub lock_file: Option<PathBuf>,
}

fn main() {
    let args = Args::parse();
    // run() 返回后日志 guard 已经释放，文件日志已刷新
    let code = run(args);
    process::exit(code);
}

fn run(args: Args) -> i32 {
    let settings::Settings { config, tolerance } = match settings::resolve(&args) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{}", StartupError::from(e));
            return EXIT_CONFIG;
        },
    };

    let _log_guard = match logging::init(args.log_dir.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {:#}", e);
            return EXIT_CONFIG;
        },
    };

    info!("inspectd {} starting", env!("CARGO_PKG_VERSION"));
    info!("  Sensor:   {}:{}", config.sensor.host, config.sensor.port);
    info!("  Actuator: {}:{}", config.actuator.host, config.actuator.port);
    info!("  Master:   {}", config.inspection.master.display());
    info!("  Tolerance: {}", tolerance);

    let master = match ProfileStore::load(&config.inspection.master) {
        Ok(store) => store.into_master(),
        Err(e) => {
            let e = StartupError::from(e);
            error!("{}", e);
            error!("Cannot run without a master profile, exiting");
            return e.exit_code();
        },
    };

    let lock_path = args.lock_file.clone().unwrap_or_else(singleton::default_lock_path);
    let lock = match SingletonLock::try_lock(&lock_path) {
        Ok(lock) => lock,
        Err(e) => {
            error!("Failed to acquire singleton lock {}: {}", lock_path.display(), e);
            error!("Another instance of inspectd may be running");
            return EXIT_LOCKED;
        },
    };
    info!("  Lock:     {}", lock.path().display());

    let shutdown = ShutdownSignal::new();
    let handler_signal = shutdown.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Interrupt received, stopping after the current operation");
        handler_signal.trigger();
    }) {
        error!("Failed to install signal handler: {}", e);
        return EXIT_FAILURE;
    }

    let sensor = SensorLink::new(settings::sensor_link_config(&config.sensor));
    let actuator = ActuatorLink::new(settings::actuator_link_config(&config.actuator));
    let mut controller = match InspectionController::new(
        sensor,
        actuator,
        master,
        tolerance,
        settings::recovery_config(&config.recovery),
        shutdown,
    ) {
        Ok(controller) => controller,
        Err(e) => {
            error!("{}", e);
            return e.exit_code();
        },
    };

    info!("inspectd started. Press Ctrl+C to stop.");
    let stats = controller.run();
    info!("inspectd stopped ({})", stats);
    EXIT_OK
}
