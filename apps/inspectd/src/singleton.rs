//! 单实例锁
//!
//! 两个控制器同时连接同一台协作机器人会互相抢占端口，
//! 因此进程启动时先获取排他文件锁；进程退出（包括崩溃）时锁由操作系统释放。

use fs4::fs_std::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// 持有期间保证只有一个 inspectd 实例
pub struct SingletonLock {
    file: File,
    path: PathBuf,
}

impl SingletonLock {
    /// 非阻塞地获取锁，成功后把当前 PID 写入锁文件
    ///
    /// # 错误
    /// 锁已被其他进程持有时返回 `ErrorKind::WouldBlock`
    pub fn try_lock(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        // 拿到锁之前不能截断：文件里可能是正在运行的实例的 PID
        let mut file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(path)?;

        if !file.try_lock_exclusive()? {
            return Err(io::Error::new(
                io::ErrorKind::WouldBlock,
                format!("{} is held by another inspectd instance", path.display()),
            ));
        }

        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;
        writeln!(file, "{}", std::process::id())?;
        file.sync_all()?;

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SingletonLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

/// 默认锁文件路径：运行时目录（XDG_RUNTIME_DIR），否则系统临时目录
pub fn default_lock_path() -> PathBuf {
    dirs::runtime_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("inspectd.lock")
}
