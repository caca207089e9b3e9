//! # 主轮廓存储
//!
//! 文件格式：逗号分隔的实数，可以写在一行也可以分多行；
//! 空行忽略，`#` 开头的行为注释。

use crate::ProfileStoreError;
use inspect_protocol::Profile;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::info;

/// 主轮廓（启动后只读）
#[derive(Debug, Clone)]
pub struct ProfileStore {
    path: PathBuf,
    master: Profile,
}

impl ProfileStore {
    /// 从文件加载主轮廓
    ///
    /// 任何失败都应该让进程在建立连接之前退出。
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ProfileStoreError> {
        let path = path.as_ref().to_path_buf();
        let text = fs::read_to_string(&path).map_err(|source| {
            if source.kind() == ErrorKind::NotFound {
                ProfileStoreError::NotFound { path: path.clone() }
            } else {
                ProfileStoreError::Io {
                    path: path.clone(),
                    source,
                }
            }
        })?;

        let master = parse_profile(&text).map_err(|e| match e {
            ParseFailure::Token { line, token } => ProfileStoreError::Parse {
                path: path.clone(),
                line,
                token,
            },
            ParseFailure::Empty => ProfileStoreError::Empty { path: path.clone() },
        })?;

        info!(
            "Master profile loaded from {} ({} samples)",
            path.display(),
            master.len()
        );
        Ok(Self { path, master })
    }

    pub fn master(&self) -> &Profile {
        &self.master
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn into_master(self) -> Profile {
        self.master
    }
}

/// 文本解析失败（尚未关联文件路径）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseFailure {
    Token { line: usize, token: String },
    Empty,
}

/// 解析主轮廓文本
pub fn parse_profile(text: &str) -> Result<Profile, ParseFailure> {
    let mut samples = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        for token in line.split(',') {
            let token = token.trim();
            match token.parse::<f64>() {
                Ok(value) if value.is_finite() => samples.push(value),
                _ => {
                    return Err(ParseFailure::Token {
                        line: idx + 1,
                        token: token.to_string(),
                    });
                },
            }
        }
    }

    if samples.is_empty() {
        return Err(ParseFailure::Empty);
    }
    // 上面已逐个检查过有限性
    Profile::new(samples).map_err(|_| ParseFailure::Empty)
}
