//! 传感器请求/响应编解码
//!
//! ## 分帧
//!
//! 一个响应是一行文本，以 `\n` 结尾。分帧只依赖行结束符，
//! 与采样值的末位数字无关（数值恰好以 `0`/`1` 结尾不会导致提前截断）。
//!
//! ## 解码
//!
//! 行内以固定分隔符切分为令牌，第一个令牌为状态码，
//! 状态码为 [`STATUS_OK`] 时其余令牌为采样点。

use crate::{Profile, ProtocolError};
use bytes::BytesMut;

/// 成功状态码
pub const STATUS_OK: &str = "1";

/// 响应缓冲区默认上限（1 MiB）
pub const DEFAULT_FRAME_LIMIT: usize = 1024 * 1024;

/// 编码采集请求
///
/// 去掉命令末尾已有的换行符后统一追加 `\r\n`。
pub fn encode_request(command: &str) -> Vec<u8> {
    let command = command.trim_end_matches(|c: char| c == '\r' || c == '\n');
    let mut out = Vec::with_capacity(command.len() + 2);
    out.extend_from_slice(command.as_bytes());
    out.extend_from_slice(b"\r\n");
    out
}

/// 一个完整的响应帧
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseFrame {
    /// 去掉行结束符后的文本
    pub line: String,
    /// 同一次读取中位于行结束符之后、被丢弃的字节数
    pub trailing_bytes: usize,
}

/// 响应分帧器
///
/// 把多次部分读取的字节累积起来，直到遇到行结束符。
#[derive(Debug)]
pub struct FrameAssembler {
    buf: BytesMut,
    limit: usize,
}

impl FrameAssembler {
    pub fn new(limit: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(4096),
            limit,
        }
    }

    /// 追加一次读取的数据
    ///
    /// # 返回
    /// - `Ok(Some(frame))`: 已收到完整的一行，内部缓冲区被清空
    /// - `Ok(None)`: 尚未收到行结束符，需要继续读取
    /// - `Err(FrameTooLarge)`: 行结束符之前的字节数超过上限，内部缓冲区被清空。
    ///   结果与数据如何被切分无关
    pub fn push(&mut self, chunk: &[u8]) -> Result<Option<ResponseFrame>, ProtocolError> {
        // 只扫描新到达的数据，之前的部分已经确认不含行结束符
        let scan_from = self.buf.len();
        self.buf.extend_from_slice(chunk);

        let Some(offset) = self.buf[scan_from..].iter().position(|&b| b == b'\n') else {
            if self.buf.len() > self.limit {
                self.buf.clear();
                return Err(ProtocolError::FrameTooLarge { limit: self.limit });
            }
            return Ok(None);
        };

        let end = scan_from + offset;
        if end > self.limit {
            self.buf.clear();
            return Err(ProtocolError::FrameTooLarge { limit: self.limit });
        }
        let raw = self.buf.split_to(end + 1);
        let trailing_bytes = self.buf.len();
        self.buf.clear();

        let mut body: &[u8] = &raw[..end];
        if let Some(stripped) = body.strip_suffix(b"\r") {
            body = stripped;
        }
        let line = std::str::from_utf8(body)
            .map_err(|_| ProtocolError::InvalidEncoding)?
            .to_string();

        Ok(Some(ResponseFrame {
            line,
            trailing_bytes,
        }))
    }

    /// 丢弃已累积的数据
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// 当前已累积的字节数
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }
}

impl Default for FrameAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_LIMIT)
    }
}

/// 解码响应行为轮廓
///
/// # 错误
/// - `EmptyFrame`: 空行
/// - `DeviceStatus`: 状态码不是 [`STATUS_OK`]
/// - `EmptyProfile`: 成功但没有采样点
/// - `MalformedSample`: 采样点为空、不是数字或不是有限值
pub fn decode_response(line: &str, delimiter: char) -> Result<Profile, ProtocolError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(ProtocolError::EmptyFrame);
    }

    let mut tokens = line.split(delimiter);
    let status = tokens.next().unwrap_or_default().trim();
    if status != STATUS_OK {
        return Err(ProtocolError::DeviceStatus {
            code: status.to_string(),
        });
    }

    let samples = tokens
        .enumerate()
        .map(|(index, token)| {
            let token = token.trim();
            token
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| ProtocolError::MalformedSample {
                    index,
                    token: token.to_string(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if samples.is_empty() {
        return Err(ProtocolError::EmptyProfile);
    }

    Profile::new(samples)
}

/// 登录握手参数
///
/// 连接建立后依次发送用户名行、可选的密码行；
/// 配置了 `login_ack` 时，设备回复中必须包含该文本。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    pub user: String,
    pub password: Option<String>,
    pub login_ack: Option<String>,
}

impl Default for Handshake {
    fn default() -> Self {
        Self {
            user: "admin".to_string(),
            password: None,
            login_ack: None,
        }
    }
}

impl Handshake {
    /// 需要依次发送的登录行（均以 `\r\n` 结尾）
    pub fn login_lines(&self) -> Vec<Vec<u8>> {
        let mut lines = vec![encode_request(&self.user)];
        if let Some(ref password) = self.password {
            lines.push(encode_request(password));
        }
        lines
    }

    /// 校验设备回复
    pub fn verify(&self, reply: &str) -> Result<(), ProtocolError> {
        match self.login_ack {
            Some(ref expected) if !reply.contains(expected.as_str()) => {
                Err(ProtocolError::HandshakeMismatch {
                    expected: expected.clone(),
                })
            },
            _ => Ok(()),
        }
    }
}
