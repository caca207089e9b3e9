//! 轮廓传感器链路
//!
//! ## 状态机
//!
//! ```text
//! Disconnected --connect--> Connecting --握手成功--> Connected
//!      ^                        |                       |
//!      +------- 失败 -----------+------ 故障 / close ---+
//! ```
//!
//! ## 采集流程
//!
//! 1. 上一次采集超时后，迟到的响应随时可能到达，无法与新响应区分：
//!    先重新建立连接（含握手），旧连接上的迟到数据随之丢弃
//! 2. 丢弃链路上残留的数据，发送采集命令
//! 3. 在总超时内累积读取，直到分帧器得到完整的一行
//! 4. 解码状态码与采样点

use crate::transport::{self, is_timeout};
use crate::{ConnectError, ConnectionState, Link, LinkError, LinkKind, SensorPort};
use inspect_protocol::{
    DEFAULT_FRAME_LIMIT, FrameAssembler, Handshake, Profile, decode_response, encode_request,
};
use std::io::{ErrorKind, Read, Write};
use std::net::TcpStream;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

/// 传感器链路配置
#[derive(Debug, Clone)]
pub struct SensorLinkConfig {
    /// 传感器地址（IP 或主机名）
    pub host: String,
    /// 原生命令端口（Telnet 风格，默认 23）
    pub port: u16,
    /// TCP 连接超时
    pub connect_timeout: Duration,
    /// 单次采集的总超时（从发送命令开始计算）
    pub acquire_timeout: Duration,
    /// 握手阶段每次排空回复的时间窗口
    pub banner_window: Duration,
    /// 登录握手参数
    pub handshake: Handshake,
    /// 采集命令
    pub command: String,
    /// 响应令牌分隔符
    pub delimiter: char,
    /// 响应缓冲区上限
    pub frame_limit: usize,
}

impl Default for SensorLinkConfig {
    fn default() -> Self {
        Self {
            host: "192.168.1.100".to_string(),
            port: 23,
            connect_timeout: Duration::from_secs(5),
            acquire_timeout: Duration::from_secs(5),
            banner_window: Duration::from_millis(500),
            handshake: Handshake::default(),
            command: "GVProfile".to_string(),
            delimiter: '\t',
            frame_limit: DEFAULT_FRAME_LIMIT,
        }
    }
}

impl SensorLinkConfig {
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 传感器链路
///
/// 独占 TCP 连接；`Drop` 时自动关闭。
pub struct SensorLink {
    config: SensorLinkConfig,
    stream: Option<TcpStream>,
    state: ConnectionState,
    assembler: FrameAssembler,
    request: Vec<u8>,
    /// 上一次采集超时，旧请求的响应可能还在路上
    stale_reply_pending: bool,
}

impl SensorLink {
    pub fn new(config: SensorLinkConfig) -> Self {
        let assembler = FrameAssembler::new(config.frame_limit);
        let request = encode_request(&config.command);
        Self {
            config,
            stream: None,
            state: ConnectionState::Disconnected,
            assembler,
            request,
            stale_reply_pending: false,
        }
    }

    pub fn config(&self) -> &SensorLinkConfig {
        &self.config
    }

    /// 打开连接并完成登录握手
    fn open(&self) -> Result<TcpStream, ConnectError> {
        let endpoint = self.config.endpoint();
        let transport_err = |source: std::io::Error| ConnectError::Transport {
            endpoint: endpoint.clone(),
            source,
        };

        let mut stream = transport::open(
            &self.config.host,
            self.config.port,
            self.config.connect_timeout,
        )?;

        // 先排空欢迎横幅，再发送登录行
        let banner = transport::drain(&mut stream, self.config.banner_window)
            .map_err(transport_err)?;
        if banner.peer_closed {
            return Err(ConnectError::ClosedDuringHandshake {
                endpoint: endpoint.clone(),
            });
        }
        if !banner.text.is_empty() {
            debug!("Sensor banner: {:?}", banner.text.trim());
        }

        for line in self.config.handshake.login_lines() {
            stream.write_all(&line).map_err(transport_err)?;
        }

        let reply = transport::drain(&mut stream, self.config.banner_window)
            .map_err(transport_err)?;
        if reply.peer_closed {
            return Err(ConnectError::ClosedDuringHandshake {
                endpoint: endpoint.clone(),
            });
        }
        self.config
            .handshake
            .verify(&reply.text)
            .map_err(|source| ConnectError::Handshake {
                endpoint: endpoint.clone(),
                source,
            })?;

        stream
            .set_read_timeout(Some(self.config.acquire_timeout))
            .map_err(transport_err)?;
        Ok(stream)
    }

    /// 一次完整的请求/响应交换
    fn exchange(
        stream: &mut TcpStream,
        assembler: &mut FrameAssembler,
        request: &[u8],
        config: &SensorLinkConfig,
    ) -> Result<Profile, LinkError> {
        match transport::discard_pending(stream) {
            Ok(0) => {},
            Ok(n) => warn!("Discarded {} stale bytes from sensor before request", n),
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Err(LinkError::PeerClosed),
            Err(e) => return Err(LinkError::Io(e)),
        }
        assembler.clear();

        stream.write_all(request)?;

        let deadline = Instant::now() + config.acquire_timeout;
        let mut buf = [0u8; 4096];
        loop {
            let now = Instant::now();
            if now >= deadline {
                return Err(LinkError::Timeout(config.acquire_timeout));
            }
            stream.set_read_timeout(Some(deadline - now))?;

            let n = match stream.read(&mut buf) {
                Ok(0) => return Err(LinkError::PeerClosed),
                Ok(n) => n,
                Err(e) if is_timeout(&e) => {
                    return Err(LinkError::Timeout(config.acquire_timeout));
                },
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(LinkError::Io(e)),
            };

            if let Some(frame) = assembler.push(&buf[..n])? {
                if frame.trailing_bytes > 0 {
                    warn!(
                        "Sensor sent {} bytes after the response terminator; discarded",
                        frame.trailing_bytes
                    );
                }
                trace!("Sensor response: {:?}", frame.line);
                return Ok(decode_response(&frame.line, config.delimiter)?);
            }
        }
    }
}

impl Link for SensorLink {
    fn kind(&self) -> LinkKind {
        LinkKind::Sensor
    }

    fn connect(&mut self) -> Result<(), ConnectError> {
        // 重连前先释放旧连接
        if let Some(stream) = self.stream.take() {
            transport::shutdown(stream);
        }
        self.state = ConnectionState::Connecting;

        match self.open() {
            Ok(stream) => {
                self.stream = Some(stream);
                self.assembler.clear();
                self.stale_reply_pending = false;
                self.state = ConnectionState::Connected;
                info!("Sensor link connected to {}", self.config.endpoint());
                Ok(())
            },
            Err(e) => {
                self.state = ConnectionState::Disconnected;
                Err(e)
            },
        }
    }

    fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            transport::shutdown(stream);
            info!("Sensor link to {} closed", self.config.endpoint());
        }
        self.assembler.clear();
        self.stale_reply_pending = false;
        self.state = ConnectionState::Disconnected;
    }

    fn state(&self) -> ConnectionState {
        self.state
    }
}

impl SensorPort for SensorLink {
    fn acquire_profile(&mut self) -> Result<Profile, LinkError> {
        if self.stream.is_none() {
            return Err(LinkError::NotConnected);
        }

        if self.stale_reply_pending {
            debug!("Previous acquisition timed out, reconnecting sensor before request");
            if let Err(e) = self.connect() {
                warn!("Sensor reconnect after timeout failed: {}", e);
                return Err(LinkError::NotConnected);
            }
        }

        let Some(stream) = self.stream.as_mut() else {
            return Err(LinkError::NotConnected);
        };

        let result = Self::exchange(stream, &mut self.assembler, &self.request, &self.config);
        match result {
            Ok(ref profile) => {
                debug!("Received profile with {} samples", profile.len());
            },
            Err(ref e) if e.breaks_link() => {
                warn!("Sensor link lost during acquisition: {}", e);
                self.close();
            },
            Err(LinkError::Timeout(_)) => {
                self.stale_reply_pending = true;
            },
            Err(_) => {},
        }
        result
    }
}

impl Drop for SensorLink {
    fn drop(&mut self) {
        self.close();
    }
}
