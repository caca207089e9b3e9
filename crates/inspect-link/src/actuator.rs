//! 协作机器人链路
//!
//! 协议非常简单：对端发送任意字节表示"工件就绪"，
//! 本端回复两个固定令牌之一（以 `\n` 结尾）。

use crate::transport::{self, is_timeout};
use crate::{ActuatorPort, ConnectError, ConnectionState, Link, LinkError, LinkKind};
use inspect_protocol::{Verdict, VerdictTokens};
use std::io::{ErrorKind, Read, Write};
use std::net::TcpStream;
use std::time::Duration;
use tracing::{debug, info, warn};

/// 协作机器人链路配置
#[derive(Debug, Clone)]
pub struct ActuatorLinkConfig {
    /// 协作机器人地址
    pub host: String,
    /// 端口（UR 默认 30002）
    pub port: u16,
    /// TCP 连接超时
    pub connect_timeout: Duration,
    /// 等待就绪信号的读超时
    pub signal_timeout: Duration,
    /// 判定令牌
    pub tokens: VerdictTokens,
}

impl Default for ActuatorLinkConfig {
    fn default() -> Self {
        Self {
            host: "192.168.1.200".to_string(),
            port: 30002,
            connect_timeout: Duration::from_secs(5),
            signal_timeout: Duration::from_secs(10),
            tokens: VerdictTokens::default(),
        }
    }
}

impl ActuatorLinkConfig {
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 就绪信号
///
/// 内容不做解析，只记录收到的字节数。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signal {
    pub bytes: usize,
}

/// 协作机器人链路
pub struct ActuatorLink {
    config: ActuatorLinkConfig,
    stream: Option<TcpStream>,
    state: ConnectionState,
}

impl ActuatorLink {
    pub fn new(config: ActuatorLinkConfig) -> Self {
        Self {
            config,
            stream: None,
            state: ConnectionState::Disconnected,
        }
    }

    pub fn config(&self) -> &ActuatorLinkConfig {
        &self.config
    }

    fn open(&self) -> Result<TcpStream, ConnectError> {
        let stream = transport::open(
            &self.config.host,
            self.config.port,
            self.config.connect_timeout,
        )?;
        stream
            .set_read_timeout(Some(self.config.signal_timeout))
            .map_err(|source| ConnectError::Transport {
                endpoint: self.config.endpoint(),
                source,
            })?;
        Ok(stream)
    }
}

impl Link for ActuatorLink {
    fn kind(&self) -> LinkKind {
        LinkKind::Actuator
    }

    fn connect(&mut self) -> Result<(), ConnectError> {
        if let Some(stream) = self.stream.take() {
            transport::shutdown(stream);
        }
        self.state = ConnectionState::Connecting;

        match self.open() {
            Ok(stream) => {
                self.stream = Some(stream);
                self.state = ConnectionState::Connected;
                info!("Actuator link connected to {}", self.config.endpoint());
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
            info!("Actuator link to {} closed", self.config.endpoint());
        }
        self.state = ConnectionState::Disconnected;
    }

    fn state(&self) -> ConnectionState {
        self.state
    }
}

impl ActuatorPort for ActuatorLink {
    fn await_signal(&mut self) -> Result<Signal, LinkError> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(LinkError::NotConnected);
        };

        let mut buf = [0u8; 1024];
        let result = loop {
            match stream.read(&mut buf) {
                Ok(0) => break Err(LinkError::PeerClosed),
                Ok(n) => {
                    debug!("Ready signal received ({} bytes)", n);
                    break Ok(Signal { bytes: n });
                },
                Err(e) if is_timeout(&e) => {
                    break Err(LinkError::Timeout(self.config.signal_timeout));
                },
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => break Err(LinkError::Io(e)),
            }
        };

        if let Err(ref e) = result
            && e.breaks_link()
        {
            warn!("Actuator link lost while waiting for signal: {}", e);
            self.close();
        }
        result
    }

    fn send_verdict(&mut self, verdict: Verdict) -> Result<(), LinkError> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(LinkError::NotConnected);
        };

        let payload = self.config.tokens.encode(verdict);
        match stream.write_all(&payload).and_then(|_| stream.flush()) {
            Ok(()) => {
                info!(
                    "Verdict {} sent to actuator as {:?}",
                    verdict,
                    self.config.tokens.token(verdict)
                );
                Ok(())
            },
            Err(e) => {
                warn!("Actuator link lost while sending verdict: {}", e);
                self.close();
                Err(LinkError::Send(e))
            },
        }
    }
}

impl Drop for ActuatorLink {
    fn drop(&mut self) {
        self.close();
    }
}
