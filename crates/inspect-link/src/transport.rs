//! TCP 传输辅助函数
//!
//! 两条链路共用：带超时的连接、超时判定、限时读取（排空横幅）、丢弃残留数据。

use crate::ConnectError;
use std::io::{self, ErrorKind, Read};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// 限时读取的结果
pub(crate) struct Drained {
    pub text: String,
    pub peer_closed: bool,
}

/// 读超时在不同平台上表现为 `WouldBlock`（Unix）或 `TimedOut`（Windows）
pub(crate) fn is_timeout(err: &io::Error) -> bool {
    matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut)
}

/// 解析地址并依次尝试连接，返回第一个成功的连接
pub(crate) fn open(host: &str, port: u16, timeout: Duration) -> Result<TcpStream, ConnectError> {
    let endpoint = format!("{}:{}", host, port);
    let addrs: Vec<_> = (host, port)
        .to_socket_addrs()
        .map_err(|source| ConnectError::Resolve {
            endpoint: endpoint.clone(),
            source,
        })?
        .collect();

    let mut last_err = None;
    for addr in addrs {
        debug!("Connecting to {} ({})", endpoint, addr);
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => {
                stream
                    .set_nodelay(true)
                    .map_err(|source| ConnectError::Transport {
                        endpoint: endpoint.clone(),
                        source,
                    })?;
                return Ok(stream);
            },
            Err(e) if e.kind() == ErrorKind::TimedOut => {
                last_err = Some(ConnectError::Timeout {
                    endpoint: endpoint.clone(),
                    timeout,
                });
            },
            Err(source) => {
                last_err = Some(ConnectError::Transport {
                    endpoint: endpoint.clone(),
                    source,
                });
            },
        }
    }

    Err(last_err.unwrap_or(ConnectError::NoAddress { endpoint }))
}

/// 在 `window` 时间内读取所有到达的数据
///
/// 读到 0 字节（对端关闭）时提前返回。
pub(crate) fn drain(stream: &mut TcpStream, window: Duration) -> io::Result<Drained> {
    let deadline = Instant::now() + window;
    let mut collected = Vec::new();
    let mut buf = [0u8; 2048];

    loop {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        stream.set_read_timeout(Some(deadline - now))?;
        match stream.read(&mut buf) {
            Ok(0) => {
                return Ok(Drained {
                    text: String::from_utf8_lossy(&collected).into_owned(),
                    peer_closed: true,
                });
            },
            Ok(n) => collected.extend_from_slice(&buf[..n]),
            Err(e) if is_timeout(&e) => break,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    Ok(Drained {
        text: String::from_utf8_lossy(&collected).into_owned(),
        peer_closed: false,
    })
}

/// 以非阻塞方式丢弃已到达但未读取的数据
///
/// # 返回
/// 丢弃的字节数；对端已关闭时返回 `UnexpectedEof`
pub(crate) fn discard_pending(stream: &mut TcpStream) -> io::Result<usize> {
    stream.set_nonblocking(true)?;
    let mut discarded = 0;
    let mut buf = [0u8; 4096];
    let result = loop {
        match stream.read(&mut buf) {
            Ok(0) => break Err(io::Error::from(ErrorKind::UnexpectedEof)),
            Ok(n) => discarded += n,
            Err(e) if e.kind() == ErrorKind::WouldBlock => break Ok(discarded),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => break Err(e),
        }
    };
    stream.set_nonblocking(false)?;
    if discarded > 0 {
        trace!("Discarded {} pending bytes", discarded);
    }
    result
}

/// 关闭连接（忽略错误，对端可能已经断开）
pub(crate) fn shutdown(stream: TcpStream) {
    let _ = stream.shutdown(Shutdown::Both);
}
