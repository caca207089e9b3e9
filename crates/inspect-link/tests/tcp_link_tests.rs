//! 链路层回环测试
//!
//! 在 127.0.0.1 上启动模拟的传感器 / 协作机器人对端，验证：
//! - 登录握手（成功与失败）
//! - 响应跨多次读取到达时的重组
//! - 设备失败状态、超时、对端关闭时的状态转换
//! - 超时后迟到的响应不会被当作下一次采集的结果（下一次采集前重新连接）

use inspect_link::{
    ActuatorLink, ActuatorLinkConfig, ConnectError, ConnectionState, Link, LinkError, SensorLink,
    SensorLinkConfig,
};
use inspect_link::{ActuatorPort, SensorPort};
use inspect_protocol::{Handshake, ProtocolError, Verdict};
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};
use std::time::Duration;

fn bind() -> (TcpListener, u16) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
    let port = listener.local_addr().unwrap().port();
    (listener, port)
}

fn sensor_config(port: u16) -> SensorLinkConfig {
    SensorLinkConfig {
        host: "127.0.0.1".to_string(),
        port,
        connect_timeout: Duration::from_secs(1),
        acquire_timeout: Duration::from_secs(1),
        banner_window: Duration::from_millis(100),
        ..Default::default()
    }
}

fn actuator_config(port: u16) -> ActuatorLinkConfig {
    ActuatorLinkConfig {
        host: "127.0.0.1".to_string(),
        port,
        connect_timeout: Duration::from_secs(1),
        signal_timeout: Duration::from_secs(1),
        ..Default::default()
    }
}

/// 逐字节读取一行（不含行尾）
fn read_line(stream: &mut TcpStream) -> String {
    let mut line = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        match stream.read(&mut byte) {
            Ok(0) => break,
            Ok(_) if byte[0] == b'\n' => break,
            Ok(_) => line.push(byte[0]),
            Err(e) => panic!("peer read failed: {}", e),
        }
    }
    String::from_utf8(line).unwrap().trim_end_matches('\r').to_string()
}

/// 模拟传感器登录流程：横幅 -> 读取用户名 -> 回复
fn sensor_login(stream: &mut TcpStream, reply: &str) -> String {
    stream.write_all(b"Welcome to In-Sight\r\nUser: ").unwrap();
    let user = read_line(stream);
    stream.write_all(reply.as_bytes()).unwrap();
    user
}

/// 启动一个只服务单个连接的模拟传感器
fn spawn_sensor<F>(listener: TcpListener, serve: F) -> JoinHandle<()>
where
    F: FnOnce(TcpStream) + Send + 'static,
{
    thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept");
        serve(stream);
    })
}

/// 等待客户端关闭连接
fn wait_for_close(stream: &mut TcpStream) {
    let mut rest = Vec::new();
    let _ = stream.read_to_end(&mut rest);
}

#[test]
fn test_sensor_handshake_with_ack() {
    let (listener, port) = bind();
    let server = spawn_sensor(listener, |mut stream| {
        let user = sensor_login(&mut stream, "User Logged In\r\n");
        assert_eq!(user, "admin");
        wait_for_close(&mut stream);
    });

    let mut config = sensor_config(port);
    config.handshake = Handshake {
        login_ack: Some("User Logged In".to_string()),
        ..Default::default()
    };
    let mut link = SensorLink::new(config);
    link.connect().expect("handshake should succeed");
    assert_eq!(link.state(), ConnectionState::Connected);

    link.close();
    assert_eq!(link.state(), ConnectionState::Disconnected);
    server.join().unwrap();
}

#[test]
fn test_sensor_handshake_mismatch() {
    let (listener, port) = bind();
    let server = spawn_sensor(listener, |mut stream| {
        sensor_login(&mut stream, "Invalid Password\r\n");
        wait_for_close(&mut stream);
    });

    let mut config = sensor_config(port);
    config.handshake.login_ack = Some("User Logged In".to_string());
    let mut link = SensorLink::new(config);

    let err = link.connect().unwrap_err();
    assert!(matches!(
        err,
        ConnectError::Handshake {
            source: ProtocolError::HandshakeMismatch { .. },
            ..
        }
    ));
    assert_eq!(link.state(), ConnectionState::Disconnected);
    server.join().unwrap();
}

#[test]
fn test_sensor_connect_refused() {
    let (listener, port) = bind();
    drop(listener);

    let mut link = SensorLink::new(sensor_config(port));
    assert!(link.connect().is_err());
    assert_eq!(link.state(), ConnectionState::Disconnected);
    assert!(matches!(
        link.acquire_profile(),
        Err(LinkError::NotConnected)
    ));
}

#[test]
fn test_sensor_response_split_across_reads() {
    let (listener, port) = bind();
    let server = spawn_sensor(listener, |mut stream| {
        sensor_login(&mut stream, "User Logged In\r\n");
        assert_eq!(read_line(&mut stream), "GVProfile");
        stream.write_all(b"1\t0.10\t0.2").unwrap();
        stream.flush().unwrap();
        thread::sleep(Duration::from_millis(50));
        stream.write_all(b"0\t0.30\r\n").unwrap();
        wait_for_close(&mut stream);
    });

    let mut link = SensorLink::new(sensor_config(port));
    link.connect().unwrap();
    let profile = link.acquire_profile().expect("profile");
    assert_eq!(profile.samples(), &[0.10, 0.20, 0.30]);
    assert!(link.is_connected());

    drop(link);
    server.join().unwrap();
}

#[test]
fn test_sensor_failure_status_keeps_link() {
    let (listener, port) = bind();
    let server = spawn_sensor(listener, |mut stream| {
        sensor_login(&mut stream, "User Logged In\r\n");
        read_line(&mut stream);
        stream.write_all(b"0\r\n").unwrap();
        read_line(&mut stream);
        stream.write_all(b"1\t2.5\r\n").unwrap();
        wait_for_close(&mut stream);
    });

    let mut link = SensorLink::new(sensor_config(port));
    link.connect().unwrap();

    let err = link.acquire_profile().unwrap_err();
    assert!(matches!(
        err,
        LinkError::Protocol(ProtocolError::DeviceStatus { ref code }) if code == "0"
    ));
    assert!(link.is_connected());

    let profile = link.acquire_profile().unwrap();
    assert_eq!(profile.samples(), &[2.5]);

    drop(link);
    server.join().unwrap();
}

#[test]
fn test_sensor_late_reply_is_discarded() {
    let (listener, port) = bind();
    let server = thread::spawn(move || {
        let (mut first, _) = listener.accept().expect("accept");
        sensor_login(&mut first, "User Logged In\r\n");
        read_line(&mut first);
        // 超过客户端的采集超时后才回复
        thread::sleep(Duration::from_millis(400));
        let _ = first.write_all(b"1\t9.9\r\n");

        let (mut second, _) = listener.accept().expect("accept");
        sensor_login(&mut second, "User Logged In\r\n");
        read_line(&mut second);
        second.write_all(b"1\t1.0\r\n").unwrap();
        wait_for_close(&mut second);
    });

    let mut config = sensor_config(port);
    config.acquire_timeout = Duration::from_millis(200);
    let mut link = SensorLink::new(config);
    link.connect().unwrap();

    let err = link.acquire_profile().unwrap_err();
    assert!(matches!(err, LinkError::Timeout(_)));
    assert!(link.is_connected());

    // 等迟到的响应到达，再发起下一次采集
    thread::sleep(Duration::from_millis(500));
    let profile = link.acquire_profile().unwrap();
    assert_eq!(profile.samples(), &[1.0]);

    drop(link);
    server.join().unwrap();
}

#[test]
fn test_sensor_late_reply_after_next_request_is_not_returned() {
    let (listener, port) = bind();
    let server = thread::spawn(move || {
        let (mut first, _) = listener.accept().expect("accept");
        sensor_login(&mut first, "User Logged In\r\n");
        read_line(&mut first);

        // 旧连接上的迟到响应在下一次请求发出之后才写出
        let late = thread::spawn(move || {
            thread::sleep(Duration::from_millis(600));
            let _ = first.write_all(b"1\t9.9\r\n");
            wait_for_close(&mut first);
        });

        let (mut second, _) = listener.accept().expect("accept");
        sensor_login(&mut second, "User Logged In\r\n");
        read_line(&mut second);
        thread::sleep(Duration::from_millis(100));
        second.write_all(b"1\t1.0\r\n").unwrap();
        late.join().unwrap();
        wait_for_close(&mut second);
    });

    let mut config = sensor_config(port);
    config.acquire_timeout = Duration::from_millis(300);
    let mut link = SensorLink::new(config);
    link.connect().unwrap();

    assert!(matches!(
        link.acquire_profile(),
        Err(LinkError::Timeout(_))
    ));
    let profile = link.acquire_profile().unwrap();
    assert_eq!(profile.samples(), &[1.0]);

    drop(link);
    server.join().unwrap();
}

#[test]
fn test_sensor_reconnect_after_timeout_fails() {
    let (listener, port) = bind();
    let server = spawn_sensor(listener, |mut stream| {
        sensor_login(&mut stream, "User Logged In\r\n");
        read_line(&mut stream);
        thread::sleep(Duration::from_millis(300));
    });

    let mut config = sensor_config(port);
    config.acquire_timeout = Duration::from_millis(200);
    let mut link = SensorLink::new(config);
    link.connect().unwrap();

    assert!(matches!(
        link.acquire_profile(),
        Err(LinkError::Timeout(_))
    ));
    // 对端连接与监听都已关闭，重新连接失败
    server.join().unwrap();
    assert!(matches!(
        link.acquire_profile(),
        Err(LinkError::NotConnected)
    ));
    assert_eq!(link.state(), ConnectionState::Disconnected);
}

#[test]
fn test_sensor_peer_closed() {
    let (listener, port) = bind();
    let server = spawn_sensor(listener, |mut stream| {
        sensor_login(&mut stream, "User Logged In\r\n");
        read_line(&mut stream);
        // 不回复，直接断开
    });

    let mut link = SensorLink::new(sensor_config(port));
    link.connect().unwrap();

    let err = link.acquire_profile().unwrap_err();
    assert!(matches!(err, LinkError::PeerClosed));
    assert_eq!(link.state(), ConnectionState::Disconnected);
    server.join().unwrap();
}

#[test]
fn test_actuator_signal_and_verdict() {
    let (listener, port) = bind();
    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        stream.write_all(b"ready").unwrap();
        let first = read_line(&mut stream);
        stream.write_all(b"x").unwrap();
        let second = read_line(&mut stream);
        wait_for_close(&mut stream);
        (first, second)
    });

    let mut link = ActuatorLink::new(actuator_config(port));
    link.connect().unwrap();

    let signal = link.await_signal().unwrap();
    assert_eq!(signal.bytes, 5);
    link.send_verdict(Verdict::Good).unwrap();

    link.await_signal().unwrap();
    link.send_verdict(Verdict::Defective).unwrap();

    link.close();
    let (first, second) = server.join().unwrap();
    assert_eq!(first, "PIEZA_BUENA");
    assert_eq!(second, "PIEZA_DEFECTUOSA");
}

#[test]
fn test_actuator_timeout_keeps_link() {
    let (listener, port) = bind();
    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        wait_for_close(&mut stream);
    });

    let mut config = actuator_config(port);
    config.signal_timeout = Duration::from_millis(100);
    let mut link = ActuatorLink::new(config);
    link.connect().unwrap();

    let err = link.await_signal().unwrap_err();
    assert!(matches!(err, LinkError::Timeout(_)));
    assert!(link.is_connected());

    link.close();
    link.close();
    assert_eq!(link.state(), ConnectionState::Disconnected);
    server.join().unwrap();
}

#[test]
fn test_actuator_peer_closed() {
    let (listener, port) = bind();
    let server = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        drop(stream);
    });

    let mut link = ActuatorLink::new(actuator_config(port));
    link.connect().unwrap();
    server.join().unwrap();

    let err = link.await_signal().unwrap_err();
    assert!(matches!(err, LinkError::PeerClosed));
    assert!(!link.is_connected());
}
