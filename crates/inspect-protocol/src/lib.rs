//! # Inspect Protocol
//!
//! 检测循环的数据模型与线路编解码（无 IO 依赖）
//!
//! ## 模块
//!
//! - `profile`: 轮廓采样序列 `Profile`
//! - `verdict`: 判定结果及其发送给协作机器人的文本令牌
//! - `sensor`: 传感器请求编码、响应分帧、响应解码、登录握手校验
//!
//! ## 线路格式
//!
//! 传感器响应为一行文本，以 `\n` 结尾（可选的 `\r` 会被去掉）：
//!
//! ```text
//! <status><delim><sample><delim><sample>...\r\n
//! ```
//!
//! `status` 为 `1` 表示成功，其余值均视为设备报告的失败。

mod error;
pub mod profile;
pub mod sensor;
pub mod verdict;

pub use error::ProtocolError;
pub use profile::Profile;
pub use sensor::{
    DEFAULT_FRAME_LIMIT, FrameAssembler, Handshake, ResponseFrame, STATUS_OK, decode_response,
    encode_request,
};
pub use verdict::{Verdict, VerdictTokens};
