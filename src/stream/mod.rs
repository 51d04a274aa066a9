//! 缓冲解码流
//!
//! 四种来源变体（内存字节、本地文件、URL、任意字节流）与预解复用的编解码流
//! 共享同一个 [`BufferedDecodeStream`] 契约；[`AudioInputStream`] 在其上
//! 附加格式、总帧数与帧位置跟踪。

mod audio_input;
mod codec;
mod peer;
mod sources;

pub use audio_input::AudioInputStream;
pub use codec::{CodecStream, resolve_target};
pub use peer::NativePeer;
pub use sources::{ByteArrayStream, FileStream, ReaderStream, StreamSetup, UrlStream, open_stream};

use std::io::Read;

use crate::error::{AudioError, AudioResult};
use crate::format::AudioFormat;
use crate::native::{FillStatus, HandleCloser, PcmTarget};

/// 定位位置的时间单位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    Nanoseconds,
    Microseconds,
    Milliseconds,
    Seconds,
}

impl TimeUnit {
    /// 换算为微秒；溢出时返回 `InvalidInput`
    pub fn to_micros(self, position: u64) -> AudioResult<i64> {
        let micros = match self {
            TimeUnit::Nanoseconds => Some(position / 1_000),
            TimeUnit::Microseconds => Some(position),
            TimeUnit::Milliseconds => position.checked_mul(1_000),
            TimeUnit::Seconds => position.checked_mul(1_000_000),
        };
        micros
            .and_then(|us| i64::try_from(us).ok())
            .ok_or_else(|| {
                AudioError::InvalidInput(format!(
                    "定位位置溢出 / seek position overflows: {position} {self:?}"
                ))
            })
    }
}

/// 缓冲解码流契约
///
/// 单一所有者顺序调用；关闭后读取和定位返回 `StreamClosed`，重复关闭无副作用。
pub trait BufferedDecodeStream: Read + Send {
    fn is_open(&self) -> bool;

    fn is_seekable(&self) -> bool;

    /// 流声明的格式
    fn format(&self) -> &AudioFormat;

    /// 实际输出的PCM字节布局
    fn output(&self) -> PcmTarget;

    /// 缓冲区耗尽时填充一次
    fn fill(&mut self) -> AudioResult<FillStatus>;

    /// 按时间定位；之后读出的数据位于该时间点或其后
    fn seek(&mut self, position: u64, unit: TimeUnit) -> AudioResult<()>;

    /// 以新的PCM布局重新解码（预解复用流使用）
    fn set_output(&mut self, target: &PcmTarget) -> AudioResult<()>;

    /// 关闭（幂等）
    fn close(&mut self) -> AudioResult<()>;

    /// 可在其他上下文关闭本流的关闭器
    fn closer(&self) -> HandleCloser;
}
