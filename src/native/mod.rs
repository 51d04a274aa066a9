//! 原生解码引擎模块
//!
//! 定义流层唯一依赖的引擎调用面（探测、打开、填充、定位、关闭），
//! 以及基于句柄的资源所有权模型和两种引擎实现。

mod buffer;
mod ffmpeg_engine;
mod handle;
#[cfg(feature = "http")]
mod http;
mod pcm;
mod registry;
mod source;
mod symphonia_engine;

// 重新导出公共接口
pub use buffer::NativeBuffer;
pub use ffmpeg_engine::FfmpegEngine;
pub use handle::{HandleCloser, NativeHandle, RawHandle};
#[cfg(feature = "http")]
pub use http::HttpSource;
pub use pcm::PcmTarget;
pub use registry::{EngineRegistry, ProbedSource};
pub use source::{SharedReader, Source, SourceKind};
pub use symphonia_engine::SymphoniaEngine;

pub(crate) use handle::SessionTable;

use crate::codec::{CodecId, PcmLayout, codec_by_id};
use crate::error::AudioResult;
use crate::format::Properties;

/// 单次填充的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillStatus {
    /// 缓冲区被替换为 n 字节新数据（n > 0）
    Data(usize),
    /// 数据已耗尽
    EndOfStream,
}

/// 一条音频流的探测结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProbeInfo {
    /// 容器内音频流序号（从0开始，只计音频流）
    pub stream_index: usize,
    pub codec: CodecId,
    pub sample_rate: Option<u32>,
    pub channels: Option<u16>,
    /// 源位深度（压缩格式可能未知）
    pub sample_size_bits: Option<u16>,
    /// 容器报告的帧/包大小（PCM为块对齐）
    pub frame_size: Option<u32>,
    /// 容器报告的帧率（压缩格式的包速率）
    pub frame_rate: Option<f32>,
    pub big_endian: bool,
    pub duration_micros: Option<i64>,
    /// 精确总帧数（容器声明时）
    pub total_frames: Option<u64>,
    pub bitrate: Option<u32>,
    pub vbr: Option<bool>,
    /// 标题、作者等标签
    pub tags: Properties,
}

impl ProbeInfo {
    /// 线性PCM源的布局
    pub fn pcm_layout(&self) -> Option<PcmLayout> {
        codec_by_id(self.codec).and_then(|info| info.pcm_layout())
    }

    /// 可信度检查：帧数、采样率、位深度、声道数全部为零/未知时视为无效探测
    pub fn is_plausible(&self) -> bool {
        self.total_frames.unwrap_or(0) != 0
            || self.duration_micros.unwrap_or(0) > 0
            || self.sample_rate.unwrap_or(0) != 0
            || self.sample_size_bits.unwrap_or(0) != 0
            || self.channels.unwrap_or(0) != 0
    }
}

/// 原生解码引擎调用面
///
/// 句柄由 `open` 分配，`close` 后失效；对失效句柄的任何调用返回错误而不是未定义行为。
/// 同一句柄上的调用由单一所有者顺序发起，不同句柄之间完全独立。
pub trait NativeDecoder: Send + Sync {
    /// 引擎名称（日志用）
    fn name(&self) -> &'static str;

    /// 是否能处理这类来源
    fn can_open(&self, source: &Source) -> bool;

    /// 探测全部音频流
    ///
    /// 无法识别时返回 `UnsupportedFormat`，底层读取失败返回 `Io`。
    fn probe(&self, source: &Source) -> AudioResult<Vec<ProbeInfo>>;

    /// 打开指定音频流，输出默认为 [`PcmTarget::default_for`]
    fn open(&self, source: &Source, stream_index: usize, buffer_hint: usize)
    -> AudioResult<RawHandle>;

    /// 会话是否支持定位
    fn is_seekable(&self, handle: RawHandle) -> bool;

    /// 重新配置会话输出布局（对已解码但未交付的数据不生效）
    fn set_output(&self, handle: RawHandle, target: &PcmTarget) -> AudioResult<()>;

    /// 解码下一段数据，整体替换缓冲区内容
    fn fill(&self, handle: RawHandle, buffer: &mut NativeBuffer) -> AudioResult<FillStatus>;

    /// 定位到指定时间（微秒）；之后的数据从该时间点或其后开始
    fn seek(&self, handle: RawHandle, micros: i64) -> AudioResult<()>;

    /// 释放会话
    fn close(&self, handle: RawHandle) -> AudioResult<()>;
}
