//! Native Audio Stream
//!
//! 基于原生解码引擎（Symphonia / FFmpeg子进程）的音频流库。
//!
//! ## 核心特性
//! - 探测容器中的全部音频流，给出编码、采样率、声道数、时长与标签
//! - 以字节流形式读取解码后的交错PCM（可选位深度、字节序与符号）
//! - 按时间定位（纳秒/微秒/毫秒/秒），不可定位的来源在原生调用前拒绝
//! - 基于句柄的资源所有权：每条流恰好关闭一次原生会话，关闭后的调用返回错误
//! - 格式协商：本库产生的源格式可转换为同声道数、同采样率的PCM
//!
//! ## 示例
//! ```no_run
//! use std::io::Read;
//! use native_audio_stream::{AudioFileReader, Source, TimeUnit};
//!
//! let reader = AudioFileReader::default();
//! let mut stream = reader.audio_input_stream(&Source::file("music.flac"))?;
//! stream.seek(1500, TimeUnit::Milliseconds)?;
//! let mut pcm = Vec::new();
//! stream.read_to_end(&mut pcm)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod codec;
pub mod config;
pub mod constants;
pub mod error;
pub mod format;
pub mod native;
pub mod provider;
pub mod stream;

// 重新导出核心类型
pub use codec::{CodecId, CodecInfo, CodecKind, Encoding, PcmLayout, SampleKind};
pub use config::{EnginePreference, StreamConfig};
pub use error::{AudioError, AudioResult, ErrorCategory};
pub use format::{AudioFileFormat, AudioFormat, FileType, Properties, PropertyValue};
pub use native::{
    EngineRegistry, FfmpegEngine, FillStatus, HandleCloser, NativeBuffer, NativeDecoder,
    PcmTarget, ProbeInfo, RawHandle, Source, SourceKind, SymphoniaEngine,
};
#[cfg(feature = "http")]
pub use native::HttpSource;
pub use provider::{AudioFileReader, FormatConversionProvider};
pub use stream::{AudioInputStream, BufferedDecodeStream, TimeUnit};
