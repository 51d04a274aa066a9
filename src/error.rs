//! 统一错误处理框架
//!
//! 流读取、探测、格式协商和原生引擎共用的错误类型定义。
//! `Read`/`Seek` 语义边界上，通过 `From<AudioError> for io::Error` 转换为标准I/O错误。

use std::fmt;
use std::io;

use thiserror::Error;

/// 音频流处理相关的统一错误类型
#[derive(Debug, Error)]
pub enum AudioError {
    /// 输入验证错误（参数非法、偏移越界等）
    #[error("输入验证失败 / invalid input: {0}")]
    InvalidInput(String),

    /// 底层I/O错误
    #[error("I/O错误 / I/O error: {0}")]
    Io(#[from] io::Error),

    /// 格式无法识别或不被支持（含DRM保护文件、无音频流等）
    #[error("不支持的音频格式 / unsupported audio format: {0}")]
    UnsupportedFormat(String),

    /// 原生引擎解码失败（数据损坏、截断等）
    #[error("音频解码失败 / decoding failed: {0}")]
    Decoding(String),

    /// 流不支持定位
    #[error("流不支持定位 / stream is not seekable")]
    NotSeekable,

    /// 请求的格式转换不被支持
    #[error("不支持的格式转换 / illegal conversion: {0}")]
    IllegalConversion(String),

    /// 流已关闭
    #[error("流已关闭 / stream closed")]
    StreamClosed,

    /// 流索引越界
    #[error("流索引越界 / stream index {index} out of range (available: {available})")]
    IndexOutOfRange { index: usize, available: usize },

    /// 原生引擎不可用或句柄无效
    #[error("原生引擎错误 / native engine error: {0}")]
    Engine(String),
}

/// 音频处理操作的标准Result类型
pub type AudioResult<T> = Result<T, AudioError>;

impl From<AudioError> for io::Error {
    fn from(err: AudioError) -> Self {
        match err {
            AudioError::Io(inner) => inner,
            AudioError::NotSeekable => io::Error::new(io::ErrorKind::Unsupported, err),
            AudioError::StreamClosed => io::Error::new(io::ErrorKind::BrokenPipe, err),
            AudioError::InvalidInput(_) | AudioError::IndexOutOfRange { .. } => {
                io::Error::new(io::ErrorKind::InvalidInput, err)
            }
            AudioError::Decoding(_) => io::Error::new(io::ErrorKind::InvalidData, err),
            other => io::Error::other(other),
        }
    }
}

// ==================== 错误转换Helper函数 ====================
// 消除重复的 .map_err(|e| AudioError::XXX(format!(...))) 模式

/// 创建格式错误的helper函数
#[inline]
pub fn format_error<E: fmt::Display>(context: &str, err: E) -> AudioError {
    AudioError::UnsupportedFormat(format!("{context}: {err}"))
}

/// 创建解码错误的helper函数
#[inline]
pub fn decoding_error<E: fmt::Display>(context: &str, err: E) -> AudioError {
    AudioError::Decoding(format!("{context}: {err}"))
}

/// 创建引擎错误的helper函数
#[inline]
pub fn engine_error<E: fmt::Display>(context: &str, err: E) -> AudioError {
    AudioError::Engine(format!("{context}: {err}"))
}

// ==================== 错误分类系统 ====================

/// 错误类别枚举（用于日志与调用方分流处理）
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub enum ErrorCategory {
    /// 格式相关错误（不支持的格式、非法转换等）
    Format,
    /// 解码相关错误（解码器失败、音频数据损坏等）
    Decoding,
    /// I/O相关错误（文件不存在、流已关闭、不可定位等）
    Io,
    /// 其他未分类错误
    Other,
}

impl ErrorCategory {
    /// 从AudioError提取错误类别
    pub fn from_audio_error(e: &AudioError) -> Self {
        match e {
            AudioError::UnsupportedFormat(_) | AudioError::IllegalConversion(_) => Self::Format,
            AudioError::Decoding(_) => Self::Decoding,
            AudioError::Io(_) | AudioError::NotSeekable | AudioError::StreamClosed => Self::Io,
            AudioError::InvalidInput(_)
            | AudioError::IndexOutOfRange { .. }
            | AudioError::Engine(_) => Self::Other,
        }
    }

    /// 获取错误类别的显示名称
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Format => "格式错误",
            Self::Decoding => "解码错误",
            Self::Io => "I/O错误",
            Self::Other => "其他错误",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_conversion_preserves_kind() {
        let err: io::Error = AudioError::NotSeekable.into();
        assert_eq!(err.kind(), io::ErrorKind::Unsupported);

        let err: io::Error = AudioError::Decoding("truncated".into()).into();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);

        let inner = io::Error::new(io::ErrorKind::NotFound, "missing");
        let err: io::Error = AudioError::Io(inner).into();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_error_category() {
        assert_eq!(
            ErrorCategory::from_audio_error(&format_error("probe", "bad header")),
            ErrorCategory::Format
        );
        assert_eq!(
            ErrorCategory::from_audio_error(&decoding_error("fill", "eof")),
            ErrorCategory::Decoding
        );
        assert_eq!(
            ErrorCategory::from_audio_error(&AudioError::StreamClosed),
            ErrorCategory::Io
        );
        assert_eq!(ErrorCategory::Io.display_name(), "I/O错误");
    }

    #[test]
    fn test_helper_messages() {
        let err = engine_error("ffmpeg", "not found");
        assert!(err.to_string().contains("ffmpeg: not found"));
    }
}
