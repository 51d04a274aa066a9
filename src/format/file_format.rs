//! 文件格式描述
//!
//! 在 [`AudioFormat`] 之上附加容器级信息：文件类型、总帧数、字节长度和属性包。

use std::borrow::Cow;
use std::fmt;

use crate::codec::{CodecId, CodecKind, codec_by_id, ids};
use crate::constants::properties;

use super::audio_format::AudioFormat;
use super::properties::{Properties, PropertyValue};

/// 文件类型（名称 + 典型扩展名）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileType {
    name: Cow<'static, str>,
    extension: Cow<'static, str>,
}

impl FileType {
    pub const WAVE: FileType = FileType::fixed("WAVE", "wav");
    pub const AIFF: FileType = FileType::fixed("AIFF", "aif");
    pub const AIFC: FileType = FileType::fixed("AIFF-C", "aifc");
    pub const AU: FileType = FileType::fixed("AU", "au");
    pub const AAC: FileType = FileType::fixed("AAC", "m4a");
    /// DRM保护的AAC（仅用于识别，不会被打开）
    pub const PROTECTED_AAC: FileType = FileType::fixed("AAC", "m4p");
    pub const MP1: FileType = FileType::fixed("MP1", "mp1");
    pub const MP2: FileType = FileType::fixed("MP2", "mp2");
    pub const MP3: FileType = FileType::fixed("MP3", "mp3");
    pub const MP4: FileType = FileType::fixed("MP4", "mp4");
    pub const MPEG4_VIDEO: FileType = FileType::fixed("MPEG-4 Video", "m4v");
    pub const FLAC: FileType = FileType::fixed("Flac", "flac");
    pub const VORBIS: FileType = FileType::fixed("Vorbis", "ogg");
    pub const OPUS: FileType = FileType::fixed("Opus", "opus");

    const fn fixed(name: &'static str, extension: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(name),
            extension: Cow::Borrowed(extension),
        }
    }

    pub fn new(name: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            name: Cow::Owned(name.into()),
            extension: Cow::Owned(extension.into()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// 由扩展名判断（未知扩展名生成 `EXT`/`ext` 类型）
    pub fn from_extension(extension: &str) -> Self {
        let ext = extension.to_ascii_lowercase();
        let known = [
            Self::AAC,
            Self::PROTECTED_AAC,
            Self::MPEG4_VIDEO,
            Self::MP3,
            Self::WAVE,
            Self::AIFF,
            Self::AIFC,
            Self::MP4,
            Self::FLAC,
            Self::VORBIS,
            Self::OPUS,
            Self::AU,
        ];
        if let Some(found) = known.into_iter().find(|t| t.extension == ext.as_str()) {
            return found;
        }
        match ext.as_str() {
            "aiff" => Self::AIFF,
            "wave" => Self::WAVE,
            _ => Self::new(ext.to_ascii_uppercase(), ext),
        }
    }

    /// 由编解码器判断（没有文件名可用时）
    pub fn from_codec(codec: CodecId) -> Self {
        match codec {
            ids::MP1 => Self::MP1,
            ids::MP2 => Self::MP2,
            ids::MP3 => Self::MP3,
            ids::FLAC => Self::FLAC,
            ids::VORBIS => Self::VORBIS,
            ids::OPUS => Self::OPUS,
            other => {
                let label = other.label();
                Self::new(label.to_ascii_uppercase(), label)
            }
        }
    }

    /// 由路径或URL判断；没有扩展名时返回None
    pub fn from_location(location: &str) -> Option<Self> {
        extension_of(location).map(Self::from_extension)
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// 取路径/URL最后一段的扩展名（忽略查询串和片段）
pub fn extension_of(location: &str) -> Option<&str> {
    let path = location
        .split(['?', '#'])
        .next()
        .unwrap_or(location);
    let last_segment = path.rsplit(['/', '\\']).next().unwrap_or(path);
    let (_, ext) = last_segment.rsplit_once('.')?;
    if ext.is_empty() { None } else { Some(ext) }
}

/// 由采样率和微秒时长计算总帧数（四舍五入）
pub fn frame_length_from_duration(sample_rate: f32, duration_micros: i64) -> Option<u64> {
    if sample_rate <= 0.0 || duration_micros < 0 {
        return None;
    }
    Some((f64::from(sample_rate) * duration_micros as f64 / 1_000_000.0).round() as u64)
}

/// 决定帧率：容器给出时直接使用；PCM、A-law、µ-law 的帧率等于采样率；其他未指定
pub fn frame_rate_for(codec: CodecId, sample_rate: Option<f32>, reported: Option<f32>) -> Option<f32> {
    if reported.is_some() {
        return reported;
    }
    let info = codec_by_id(codec)?;
    if info.is_pcm() || info.kind == CodecKind::Companded {
        sample_rate
    } else {
        None
    }
}

/// 音频文件格式
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFileFormat {
    file_type: FileType,
    format: AudioFormat,
    frame_length: Option<u64>,
    byte_length: Option<u64>,
    properties: Properties,
}

impl AudioFileFormat {
    pub fn new(
        file_type: FileType,
        format: AudioFormat,
        frame_length: Option<u64>,
        byte_length: Option<u64>,
    ) -> Self {
        Self {
            file_type,
            format,
            frame_length,
            byte_length,
            properties: Properties::new(),
        }
    }

    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    pub fn file_type(&self) -> &FileType {
        &self.file_type
    }

    pub fn format(&self) -> &AudioFormat {
        &self.format
    }

    /// 总帧数（未知时None）
    pub fn frame_length(&self) -> Option<u64> {
        self.frame_length
    }

    /// 文件字节长度（流式来源未知时None）
    pub fn byte_length(&self) -> Option<u64> {
        self.byte_length
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    /// 时长（微秒）
    pub fn duration_micros(&self) -> Option<i64> {
        self.property(properties::DURATION)
            .and_then(PropertyValue::as_i64)
    }

    /// 平均码率（bit/s）
    pub fn bitrate(&self) -> Option<i64> {
        self.format
            .property(properties::BITRATE)
            .or_else(|| self.property(properties::BITRATE))
            .and_then(PropertyValue::as_i64)
    }
}
