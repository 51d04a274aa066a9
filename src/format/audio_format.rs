//! 音频格式描述
//!
//! 不可变值对象：采样率、位深度、声道数、帧大小、帧率、字节序、编码与属性包。
//! 未指定的数值字段用 `None` 表示。

use std::fmt;

use crate::codec::{CodecInfo, Encoding, PcmLayout, SampleKind, pcm_codec};
use crate::constants::properties;

use super::properties::{Properties, PropertyValue};

/// 音频格式信息
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFormat {
    encoding: Encoding,
    sample_rate: Option<f32>,
    sample_size_bits: Option<u16>,
    channels: Option<u16>,
    frame_size: Option<u32>,
    frame_rate: Option<f32>,
    big_endian: bool,
    /// 显式PCM标记（None时由编码推断）
    pcm: Option<bool>,
    properties: Properties,
}

impl AudioFormat {
    /// 创建新的音频格式（所有字段显式给出）
    pub fn new(
        encoding: Encoding,
        sample_rate: Option<f32>,
        sample_size_bits: Option<u16>,
        channels: Option<u16>,
        frame_size: Option<u32>,
        frame_rate: Option<f32>,
        big_endian: bool,
    ) -> Self {
        Self {
            encoding,
            sample_rate,
            sample_size_bits,
            channels,
            frame_size,
            frame_rate,
            big_endian,
            pcm: None,
            properties: Properties::new(),
        }
    }

    /// 创建线性PCM格式
    ///
    /// 帧大小 = 声道数 × 每样本字节数，帧率 = 采样率。
    pub fn pcm(
        kind: SampleKind,
        sample_rate: f32,
        sample_size_bits: u16,
        channels: u16,
        big_endian: bool,
    ) -> Self {
        let frame_size = u32::from(channels) * u32::from(sample_size_bits.div_ceil(8));
        Self::new(
            Encoding::pcm(kind),
            Some(sample_rate),
            Some(sample_size_bits),
            Some(channels),
            Some(frame_size),
            Some(sample_rate),
            big_endian && sample_size_bits > 8,
        )
    }

    /// 覆盖属性包
    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    /// 追加单个属性
    pub fn with_property(mut self, key: &str, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key, value);
        self
    }

    /// 设置显式PCM标记
    pub fn with_pcm_flag(mut self, pcm: bool) -> Self {
        self.pcm = Some(pcm);
        self
    }

    /// 覆盖帧大小（容器报告的压缩格式包大小可与PCM公式不同）
    pub fn with_frame_size(mut self, frame_size: Option<u32>) -> Self {
        self.frame_size = frame_size;
        self
    }

    #[inline]
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    #[inline]
    pub fn sample_rate(&self) -> Option<f32> {
        self.sample_rate
    }

    #[inline]
    pub fn sample_size_bits(&self) -> Option<u16> {
        self.sample_size_bits
    }

    #[inline]
    pub fn channels(&self) -> Option<u16> {
        self.channels
    }

    #[inline]
    pub fn frame_size(&self) -> Option<u32> {
        self.frame_size
    }

    #[inline]
    pub fn frame_rate(&self) -> Option<f32> {
        self.frame_rate
    }

    #[inline]
    pub fn is_big_endian(&self) -> bool {
        self.big_endian
    }

    /// 是否为PCM（显式标记优先，否则由编码推断）
    pub fn is_pcm(&self) -> bool {
        self.pcm.unwrap_or_else(|| self.encoding.is_pcm())
    }

    /// 显式PCM标记
    pub fn pcm_flag(&self) -> Option<bool> {
        self.pcm
    }

    pub fn sample_kind(&self) -> Option<SampleKind> {
        self.encoding.sample_kind()
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    /// 是否带有本crate的提供方标记
    pub fn has_provider_marker(&self, provider: &str) -> bool {
        self.property(properties::PROVIDER)
            .and_then(PropertyValue::as_str)
            .is_some_and(|p| p == provider)
    }

    /// PCM公式给出的帧大小（声道数 × 每样本字节数）
    pub fn expected_frame_size(&self) -> Option<u32> {
        let channels = u32::from(self.channels?);
        let bits = u32::from(self.sample_size_bits?);
        Some(channels * bits.div_ceil(8))
    }

    /// 交错线性PCM布局
    ///
    /// 通用PCM族编码需要位深度才能确定布局；具体线性PCM编码直接使用表中布局。
    pub fn pcm_layout(&self) -> Option<PcmLayout> {
        let info = self.encoding.info()?;
        if let Some(layout) = info.pcm_layout() {
            return Some(layout);
        }
        let kind = info.sample_kind()?;
        let bits = self.sample_size_bits?;
        Some(PcmLayout {
            kind,
            bits,
            big_endian: self.big_endian && bits > 8,
            planar: false,
        })
    }

    /// 对应的具体PCM编解码器（`pcm_signed` + 16位 + 小端 → `pcm_s16le`）
    pub fn concrete_codec(&self) -> Option<&'static CodecInfo> {
        let layout = self.pcm_layout()?;
        pcm_codec(layout.kind, layout.bits, layout.big_endian)
    }

    /// 格式匹配（未指定字段视为通配）
    ///
    /// 编码必须相同；字节序仅在位深度大于8时比较。
    pub fn matches(&self, other: &AudioFormat) -> bool {
        fn field<T: PartialEq>(a: Option<T>, b: Option<T>) -> bool {
            match (a, b) {
                (Some(a), Some(b)) => a == b,
                _ => true,
            }
        }

        let endian_matters = self.sample_size_bits.is_some_and(|bits| bits > 8);

        self.encoding == other.encoding
            && field(self.channels, other.channels)
            && field(self.sample_rate, other.sample_rate)
            && field(self.sample_size_bits, other.sample_size_bits)
            && field(self.frame_size, other.frame_size)
            && field(self.frame_rate, other.frame_rate)
            && (!endian_matters || self.big_endian == other.big_endian)
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.encoding)?;
        if let Some(rate) = self.sample_rate {
            write!(f, " {rate} Hz")?;
        }
        if let Some(bits) = self.sample_size_bits {
            write!(f, ", {bits} bit")?;
        }
        match self.channels {
            Some(1) => write!(f, ", mono")?,
            Some(2) => write!(f, ", stereo")?,
            Some(n) => write!(f, ", {n} channels")?,
            None => {}
        }
        if let Some(size) = self.frame_size {
            write!(f, ", {size} bytes/frame")?;
        }
        if self.sample_size_bits.is_some_and(|bits| bits > 8) {
            let order = if self.big_endian {
                "big-endian"
            } else {
                "little-endian"
            };
            write!(f, ", {order}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ids;

    #[test]
    fn test_pcm_frame_size_invariant() {
        let format = AudioFormat::pcm(SampleKind::Signed, 44100.0, 24, 2, false);
        assert_eq!(format.frame_size(), Some(6));
        assert_eq!(format.frame_size(), format.expected_frame_size());
        assert_eq!(format.frame_rate(), Some(44100.0));
        assert!(format.is_pcm());
        assert_eq!(format.encoding(), Encoding::PCM_SIGNED);
    }

    #[test]
    fn test_eight_bit_has_no_byte_order() {
        let format = AudioFormat::pcm(SampleKind::Unsigned, 8000.0, 8, 1, true);
        assert!(!format.is_big_endian());
        assert_eq!(format.concrete_codec().map(|c| c.id), Some(ids::PCM_U8));
    }

    #[test]
    fn test_concrete_codec_resolution() {
        let s16be = AudioFormat::pcm(SampleKind::Signed, 48000.0, 16, 2, true);
        assert_eq!(s16be.concrete_codec().map(|c| c.name), Some("pcm_s16be"));

        let mp3 = AudioFormat::new(
            Encoding::from_id(ids::MP3),
            Some(44100.0),
            None,
            Some(2),
            None,
            None,
            false,
        );
        assert!(mp3.concrete_codec().is_none());
        assert!(!mp3.is_pcm());
        assert!(mp3.with_pcm_flag(true).is_pcm());
    }

    #[test]
    fn test_matches_treats_unspecified_as_wildcard() {
        let concrete = AudioFormat::pcm(SampleKind::Signed, 44100.0, 16, 2, false);
        let loose = AudioFormat::new(
            Encoding::PCM_SIGNED,
            None,
            Some(16),
            Some(2),
            None,
            None,
            false,
        );
        assert!(loose.matches(&concrete));
        assert!(concrete.matches(&loose));

        let other_rate = AudioFormat::pcm(SampleKind::Signed, 48000.0, 16, 2, false);
        assert!(!concrete.matches(&other_rate));

        let big = AudioFormat::pcm(SampleKind::Signed, 44100.0, 16, 2, true);
        assert!(!concrete.matches(&big));
    }

    #[test]
    fn test_provider_marker() {
        let format = AudioFormat::pcm(SampleKind::Float, 44100.0, 32, 2, false)
            .with_property(properties::PROVIDER, "native-audio-stream");
        assert!(format.has_provider_marker("native-audio-stream"));
        assert!(!format.has_provider_marker("other"));
    }

    #[test]
    fn test_display() {
        let format = AudioFormat::pcm(SampleKind::Signed, 44100.0, 16, 2, false);
        assert_eq!(
            format.to_string(),
            "pcm_signed 44100 Hz, 16 bit, stereo, 4 bytes/frame, little-endian"
        );
    }
}
