//! 格式转换提供方
//!
//! 协商只依赖静态编解码器表和探测到的源格式，不调用原生层。
//! 只提供本crate产生的源格式（带提供方标记）到同声道数、同采样率PCM的转换。

use tracing::debug;

use crate::codec::{Encoding, SampleKind, all_codecs};
use crate::constants::{PROVIDER_NAME, SUPPORTED_FLOAT_SIZES, SUPPORTED_PCM_SIZES, defaults};
use crate::error::{AudioError, AudioResult};
use crate::format::AudioFormat;
use crate::stream::{AudioInputStream, CodecStream, resolve_target};

/// 可作为转换目标的编码
pub const TARGET_ENCODINGS: [Encoding; 3] = [Encoding::PCM_SIGNED, Encoding::PCM_UNSIGNED, Encoding::PCM_FLOAT];

#[derive(Debug, Clone, Copy, Default)]
pub struct FormatConversionProvider;

impl FormatConversionProvider {
    pub fn new() -> Self {
        Self
    }

    /// 全部已知编解码器都可作为源编码
    pub fn source_encodings(&self) -> Vec<Encoding> {
        all_codecs().iter().map(|info| Encoding::from_id(info.id)).collect()
    }

    pub fn target_encodings(&self) -> &'static [Encoding] {
        &TARGET_ENCODINGS
    }

    /// 源格式可转换到的目标编码
    pub fn target_encodings_for(&self, source: &AudioFormat) -> Vec<Encoding> {
        TARGET_ENCODINGS
            .into_iter()
            .filter(|target| self.is_conversion_supported_encoding(*target, source))
            .collect()
    }

    /// 是否支持转换到某个编码（具体PCM编码按其所属PCM族判断）
    pub fn is_conversion_supported_encoding(&self, target: Encoding, source: &AudioFormat) -> bool {
        if !convertible_source(source) {
            return false;
        }
        TARGET_ENCODINGS.contains(&target.pcm_family())
    }

    /// 是否支持转换到具体目标格式
    pub fn is_conversion_supported(&self, target: &AudioFormat, source: &AudioFormat) -> bool {
        convertible_source(source) && resolve_target(target, source).is_ok()
    }

    /// 不重采样、不重混音即可得到的全部目标格式
    pub fn target_formats(&self, target: Encoding, source: &AudioFormat) -> Vec<AudioFormat> {
        if !self.is_conversion_supported_encoding(target, source) {
            return Vec::new();
        }
        let (Some(channels), Some(rate)) = (source.channels(), source.sample_rate()) else {
            return Vec::new();
        };
        let Some(kind) = target.sample_kind() else {
            return Vec::new();
        };

        let sizes: &[u16] = match kind {
            SampleKind::Signed | SampleKind::Unsigned => SUPPORTED_PCM_SIZES,
            SampleKind::Float => SUPPORTED_FLOAT_SIZES,
        };

        let mut formats = Vec::with_capacity(sizes.len() * 2);
        for &bits in sizes {
            formats.push(AudioFormat::pcm(kind, rate, bits, channels, false));
            if bits > 8 {
                formats.push(AudioFormat::pcm(kind, rate, bits, channels, true));
            }
        }
        formats
    }

    /// 把源流转码为目标格式
    ///
    /// 失败时源流随之关闭。
    pub fn audio_input_stream(&self, target: &AudioFormat, stream: AudioInputStream) -> AudioResult<AudioInputStream> {
        if !convertible_source(stream.format()) {
            return Err(AudioError::IllegalConversion(format!(
                "源格式不是本库产生的 / source format was not produced by {PROVIDER_NAME}: {}",
                stream.format()
            )));
        }
        let frame_length = stream.frame_length();
        let codec = CodecStream::new(stream.into_inner(), target)?;
        debug!(target = %target, "格式转换流已创建 / conversion stream created");
        Ok(AudioInputStream::new(Box::new(codec), frame_length))
    }

    /// 只指定目标编码：位深度取源的位深度（未知时16），采样率与声道数保持不变
    pub fn audio_input_stream_for_encoding(
        &self,
        target: Encoding,
        stream: AudioInputStream,
    ) -> AudioResult<AudioInputStream> {
        let source = stream.format();
        let bits = source
            .sample_size_bits()
            .filter(|bits| *bits > 0)
            .unwrap_or(defaults::DEFAULT_SAMPLE_SIZE_BITS);
        let frame_size = source
            .channels()
            .map(|channels| u32::from(channels) * u32::from(bits.div_ceil(8)));
        let target_format = AudioFormat::new(
            target,
            source.sample_rate(),
            Some(bits),
            source.channels(),
            frame_size,
            source.sample_rate(),
            source.is_big_endian(),
        );
        self.audio_input_stream(&target_format, stream)
    }
}

/// 源格式必须带本crate的提供方标记且编码已知
fn convertible_source(source: &AudioFormat) -> bool {
    source.has_provider_marker(PROVIDER_NAME) && source.encoding().is_known()
}
