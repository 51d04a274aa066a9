//! 预解复用编解码流
//!
//! 包装一条已经打开的流，按目标PCM格式重新配置原生输出，不再重复探测容器。
//! 只允许改变位深度、字节序和符号；声道数与采样率必须与源一致。

use std::io::{self, Read};

use tracing::debug;

use super::{BufferedDecodeStream, TimeUnit};
use crate::constants::{PROVIDER_NAME, defaults, properties};
use crate::error::{AudioError, AudioResult};
use crate::format::AudioFormat;
use crate::native::{FillStatus, HandleCloser, PcmTarget};

/// 解析目标格式：未指定的采样率、声道数、位深度取源的值
///
/// 返回完整的目标格式与对应的原生输出布局；不可达时返回 `IllegalConversion`。
pub fn resolve_target(target: &AudioFormat, source: &AudioFormat) -> AudioResult<(AudioFormat, PcmTarget)> {
    let illegal = |reason: String| AudioError::IllegalConversion(format!("{source} → {target}: {reason}"));

    if !source.encoding().is_known() {
        return Err(illegal("源编码未知 / unknown source encoding".to_string()));
    }
    let kind = target
        .sample_kind()
        .ok_or_else(|| illegal("目标不是PCM / target is not PCM".to_string()))?;
    if target.concrete_codec().is_some_and(|c| c.pcm_layout().is_some_and(|l| l.planar)) {
        return Err(illegal("不支持平面布局 / planar target".to_string()));
    }

    let channels = match (target.channels(), source.channels()) {
        (Some(t), Some(s)) if t != s => {
            return Err(illegal(format!("声道数不同 / channel count {t} != {s}")));
        }
        (t, s) => t.or(s).filter(|c| *c >= 1),
    }
    .ok_or_else(|| illegal("声道数无效 / invalid channel count".to_string()))?;

    let sample_rate = match (target.sample_rate(), source.sample_rate()) {
        (Some(t), Some(s)) if t != s => {
            return Err(illegal(format!("采样率不同 / sample rate {t} != {s}")));
        }
        (t, s) => t.or(s).filter(|r| *r > 0.0),
    }
    .ok_or_else(|| illegal("采样率未知 / unknown sample rate".to_string()))?;

    // 具体线性PCM编码（如 pcm_s24be）自带位深度和字节序
    let (bits, big_endian) = match target.encoding().info().and_then(|info| info.pcm_layout()) {
        Some(layout) => (layout.bits, layout.big_endian),
        None => (
            target
                .sample_size_bits()
                .or_else(|| source.sample_size_bits())
                .unwrap_or(defaults::DEFAULT_SAMPLE_SIZE_BITS),
            target.is_big_endian(),
        ),
    };
    let output = PcmTarget::new(kind, bits, big_endian)?;

    let frame_size = u32::from(channels) * output.bytes_per_sample() as u32;
    if let Some(requested) = target.frame_size() {
        if requested != frame_size {
            return Err(illegal(format!(
                "帧大小应为 {frame_size} / frame size must be {frame_size}, got {requested}"
            )));
        }
    }

    let format = AudioFormat::pcm(kind, sample_rate, bits, channels, output.is_big_endian())
        .with_properties(source.properties().clone())
        .with_property(properties::PROVIDER, PROVIDER_NAME);
    Ok((format, output))
}

/// 以新PCM布局重新解码的流
pub struct CodecStream {
    inner: Box<dyn BufferedDecodeStream>,
    format: AudioFormat,
}

impl CodecStream {
    /// 包装已打开的流；缓冲区中有旧布局的未读数据时拒绝
    pub fn new(mut inner: Box<dyn BufferedDecodeStream>, target: &AudioFormat) -> AudioResult<Self> {
        let (format, output) = resolve_target(target, inner.format())?;
        inner.set_output(&output)?;
        debug!(from = %inner.format(), to = %format, "编解码流已配置 / codec stream configured");
        Ok(Self { inner, format })
    }

    /// 取回被包装的流
    pub fn into_inner(self) -> Box<dyn BufferedDecodeStream> {
        self.inner
    }
}

impl Read for CodecStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl BufferedDecodeStream for CodecStream {
    fn is_open(&self) -> bool {
        self.inner.is_open()
    }

    fn is_seekable(&self) -> bool {
        self.inner.is_seekable()
    }

    fn format(&self) -> &AudioFormat {
        &self.format
    }

    fn output(&self) -> PcmTarget {
        self.inner.output()
    }

    fn fill(&mut self) -> AudioResult<FillStatus> {
        self.inner.fill()
    }

    fn seek(&mut self, position: u64, unit: TimeUnit) -> AudioResult<()> {
        self.inner.seek(position, unit)
    }

    fn set_output(&mut self, target: &PcmTarget) -> AudioResult<()> {
        let requested = AudioFormat::pcm(
            target.kind(),
            self.format.sample_rate().unwrap_or_default(),
            target.bits(),
            self.format.channels().unwrap_or_default(),
            target.is_big_endian(),
        );
        let (format, output) = resolve_target(&requested, &self.format)?;
        self.inner.set_output(&output)?;
        self.format = format;
        Ok(())
    }

    fn close(&mut self) -> AudioResult<()> {
        self.inner.close()
    }

    fn closer(&self) -> HandleCloser {
        self.inner.closer()
    }
}
