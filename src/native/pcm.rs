//! PCM输出目标与样本打包
//!
//! 引擎把解码后的交错样本按 [`PcmTarget`] 打包为字节：
//! 整数目标走 i32 路径（无损截位），浮点目标走 f64 路径。

use crate::codec::{PcmLayout, SampleKind};
use crate::constants::{SUPPORTED_FLOAT_SIZES, SUPPORTED_PCM_SIZES, defaults};
use crate::error::{AudioError, AudioResult};

use super::ProbeInfo;

/// 解码输出的交错PCM布局
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PcmTarget {
    kind: SampleKind,
    bits: u16,
    big_endian: bool,
}

impl PcmTarget {
    /// 有符号16位小端
    pub const S16LE: PcmTarget = PcmTarget {
        kind: SampleKind::Signed,
        bits: 16,
        big_endian: false,
    };

    /// 校验并创建（整数 8/16/24/32，浮点 32/64）
    pub fn new(kind: SampleKind, bits: u16, big_endian: bool) -> AudioResult<Self> {
        let supported = match kind {
            SampleKind::Signed | SampleKind::Unsigned => SUPPORTED_PCM_SIZES.contains(&bits),
            SampleKind::Float => SUPPORTED_FLOAT_SIZES.contains(&bits),
        };
        if !supported {
            return Err(AudioError::IllegalConversion(format!(
                "不支持的样本格式 / unsupported sample format: {kind:?} {bits} bit"
            )));
        }
        Ok(Self {
            kind,
            bits,
            big_endian: big_endian && bits > 8,
        })
    }

    pub fn from_layout(layout: PcmLayout) -> AudioResult<Self> {
        if layout.planar {
            return Err(AudioError::IllegalConversion(
                "不支持平面布局输出 / planar output is not supported".to_string(),
            ));
        }
        Self::new(layout.kind, layout.bits, layout.big_endian)
    }

    /// 某条音频流的默认输出：线性PCM源保持原布局，其余为有符号小端（位深取源位深或16）
    pub fn default_for(info: &ProbeInfo) -> Self {
        let native = info.pcm_layout().and_then(|layout| {
            Self::from_layout(PcmLayout {
                planar: false,
                ..layout
            })
            .ok()
        });
        if let Some(target) = native {
            return target;
        }
        let bits = info
            .sample_size_bits
            .filter(|bits| SUPPORTED_PCM_SIZES.contains(bits))
            .unwrap_or(defaults::DEFAULT_SAMPLE_SIZE_BITS);
        Self {
            kind: SampleKind::Signed,
            bits,
            big_endian: false,
        }
    }

    #[inline]
    pub fn kind(&self) -> SampleKind {
        self.kind
    }

    #[inline]
    pub fn bits(&self) -> u16 {
        self.bits
    }

    #[inline]
    pub fn is_big_endian(&self) -> bool {
        self.big_endian
    }

    #[inline]
    pub fn bytes_per_sample(&self) -> usize {
        usize::from(self.bits / 8)
    }

    #[inline]
    pub fn is_float(&self) -> bool {
        self.kind == SampleKind::Float
    }

    pub fn layout(&self) -> PcmLayout {
        PcmLayout {
            kind: self.kind,
            bits: self.bits,
            big_endian: self.big_endian,
            planar: false,
        }
    }

    /// FFmpeg原始格式名（`s16le`、`u8`、`f64be`……）
    pub fn ffmpeg_format(&self) -> String {
        let prefix = match self.kind {
            SampleKind::Signed => 's',
            SampleKind::Unsigned => 'u',
            SampleKind::Float => 'f',
        };
        if self.bits == 8 {
            format!("{prefix}8")
        } else {
            let order = if self.big_endian { "be" } else { "le" };
            format!("{prefix}{}{order}", self.bits)
        }
    }

    /// FFmpeg PCM编码器名（`pcm_s16le`……）
    pub fn ffmpeg_codec(&self) -> String {
        format!("pcm_{}", self.ffmpeg_format())
    }

    /// 打包满幅 i32 样本（整数目标按高位截取）
    pub fn encode_i32(&self, samples: &[i32], out: &mut Vec<u8>) {
        out.reserve(samples.len() * self.bytes_per_sample());
        match self.kind {
            SampleKind::Float => {
                for &s in samples {
                    self.push_float(f64::from(s) / 2_147_483_648.0, out);
                }
            }
            SampleKind::Signed | SampleKind::Unsigned => {
                let shift = 32 - u32::from(self.bits);
                for &s in samples {
                    self.push_int(i64::from(s >> shift), out);
                }
            }
        }
    }

    /// 打包 [-1.0, 1.0] 浮点样本
    pub fn encode_f64(&self, samples: &[f64], out: &mut Vec<u8>) {
        out.reserve(samples.len() * self.bytes_per_sample());
        match self.kind {
            SampleKind::Float => {
                for &s in samples {
                    self.push_float(s, out);
                }
            }
            SampleKind::Signed | SampleKind::Unsigned => {
                let full_scale = (1i64 << (self.bits - 1)) as f64;
                let max = (1i64 << (self.bits - 1)) - 1;
                let min = -(1i64 << (self.bits - 1));
                for &s in samples {
                    let v = (s * full_scale).round() as i64;
                    self.push_int(v.clamp(min, max), out);
                }
            }
        }
    }

    fn push_int(&self, signed: i64, out: &mut Vec<u8>) {
        let value = match self.kind {
            SampleKind::Unsigned => signed + (1i64 << (self.bits - 1)),
            _ => signed,
        } as u64;
        let width = self.bytes_per_sample();
        let le = value.to_le_bytes();
        if self.big_endian {
            out.extend(le[..width].iter().rev());
        } else {
            out.extend_from_slice(&le[..width]);
        }
    }

    fn push_float(&self, sample: f64, out: &mut Vec<u8>) {
        match (self.bits, self.big_endian) {
            (32, false) => out.extend_from_slice(&(sample as f32).to_le_bytes()),
            (32, true) => out.extend_from_slice(&(sample as f32).to_be_bytes()),
            (_, false) => out.extend_from_slice(&sample.to_le_bytes()),
            (_, true) => out.extend_from_slice(&sample.to_be_bytes()),
        }
    }
}

impl Default for PcmTarget {
    fn default() -> Self {
        Self::S16LE
    }
}
