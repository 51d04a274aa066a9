//! 编码（用于格式协商的编解码器包装）

use std::fmt;

use super::{CodecId, CodecInfo, SampleKind, codec_by_id, codec_by_name, ids};

/// 编码
///
/// 对编解码器标识的轻量包装；两个编码相等当且仅当其编解码器id相同。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Encoding(CodecId);

impl Encoding {
    /// 通用有符号PCM
    pub const PCM_SIGNED: Encoding = Encoding(ids::PCM_SIGNED);
    /// 通用无符号PCM
    pub const PCM_UNSIGNED: Encoding = Encoding(ids::PCM_UNSIGNED);
    /// 通用浮点PCM
    pub const PCM_FLOAT: Encoding = Encoding(ids::PCM_FLOAT);
    pub const ALAW: Encoding = Encoding(ids::PCM_ALAW);
    pub const ULAW: Encoding = Encoding(ids::PCM_MULAW);

    /// 由id构造（未知id同样合法，只是没有名称）
    #[inline]
    pub const fn from_id(id: CodecId) -> Self {
        Encoding(id)
    }

    /// 由规范名称构造，未知名称返回None
    pub fn from_name(name: &str) -> Option<Self> {
        codec_by_name(name).map(|info| Encoding(info.id))
    }

    /// 指定样本类型对应的通用PCM编码
    pub const fn pcm(kind: SampleKind) -> Self {
        match kind {
            SampleKind::Signed => Self::PCM_SIGNED,
            SampleKind::Unsigned => Self::PCM_UNSIGNED,
            SampleKind::Float => Self::PCM_FLOAT,
        }
    }

    #[inline]
    pub fn id(&self) -> CodecId {
        self.0
    }

    pub fn info(&self) -> Option<&'static CodecInfo> {
        codec_by_id(self.0)
    }

    /// 规范名称（未知编码返回None）
    pub fn name(&self) -> Option<&'static str> {
        self.info().map(|info| info.name)
    }

    /// 是否属于已知集合
    pub fn is_known(&self) -> bool {
        self.info().is_some()
    }

    pub fn is_pcm(&self) -> bool {
        self.info().is_some_and(CodecInfo::is_pcm)
    }

    /// PCM样本类型（线性PCM与通用PCM族有值）
    pub fn sample_kind(&self) -> Option<SampleKind> {
        self.info().and_then(CodecInfo::sample_kind)
    }

    /// 归一化为通用PCM族编码（`pcm_s16le` → `pcm_signed`），非线性PCM原样返回
    pub fn pcm_family(&self) -> Self {
        match self.sample_kind() {
            Some(kind) => Self::pcm(kind),
            None => *self,
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.label())
    }
}
