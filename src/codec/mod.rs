//! 编解码器标识与编码注册表
//!
//! 进程级只读静态表：编解码器id ↔ 名称双向映射（在已知集合内一一对应），
//! 以及用于格式协商的 [`Encoding`] 包装。索引在首次访问时构建一次，之后只读，
//! 可被多个流并发查询。

mod encoding;
mod table;

pub use encoding::Encoding;

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

/// 编解码器标识（与FFmpeg AVCodecID数值兼容）
///
/// 未知id同样可以表示，只是查不到名称。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CodecId(pub u32);

impl CodecId {
    /// 四字符标签形式（`0x4f505553` → `"OPUS"`），不可打印字符时返回None
    pub fn fourcc(&self) -> Option<String> {
        let bytes = self.0.to_be_bytes();
        if bytes.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
            Some(bytes.iter().map(|b| *b as char).collect())
        } else {
            None
        }
    }

    /// 显示标签：已知名称 > 四字符标签 > 十六进制
    pub fn label(&self) -> String {
        match codec_by_id(*self) {
            Some(info) => info.name.to_string(),
            None => self.fourcc().unwrap_or_else(|| format!("{:#x}", self.0)),
        }
    }
}

impl fmt::Display for CodecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// 样本数值类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleKind {
    /// 有符号整数
    Signed,
    /// 无符号整数
    Unsigned,
    /// 浮点
    Float,
}

/// 线性PCM的内存布局
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PcmLayout {
    pub kind: SampleKind,
    pub bits: u16,
    pub big_endian: bool,
    pub planar: bool,
}

impl PcmLayout {
    #[inline]
    pub fn bytes_per_sample(&self) -> u16 {
        self.bits / 8
    }
}

/// 编解码器类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodecKind {
    /// 固定位深度/字节序/符号的线性PCM
    LinearPcm(PcmLayout),
    /// 通用PCM族（位深度和字节序由格式描述决定）
    PcmFamily(SampleKind),
    /// A-law / µ-law 压扩编码
    Companded,
    /// 其他PCM变体（DVD、Blu-ray等打包格式）
    OtherPcm,
    /// 压缩编码（有损或无损）
    Compressed,
}

/// 编解码器静态描述
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecInfo {
    pub id: CodecId,
    /// 规范名称（FFmpeg短名）
    pub name: &'static str,
    pub description: &'static str,
    pub kind: CodecKind,
}

impl CodecInfo {
    /// 是否为PCM类编码（线性PCM、通用PCM族或其他PCM变体）
    pub fn is_pcm(&self) -> bool {
        matches!(
            self.kind,
            CodecKind::LinearPcm(_) | CodecKind::PcmFamily(_) | CodecKind::OtherPcm
        )
    }

    pub fn pcm_layout(&self) -> Option<PcmLayout> {
        match self.kind {
            CodecKind::LinearPcm(layout) => Some(layout),
            _ => None,
        }
    }

    /// 样本类型（线性PCM或通用PCM族）
    pub fn sample_kind(&self) -> Option<SampleKind> {
        match self.kind {
            CodecKind::LinearPcm(layout) => Some(layout.kind),
            CodecKind::PcmFamily(kind) => Some(kind),
            _ => None,
        }
    }
}

struct CodecIndex {
    by_id: HashMap<CodecId, &'static CodecInfo>,
    by_name: HashMap<&'static str, &'static CodecInfo>,
}

fn index() -> &'static CodecIndex {
    static INDEX: OnceLock<CodecIndex> = OnceLock::new();
    INDEX.get_or_init(|| {
        let mut by_id = HashMap::with_capacity(table::CODECS.len());
        let mut by_name = HashMap::with_capacity(table::CODECS.len());
        for info in table::CODECS {
            by_id.insert(info.id, info);
            by_name.insert(info.name, info);
        }
        CodecIndex { by_id, by_name }
    })
}

/// 全部已知编解码器（表顺序）
pub fn all_codecs() -> &'static [CodecInfo] {
    table::CODECS
}

/// 按id查找
pub fn codec_by_id(id: CodecId) -> Option<&'static CodecInfo> {
    index().by_id.get(&id).copied()
}

/// 按名称查找（忽略ASCII大小写）
pub fn codec_by_name(name: &str) -> Option<&'static CodecInfo> {
    let idx = index();
    idx.by_name
        .get(name)
        .or_else(|| idx.by_name.get(name.to_ascii_lowercase().as_str()))
        .copied()
}

/// 按样本类型、位深度和字节序查找具体的交错线性PCM编解码器
///
/// 8位样本没有字节序之分，`big_endian` 被忽略。
pub fn pcm_codec(kind: SampleKind, bits: u16, big_endian: bool) -> Option<&'static CodecInfo> {
    let big_endian = big_endian && bits > 8;
    table::CODECS.iter().find(|info| {
        info.pcm_layout().is_some_and(|layout| {
            layout.kind == kind
                && layout.bits == bits
                && layout.big_endian == big_endian
                && !layout.planar
        })
    })
}

/// 已知id常量（代码中直接引用的部分）
pub mod ids {
    use super::CodecId;

    pub const PCM_SIGNED: CodecId = CodecId(super::table::PCM_SIGNED_ID);
    pub const PCM_UNSIGNED: CodecId = CodecId(super::table::PCM_UNSIGNED_ID);
    pub const PCM_FLOAT: CodecId = CodecId(super::table::PCM_FLOAT_ID);

    pub const PCM_S16LE: CodecId = CodecId(0x10000);
    pub const PCM_S16BE: CodecId = CodecId(0x10001);
    pub const PCM_U8: CodecId = CodecId(0x10005);
    pub const PCM_MULAW: CodecId = CodecId(0x10006);
    pub const PCM_ALAW: CodecId = CodecId(0x10007);
    pub const PCM_S24LE: CodecId = CodecId(0x1000c);
    pub const PCM_F32LE: CodecId = CodecId(0x10015);

    pub const MP2: CodecId = CodecId(0x15000);
    pub const MP3: CodecId = CodecId(0x15001);
    pub const AAC: CodecId = CodecId(0x15002);
    pub const AC3: CodecId = CodecId(0x15003);
    pub const VORBIS: CodecId = CodecId(0x15005);
    pub const FLAC: CodecId = CodecId(0x1500c);
    pub const ALAC: CodecId = CodecId(0x15010);
    pub const MP1: CodecId = CodecId(0x1502b);
    pub const OPUS: CodecId = CodecId(0x4f505553);
}
