//! 常量和默认配置集中管理
//!
//! 将所有重要常量集中定义，避免"默认值漂移"和重复定义

/// 缓冲与探测相关的默认配置值
pub mod defaults {
    /// 原生缓冲区默认容量（字节）
    ///
    /// 解码器单次填充的数据量上限；填充需要更大空间时缓冲区只增不减
    pub const NATIVE_BUFFER_CAPACITY: usize = 32 * 1024;

    /// 探测结果LRU缓存容量（条目数）
    pub const PROBE_CACHE_CAPACITY: usize = 20;

    /// 任意字节流探测时允许预读的最大字节数
    ///
    /// 探测只能看到这部分前缀，超出的数据保持未消费状态供后续解码
    pub const PROBE_READ_LIMIT: usize = 32 * 1024;

    /// HTTP请求超时（秒）
    pub const HTTP_TIMEOUT_SECS: u64 = 30;

    /// 未检测到位深度的压缩格式，解码输出默认位深度
    pub const DEFAULT_SAMPLE_SIZE_BITS: u16 = 16;
}

/// 格式属性键
pub mod properties {
    /// 时长（微秒）
    pub const DURATION: &str = "duration";
    /// 平均码率（bit/s）
    pub const BITRATE: &str = "bitrate";
    /// 是否为可变码率
    pub const VBR: &str = "vbr";
    /// 提供方标记
    pub const PROVIDER: &str = "provider";
    /// 标题/作者/专辑等元数据
    pub const TITLE: &str = "title";
    pub const AUTHOR: &str = "author";
    pub const ALBUM: &str = "album";
    pub const DATE: &str = "date";
    pub const COMMENT: &str = "comment";
    pub const COPYRIGHT: &str = "copyright";
}

/// 提供方标记值
///
/// 只有带此标记的源格式才会被格式转换提供方接受
pub const PROVIDER_NAME: &str = "native-audio-stream";

/// DRM保护容器扩展名（直接拒绝，不尝试解码）
pub const DRM_PROTECTED_EXTENSIONS: &[&str] = &["m4p"];

/// 合法的PCM样本位深度
pub const SUPPORTED_PCM_SIZES: &[u16] = &[8, 16, 24, 32];

/// 合法的浮点样本位深度
pub const SUPPORTED_FLOAT_SIZES: &[u16] = &[32, 64];

/// 环境变量名称（配置覆盖）
pub mod env {
    pub const ENGINE: &str = "NATIVE_AUDIO_ENGINE";
    pub const BUFFER_CAPACITY: &str = "NATIVE_AUDIO_BUFFER_CAPACITY";
    pub const CACHE_CAPACITY: &str = "NATIVE_AUDIO_CACHE_CAPACITY";
    pub const PROBE_LIMIT: &str = "NATIVE_AUDIO_PROBE_LIMIT";
    pub const FFMPEG_PATH: &str = "NATIVE_AUDIO_FFMPEG";
    pub const FFPROBE_PATH: &str = "NATIVE_AUDIO_FFPROBE";
    pub const HTTP_TIMEOUT: &str = "NATIVE_AUDIO_HTTP_TIMEOUT";
}
