//! 运行配置
//!
//! 缓冲区容量、探测缓存、引擎选择和外部工具路径。
//! 默认值来自 [`crate::constants::defaults`]，可通过 `NATIVE_AUDIO_*` 环境变量覆盖，
//! 也可以用serde从JSON等格式加载。

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{defaults, env};
use crate::error::{AudioError, AudioResult};

/// 原生引擎偏好
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnginePreference {
    /// 先尝试Symphonia，失败后回退到FFmpeg（若可用）
    #[default]
    Auto,
    /// 仅使用Symphonia
    Symphonia,
    /// 仅使用FFmpeg子进程
    Ffmpeg,
}

impl FromStr for EnginePreference {
    type Err = AudioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "symphonia" => Ok(Self::Symphonia),
            "ffmpeg" => Ok(Self::Ffmpeg),
            other => Err(AudioError::InvalidInput(format!(
                "未知引擎 / unknown engine: {other}"
            ))),
        }
    }
}

/// 流与探测配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// 引擎偏好
    pub engine: EnginePreference,
    /// 原生缓冲区初始容量（字节）
    pub buffer_capacity: usize,
    /// 探测结果缓存条目数，0表示禁用缓存
    pub cache_capacity: usize,
    /// 任意字节流探测预读上限（字节）
    pub probe_read_limit: usize,
    /// ffmpeg可执行文件路径（None时在PATH中查找）
    pub ffmpeg_path: Option<PathBuf>,
    /// ffprobe可执行文件路径（None时在PATH中查找）
    pub ffprobe_path: Option<PathBuf>,
    /// HTTP请求超时（秒）
    pub http_timeout_secs: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            engine: EnginePreference::Auto,
            buffer_capacity: defaults::NATIVE_BUFFER_CAPACITY,
            cache_capacity: defaults::PROBE_CACHE_CAPACITY,
            probe_read_limit: defaults::PROBE_READ_LIMIT,
            ffmpeg_path: None,
            ffprobe_path: None,
            http_timeout_secs: defaults::HTTP_TIMEOUT_SECS,
        }
    }
}

impl StreamConfig {
    /// 从环境变量加载配置（未设置的项使用默认值）
    pub fn from_env() -> AudioResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源加载配置
    ///
    /// 便于测试时注入变量而不修改进程环境
    pub fn from_lookup<F>(lookup: F) -> AudioResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(env::ENGINE) {
            config.engine = value.parse()?;
        }
        if let Some(value) = lookup(env::BUFFER_CAPACITY) {
            config.buffer_capacity = parse_number(env::BUFFER_CAPACITY, &value)?;
        }
        if let Some(value) = lookup(env::CACHE_CAPACITY) {
            config.cache_capacity = parse_number(env::CACHE_CAPACITY, &value)?;
        }
        if let Some(value) = lookup(env::PROBE_LIMIT) {
            config.probe_read_limit = parse_number(env::PROBE_LIMIT, &value)?;
        }
        if let Some(value) = lookup(env::FFMPEG_PATH) {
            config.ffmpeg_path = Some(PathBuf::from(value));
        }
        if let Some(value) = lookup(env::FFPROBE_PATH) {
            config.ffprobe_path = Some(PathBuf::from(value));
        }
        if let Some(value) = lookup(env::HTTP_TIMEOUT) {
            config.http_timeout_secs = parse_number(env::HTTP_TIMEOUT, &value)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// 校验配置合法性
    pub fn validate(&self) -> AudioResult<()> {
        if self.buffer_capacity == 0 {
            return Err(AudioError::InvalidInput(
                "缓冲区容量必须大于0 / buffer capacity must be positive".to_string(),
            ));
        }
        if self.probe_read_limit == 0 {
            return Err(AudioError::InvalidInput(
                "探测预读上限必须大于0 / probe read limit must be positive".to_string(),
            ));
        }
        Ok(())
    }

    #[inline]
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// ffmpeg命令（配置路径优先）
    pub fn ffmpeg_command(&self) -> PathBuf {
        self.ffmpeg_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(platform_binary("ffmpeg")))
    }

    /// ffprobe命令（配置路径优先）
    pub fn ffprobe_command(&self) -> PathBuf {
        self.ffprobe_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(platform_binary("ffprobe")))
    }
}

fn platform_binary(name: &str) -> String {
    if cfg!(target_os = "windows") {
        format!("{name}.exe")
    } else {
        name.to_string()
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> AudioResult<T> {
    value.trim().parse().map_err(|_| {
        AudioError::InvalidInput(format!("{key} 不是合法数字 / not a number: {value}"))
    })
}
