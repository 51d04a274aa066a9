//! 音频文件读取器
//!
//! 探测来源、构建文件格式描述并打开对应的流变体。
//! 路径与URL的探测结果保存在LRU缓存中（本地文件以修改时间和大小区分版本）。

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::codec::{CodecKind, Encoding, codec_by_id};
use crate::config::StreamConfig;
use crate::constants::{PROVIDER_NAME, properties};
use crate::error::{AudioError, AudioResult};
use crate::format::{AudioFileFormat, AudioFormat, FileType, Properties, frame_length_from_duration, frame_rate_for};
use crate::native::{EngineRegistry, NativeDecoder, PcmTarget, ProbeInfo, Source};
use crate::stream::{AudioInputStream, StreamSetup, open_stream};

/// 一次探测的结果：负责解码的引擎 + 每条音频流的描述
struct ProbeRecord {
    engine: Arc<dyn NativeDecoder>,
    infos: Vec<ProbeInfo>,
    formats: Vec<AudioFileFormat>,
}

pub struct AudioFileReader {
    config: StreamConfig,
    registry: EngineRegistry,
    cache: Option<Mutex<LruCache<String, Arc<ProbeRecord>>>>,
}

impl AudioFileReader {
    /// 按配置创建（引擎偏好、缓冲区与缓存容量）
    pub fn new(config: StreamConfig) -> AudioResult<Self> {
        let registry = EngineRegistry::from_config(&config);
        Self::with_registry(config, registry)
    }

    /// 使用自定义引擎注册表
    pub fn with_registry(config: StreamConfig, registry: EngineRegistry) -> AudioResult<Self> {
        config.validate()?;
        let cache = NonZeroUsize::new(config.cache_capacity).map(|cap| Mutex::new(LruCache::new(cap)));
        Ok(Self {
            config,
            registry,
            cache,
        })
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn registry(&self) -> &EngineRegistry {
        &self.registry
    }

    /// 全部音频流的文件格式
    pub fn audio_file_formats(&self, source: &Source) -> AudioResult<Vec<AudioFileFormat>> {
        Ok(self.probe(source)?.formats.clone())
    }

    /// 第一条音频流的文件格式
    pub fn audio_file_format(&self, source: &Source) -> AudioResult<AudioFileFormat> {
        let record = self.probe(source)?;
        record
            .formats
            .first()
            .cloned()
            .ok_or_else(|| AudioError::UnsupportedFormat("未找到音频轨道 / no audio track".to_string()))
    }

    /// 打开第一条音频流
    pub fn audio_input_stream(&self, source: &Source) -> AudioResult<AudioInputStream> {
        self.audio_input_stream_at(source, 0)
    }

    /// 打开指定序号的音频流
    pub fn audio_input_stream_at(&self, source: &Source, stream_index: usize) -> AudioResult<AudioInputStream> {
        let record = self.probe(source)?;
        let available = record.formats.len();
        let (file_format, info) = record
            .formats
            .get(stream_index)
            .zip(record.infos.get(stream_index))
            .ok_or(AudioError::IndexOutOfRange {
                index: stream_index,
                available,
            })?;

        let setup = StreamSetup {
            stream_index,
            format: file_format.format().clone(),
            output: PcmTarget::default_for(info),
            buffer_capacity: self.config.buffer_capacity,
        };
        let stream = open_stream(Arc::clone(&record.engine), source, setup)?;
        info!(
            ?source,
            stream_index,
            engine = record.engine.name(),
            format = %file_format.format(),
            "音频流已打开 / audio stream opened"
        );
        Ok(AudioInputStream::new(stream, file_format.frame_length()))
    }

    fn probe(&self, source: &Source) -> AudioResult<Arc<ProbeRecord>> {
        if source.is_drm_protected() {
            return Err(AudioError::UnsupportedFormat(format!(
                "DRM保护的文件不受支持 / DRM protected content: {source:?}"
            )));
        }
        if let Source::File(path) = source {
            let metadata = std::fs::metadata(path)?;
            if !metadata.is_file() {
                return Err(AudioError::InvalidInput(format!(
                    "不是文件 / not a file: {}",
                    path.display()
                )));
            }
        }

        let key = cache_key(source);
        if let (Some(cache), Some(key)) = (&self.cache, &key) {
            if let Some(record) = cache.lock().get(key) {
                debug!(key, "探测缓存命中 / probe cache hit");
                return Ok(Arc::clone(record));
            }
        }

        let probed = self.registry.probe(source)?;
        let first = probed
            .streams
            .first()
            .ok_or_else(|| AudioError::UnsupportedFormat("未找到音频轨道 / no audio track".to_string()))?;
        if !first.is_plausible() {
            return Err(AudioError::UnsupportedFormat(format!(
                "探测结果不可信 / implausible audio format: {source:?}"
            )));
        }

        let formats = probed
            .streams
            .iter()
            .map(|info| file_format_for(source, info))
            .collect();
        let record = Arc::new(ProbeRecord {
            engine: probed.engine,
            infos: probed.streams,
            formats,
        });

        if let (Some(cache), Some(key)) = (&self.cache, key) {
            cache.lock().put(key, Arc::clone(&record));
        }
        Ok(record)
    }
}

impl Default for AudioFileReader {
    fn default() -> Self {
        let config = StreamConfig::default();
        Self {
            registry: EngineRegistry::from_config(&config),
            cache: NonZeroUsize::new(config.cache_capacity).map(|cap| Mutex::new(LruCache::new(cap))),
            config,
        }
    }
}

/// 缓存键：URL原样；本地文件附带修改时间和大小
fn cache_key(source: &Source) -> Option<String> {
    match source {
        Source::Url(url) => Some(url.clone()),
        Source::File(path) => {
            let metadata = std::fs::metadata(path).ok()?;
            let modified = metadata.modified().ok()?;
            Some(format!("{}|{modified:?}|{}", path.display(), metadata.len()))
        }
        Source::Bytes(_) | Source::Reader(_) => None,
    }
}

/// 由探测结果构建文件格式描述
fn file_format_for(source: &Source, info: &ProbeInfo) -> AudioFileFormat {
    let codec = codec_by_id(info.codec);
    let pcm_like = codec.is_some_and(|c| c.is_pcm() || c.kind == CodecKind::Companded);

    // 线性PCM使用通用PCM族编码 + 位深度/字节序，其余使用具体编解码器
    let encoding = match codec.and_then(|c| c.pcm_layout()) {
        Some(layout) => Encoding::pcm(layout.kind),
        None => Encoding::from_id(info.codec),
    };

    let sample_rate = info.sample_rate.map(|rate| rate as f32);
    let frame_rate = frame_rate_for(info.codec, sample_rate, info.frame_rate);
    let frame_size = info.frame_size.or_else(|| {
        if !pcm_like {
            return None;
        }
        let channels = u32::from(info.channels?);
        let bits = u32::from(info.sample_size_bits?);
        Some(channels * bits.div_ceil(8))
    });

    let mut format_properties = Properties::new();
    format_properties.insert(properties::PROVIDER, PROVIDER_NAME);
    if let Some(bitrate) = info.bitrate {
        format_properties.insert(properties::BITRATE, bitrate);
    }
    if let Some(vbr) = info.vbr {
        format_properties.insert(properties::VBR, vbr);
    }

    let format = AudioFormat::new(
        encoding,
        sample_rate,
        info.sample_size_bits,
        info.channels,
        frame_size,
        frame_rate,
        info.big_endian,
    )
    .with_properties(format_properties);

    let file_type = source
        .location()
        .and_then(|location| FileType::from_location(&location))
        .unwrap_or_else(|| FileType::from_codec(info.codec));

    let frame_length = info.total_frames.or_else(|| {
        let rate = sample_rate?;
        frame_length_from_duration(rate, info.duration_micros?)
    });

    let mut file_properties = info.tags.clone();
    if let Some(duration) = info.duration_micros {
        file_properties.insert(properties::DURATION, duration);
    }
    if let Some(bitrate) = info.bitrate {
        file_properties.insert(properties::BITRATE, bitrate);
    }

    AudioFileFormat::new(file_type, format, frame_length, source.byte_length()).with_properties(file_properties)
}
