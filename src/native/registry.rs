//! 引擎注册表
//!
//! 按优先级排列的解码引擎列表：探测时依次尝试，第一个成功的引擎负责之后的解码。

use std::sync::Arc;

use tracing::{debug, warn};

use super::{FfmpegEngine, NativeDecoder, ProbeInfo, Source, SymphoniaEngine};
use crate::config::{EnginePreference, StreamConfig};
use crate::error::{AudioError, AudioResult};

/// 探测成功的引擎及其探测结果
pub struct ProbedSource {
    pub engine: Arc<dyn NativeDecoder>,
    pub streams: Vec<ProbeInfo>,
}

#[derive(Clone)]
pub struct EngineRegistry {
    engines: Vec<Arc<dyn NativeDecoder>>,
}

impl EngineRegistry {
    /// 使用自定义引擎列表（顺序即优先级）
    pub fn new(engines: Vec<Arc<dyn NativeDecoder>>) -> Self {
        Self { engines }
    }

    /// 按配置的引擎偏好构建
    pub fn from_config(config: &StreamConfig) -> Self {
        let symphonia = || -> Arc<dyn NativeDecoder> { Arc::new(SymphoniaEngine::new(config)) };
        let ffmpeg = || -> Arc<dyn NativeDecoder> { Arc::new(FfmpegEngine::new(config)) };

        let engines = match config.engine {
            EnginePreference::Auto => vec![symphonia(), ffmpeg()],
            EnginePreference::Symphonia => vec![symphonia()],
            EnginePreference::Ffmpeg => vec![ffmpeg()],
        };
        Self { engines }
    }

    pub fn engines(&self) -> &[Arc<dyn NativeDecoder>] {
        &self.engines
    }

    /// 依次探测，返回第一个成功的引擎
    ///
    /// 格式无法识别或引擎不可用时尝试下一个引擎；I/O错误立即返回。
    pub fn probe(&self, source: &Source) -> AudioResult<ProbedSource> {
        let mut last_error = None;

        for engine in &self.engines {
            if !engine.can_open(source) {
                debug!(engine = engine.name(), ?source, "引擎无法处理该来源 / engine skipped");
                continue;
            }
            match engine.probe(source) {
                Ok(streams) => {
                    debug!(engine = engine.name(), streams = streams.len(), "探测成功 / probe succeeded");
                    return Ok(ProbedSource {
                        engine: Arc::clone(engine),
                        streams,
                    });
                }
                Err(e @ AudioError::Io(_)) => return Err(e),
                Err(e) => {
                    warn!(engine = engine.name(), "探测失败，尝试下一个引擎 / probe failed: {e}");
                    last_error = Some(e);
                }
            }
        }

        Err(match last_error {
            Some(AudioError::Engine(message)) | Some(AudioError::Decoding(message)) => {
                AudioError::UnsupportedFormat(message)
            }
            Some(e) => e,
            None => AudioError::UnsupportedFormat(format!(
                "没有可处理该来源的引擎 / no engine can open {source:?}"
            )),
        })
    }
}

impl Default for EngineRegistry {
    fn default() -> Self {
        Self::from_config(&StreamConfig::default())
    }
}

impl std::fmt::Debug for EngineRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.engines.iter().map(|e| e.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_order() {
        let registry = EngineRegistry::default();
        let names: Vec<&str> = registry.engines().iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["symphonia", "ffmpeg"]);

        let config = StreamConfig {
            engine: EnginePreference::Symphonia,
            ..Default::default()
        };
        assert_eq!(EngineRegistry::from_config(&config).engines().len(), 1);
    }

    #[test]
    fn test_empty_registry_is_unsupported() {
        let registry = EngineRegistry::new(Vec::new());
        let err = registry.probe(&Source::bytes(vec![1u8, 2, 3])).err();
        assert!(matches!(err, Some(AudioError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let config = StreamConfig {
            engine: EnginePreference::Symphonia,
            ..Default::default()
        };
        let registry = EngineRegistry::from_config(&config);
        let err = registry
            .probe(&Source::file("/definitely/not/here.wav"))
            .err();
        assert!(matches!(err, Some(AudioError::Io(_))));
    }
}
