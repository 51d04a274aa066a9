//! Symphonia进程内解码引擎
//!
//! 纯Rust的探测与解码实现。每个句柄对应一个会话（格式读取器 + 解码器 + 输出布局），
//! 会话保存在按句柄索引的表中；填充时逐包解码并按输出布局打包为字节。

use std::fs::File;
use std::io::{self, Cursor};
use std::time::Duration;

use symphonia::core::audio::{SampleBuffer, SignalSpec};
use symphonia::core::codecs::{self, CODEC_TYPE_NULL, CodecType, Decoder, DecoderOptions};
use symphonia::core::errors::{Error as SymphoniaError, SeekErrorKind};
use symphonia::core::formats::{FormatOptions, FormatReader, SeekMode, SeekTo, Track};
use symphonia::core::io::{MediaSource, MediaSourceStream, ReadOnlySource};
use symphonia::core::meta::{MetadataOptions, MetadataRevision, StandardTagKey};
use symphonia::core::probe::Hint;
use symphonia::core::units::{Time, TimeBase};
use tracing::{debug, trace, warn};

use super::{
    FillStatus, NativeBuffer, NativeDecoder, PcmTarget, ProbeInfo, RawHandle, SessionTable, Source,
};
use crate::codec::{CodecId, CodecKind, codec_by_id, codec_by_name, ids};
use crate::config::StreamConfig;
use crate::constants::properties;
use crate::error::{self, AudioError, AudioResult};
use crate::format::Properties;

/// Symphonia解码引擎
pub struct SymphoniaEngine {
    sessions: SessionTable<Session>,
    probe_read_limit: usize,
    #[cfg_attr(not(feature = "http"), allow(dead_code))]
    http_timeout: Duration,
}

impl SymphoniaEngine {
    pub fn new(config: &StreamConfig) -> Self {
        Self {
            sessions: SessionTable::new(),
            probe_read_limit: config.probe_read_limit,
            http_timeout: config.http_timeout(),
        }
    }

    /// 构造媒体源；探测任意字节流时只使用预读前缀，不消费数据
    fn media_source(&self, source: &Source, for_probe: bool) -> AudioResult<(Box<dyn MediaSource>, Hint)> {
        let mut hint = Hint::new();
        if let Some(ext) = source.extension() {
            hint.with_extension(&ext);
        }

        let media: Box<dyn MediaSource> = match source {
            Source::Bytes(data) => Box::new(Cursor::new(data.clone())),
            Source::File(path) => Box::new(File::open(path)?),
            Source::Url(url) => self.open_url(url)?,
            Source::Reader(reader) if for_probe => {
                Box::new(Cursor::new(reader.peek(self.probe_read_limit)?))
            }
            Source::Reader(reader) => Box::new(ReadOnlySource::new(reader.clone())),
        };
        Ok((media, hint))
    }

    #[cfg(feature = "http")]
    fn open_url(&self, url: &str) -> AudioResult<Box<dyn MediaSource>> {
        Ok(Box::new(super::HttpSource::open(url, self.http_timeout)?))
    }

    #[cfg(not(feature = "http"))]
    fn open_url(&self, url: &str) -> AudioResult<Box<dyn MediaSource>> {
        Err(AudioError::UnsupportedFormat(format!(
            "未启用http特性，无法读取URL / http feature disabled: {url}"
        )))
    }

    /// 打开格式读取器，同时返回底层媒体源是否可定位
    fn open_reader(&self, source: &Source) -> AudioResult<(Box<dyn FormatReader>, bool)> {
        let (media, hint) = self.media_source(source, false)?;
        // 网络源的可定位性取决于服务器是否支持Range请求
        let seekable = media.is_seekable();
        let mss = MediaSourceStream::new(media, Default::default());

        let meta_opts = MetadataOptions::default();
        let fmt_opts = FormatOptions::default();

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &fmt_opts, &meta_opts)
            .map_err(map_probe_error)?;
        Ok((probed.format, seekable))
    }
}

impl Default for SymphoniaEngine {
    fn default() -> Self {
        Self::new(&StreamConfig::default())
    }
}

impl NativeDecoder for SymphoniaEngine {
    fn name(&self) -> &'static str {
        "symphonia"
    }

    fn can_open(&self, source: &Source) -> bool {
        !matches!(source, Source::Url(_)) || cfg!(feature = "http")
    }

    fn probe(&self, source: &Source) -> AudioResult<Vec<ProbeInfo>> {
        let (media, hint) = self.media_source(source, true)?;
        // 字节流探测只看到前缀，长度不代表整个来源
        let byte_len = match source {
            Source::Reader(_) => None,
            _ => media.byte_len(),
        };
        let mss = MediaSourceStream::new(media, Default::default());

        let mut probed = symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .map_err(map_probe_error)?;

        let mut tags = Properties::new();
        if let Some(metadata) = probed.metadata.get() {
            if let Some(revision) = metadata.current() {
                collect_tags(revision, &mut tags);
            }
        }
        let mut format = probed.format;
        {
            let metadata = format.metadata();
            if let Some(revision) = metadata.current() {
                collect_tags(revision, &mut tags);
            }
        }

        let infos: Vec<ProbeInfo> = audio_tracks(format.tracks())
            .enumerate()
            .map(|(index, track)| probe_info(index, track, &tags, byte_len))
            .collect();

        if infos.is_empty() {
            return Err(AudioError::UnsupportedFormat(
                "未找到音频轨道 / no audio track".to_string(),
            ));
        }
        debug!(streams = infos.len(), codec = %infos[0].codec, "symphonia探测完成 / probe complete");
        Ok(infos)
    }

    fn open(&self, source: &Source, stream_index: usize, buffer_hint: usize) -> AudioResult<RawHandle> {
        let (reader, seekable) = self.open_reader(source)?;

        let (track_id, info, params) = {
            let tracks: Vec<&Track> = audio_tracks(reader.tracks()).collect();
            let available = tracks.len();
            let track = tracks
                .get(stream_index)
                .ok_or(AudioError::IndexOutOfRange {
                    index: stream_index,
                    available,
                })?;
            (
                track.id,
                probe_info(stream_index, track, &Properties::new(), None),
                track.codec_params.clone(),
            )
        };

        let decoder = symphonia::default::get_codecs()
            .make(&params, &DecoderOptions::default())
            .map_err(|e| error::format_error("创建解码器失败 / cannot create decoder", e))?;

        let sample_rate = params.sample_rate.unwrap_or(0);
        let exact_frames = params
            .n_frames
            .filter(|_| declares_exact_length(info.codec))
            .filter(|_| {
                params
                    .time_base
                    .is_none_or(|tb| tb.numer == 1 && tb.denom == sample_rate)
            });

        let session = Session {
            reader,
            decoder,
            track_id,
            time_base: params.time_base,
            sample_rate,
            target: PcmTarget::default_for(&info),
            seekable,
            exact_frames,
            frame_cursor: ts_delta_to_frames(params.start_ts, params.time_base, sample_rate) as u64,
            skip_until_ts: None,
            ended: false,
            past_end: false,
            int_samples: None,
            float_samples: None,
            scratch: Vec::with_capacity(buffer_hint),
        };

        let handle = self.sessions.insert(session);
        debug!(%handle, stream_index, seekable, codec = %info.codec, "symphonia会话已打开 / session opened");
        Ok(handle)
    }

    fn is_seekable(&self, handle: RawHandle) -> bool {
        self.sessions
            .get(handle)
            .map(|session| session.lock().seekable)
            .unwrap_or(false)
    }

    fn set_output(&self, handle: RawHandle, target: &PcmTarget) -> AudioResult<()> {
        let session = self.sessions.get(handle)?;
        let mut session = session.lock();
        session.target = *target;
        session.scratch.clear();
        Ok(())
    }

    fn fill(&self, handle: RawHandle, buffer: &mut NativeBuffer) -> AudioResult<FillStatus> {
        let session = self.sessions.get(handle)?;
        let mut session = session.lock();
        let status = session.fill(buffer)?;
        trace!(%handle, ?status, "symphonia填充 / fill");
        Ok(status)
    }

    fn seek(&self, handle: RawHandle, micros: i64) -> AudioResult<()> {
        let session = self.sessions.get(handle)?;
        let mut session = session.lock();
        session.seek(micros)
    }

    fn close(&self, handle: RawHandle) -> AudioResult<()> {
        match self.sessions.remove(handle) {
            Some(_) => Ok(()),
            None => Err(AudioError::Engine(format!(
                "无效句柄 / unknown handle {handle}"
            ))),
        }
    }
}

/// 单个解码会话
struct Session {
    reader: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    time_base: Option<TimeBase>,
    sample_rate: u32,
    target: PcmTarget,
    seekable: bool,
    /// 容器声明的精确帧数（用于截断检测）
    exact_frames: Option<u64>,
    /// 已解码数据末尾的帧位置（按实际解码帧数累计）
    frame_cursor: u64,
    /// 定位后需要丢弃的目标时间戳之前的数据
    skip_until_ts: Option<u64>,
    ended: bool,
    past_end: bool,
    int_samples: Option<SampleBuffer<i32>>,
    float_samples: Option<SampleBuffer<f64>>,
    scratch: Vec<u8>,
}

impl Session {
    fn fill(&mut self, buffer: &mut NativeBuffer) -> AudioResult<FillStatus> {
        loop {
            if self.ended {
                return Ok(FillStatus::EndOfStream);
            }

            let packet = match self.reader.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::ResetRequired) => {
                    self.decoder.reset();
                    continue;
                }
                Err(SymphoniaError::IoError(ref e)) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    return self.finish();
                }
                Err(SymphoniaError::IoError(e)) => return Err(AudioError::Io(e)),
                Err(e) => {
                    return Err(error::decoding_error("读取数据包失败 / reading packet failed", e));
                }
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            let ts = packet.ts();

            let decoded = match self.decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(SymphoniaError::IoError(ref e)) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    return self.finish();
                }
                Err(SymphoniaError::IoError(e)) => return Err(AudioError::Io(e)),
                Err(e) => {
                    return Err(error::decoding_error(
                        &format!("解码失败 / decode failed at ts {ts}"),
                        e,
                    ));
                }
            };
            let spec: SignalSpec = *decoded.spec();
            let channels = spec.channels.count();
            let frames = decoded.frames();
            let capacity = decoded.capacity();
            // 包声明的时长可能多于实际数据（末包截断），只信任解码出的帧数
            let packet_start = ts_delta_to_frames(ts, self.time_base, self.sample_rate) as u64;
            self.frame_cursor = packet_start + frames as u64;

            // 定位后：丢弃目标时间之前的帧
            let skip_frames = match self.skip_until_ts {
                Some(target_ts) if target_ts > ts => {
                    let delta = ts_delta_to_frames(target_ts - ts, self.time_base, self.sample_rate);
                    delta.min(frames)
                }
                _ => 0,
            };
            if skip_frames >= frames {
                continue;
            }
            self.skip_until_ts = None;

            self.scratch.clear();
            let start = skip_frames * channels;
            if self.target.is_float() {
                if self
                    .float_samples
                    .as_ref()
                    .is_none_or(|b| b.capacity() < capacity * channels)
                {
                    self.float_samples = Some(SampleBuffer::new(capacity as u64, spec));
                }
                if let Some(samples) = self.float_samples.as_mut() {
                    samples.copy_interleaved_ref(decoded);
                    self.target.encode_f64(&samples.samples()[start..], &mut self.scratch);
                }
            } else {
                if self
                    .int_samples
                    .as_ref()
                    .is_none_or(|b| b.capacity() < capacity * channels)
                {
                    self.int_samples = Some(SampleBuffer::new(capacity as u64, spec));
                }
                if let Some(samples) = self.int_samples.as_mut() {
                    samples.copy_interleaved_ref(decoded);
                    self.target.encode_i32(&samples.samples()[start..], &mut self.scratch);
                }
            }

            if self.scratch.is_empty() {
                continue;
            }
            return Ok(FillStatus::Data(buffer.load(&self.scratch)));
        }
    }

    /// 到达数据末尾：容器声明了精确帧数而实际不足时视为截断
    fn finish(&mut self) -> AudioResult<FillStatus> {
        self.ended = true;
        if let Some(expected) = self.exact_frames {
            if !self.past_end && self.frame_cursor < expected {
                return Err(AudioError::Decoding(format!(
                    "数据被截断 / truncated stream: decoded {} of {expected} frames",
                    self.frame_cursor
                )));
            }
        }
        Ok(FillStatus::EndOfStream)
    }

    fn seek(&mut self, micros: i64) -> AudioResult<()> {
        if !self.seekable {
            return Err(AudioError::NotSeekable);
        }
        if micros < 0 {
            return Err(AudioError::InvalidInput(format!(
                "定位时间不能为负 / negative seek time: {micros}µs"
            )));
        }
        let micros = micros as u64;
        let time = Time::new(micros / 1_000_000, (micros % 1_000_000) as f64 / 1_000_000.0);
        let result = self.reader.seek(
            SeekMode::Accurate,
            SeekTo::Time {
                time,
                track_id: Some(self.track_id),
            },
        );

        match result {
            Ok(seeked) => {
                self.decoder.reset();
                self.skip_until_ts = Some(seeked.required_ts);
                self.frame_cursor =
                    ts_delta_to_frames(seeked.actual_ts, self.time_base, self.sample_rate) as u64;
                self.ended = false;
                self.past_end = false;
                debug!(micros, required_ts = seeked.required_ts, actual_ts = seeked.actual_ts, "symphonia定位 / seek");
                Ok(())
            }
            Err(SymphoniaError::SeekError(SeekErrorKind::OutOfRange)) => {
                // 超出末尾：之后的读取直接返回流结束
                self.ended = true;
                self.past_end = true;
                Ok(())
            }
            Err(SymphoniaError::SeekError(SeekErrorKind::Unseekable))
            | Err(SymphoniaError::SeekError(SeekErrorKind::ForwardOnly)) => Err(AudioError::NotSeekable),
            Err(SymphoniaError::IoError(e)) => Err(AudioError::Io(e)),
            Err(e) => Err(error::decoding_error("定位失败 / seek failed", e)),
        }
    }
}

fn audio_tracks(tracks: &[Track]) -> impl Iterator<Item = &Track> {
    tracks
        .iter()
        .filter(|t| t.codec_params.codec != CODEC_TYPE_NULL)
}

fn map_probe_error(err: SymphoniaError) -> AudioError {
    match err {
        SymphoniaError::IoError(e) if e.kind() != io::ErrorKind::UnexpectedEof => AudioError::Io(e),
        other => error::format_error("格式探测失败 / probe failed", other),
    }
}

fn ts_delta_to_frames(delta: u64, time_base: Option<TimeBase>, sample_rate: u32) -> usize {
    match time_base {
        Some(tb) if !(tb.numer == 1 && tb.denom == sample_rate) && tb.denom != 0 => {
            let seconds = delta as f64 * f64::from(tb.numer) / f64::from(tb.denom);
            (seconds * f64::from(sample_rate)).round() as usize
        }
        _ => delta as usize,
    }
}

/// 容器是否声明精确帧数（PCM与FLAC）
fn declares_exact_length(codec: CodecId) -> bool {
    codec == ids::FLAC
        || codec_by_id(codec).is_some_and(|info| info.is_pcm() || info.kind == CodecKind::Companded)
}

fn probe_info(index: usize, track: &Track, tags: &Properties, byte_len: Option<u64>) -> ProbeInfo {
    let params = &track.codec_params;
    let codec = codec_id_for(params.codec);
    let layout = codec_by_id(codec).and_then(|info| info.pcm_layout());

    let sample_rate = params.sample_rate;
    let channels = params.channels.map(|c| c.count() as u16);
    let sample_size_bits = params
        .bits_per_sample
        .map(|bits| bits as u16)
        .or(layout.map(|l| l.bits));

    let duration_micros = match (params.n_frames, params.time_base, sample_rate) {
        (Some(n), Some(tb), _) => {
            let t = tb.calc_time(n);
            Some(t.seconds as i64 * 1_000_000 + (t.frac * 1_000_000.0).round() as i64)
        }
        (Some(n), None, Some(rate)) if rate > 0 => {
            Some((n as f64 * 1_000_000.0 / f64::from(rate)).round() as i64)
        }
        _ => None,
    };

    let (frame_size, bitrate, vbr) = match (layout, channels, sample_size_bits) {
        (Some(_), Some(ch), Some(bits)) => {
            let frame_size = u32::from(ch) * u32::from(bits).div_ceil(8);
            let bitrate = sample_rate.map(|rate| rate * u32::from(ch) * u32::from(bits));
            (Some(frame_size), bitrate, Some(false))
        }
        _ => {
            let bitrate = match (byte_len, duration_micros) {
                (Some(bytes), Some(us)) if us > 0 => {
                    Some((bytes as f64 * 8.0 * 1_000_000.0 / us as f64).round() as u32)
                }
                _ => None,
            };
            (None, bitrate, None)
        }
    };

    let mut tags = tags.clone();
    if let Some(language) = &track.language {
        tags.insert("language", language.as_str());
    }

    ProbeInfo {
        stream_index: index,
        codec,
        sample_rate,
        channels,
        sample_size_bits,
        frame_size,
        frame_rate: None,
        big_endian: layout.is_some_and(|l| l.big_endian),
        duration_micros,
        total_frames: params.n_frames,
        bitrate,
        vbr,
        tags,
    }
}

fn collect_tags(revision: &MetadataRevision, props: &mut Properties) {
    for tag in revision.tags() {
        let key = match tag.std_key {
            Some(StandardTagKey::TrackTitle) => properties::TITLE,
            Some(StandardTagKey::Artist) => properties::AUTHOR,
            Some(StandardTagKey::Album) => properties::ALBUM,
            Some(StandardTagKey::Date) => properties::DATE,
            Some(StandardTagKey::Comment) => properties::COMMENT,
            Some(StandardTagKey::Copyright) => properties::COPYRIGHT,
            _ => continue,
        };
        props.insert(key, tag.value.to_string());
    }
}

/// Symphonia编解码器类型 → 编解码器id
fn codec_id_for(codec: CodecType) -> CodecId {
    let name = match codec {
        codecs::CODEC_TYPE_PCM_S16LE => Some("pcm_s16le"),
        codecs::CODEC_TYPE_PCM_S16BE => Some("pcm_s16be"),
        codecs::CODEC_TYPE_PCM_S24LE => Some("pcm_s24le"),
        codecs::CODEC_TYPE_PCM_S24BE => Some("pcm_s24be"),
        codecs::CODEC_TYPE_PCM_S32LE => Some("pcm_s32le"),
        codecs::CODEC_TYPE_PCM_S32BE => Some("pcm_s32be"),
        codecs::CODEC_TYPE_PCM_S8 => Some("pcm_s8"),
        codecs::CODEC_TYPE_PCM_U8 => Some("pcm_u8"),
        codecs::CODEC_TYPE_PCM_U16LE => Some("pcm_u16le"),
        codecs::CODEC_TYPE_PCM_U16BE => Some("pcm_u16be"),
        codecs::CODEC_TYPE_PCM_U24LE => Some("pcm_u24le"),
        codecs::CODEC_TYPE_PCM_U24BE => Some("pcm_u24be"),
        codecs::CODEC_TYPE_PCM_U32LE => Some("pcm_u32le"),
        codecs::CODEC_TYPE_PCM_U32BE => Some("pcm_u32be"),
        codecs::CODEC_TYPE_PCM_F32LE => Some("pcm_f32le"),
        codecs::CODEC_TYPE_PCM_F32BE => Some("pcm_f32be"),
        codecs::CODEC_TYPE_PCM_F64LE => Some("pcm_f64le"),
        codecs::CODEC_TYPE_PCM_F64BE => Some("pcm_f64be"),
        codecs::CODEC_TYPE_PCM_ALAW => Some("pcm_alaw"),
        codecs::CODEC_TYPE_PCM_MULAW => Some("pcm_mulaw"),
        codecs::CODEC_TYPE_ADPCM_MS => Some("adpcm_ms"),
        codecs::CODEC_TYPE_ADPCM_IMA_WAV => Some("adpcm_ima_wav"),
        codecs::CODEC_TYPE_MP1 => Some("mp1"),
        codecs::CODEC_TYPE_MP2 => Some("mp2"),
        codecs::CODEC_TYPE_MP3 => Some("mp3"),
        codecs::CODEC_TYPE_AAC => Some("aac"),
        codecs::CODEC_TYPE_OPUS => Some("opus"),
        codecs::CODEC_TYPE_VORBIS => Some("vorbis"),
        codecs::CODEC_TYPE_FLAC => Some("flac"),
        codecs::CODEC_TYPE_ALAC => Some("alac"),
        codecs::CODEC_TYPE_WAVPACK => Some("wavpack"),
        other => symphonia::default::get_codecs()
            .get_codec(other)
            .map(|descriptor| descriptor.short_name),
    };

    match name.and_then(codec_by_name) {
        Some(info) => info.id,
        None => {
            warn!(?codec, "未知的编解码器类型 / unknown codec type");
            CodecId::default()
        }
    }
}
