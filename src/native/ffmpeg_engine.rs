//! FFmpeg外部进程引擎
//!
//! Symphonia无法处理的格式（AC-3、DTS、WMA等）回退到外部 ffmpeg/ffprobe：
//! ffprobe 以JSON输出探测全部音频流，ffmpeg 子进程把选中的音频流转码为
//! 原始PCM写到标准输出，填充时直接从管道读取。定位通过 `-ss` 重启子进程实现。

use std::collections::HashMap;
use std::ffi::OsString;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::sync::OnceLock;
use std::thread;

use bytes::Bytes;
use crossbeam_channel::{Receiver, unbounded};
use serde::Deserialize;
use tracing::{debug, trace, warn};

use super::{FillStatus, NativeBuffer, NativeDecoder, PcmTarget, ProbeInfo, RawHandle, SessionTable, Source};
use crate::codec::{CodecId, codec_by_id, codec_by_name};
use crate::config::StreamConfig;
use crate::constants::properties;
use crate::error::{self, AudioError, AudioResult};
use crate::format::Properties;

/// FFmpeg安装指南（跨平台）
pub const FFMPEG_INSTALL_GUIDE: &str = r#"
FFmpeg is required for formats the built-in decoder cannot handle / 需要安装FFmpeg以解码内置解码器不支持的格式

Installation / 安装方法:
  macOS:   brew install ffmpeg
  Windows: https://www.gyan.dev/ffmpeg/builds/
           或使用: winget install Gyan.FFmpeg
  Linux:
    - Ubuntu/Debian: sudo apt install ffmpeg
    - Fedora/RHEL:   sudo dnf install ffmpeg
    - Arch:          sudo pacman -S ffmpeg

Official site / 官方网站: https://ffmpeg.org/download.html
Custom location / 自定义路径: NATIVE_AUDIO_FFMPEG, NATIVE_AUDIO_FFPROBE
"#;

/// 管道读取块的下限
const MIN_READ_CHUNK: usize = 4096;

/// FFmpeg外部进程引擎
pub struct FfmpegEngine {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
    #[cfg_attr(not(feature = "http"), allow(dead_code))]
    http_timeout: std::time::Duration,
    available: OnceLock<bool>,
    sessions: SessionTable<FfmpegSession>,
}

impl FfmpegEngine {
    pub fn new(config: &StreamConfig) -> Self {
        Self {
            ffmpeg: config.ffmpeg_command(),
            ffprobe: config.ffprobe_command(),
            http_timeout: config.http_timeout(),
            available: OnceLock::new(),
            sessions: SessionTable::new(),
        }
    }

    /// ffmpeg 与 ffprobe 是否都可执行（只检测一次）
    pub fn is_available(&self) -> bool {
        *self.available.get_or_init(|| {
            let available = binary_responds(&self.ffmpeg) && binary_responds(&self.ffprobe);
            debug!(
                ffmpeg = %self.ffmpeg.display(),
                available,
                "FFmpeg可用性检测 / availability check"
            );
            available
        })
    }

    /// 句柄当前ffmpeg子进程的进程号；子进程尚未启动或句柄已关闭时为None
    pub fn child_pid(&self, handle: RawHandle) -> Option<u32> {
        let session = self.sessions.get(handle).ok()?;
        let session = session.lock();
        session.process.as_ref().map(|process| process.child.id())
    }

    fn require_available(&self) -> AudioResult<()> {
        if self.is_available() {
            Ok(())
        } else {
            Err(AudioError::Engine(format!(
                "未找到FFmpeg / FFmpeg not found\n{FFMPEG_INSTALL_GUIDE}"
            )))
        }
    }

    fn run_ffprobe(&self, source: &Source) -> AudioResult<Vec<ProbeInfo>> {
        let input = input_arg(source)?;
        let mut command = Command::new(&self.ffprobe);
        command
            .args([
                "-v",
                "error",
                "-show_streams",
                "-show_format",
                "-select_streams",
                "a",
                "-of",
                "json",
            ])
            .arg(&input)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let payload = match source {
            Source::Bytes(data) => {
                command.stdin(Stdio::piped());
                Some(data.clone())
            }
            _ => {
                command.stdin(Stdio::null());
                None
            }
        };

        let mut child = command.spawn().map_err(|e| {
            AudioError::Engine(format!("无法运行ffprobe / failed to run ffprobe: {e}\n{FFMPEG_INSTALL_GUIDE}"))
        })?;
        if let Some(data) = payload {
            feed_stdin(&mut child, data);
        }
        let output = child.wait_with_output()?;

        if !output.status.success() {
            return Err(AudioError::UnsupportedFormat(format!(
                "ffprobe失败 / ffprobe failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        parse_ffprobe_json(&output.stdout, source.byte_length())
    }
}

impl Default for FfmpegEngine {
    fn default() -> Self {
        Self::new(&StreamConfig::default())
    }
}

impl NativeDecoder for FfmpegEngine {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    fn can_open(&self, source: &Source) -> bool {
        !matches!(source, Source::Reader(_)) && self.is_available()
    }

    fn probe(&self, source: &Source) -> AudioResult<Vec<ProbeInfo>> {
        self.require_available()?;
        let infos = self.run_ffprobe(source)?;
        debug!(streams = infos.len(), "ffprobe探测完成 / probe complete");
        Ok(infos)
    }

    fn open(&self, source: &Source, stream_index: usize, buffer_hint: usize) -> AudioResult<RawHandle> {
        self.require_available()?;
        let infos = self.run_ffprobe(source)?;
        let info = infos.get(stream_index).ok_or(AudioError::IndexOutOfRange {
            index: stream_index,
            available: infos.len(),
        })?;

        let seekable = self.source_is_seekable(source);
        let session = FfmpegSession {
            ffmpeg: self.ffmpeg.clone(),
            source: source.clone(),
            stream_index,
            target: PcmTarget::default_for(info),
            channels: info.channels.unwrap_or(0),
            sample_rate: info.sample_rate.unwrap_or(0),
            seekable,
            read_chunk: buffer_hint.max(MIN_READ_CHUNK),
            start_micros: 0,
            delivered_bytes: 0,
            ended: false,
            process: None,
        };
        let handle = self.sessions.insert(session);
        debug!(%handle, stream_index, seekable, codec = %info.codec, "ffmpeg会话已打开 / session opened");
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
        if session.target != *target {
            // 已启动的子进程按当前位置以新格式重启
            if session.process.is_some() {
                let micros = session.position_micros();
                session.restart_at(micros);
            }
            session.target = *target;
        }
        Ok(())
    }

    fn fill(&self, handle: RawHandle, buffer: &mut NativeBuffer) -> AudioResult<FillStatus> {
        let session = self.sessions.get(handle)?;
        let mut session = session.lock();
        let status = session.fill(buffer)?;
        trace!(%handle, ?status, "ffmpeg填充 / fill");
        Ok(status)
    }

    fn seek(&self, handle: RawHandle, micros: i64) -> AudioResult<()> {
        let session = self.sessions.get(handle)?;
        let mut session = session.lock();
        if !session.seekable {
            return Err(AudioError::NotSeekable);
        }
        if micros < 0 {
            return Err(AudioError::InvalidInput(format!(
                "定位时间不能为负 / negative seek time: {micros}µs"
            )));
        }
        session.restart_at(micros);
        debug!(%handle, micros, "ffmpeg定位 / seek");
        Ok(())
    }

    fn close(&self, handle: RawHandle) -> AudioResult<()> {
        match self.sessions.remove(handle) {
            // 会话释放时子进程被终止并回收
            Some(_) => Ok(()),
            None => Err(AudioError::Engine(format!(
                "无效句柄 / unknown handle {handle}"
            ))),
        }
    }
}

impl FfmpegEngine {
    fn source_is_seekable(&self, source: &Source) -> bool {
        match source {
            Source::Bytes(_) | Source::File(_) => true,
            Source::Reader(_) => false,
            Source::Url(url) => self.url_is_seekable(url),
        }
    }

    #[cfg(feature = "http")]
    fn url_is_seekable(&self, url: &str) -> bool {
        match super::HttpSource::open(url, self.http_timeout) {
            Ok(source) => source.is_seekable(),
            Err(e) => {
                warn!(url, "Range探测失败，按不可定位处理 / range probe failed: {e}");
                false
            }
        }
    }

    #[cfg(not(feature = "http"))]
    fn url_is_seekable(&self, _url: &str) -> bool {
        false
    }
}

/// 单个ffmpeg解码会话
struct FfmpegSession {
    ffmpeg: PathBuf,
    source: Source,
    stream_index: usize,
    target: PcmTarget,
    channels: u16,
    sample_rate: u32,
    seekable: bool,
    /// 单次从管道读取的字节数（缓冲区按此扩容）
    read_chunk: usize,
    /// 当前子进程的起始时间
    start_micros: i64,
    /// 当前子进程已交付的字节数
    delivered_bytes: u64,
    ended: bool,
    /// 首次填充时才启动，便于先调整输出格式
    process: Option<FfmpegProcess>,
}

impl FfmpegSession {
    fn position_micros(&self) -> i64 {
        let frame_bytes = u64::from(self.channels) * self.target.bytes_per_sample() as u64;
        if frame_bytes == 0 || self.sample_rate == 0 {
            return self.start_micros;
        }
        let frames = self.delivered_bytes / frame_bytes;
        self.start_micros + (frames as f64 * 1_000_000.0 / f64::from(self.sample_rate)).round() as i64
    }

    fn restart_at(&mut self, micros: i64) {
        self.process = None;
        self.start_micros = micros;
        self.delivered_bytes = 0;
        self.ended = false;
    }

    fn fill(&mut self, buffer: &mut NativeBuffer) -> AudioResult<FillStatus> {
        if self.ended {
            return Ok(FillStatus::EndOfStream);
        }
        if self.process.is_none() {
            self.process = Some(FfmpegProcess::spawn(self)?);
        }
        let Some(process) = self.process.as_mut() else {
            return Ok(FillStatus::EndOfStream);
        };

        buffer.ensure_capacity(self.read_chunk)?;
        let n = buffer.refill_with(|buf| process.stdout.read(buf))?;
        if n > 0 {
            self.delivered_bytes += n as u64;
            return Ok(FillStatus::Data(n));
        }

        self.ended = true;
        let status = process.child.wait()?;
        if !status.success() {
            let message = process.stderr_text();
            return Err(AudioError::Decoding(format!(
                "ffmpeg异常退出 / ffmpeg exited with {status}: {message}"
            )));
        }
        Ok(FillStatus::EndOfStream)
    }
}

/// 运行中的ffmpeg子进程
struct FfmpegProcess {
    child: Child,
    stdout: ChildStdout,
    stderr_lines: Receiver<String>,
}

impl FfmpegProcess {
    fn spawn(session: &FfmpegSession) -> AudioResult<Self> {
        let args = decode_args(
            &input_arg(&session.source)?,
            session.stream_index,
            &session.target,
            session.start_micros,
        );
        let payload: Option<Bytes> = match &session.source {
            Source::Bytes(data) => Some(data.clone()),
            _ => None,
        };

        let mut child = Command::new(&session.ffmpeg)
            .args(&args)
            .stdin(if payload.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| error::engine_error("无法启动FFmpeg / failed to spawn FFmpeg", e))?;

        if let Some(data) = payload {
            feed_stdin(&mut child, data);
        }

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AudioError::Engine("FFmpeg标准输出不可用 / stdout not available".to_string()))?;

        // stderr 在独立线程中逐行收集，避免管道写满阻塞子进程
        let (tx, rx) = unbounded();
        if let Some(stderr) = child.stderr.take() {
            thread::spawn(move || {
                for line in BufReader::new(stderr).lines().map_while(Result::ok) {
                    warn!(target: "native_audio_stream::ffmpeg", "{line}");
                    if tx.send(line).is_err() {
                        break;
                    }
                }
            });
        }

        debug!(args = ?args, "ffmpeg子进程已启动 / process spawned");
        Ok(Self {
            child,
            stdout,
            stderr_lines: rx,
        })
    }

    /// 子进程退出后收集全部stderr输出
    fn stderr_text(&self) -> String {
        let lines: Vec<String> = self.stderr_lines.iter().collect();
        if lines.is_empty() {
            "无错误输出 / no diagnostic output".to_string()
        } else {
            lines.join("\n")
        }
    }
}

impl Drop for FfmpegProcess {
    fn drop(&mut self) {
        // 确保子进程被终止并回收
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn binary_responds(path: &Path) -> bool {
    Command::new(path)
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

fn input_arg(source: &Source) -> AudioResult<OsString> {
    match source {
        Source::File(path) => {
            std::fs::metadata(path)?;
            Ok(path.as_os_str().to_owned())
        }
        Source::Url(url) => Ok(OsString::from(url)),
        Source::Bytes(_) => Ok(OsString::from("pipe:0")),
        Source::Reader(_) => Err(AudioError::UnsupportedFormat(
            "ffmpeg引擎不支持任意字节流 / ffmpeg engine cannot read generic readers".to_string(),
        )),
    }
}

/// 把内存数据写入子进程标准输入（后台线程，子进程提前退出时忽略断管）
fn feed_stdin(child: &mut Child, data: Bytes) {
    if let Some(mut stdin) = child.stdin.take() {
        thread::spawn(move || {
            if let Err(e) = stdin.write_all(&data) {
                trace!("stdin写入中止 / stdin feed stopped: {e}");
            }
        });
    }
}

fn decode_args(input: &OsString, stream_index: usize, target: &PcmTarget, start_micros: i64) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-nostats".into(), "-v".into(), "error".into()];
    if start_micros > 0 {
        args.push("-ss".into());
        args.push(format!("{:.6}", start_micros as f64 / 1_000_000.0).into());
    }
    args.push("-i".into());
    args.push(input.clone());
    args.extend([
        "-map".into(),
        format!("0:a:{stream_index}").into(),
        "-f".into(),
        target.ffmpeg_format().into(),
        "-c:a".into(),
        target.ffmpeg_codec().into(),
        "-".into(),
    ]);
    args
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_name: Option<String>,
    sample_rate: Option<String>,
    channels: Option<u16>,
    #[serde(default)]
    bits_per_sample: u32,
    bits_per_raw_sample: Option<String>,
    duration: Option<String>,
    bit_rate: Option<String>,
    #[serde(default)]
    tags: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
    bit_rate: Option<String>,
    #[serde(default)]
    tags: HashMap<String, String>,
}

fn parse_ffprobe_json(json: &[u8], byte_len: Option<u64>) -> AudioResult<Vec<ProbeInfo>> {
    let output: FfprobeOutput = serde_json::from_slice(json)
        .map_err(|e| error::format_error("ffprobe输出无法解析 / invalid ffprobe output", e))?;

    let format_tags = output.format.as_ref().map(|f| &f.tags);
    let format_duration = output
        .format
        .as_ref()
        .and_then(|f| parse_seconds(f.duration.as_deref()));
    let format_bitrate = output
        .format
        .as_ref()
        .and_then(|f| f.bit_rate.as_deref())
        .and_then(|v| v.parse::<u32>().ok());

    let infos: Vec<ProbeInfo> = output
        .streams
        .iter()
        .enumerate()
        .map(|(index, stream)| {
            let codec = stream
                .codec_name
                .as_deref()
                .and_then(codec_by_name)
                .map(|info| info.id)
                .unwrap_or_default();
            let layout = codec_by_id(codec).and_then(|info| info.pcm_layout());

            let sample_rate = stream.sample_rate.as_deref().and_then(|v| v.parse::<u32>().ok());
            let sample_size_bits = Some(stream.bits_per_sample)
                .filter(|bits| *bits > 0)
                .or_else(|| stream.bits_per_raw_sample.as_deref().and_then(|v| v.parse().ok()))
                .map(|bits: u32| bits as u16)
                .or(layout.map(|l| l.bits));

            let duration_micros = parse_seconds(stream.duration.as_deref()).or(format_duration);
            let total_frames = match (layout, duration_micros, sample_rate) {
                (Some(_), Some(us), Some(rate)) => {
                    Some((f64::from(rate) * us as f64 / 1_000_000.0).round() as u64)
                }
                _ => None,
            };
            let frame_size = match (layout, stream.channels, sample_size_bits) {
                (Some(_), Some(ch), Some(bits)) => Some(u32::from(ch) * u32::from(bits).div_ceil(8)),
                _ => None,
            };
            let bitrate = stream
                .bit_rate
                .as_deref()
                .and_then(|v| v.parse::<u32>().ok())
                .or(format_bitrate)
                .or_else(|| match (byte_len, duration_micros) {
                    (Some(bytes), Some(us)) if us > 0 => {
                        Some((bytes as f64 * 8_000_000.0 / us as f64).round() as u32)
                    }
                    _ => None,
                });

            let mut tags = Properties::new();
            for source_tags in format_tags.into_iter().chain(Some(&stream.tags)) {
                collect_tags(source_tags, &mut tags);
            }

            ProbeInfo {
                stream_index: index,
                codec,
                sample_rate,
                channels: stream.channels,
                sample_size_bits,
                frame_size,
                frame_rate: None,
                big_endian: layout.is_some_and(|l| l.big_endian),
                duration_micros,
                total_frames,
                bitrate,
                vbr: layout.map(|_| false),
                tags,
            }
        })
        .collect();

    if infos.is_empty() {
        return Err(AudioError::UnsupportedFormat(
            "未找到音频轨道 / no audio track".to_string(),
        ));
    }
    if infos.iter().any(|info| info.codec == CodecId::default()) {
        warn!("ffprobe报告了未知编解码器 / ffprobe reported an unknown codec");
    }
    Ok(infos)
}

fn parse_seconds(value: Option<&str>) -> Option<i64> {
    value
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map(|secs| (secs * 1_000_000.0).round() as i64)
}

fn collect_tags(source: &HashMap<String, String>, props: &mut Properties) {
    for (key, value) in source {
        let key = match key.to_ascii_lowercase().as_str() {
            "title" => properties::TITLE,
            "artist" => properties::AUTHOR,
            "album" => properties::ALBUM,
            "date" => properties::DATE,
            "comment" => properties::COMMENT,
            "copyright" => properties::COPYRIGHT,
            _ => continue,
        };
        props.insert(key, value.as_str());
    }
}
