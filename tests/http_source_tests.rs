//! HTTP来源集成测试
//!
//! 本地 `TcpListener` 提供固件数据，分别模拟支持Range、不支持Range和404三种服务器。

#![cfg(feature = "http")]

mod audio_test_fixtures;

use audio_test_fixtures::{STEREO_FRAMES, ensure_fixtures_generated, log, read_fixture};
use native_audio_stream::stream::{StreamSetup, open_stream};
use native_audio_stream::{
    AudioError, AudioFileReader, AudioFormat, AudioResult, EnginePreference, FillStatus,
    HttpSource, NativeBuffer, NativeDecoder, PcmTarget, ProbeInfo, RawHandle, SampleKind, Source,
    StreamConfig, SymphoniaEngine, TimeUnit,
};
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ServerMode {
    /// 按Range请求返回206与Content-Range
    Ranges,
    /// 忽略Range，总是返回完整的200响应且不声明Accept-Ranges
    NoRanges,
    NotFound,
}

/// 单文件HTTP服务器（每个连接一个线程，响应后关闭连接）
struct TestServer {
    url: String,
    range_offsets: Arc<Mutex<Vec<u64>>>,
}

impl TestServer {
    fn start(body: Vec<u8>, mode: ServerMode) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("无法绑定本地端口");
        let addr = listener.local_addr().expect("无法获取本地地址");
        let body = Arc::new(body);
        let range_offsets = Arc::new(Mutex::new(Vec::new()));

        let offsets = Arc::clone(&range_offsets);
        thread::spawn(move || {
            for connection in listener.incoming() {
                let Ok(stream) = connection else { break };
                let body = Arc::clone(&body);
                let offsets = Arc::clone(&offsets);
                // 客户端中途断开（定位后重新请求）时写入失败，忽略即可
                thread::spawn(move || {
                    let _ = serve(stream, &body, mode, &offsets);
                });
            }
        });

        Self {
            url: format!("http://{addr}/stereo_ramp.wav"),
            range_offsets,
        }
    }

    /// 服务器收到的Range起始偏移（按到达顺序）
    fn range_offsets(&self) -> Vec<u64> {
        self.range_offsets.lock().expect("offsets mutex poisoned").clone()
    }
}

fn serve(stream: TcpStream, body: &[u8], mode: ServerMode, offsets: &Mutex<Vec<u64>>) -> io::Result<()> {
    let mut request = BufReader::new(stream.try_clone()?);
    let mut range_start = None;
    loop {
        let mut line = String::new();
        if request.read_line(&mut line)? == 0 {
            return Ok(());
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.eq_ignore_ascii_case("range") {
                range_start = value
                    .trim()
                    .strip_prefix("bytes=")
                    .and_then(|v| v.split('-').next())
                    .and_then(|v| v.parse::<u64>().ok());
            }
        }
    }

    let mut stream = stream;
    let total = body.len();
    match (mode, range_start) {
        (ServerMode::NotFound, _) => {
            write!(stream, "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")?;
        }
        (ServerMode::Ranges, Some(start)) => {
            let start = (start as usize).min(total);
            offsets.lock().expect("offsets mutex poisoned").push(start as u64);
            write!(
                stream,
                "HTTP/1.1 206 Partial Content\r\nAccept-Ranges: bytes\r\nContent-Range: bytes {start}-{}/{total}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                total.saturating_sub(1),
                total - start
            )?;
            stream.write_all(&body[start..])?;
        }
        (ServerMode::Ranges, None) => {
            write!(
                stream,
                "HTTP/1.1 200 OK\r\nAccept-Ranges: bytes\r\nContent-Length: {total}\r\nConnection: close\r\n\r\n"
            )?;
            stream.write_all(body)?;
        }
        (ServerMode::NoRanges, _) => {
            write!(
                stream,
                "HTTP/1.1 200 OK\r\nContent-Type: audio/wav\r\nContent-Length: {total}\r\nConnection: close\r\n\r\n"
            )?;
            stream.write_all(body)?;
        }
    }
    stream.flush()
}

fn stereo_bytes() -> Vec<u8> {
    let fixtures = ensure_fixtures_generated();
    read_fixture(&fixtures.get_path("stereo_ramp.wav"))
}

fn symphonia_reader() -> AudioFileReader {
    let config = StreamConfig {
        engine: EnginePreference::Symphonia,
        ..StreamConfig::default()
    };
    AudioFileReader::new(config).expect("默认配置应合法")
}

/// 记录原生定位调用次数的Symphonia引擎包装
struct SeekCountingEngine {
    inner: SymphoniaEngine,
    seeks: AtomicUsize,
}

impl SeekCountingEngine {
    fn new() -> Self {
        Self {
            inner: SymphoniaEngine::default(),
            seeks: AtomicUsize::new(0),
        }
    }

    fn seeks(&self) -> usize {
        self.seeks.load(Ordering::SeqCst)
    }
}

impl NativeDecoder for SeekCountingEngine {
    fn name(&self) -> &'static str {
        "seek-counting"
    }

    fn can_open(&self, source: &Source) -> bool {
        self.inner.can_open(source)
    }

    fn probe(&self, source: &Source) -> AudioResult<Vec<ProbeInfo>> {
        self.inner.probe(source)
    }

    fn open(&self, source: &Source, stream_index: usize, buffer_hint: usize) -> AudioResult<RawHandle> {
        self.inner.open(source, stream_index, buffer_hint)
    }

    fn is_seekable(&self, handle: RawHandle) -> bool {
        self.inner.is_seekable(handle)
    }

    fn set_output(&self, handle: RawHandle, target: &PcmTarget) -> AudioResult<()> {
        self.inner.set_output(handle, target)
    }

    fn fill(&self, handle: RawHandle, buffer: &mut NativeBuffer) -> AudioResult<FillStatus> {
        self.inner.fill(handle, buffer)
    }

    fn seek(&self, handle: RawHandle, micros: i64) -> AudioResult<()> {
        self.seeks.fetch_add(1, Ordering::SeqCst);
        self.inner.seek(handle, micros)
    }

    fn close(&self, handle: RawHandle) -> AudioResult<()> {
        self.inner.close(handle)
    }
}

fn stereo_setup() -> StreamSetup {
    StreamSetup {
        stream_index: 0,
        format: AudioFormat::pcm(SampleKind::Signed, 44_100.0, 16, 2, false),
        output: PcmTarget::S16LE,
        buffer_capacity: 4096,
    }
}

// ========== 支持Range的服务器 ==========

#[test]
fn test_range_server_source_seeks_with_new_request() {
    let data = stereo_bytes();
    let server = TestServer::start(data.clone(), ServerMode::Ranges);

    let mut source = HttpSource::open(&server.url, TIMEOUT).expect("连接应成功");
    assert!(source.is_seekable());
    assert_eq!(source.len(), Some(data.len() as u64));

    source.seek(SeekFrom::Start(1_000)).expect("定位应成功");
    let mut chunk = [0u8; 64];
    source.read_exact(&mut chunk).expect("读取应成功");
    assert_eq!(&chunk[..], &data[1_000..1_064]);

    assert_eq!(server.range_offsets(), vec![0, 1_000]);
}

#[test]
fn test_range_server_stream_seek_lands_on_target() {
    let server = TestServer::start(stereo_bytes(), ServerMode::Ranges);
    let mut stream = symphonia_reader()
        .audio_input_stream(&Source::url(server.url.clone()))
        .expect("URL来源应可打开");
    assert!(stream.is_seekable());

    stream.seek(500, TimeUnit::Milliseconds).expect("定位应成功");
    assert_eq!(stream.frame_position(), 22_050);

    let mut frame = [0u8; 4];
    stream.read_exact(&mut frame).expect("应能读取一帧");
    let left = i16::from_le_bytes([frame[0], frame[1]]) as u32;
    assert!(
        (22_050..22_050 + 4_096).contains(&left),
        "定位后首帧 {left} 应不早于目标帧 / first frame after seek must not precede the target"
    );
    assert!(
        server.range_offsets().iter().any(|offset| *offset > 0),
        "定位应按新偏移重新请求 / seek must re-request from the new offset"
    );
}

// ========== 不支持Range的服务器 ==========

#[test]
fn test_plain_server_source_is_not_seekable() {
    let data = stereo_bytes();
    let server = TestServer::start(data.clone(), ServerMode::NoRanges);

    let mut source = HttpSource::open(&server.url, TIMEOUT).expect("连接应成功");
    assert!(!source.is_seekable());
    assert_eq!(source.len(), Some(data.len() as u64));

    let err = source.seek(SeekFrom::Start(1_000)).expect_err("不支持Range时不能定位");
    assert_eq!(err.kind(), io::ErrorKind::Unsupported);
}

#[test]
fn test_plain_server_stream_never_reaches_native_seek() {
    let server = TestServer::start(stereo_bytes(), ServerMode::NoRanges);
    let engine = Arc::new(SeekCountingEngine::new());

    let mut stream = open_stream(engine.clone(), &Source::url(server.url.clone()), stereo_setup())
        .expect("URL来源应可打开");
    assert!(!stream.is_seekable());

    for (position, unit) in [(500, TimeUnit::Milliseconds), (0, TimeUnit::Seconds)] {
        let result = stream.seek(position, unit);
        assert!(matches!(result, Err(AudioError::NotSeekable)), "{result:?}");
    }
    assert_eq!(engine.seeks(), 0);

    // 定位失败不影响顺序读取
    let mut pcm = Vec::new();
    stream.read_to_end(&mut pcm).expect("读取应成功");
    assert_eq!(pcm.len(), STEREO_FRAMES as usize * 4);
}

#[test]
fn test_plain_server_reader_stream_reports_not_seekable() {
    let server = TestServer::start(stereo_bytes(), ServerMode::NoRanges);
    let mut stream = symphonia_reader()
        .audio_input_stream(&Source::url(server.url.clone()))
        .expect("URL来源应可打开");

    assert!(!stream.is_seekable());
    let result = stream.seek(100, TimeUnit::Milliseconds);
    assert!(matches!(result, Err(AudioError::NotSeekable)), "{result:?}");
    assert_eq!(stream.frame_position(), 0);
}

// ========== 错误 ==========

#[test]
fn test_missing_url_is_io_error() {
    let server = TestServer::start(Vec::new(), ServerMode::NotFound);

    match HttpSource::open(&server.url, TIMEOUT) {
        Err(AudioError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::NotFound),
        Err(other) => panic!("应为I/O错误 / expected Io, got: {other:?}"),
        Ok(_) => panic!("404不应连接成功 / 404 must not connect"),
    }

    let result = symphonia_reader().audio_file_format(&Source::url(server.url.clone()));
    assert!(matches!(result, Err(AudioError::Io(_))), "{result:?}");
    log(
        format!("404来源: {result:?}"),
        format!("Missing URL: {result:?}"),
    );
}
