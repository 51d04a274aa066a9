//! 原生调用面契约测试
//!
//! 用mockall替身验证流层与引擎之间的约定：
//! 句柄恰好关闭一次、不可定位时不触达原生定位、缓冲区未耗尽时不填充、解码错误向上传递。

use mockall::mock;
use mockall::predicate::*;
use native_audio_stream::codec::ids;
use native_audio_stream::stream::{StreamSetup, open_stream};
use native_audio_stream::{
    AudioError, AudioFileReader, AudioFormat, AudioResult, EngineRegistry, FillStatus,
    NativeBuffer, NativeDecoder, PcmTarget, ProbeInfo, RawHandle, SampleKind, Source,
    StreamConfig, TimeUnit,
};
use std::io::{self, Cursor, Read};
use std::sync::Arc;

mock! {
    pub Engine {}

    impl NativeDecoder for Engine {
        fn name(&self) -> &'static str;
        fn can_open(&self, source: &Source) -> bool;
        fn probe(&self, source: &Source) -> AudioResult<Vec<ProbeInfo>>;
        fn open(&self, source: &Source, stream_index: usize, buffer_hint: usize) -> AudioResult<RawHandle>;
        fn is_seekable(&self, handle: RawHandle) -> bool;
        fn set_output(&self, handle: RawHandle, target: &PcmTarget) -> AudioResult<()>;
        fn fill(&self, handle: RawHandle, buffer: &mut NativeBuffer) -> AudioResult<FillStatus>;
        fn seek(&self, handle: RawHandle, micros: i64) -> AudioResult<()>;
        fn close(&self, handle: RawHandle) -> AudioResult<()>;
    }
}

const HANDLE: RawHandle = RawHandle::new(42);

/// 打开成功、输出配置成功的引擎替身
fn opened_engine(seekable: bool) -> MockEngine {
    let mut engine = MockEngine::new();
    engine.expect_name().return_const("mock");
    engine.expect_open().returning(|_, _, _| Ok(HANDLE));
    engine.expect_set_output().returning(|_, _| Ok(()));
    engine.expect_is_seekable().return_const(seekable);
    engine
}

fn setup() -> StreamSetup {
    StreamSetup {
        stream_index: 0,
        format: AudioFormat::pcm(SampleKind::Signed, 44_100.0, 16, 2, false),
        output: PcmTarget::S16LE,
        buffer_capacity: 1024,
    }
}

fn aac_info() -> ProbeInfo {
    ProbeInfo {
        codec: ids::AAC,
        sample_rate: Some(44_100),
        channels: Some(2),
        duration_micros: Some(1_000_000),
        ..Default::default()
    }
}

/// 脚本化填充：依次交付给定的数据块，之后返回流结束
fn scripted_fill(engine: &mut MockEngine, chunks: Vec<Vec<u8>>) {
    let mut chunks = chunks.into_iter();
    engine
        .expect_fill()
        .returning(move |_, buffer| match chunks.next() {
            Some(chunk) => Ok(FillStatus::Data(buffer.load(&chunk))),
            None => Ok(FillStatus::EndOfStream),
        });
}

#[test]
fn test_reader_stream_never_calls_native_seek() {
    let mut engine = opened_engine(true);
    engine.expect_seek().times(0);
    engine.expect_close().with(eq(HANDLE)).times(1).returning(|_| Ok(()));

    let source = Source::reader(Cursor::new(vec![0u8; 16]));
    let mut stream = open_stream(Arc::new(engine), &source, setup()).expect("打开应成功");

    assert!(!stream.is_seekable());
    let result = stream.seek(1, TimeUnit::Seconds);
    assert!(matches!(result, Err(AudioError::NotSeekable)));
}

#[test]
fn test_close_reaches_engine_exactly_once() {
    let mut engine = opened_engine(true);
    engine.expect_close().with(eq(HANDLE)).times(1).returning(|_| Ok(()));

    let mut stream =
        open_stream(Arc::new(engine), &Source::bytes(vec![0u8; 16]), setup()).expect("打开应成功");
    let closer = stream.closer();

    stream.close().expect("关闭应成功");
    stream.close().expect("重复关闭应成功");
    closer.close().expect("关闭器在已关闭后调用应成功");
    assert!(closer.is_closed());
    drop(stream);
}

#[test]
fn test_drop_closes_unclosed_stream() {
    let mut engine = opened_engine(true);
    engine.expect_close().with(eq(HANDLE)).times(1).returning(|_| Ok(()));

    let stream =
        open_stream(Arc::new(engine), &Source::bytes(vec![0u8; 16]), setup()).expect("打开应成功");
    drop(stream);
}

#[test]
fn test_failed_output_setup_still_closes_handle() {
    let mut engine = MockEngine::new();
    engine.expect_name().return_const("mock");
    engine.expect_open().returning(|_, _, _| Ok(HANDLE));
    engine
        .expect_set_output()
        .returning(|_, _| Err(AudioError::Engine("rejected".to_string())));
    engine.expect_close().with(eq(HANDLE)).times(1).returning(|_| Ok(()));

    let result = open_stream(Arc::new(engine), &Source::bytes(vec![0u8; 16]), setup());
    assert!(matches!(result, Err(AudioError::Engine(_))));
}

#[test]
fn test_failed_open_never_closes() {
    let mut engine = MockEngine::new();
    engine.expect_name().return_const("mock");
    engine
        .expect_open()
        .returning(|_, _, _| Err(AudioError::UnsupportedFormat("garbage".to_string())));
    engine.expect_close().times(0);

    let result = open_stream(Arc::new(engine), &Source::bytes(vec![0u8; 16]), setup());
    assert!(matches!(result, Err(AudioError::UnsupportedFormat(_))));
}

#[test]
fn test_buffered_data_is_consumed_before_next_fill() {
    let mut engine = opened_engine(true);
    engine.expect_close().returning(|_| Ok(()));
    engine
        .expect_fill()
        .times(1)
        .returning(|_, buffer| Ok(FillStatus::Data(buffer.load(&[1, 2, 3, 4, 5, 6, 7, 8]))));

    let mut stream =
        open_stream(Arc::new(engine), &Source::bytes(vec![0u8; 16]), setup()).expect("打开应成功");

    let mut collected = Vec::new();
    let mut buf = [0u8; 3];
    while collected.len() < 8 {
        let n = stream.read(&mut buf).expect("读取应成功");
        collected.extend_from_slice(&buf[..n]);
    }
    assert_eq!(collected, vec![1, 2, 3, 4, 5, 6, 7, 8]);
}

#[test]
fn test_seek_converts_units_and_discards_buffer() {
    let mut engine = opened_engine(true);
    engine.expect_close().returning(|_| Ok(()));
    engine
        .expect_seek()
        .with(eq(HANDLE), eq(1_500_000i64))
        .times(1)
        .returning(|_, _| Ok(()));
    scripted_fill(&mut engine, vec![vec![1u8; 8], vec![2u8; 8]]);

    let mut stream =
        open_stream(Arc::new(engine), &Source::bytes(vec![0u8; 16]), setup()).expect("打开应成功");

    let mut head = [0u8; 2];
    stream.read_exact(&mut head).expect("读取应成功");
    assert_eq!(head, [1, 1]);

    stream.seek(1_500, TimeUnit::Milliseconds).expect("定位应成功");
    stream.read_exact(&mut head).expect("读取应成功");
    assert_eq!(head, [2, 2], "定位后不应交付旧缓冲区中的数据");
}

#[test]
fn test_end_of_stream_is_sticky_without_native_calls() {
    let mut engine = opened_engine(true);
    engine.expect_close().returning(|_| Ok(()));
    engine
        .expect_fill()
        .times(1)
        .returning(|_, _| Ok(FillStatus::EndOfStream));

    let mut stream =
        open_stream(Arc::new(engine), &Source::bytes(vec![0u8; 16]), setup()).expect("打开应成功");
    let mut buf = [0u8; 8];
    assert_eq!(stream.read(&mut buf).expect("读取应成功"), 0);
    assert_eq!(stream.read(&mut buf).expect("读取应成功"), 0);
    assert!(matches!(stream.fill(), Ok(FillStatus::EndOfStream)));
}

#[test]
fn test_compressed_stream_delivers_declared_length() {
    let mut engine = opened_engine(true);
    engine.expect_can_open().return_const(true);
    engine.expect_probe().returning(|_| Ok(vec![aac_info()]));
    engine.expect_close().times(1).returning(|_| Ok(()));
    // 44100帧 × 4字节，分10块交付
    scripted_fill(&mut engine, vec![vec![0u8; 4_410 * 4]; 10]);

    let registry = EngineRegistry::new(vec![Arc::new(engine)]);
    let reader =
        AudioFileReader::with_registry(StreamConfig::default(), registry).expect("配置应合法");
    let mut stream = reader
        .audio_input_stream(&Source::bytes(vec![0u8; 64]))
        .expect("打开应成功");

    assert_eq!(stream.frame_length(), Some(44_100));
    assert_eq!(stream.format().encoding().name(), Some("aac"));
    assert_eq!(stream.output(), PcmTarget::S16LE);

    let mut pcm = Vec::new();
    stream.read_to_end(&mut pcm).expect("读取应成功");
    assert_eq!(Some(pcm.len() as u64), stream.decoded_byte_length());
    assert_eq!(stream.frame_position(), 44_100);
}

#[test]
fn test_corrupt_data_surfaces_decoding_error() {
    let mut engine = opened_engine(true);
    engine.expect_close().returning(|_| Ok(()));
    let mut calls = 0;
    engine.expect_fill().returning(move |_, buffer| {
        calls += 1;
        if calls == 1 {
            Ok(FillStatus::Data(buffer.load(&[0u8; 16])))
        } else {
            Err(AudioError::Decoding("corrupt packet".to_string()))
        }
    });

    let mut stream =
        open_stream(Arc::new(engine), &Source::bytes(vec![0u8; 16]), setup()).expect("打开应成功");
    let mut pcm = Vec::new();
    let err = stream.read_to_end(&mut pcm).expect_err("损坏数据应报错");
    assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    assert_eq!(pcm.len(), 16, "错误之前的数据应已交付");
}

#[test]
fn test_implausible_probe_rejected() {
    let mut engine = MockEngine::new();
    engine.expect_name().return_const("mock");
    engine.expect_can_open().return_const(true);
    engine
        .expect_probe()
        .returning(|_| Ok(vec![ProbeInfo::default()]));
    engine.expect_open().times(0);

    let registry = EngineRegistry::new(vec![Arc::new(engine)]);
    let reader =
        AudioFileReader::with_registry(StreamConfig::default(), registry).expect("配置应合法");
    let result = reader.audio_file_format(&Source::bytes(vec![0u8; 64]));
    assert!(matches!(result, Err(AudioError::UnsupportedFormat(_))));
}

#[test]
fn test_registry_falls_through_to_next_engine() {
    let mut failing = MockEngine::new();
    failing.expect_name().return_const("first");
    failing.expect_can_open().return_const(true);
    failing
        .expect_probe()
        .times(1)
        .returning(|_| Err(AudioError::UnsupportedFormat("unknown".to_string())));

    let mut working = MockEngine::new();
    working.expect_name().return_const("second");
    working.expect_can_open().return_const(true);
    working.expect_probe().times(1).returning(|_| Ok(vec![aac_info()]));

    let registry = EngineRegistry::new(vec![Arc::new(failing), Arc::new(working)]);
    let probed = registry.probe(&Source::bytes(vec![0u8; 8])).expect("第二个引擎应成功");
    assert_eq!(probed.engine.name(), "second");
    assert_eq!(probed.streams.len(), 1);
}
