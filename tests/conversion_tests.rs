//! 格式协商与转换集成测试

mod audio_test_fixtures;

use audio_test_fixtures::{STEREO_FRAMES, ensure_fixtures_generated, log, ramp_sample};
use native_audio_stream::constants::PROVIDER_NAME;
use native_audio_stream::{
    AudioError, AudioFileReader, AudioFormat, AudioInputStream, EnginePreference, Encoding,
    FormatConversionProvider, SampleKind, Source, StreamConfig, TimeUnit,
};
use std::io::Read;

fn open_stereo() -> AudioInputStream {
    let fixtures = ensure_fixtures_generated();
    let config = StreamConfig {
        engine: EnginePreference::Symphonia,
        ..StreamConfig::default()
    };
    AudioFileReader::new(config)
        .expect("默认配置应合法")
        .audio_input_stream(&Source::file(fixtures.get_path("stereo_ramp.wav")))
        .expect("立体声固件应可打开")
}

#[test]
fn test_negotiation_for_probed_format() {
    let provider = FormatConversionProvider::new();
    let stream = open_stereo();
    let source = stream.format();
    assert!(source.has_provider_marker(PROVIDER_NAME));

    let encodings = provider.target_encodings_for(source);
    assert_eq!(
        encodings,
        vec![Encoding::PCM_SIGNED, Encoding::PCM_UNSIGNED, Encoding::PCM_FLOAT]
    );

    let formats = provider.target_formats(Encoding::PCM_SIGNED, source);
    assert!(!formats.is_empty());
    for format in &formats {
        assert_eq!(format.channels(), Some(2));
        assert_eq!(format.sample_rate(), Some(44_100.0));
        assert!(provider.is_conversion_supported(format, source));
    }
    log(
        format!("可用目标格式 {} 种", formats.len()),
        format!("{} target formats available", formats.len()),
    );
}

#[test]
fn test_convert_to_24_bit_big_endian() {
    let provider = FormatConversionProvider::new();
    let target = AudioFormat::pcm(SampleKind::Signed, 44_100.0, 24, 2, true);
    let mut stream = provider
        .audio_input_stream(&target, open_stereo())
        .expect("转换应成功");

    assert_eq!(stream.format().sample_size_bits(), Some(24));
    assert!(stream.format().is_big_endian());
    assert_eq!(stream.frame_length(), Some(u64::from(STEREO_FRAMES)));
    assert_eq!(stream.decoded_frame_size(), Some(6));

    let mut pcm = Vec::new();
    stream.read_to_end(&mut pcm).expect("读取应成功");
    assert_eq!(pcm.len(), STEREO_FRAMES as usize * 6);

    // 第1帧左声道为1（16位），放大到24位后为 0x000100
    assert_eq!(&pcm[6..9], &[0x00, 0x01, 0x00]);
}

#[test]
fn test_convert_to_float() {
    let provider = FormatConversionProvider::new();
    let target = AudioFormat::pcm(SampleKind::Float, 44_100.0, 32, 2, false);
    let mut stream = provider
        .audio_input_stream(&target, open_stereo())
        .expect("转换应成功");

    let mut pcm = Vec::new();
    stream.read_to_end(&mut pcm).expect("读取应成功");
    assert_eq!(pcm.len(), STEREO_FRAMES as usize * 8);

    let frame = 1000usize;
    let left = f32::from_le_bytes(pcm[frame * 8..frame * 8 + 4].try_into().unwrap());
    let expected = f32::from(ramp_sample(frame as u32)) / 32_768.0;
    assert!((left - expected).abs() < 1e-6, "{left} != {expected}");
}

#[test]
fn test_convert_by_encoding_keeps_bit_depth() {
    let provider = FormatConversionProvider::new();
    let mut stream = provider
        .audio_input_stream_for_encoding(Encoding::PCM_UNSIGNED, open_stereo())
        .expect("转换应成功");

    assert_eq!(stream.format().encoding(), Encoding::PCM_UNSIGNED);
    assert_eq!(stream.format().sample_size_bits(), Some(16));

    let mut frame = [0u8; 4];
    stream.read_exact(&mut frame).expect("读取应成功");
    // 无符号16位的零点为 0x8000
    assert_eq!(&frame[..2], &[0x00, 0x80]);
}

#[test]
fn test_converted_stream_seeks() {
    let provider = FormatConversionProvider::new();
    let target = AudioFormat::pcm(SampleKind::Signed, 44_100.0, 16, 2, true);
    let mut stream = provider
        .audio_input_stream(&target, open_stereo())
        .expect("转换应成功");

    stream.seek(500, TimeUnit::Milliseconds).expect("定位应成功");
    let mut frame = [0u8; 4];
    stream.read_exact(&mut frame).expect("读取应成功");
    let left = i16::from_be_bytes([frame[0], frame[1]]) as u32;
    assert!(left >= 22_050);
}

#[test]
fn test_resampling_is_illegal() {
    let provider = FormatConversionProvider::new();
    let target = AudioFormat::pcm(SampleKind::Signed, 48_000.0, 16, 2, false);
    let result = provider.audio_input_stream(&target, open_stereo());
    assert!(matches!(result, Err(AudioError::IllegalConversion(_))));
}

#[test]
fn test_conversion_rejected_after_partial_read() {
    let provider = FormatConversionProvider::new();
    let mut stream = open_stereo();
    let mut head = [0u8; 2];
    stream.read_exact(&mut head).expect("读取应成功");

    let target = AudioFormat::pcm(SampleKind::Signed, 44_100.0, 24, 2, false);
    let result = provider.audio_input_stream(&target, stream);
    assert!(matches!(result, Err(AudioError::IllegalConversion(_))));
}

#[test]
fn test_foreign_format_not_convertible() {
    let provider = FormatConversionProvider::new();
    let foreign = AudioFormat::pcm(SampleKind::Signed, 44_100.0, 16, 2, false);
    assert!(!foreign.has_provider_marker(PROVIDER_NAME));
    assert!(provider.target_encodings_for(&foreign).is_empty());
}
