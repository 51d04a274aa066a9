//! 音频测试固件生成器
//!
//! 为流读取、定位和异常测试生成WAV文件。
//! 样本值编码了帧序号，便于验证定位后的数据位置。

#![allow(dead_code)]

use fs2::FileExt;
use hound::{SampleFormat, WavSpec, WavWriter};
use std::fs::{File, OpenOptions, create_dir_all};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

/// 立体声固件：44.1kHz，16位，1秒
pub const STEREO_FRAMES: u32 = 44_100;
/// 单声道24位固件：48kHz，0.5秒
pub const MONO_24_FRAMES: u32 = 24_000;
/// 截断固件头部声明的帧数（实际只写入一半）
pub const TRUNCATED_DECLARED_FRAMES: u32 = 44_100;

pub fn log(msg_zh: impl AsRef<str>, msg_en: impl AsRef<str>) {
    println!("{} / {}", msg_zh.as_ref(), msg_en.as_ref());
}

/// 立体声固件第 `frame` 帧的左声道样本（右声道取反）
pub fn ramp_sample(frame: u32) -> i16 {
    (frame & 0x7fff) as i16
}

fn fixtures_base_dir() -> &'static PathBuf {
    static ROOT: OnceLock<PathBuf> = OnceLock::new();
    ROOT.get_or_init(|| {
        let path = match std::env::var("NATIVE_AUDIO_FIXTURES_DIR") {
            Ok(custom) => PathBuf::from(custom),
            Err(_) => PathBuf::from("tests/fixtures"),
        };
        create_dir_all(&path).expect("无法创建测试固件目录");
        path
    })
}

/// 获取特定固件文件路径
pub fn fixture_path(name: &str) -> PathBuf {
    fixtures_base_dir().join(name)
}

/// 安装测试日志（`RUST_LOG` 控制级别，重复调用无副作用）
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// 确保所有固件生成完毕（幂等）
pub fn ensure_fixtures_generated() -> AudioTestFixtures {
    static INIT: OnceLock<()> = OnceLock::new();
    init_tracing();
    let fixtures = AudioTestFixtures::new();
    INIT.get_or_init(|| fixtures.generate_all());
    fixtures
}

/// 跨进程文件锁 + 进程内互斥，避免并发写入导致的截断文件。
struct FixtureLock {
    _mutex_guard: std::sync::MutexGuard<'static, ()>,
    lock_file: File,
}

impl FixtureLock {
    fn acquire() -> Self {
        static MUTEX: OnceLock<Mutex<()>> = OnceLock::new();
        let mutex = MUTEX.get_or_init(|| Mutex::new(()));
        let guard = mutex.lock().expect("Fixture mutex poisoned");

        let lock_path = fixtures_base_dir().join(".lock");
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .expect("无法创建固件锁文件");
        file.lock_exclusive()
            .expect("无法获取固件文件锁，可能被其他进程占用");

        Self {
            _mutex_guard: guard,
            lock_file: file,
        }
    }
}

impl Drop for FixtureLock {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.lock_file);
    }
}

/// 测试固件生成器
pub struct AudioTestFixtures {
    fixtures_dir: PathBuf,
}

impl AudioTestFixtures {
    pub fn new() -> Self {
        Self {
            fixtures_dir: fixtures_base_dir().clone(),
        }
    }

    pub fn get_path(&self, filename: &str) -> PathBuf {
        self.fixtures_dir.join(filename)
    }

    /// 生成所有测试固件
    pub fn generate_all(&self) {
        let _guard = FixtureLock::acquire();

        log(
            "开始生成音频测试固件...",
            "Generating audio test fixtures...",
        );

        self.create_stereo_ramp();
        self.create_mono_24bit();
        self.create_truncated_wav();
        self.create_fake_audio();
        self.create_empty_file();

        log(
            format!("所有测试固件已生成到: {:?}", self.fixtures_dir),
            format!("All fixtures generated at: {:?}", self.fixtures_dir),
        );
    }

    /// 立体声16位斜坡：左声道为帧序号（按15位回绕），右声道取反
    pub fn create_stereo_ramp(&self) -> PathBuf {
        let path = self.get_path("stereo_ramp.wav");
        let spec = WavSpec {
            channels: 2,
            sample_rate: 44_100,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        {
            let mut writer = WavWriter::create(&path, spec).expect("无法创建斜坡文件");
            for frame in 0..STEREO_FRAMES {
                let sample = ramp_sample(frame);
                writer.write_sample(sample).expect("无法写入样本");
                writer.write_sample(-sample).expect("无法写入样本");
            }
            writer.finalize().expect("无法完成写入");
        }
        log(
            "  生成 stereo_ramp.wav (1 秒, 16bit 立体声)",
            "  Generated stereo_ramp.wav (1 s, 16-bit stereo)",
        );
        path
    }

    /// 单声道24位正弦（48kHz）
    pub fn create_mono_24bit(&self) -> PathBuf {
        let path = self.get_path("mono_24bit.wav");
        let spec = WavSpec {
            channels: 1,
            sample_rate: 48_000,
            bits_per_sample: 24,
            sample_format: SampleFormat::Int,
        };
        {
            let mut writer = WavWriter::create(&path, spec).expect("无法创建24位文件");
            for i in 0..MONO_24_FRAMES {
                let t = f64::from(i) / 48_000.0;
                let sample = (t * 440.0 * 2.0 * std::f64::consts::PI).sin() * 4_000_000.0;
                writer.write_sample(sample as i32).expect("无法写入样本");
            }
            writer.finalize().expect("无法完成写入");
        }
        log(
            "  生成 mono_24bit.wav (48kHz, 24bit)",
            "  Generated mono_24bit.wav (48 kHz, 24-bit)",
        );
        path
    }

    /// 截断的WAV：头部声明1秒数据，实际只写入一半
    pub fn create_truncated_wav(&self) -> PathBuf {
        let path = self.get_path("truncated.wav");
        let data = truncated_wav_bytes(TRUNCATED_DECLARED_FRAMES, TRUNCATED_DECLARED_FRAMES / 2);
        std::fs::write(&path, data).expect("无法写入截断文件");

        log(
            "  生成 truncated.wav (数据只有声明的一半)",
            "  Generated truncated.wav (half of the declared data)",
        );
        path
    }

    /// 伪装成音频的文本文件
    pub fn create_fake_audio(&self) -> PathBuf {
        let path = self.get_path("fake_audio.wav");
        let mut file = File::create(&path).expect("无法创建伪装文件");
        file.write_all(b"This is not an audio file, just plain text pretending to be one.")
            .expect("写入失败");
        log(
            "  生成 fake_audio.wav (文本内容)",
            "  Generated fake_audio.wav (plain text)",
        );
        path
    }

    /// 空文件（0字节）
    pub fn create_empty_file(&self) -> PathBuf {
        let path = self.get_path("empty.wav");
        File::create(&path).expect("无法创建空文件");
        log(
            "  生成 empty.wav (0 字节)",
            "  Generated empty.wav (0 bytes)",
        );
        path
    }
}

impl Default for AudioTestFixtures {
    fn default() -> Self {
        Self::new()
    }
}

/// 构造立体声16位斜坡WAV：头部声明 `declared_frames` 帧，实际只写入 `present_frames` 帧
pub fn truncated_wav_bytes(declared_frames: u32, present_frames: u32) -> Vec<u8> {
    let channels = 2u16;
    let sample_rate = 44_100u32;
    let bits_per_sample = 16u16;
    let block_align = channels * (bits_per_sample / 8);
    let byte_rate = sample_rate * u32::from(block_align);
    let data_size = declared_frames * u32::from(block_align);

    let mut bytes = Vec::with_capacity(44 + (present_frames * u32::from(block_align)) as usize);
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data_size).to_le_bytes());
    bytes.extend_from_slice(b"WAVE");
    bytes.extend_from_slice(b"fmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&channels.to_le_bytes());
    bytes.extend_from_slice(&sample_rate.to_le_bytes());
    bytes.extend_from_slice(&byte_rate.to_le_bytes());
    bytes.extend_from_slice(&block_align.to_le_bytes());
    bytes.extend_from_slice(&bits_per_sample.to_le_bytes());
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_size.to_le_bytes());

    for frame in 0..present_frames {
        let sample = ramp_sample(frame);
        bytes.extend_from_slice(&sample.to_le_bytes());
        bytes.extend_from_slice(&(-sample).to_le_bytes());
    }
    bytes
}

/// 读取整个文件（用于内存字节源测试）
pub fn read_fixture(path: &Path) -> Vec<u8> {
    std::fs::read(path).expect("无法读取固件")
}
