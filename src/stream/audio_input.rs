//! 音频输入流
//!
//! 缓冲解码流 + 格式 + 总帧数，并按读出的字节数跟踪帧位置。

use std::fmt;
use std::io::{self, Read};

use super::{BufferedDecodeStream, TimeUnit};
use crate::error::AudioResult;
use crate::format::AudioFormat;
use crate::native::{HandleCloser, PcmTarget};

pub struct AudioInputStream {
    stream: Box<dyn BufferedDecodeStream>,
    frame_length: Option<u64>,
    /// 当前帧位置
    frame_position: u64,
    /// 不足一帧的已读字节
    partial_bytes: usize,
}

impl AudioInputStream {
    pub fn new(stream: Box<dyn BufferedDecodeStream>, frame_length: Option<u64>) -> Self {
        Self {
            stream,
            frame_length,
            frame_position: 0,
            partial_bytes: 0,
        }
    }

    pub fn format(&self) -> &AudioFormat {
        self.stream.format()
    }

    /// 实际输出的PCM布局
    pub fn output(&self) -> PcmTarget {
        self.stream.output()
    }

    /// 总帧数（未知时None）
    pub fn frame_length(&self) -> Option<u64> {
        self.frame_length
    }

    pub fn frame_position(&self) -> u64 {
        self.frame_position
    }

    /// 输出数据中每帧字节数（声道数 × 每样本字节数）
    pub fn decoded_frame_size(&self) -> Option<usize> {
        let channels = usize::from(self.format().channels()?);
        Some(channels * self.output().bytes_per_sample()).filter(|size| *size > 0)
    }

    /// 输出数据的总字节数（总帧数已知时）
    pub fn decoded_byte_length(&self) -> Option<u64> {
        Some(self.frame_length? * self.decoded_frame_size()? as u64)
    }

    pub fn is_open(&self) -> bool {
        self.stream.is_open()
    }

    pub fn is_seekable(&self) -> bool {
        self.stream.is_seekable()
    }

    /// 按时间定位，帧位置同步更新
    pub fn seek(&mut self, position: u64, unit: TimeUnit) -> AudioResult<()> {
        self.stream.seek(position, unit)?;
        let micros = unit.to_micros(position)?;
        self.frame_position = self
            .format()
            .sample_rate()
            .map(|rate| (f64::from(rate) * micros as f64 / 1_000_000.0).round() as u64)
            .unwrap_or(0);
        self.partial_bytes = 0;
        Ok(())
    }

    /// 关闭（幂等）
    pub fn close(&mut self) -> AudioResult<()> {
        self.stream.close()
    }

    pub fn closer(&self) -> HandleCloser {
        self.stream.closer()
    }

    pub fn stream_mut(&mut self) -> &mut dyn BufferedDecodeStream {
        self.stream.as_mut()
    }

    /// 取回底层流（用于格式转换）
    pub fn into_inner(self) -> Box<dyn BufferedDecodeStream> {
        self.stream
    }
}

impl Read for AudioInputStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.stream.read(buf)?;
        if let Some(frame_size) = self.decoded_frame_size() {
            let total = self.partial_bytes + n;
            self.frame_position += (total / frame_size) as u64;
            self.partial_bytes = total % frame_size;
        }
        Ok(n)
    }
}

impl fmt::Debug for AudioInputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioInputStream")
            .field("format", &self.format().to_string())
            .field("frame_length", &self.frame_length)
            .field("frame_position", &self.frame_position)
            .field("open", &self.is_open())
            .finish()
    }
}
