//! 原生对端：句柄 + 中间缓冲区
//!
//! 所有流变体共享的核心。读取优先消费缓冲区中的未读数据，
//! 缓冲区耗尽时才调用一次原生填充；流结束用哨兵表示而不是错误。

use std::sync::Arc;

use tracing::debug;

use super::{StreamSetup, TimeUnit};
use crate::error::{AudioError, AudioResult};
use crate::native::{
    FillStatus, HandleCloser, NativeBuffer, NativeDecoder, NativeHandle, PcmTarget, Source,
};

/// 单条流独占的原生资源
#[derive(Debug)]
pub struct NativePeer {
    handle: NativeHandle,
    buffer: NativeBuffer,
    seekable: bool,
    end_of_stream: bool,
}

impl NativePeer {
    /// 打开原生会话、设置输出布局并分配缓冲区
    ///
    /// `allow_seek` 为false时无论引擎能力如何都不可定位。
    pub fn open(
        engine: Arc<dyn NativeDecoder>,
        source: &Source,
        setup: &StreamSetup,
        allow_seek: bool,
    ) -> AudioResult<Self> {
        let raw = engine.open(source, setup.stream_index, setup.buffer_capacity)?;
        // 句柄先交给所有者，之后任何失败都会在Drop中关闭
        let handle = NativeHandle::new(engine, raw);
        let engine = handle.engine();
        engine.set_output(raw, &setup.output)?;
        let seekable = allow_seek && engine.is_seekable(raw);
        debug!(handle = %raw, engine = engine.name(), seekable, "原生流已打开 / native stream opened");

        Ok(Self {
            handle,
            buffer: NativeBuffer::new(setup.buffer_capacity),
            seekable,
            end_of_stream: false,
        })
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        !self.handle.is_closed()
    }

    #[inline]
    pub fn is_seekable(&self) -> bool {
        self.seekable
    }

    /// 缓冲区中尚未读出的字节数
    #[inline]
    pub fn buffered(&self) -> usize {
        self.buffer.remaining()
    }

    /// 缓冲区耗尽时从原生层填充一次；仍有未读数据时不触达原生层
    pub fn fill(&mut self) -> AudioResult<FillStatus> {
        let raw = self.handle.raw()?;
        if self.buffer.has_remaining() {
            return Ok(FillStatus::Data(self.buffer.remaining()));
        }
        if self.end_of_stream {
            return Ok(FillStatus::EndOfStream);
        }

        match self.handle.engine().fill(raw, &mut self.buffer)? {
            FillStatus::Data(n) if n > 0 => Ok(FillStatus::Data(n)),
            _ => {
                self.end_of_stream = true;
                self.buffer.invalidate();
                Ok(FillStatus::EndOfStream)
            }
        }
    }

    /// 读取至多 `out.len()` 字节，流结束返回0
    pub fn read(&mut self, out: &mut [u8]) -> AudioResult<usize> {
        self.handle.raw()?;
        if out.is_empty() {
            return Ok(0);
        }
        if !self.buffer.has_remaining() {
            if let FillStatus::EndOfStream = self.fill()? {
                return Ok(0);
            }
        }
        Ok(self.buffer.read_into(out))
    }

    /// 按时间定位
    ///
    /// 不可定位时在任何原生调用之前失败；成功时丢弃缓冲区中的旧数据。
    pub fn seek(&mut self, position: u64, unit: TimeUnit) -> AudioResult<()> {
        let raw = self.handle.raw()?;
        if !self.seekable {
            return Err(AudioError::NotSeekable);
        }
        let micros = unit.to_micros(position)?;
        self.buffer.invalidate();
        self.handle.engine().seek(raw, micros)?;
        self.end_of_stream = false;
        Ok(())
    }

    /// 重新配置原生输出布局；缓冲区中仍有旧布局的数据时拒绝
    pub fn set_output(&mut self, target: &PcmTarget) -> AudioResult<()> {
        let raw = self.handle.raw()?;
        if self.buffer.has_remaining() {
            return Err(AudioError::IllegalConversion(format!(
                "缓冲区仍有 {} 字节未读 / stream already has unread decoded data",
                self.buffer.remaining()
            )));
        }
        self.handle.engine().set_output(raw, target)
    }

    /// 关闭（幂等）：释放缓冲区并恰好关闭一次原生句柄
    pub fn close(&mut self) -> AudioResult<()> {
        self.buffer.release();
        self.handle.close()
    }

    pub fn closer(&self) -> HandleCloser {
        self.handle.closer()
    }
}
