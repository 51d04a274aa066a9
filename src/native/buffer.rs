//! 原生中间缓冲区
//!
//! 固定容量的字节区 + 读游标（position）+ 有效长度（limit）。
//! 不变量：position ≤ limit ≤ capacity。每次填充整体替换内容，不追加。
//! 容量只增不减；仍有未读数据时不允许扩容。

use std::io;

use crate::error::{AudioError, AudioResult};

#[derive(Debug)]
pub struct NativeBuffer {
    data: Vec<u8>,
    position: usize,
    limit: usize,
}

impl NativeBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![0u8; capacity],
            position: 0,
            limit: 0,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    #[inline]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// 未读字节数
    #[inline]
    pub fn remaining(&self) -> usize {
        self.limit - self.position
    }

    #[inline]
    pub fn has_remaining(&self) -> bool {
        self.position < self.limit
    }

    /// 确保容量至少为 `min_capacity`
    ///
    /// 只增不减；仍有未读数据时扩容会丢弃数据，因此返回错误。
    pub fn ensure_capacity(&mut self, min_capacity: usize) -> AudioResult<()> {
        if min_capacity <= self.data.len() {
            return Ok(());
        }
        if self.has_remaining() {
            return Err(AudioError::InvalidInput(format!(
                "缓冲区仍有 {} 字节未读，不能扩容 / cannot grow buffer with unread data",
                self.remaining()
            )));
        }
        self.data = vec![0u8; min_capacity];
        self.position = 0;
        self.limit = 0;
        Ok(())
    }

    /// 用一段解码数据整体替换缓冲区内容（必要时扩容），返回写入字节数
    pub fn load(&mut self, bytes: &[u8]) -> usize {
        if bytes.len() > self.data.len() {
            self.data = vec![0u8; bytes.len()];
        }
        self.data[..bytes.len()].copy_from_slice(bytes);
        self.position = 0;
        self.limit = bytes.len();
        bytes.len()
    }

    /// 由回调直接写入整个容量区，回调返回有效字节数
    pub fn refill_with<F>(&mut self, fill: F) -> io::Result<usize>
    where
        F: FnOnce(&mut [u8]) -> io::Result<usize>,
    {
        self.position = 0;
        self.limit = 0;
        let n = fill(&mut self.data)?;
        self.limit = n.min(self.data.len());
        Ok(self.limit)
    }

    /// 从缓冲区读出至多 `out.len()` 字节，返回读出字节数
    pub fn read_into(&mut self, out: &mut [u8]) -> usize {
        let n = self.remaining().min(out.len());
        out[..n].copy_from_slice(&self.data[self.position..self.position + n]);
        self.position += n;
        n
    }

    /// 丢弃未读内容（定位后使缓冲区失效）
    pub fn invalidate(&mut self) {
        self.position = 0;
        self.limit = 0;
    }

    /// 释放存储（关闭时调用）
    pub fn release(&mut self) {
        self.data = Vec::new();
        self.position = 0;
        self.limit = 0;
    }
}
