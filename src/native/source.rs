//! 输入源
//!
//! 内存字节、本地文件、URL 和任意字节流四类来源。
//! 任意字节流支持"预读不消费"，探测只看到前缀，解码时从头开始读取。

use std::fmt;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;

use crate::constants::DRM_PROTECTED_EXTENSIONS;
use crate::format::extension_of;

/// 来源类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Bytes,
    File,
    Url,
    Reader,
}

/// 音频输入源
#[derive(Clone)]
pub enum Source {
    /// 内存中的完整数据
    Bytes(Bytes),
    /// 本地文件
    File(PathBuf),
    /// 远程URL（http/https）
    Url(String),
    /// 任意字节流（不可定位）
    Reader(SharedReader),
}

impl Source {
    pub fn bytes(data: impl Into<Bytes>) -> Self {
        Source::Bytes(data.into())
    }

    pub fn file(path: impl AsRef<Path>) -> Self {
        Source::File(path.as_ref().to_path_buf())
    }

    /// URL来源；`file://` URL 会被转换为本地文件来源
    pub fn url(url: impl Into<String>) -> Self {
        let url = url.into();
        match url.strip_prefix("file://") {
            Some(path) => Source::File(PathBuf::from(path)),
            None => Source::Url(url),
        }
    }

    pub fn reader<R: Read + Send + 'static>(reader: R) -> Self {
        Source::Reader(SharedReader::new(reader))
    }

    pub fn kind(&self) -> SourceKind {
        match self {
            Source::Bytes(_) => SourceKind::Bytes,
            Source::File(_) => SourceKind::File,
            Source::Url(_) => SourceKind::Url,
            Source::Reader(_) => SourceKind::Reader,
        }
    }

    /// 路径或URL（用于缓存键、扩展名判断和日志）
    pub fn location(&self) -> Option<String> {
        match self {
            Source::File(path) => Some(path.to_string_lossy().into_owned()),
            Source::Url(url) => Some(url.clone()),
            Source::Bytes(_) | Source::Reader(_) => None,
        }
    }

    /// 扩展名（小写）
    pub fn extension(&self) -> Option<String> {
        let location = self.location()?;
        extension_of(&location).map(|ext| ext.to_ascii_lowercase())
    }

    /// 字节长度：内存数据和本地文件可知，其余未知
    pub fn byte_length(&self) -> Option<u64> {
        match self {
            Source::Bytes(data) => Some(data.len() as u64),
            Source::File(path) => std::fs::metadata(path).ok().map(|m| m.len()),
            Source::Url(_) | Source::Reader(_) => None,
        }
    }

    /// 是否为DRM保护容器（按扩展名判断）
    pub fn is_drm_protected(&self) -> bool {
        self.extension()
            .is_some_and(|ext| DRM_PROTECTED_EXTENSIONS.contains(&ext.as_str()))
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Bytes(data) => write!(f, "Source::Bytes({} bytes)", data.len()),
            Source::File(path) => write!(f, "Source::File({})", path.display()),
            Source::Url(url) => write!(f, "Source::Url({url})"),
            Source::Reader(_) => f.write_str("Source::Reader(..)"),
        }
    }
}

impl From<Bytes> for Source {
    fn from(data: Bytes) -> Self {
        Source::Bytes(data)
    }
}

impl From<Vec<u8>> for Source {
    fn from(data: Vec<u8>) -> Self {
        Source::Bytes(Bytes::from(data))
    }
}

impl From<PathBuf> for Source {
    fn from(path: PathBuf) -> Self {
        Source::File(path)
    }
}

impl From<&Path> for Source {
    fn from(path: &Path) -> Self {
        Source::File(path.to_path_buf())
    }
}

/// 可预读的字节流
struct PeekableReader {
    prefix: Vec<u8>,
    consumed: usize,
    inner: Box<dyn Read + Send>,
}

impl PeekableReader {
    fn peek(&mut self, limit: usize) -> io::Result<&[u8]> {
        let mut chunk = [0u8; 4096];
        while self.prefix.len() < limit {
            let want = (limit - self.prefix.len()).min(chunk.len());
            match self.inner.read(&mut chunk[..want]) {
                Ok(0) => break,
                Ok(n) => self.prefix.extend_from_slice(&chunk[..n]),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        let end = self.prefix.len().min(limit);
        Ok(&self.prefix[self.consumed.min(end)..end])
    }
}

impl Read for PeekableReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.consumed < self.prefix.len() {
            let n = (self.prefix.len() - self.consumed).min(buf.len());
            buf[..n].copy_from_slice(&self.prefix[self.consumed..self.consumed + n]);
            self.consumed += n;
            if self.consumed == self.prefix.len() {
                self.prefix = Vec::new();
                self.consumed = 0;
            }
            return Ok(n);
        }
        self.inner.read(buf)
    }
}

/// 共享的可预读字节流
///
/// 克隆共享同一底层流：探测阶段只预读，解码阶段才真正消费。
#[derive(Clone)]
pub struct SharedReader(Arc<Mutex<PeekableReader>>);

impl SharedReader {
    pub fn new<R: Read + Send + 'static>(reader: R) -> Self {
        SharedReader(Arc::new(Mutex::new(PeekableReader {
            prefix: Vec::new(),
            consumed: 0,
            inner: Box::new(reader),
        })))
    }

    /// 预读至多 `limit` 字节（不消费），返回尚未被读取的前缀副本
    pub fn peek(&self, limit: usize) -> io::Result<Bytes> {
        let mut guard = self.0.lock();
        guard.peek(limit).map(Bytes::copy_from_slice)
    }
}

impl Read for SharedReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.lock().read(buf)
    }
}
