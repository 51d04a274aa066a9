//! 四种来源变体
//!
//! 各变体只在"如何把字节与定位能力交给原生层"上不同，读取与定位逻辑由 [`NativePeer`] 提供。

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;

use super::{BufferedDecodeStream, NativePeer, TimeUnit};
use crate::error::AudioResult;
use crate::format::AudioFormat;
use crate::native::{FillStatus, HandleCloser, NativeDecoder, PcmTarget, SharedReader, Source};

/// 打开一条流所需的参数
#[derive(Debug, Clone)]
pub struct StreamSetup {
    pub stream_index: usize,
    pub format: AudioFormat,
    pub output: PcmTarget,
    pub buffer_capacity: usize,
}

macro_rules! peer_stream {
    ($name:ident) => {
        impl Read for $name {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                self.peer.read(buf).map_err(io::Error::from)
            }
        }

        impl BufferedDecodeStream for $name {
            fn is_open(&self) -> bool {
                self.peer.is_open()
            }

            fn is_seekable(&self) -> bool {
                self.peer.is_seekable()
            }

            fn format(&self) -> &AudioFormat {
                &self.format
            }

            fn output(&self) -> PcmTarget {
                self.output
            }

            fn fill(&mut self) -> AudioResult<FillStatus> {
                self.peer.fill()
            }

            fn seek(&mut self, position: u64, unit: TimeUnit) -> AudioResult<()> {
                self.peer.seek(position, unit)
            }

            fn set_output(&mut self, target: &PcmTarget) -> AudioResult<()> {
                self.peer.set_output(target)?;
                self.output = *target;
                Ok(())
            }

            fn close(&mut self) -> AudioResult<()> {
                self.peer.close()
            }

            fn closer(&self) -> HandleCloser {
                self.peer.closer()
            }
        }
    };
}

/// 内存字节流（始终可定位）
#[derive(Debug)]
pub struct ByteArrayStream {
    peer: NativePeer,
    format: AudioFormat,
    output: PcmTarget,
    len: usize,
}

impl ByteArrayStream {
    pub fn open(engine: Arc<dyn NativeDecoder>, data: Bytes, setup: StreamSetup) -> AudioResult<Self> {
        let len = data.len();
        let peer = NativePeer::open(engine, &Source::Bytes(data), &setup, true)?;
        Ok(Self {
            peer,
            format: setup.format,
            output: setup.output,
            len,
        })
    }

    /// 原始（编码）数据长度
    pub fn source_len(&self) -> usize {
        self.len
    }
}

peer_stream!(ByteArrayStream);

/// 本地文件流（可随机访问）
#[derive(Debug)]
pub struct FileStream {
    peer: NativePeer,
    format: AudioFormat,
    output: PcmTarget,
    path: PathBuf,
}

impl FileStream {
    pub fn open(engine: Arc<dyn NativeDecoder>, path: &Path, setup: StreamSetup) -> AudioResult<Self> {
        let peer = NativePeer::open(engine, &Source::file(path), &setup, true)?;
        Ok(Self {
            peer,
            format: setup.format,
            output: setup.output,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

peer_stream!(FileStream);

/// URL流（服务器支持Range请求时可定位）
#[derive(Debug)]
pub struct UrlStream {
    peer: NativePeer,
    format: AudioFormat,
    output: PcmTarget,
    url: String,
}

impl UrlStream {
    pub fn open(engine: Arc<dyn NativeDecoder>, url: &str, setup: StreamSetup) -> AudioResult<Self> {
        let source = Source::Url(url.to_string());
        let peer = NativePeer::open(engine, &source, &setup, true)?;
        Ok(Self {
            peer,
            format: setup.format,
            output: setup.output,
            url: url.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

peer_stream!(UrlStream);

/// 任意字节流（从不可定位）
#[derive(Debug)]
pub struct ReaderStream {
    peer: NativePeer,
    format: AudioFormat,
    output: PcmTarget,
}

impl ReaderStream {
    pub fn open(engine: Arc<dyn NativeDecoder>, reader: SharedReader, setup: StreamSetup) -> AudioResult<Self> {
        let peer = NativePeer::open(engine, &Source::Reader(reader), &setup, false)?;
        Ok(Self {
            peer,
            format: setup.format,
            output: setup.output,
        })
    }
}

peer_stream!(ReaderStream);

/// 按来源类型打开对应的流变体
pub fn open_stream(
    engine: Arc<dyn NativeDecoder>,
    source: &Source,
    setup: StreamSetup,
) -> AudioResult<Box<dyn BufferedDecodeStream>> {
    Ok(match source {
        Source::Bytes(data) => Box::new(ByteArrayStream::open(engine, data.clone(), setup)?),
        Source::File(path) => Box::new(FileStream::open(engine, path, setup)?),
        Source::Url(url) => Box::new(UrlStream::open(engine, url, setup)?),
        Source::Reader(reader) => Box::new(ReaderStream::open(engine, reader.clone(), setup)?),
    })
}
