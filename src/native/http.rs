//! HTTP(S)字节源
//!
//! 基于 reqwest 阻塞客户端的 `Read + Seek` 实现。
//! 服务器支持 Range 请求且长度已知时可定位；定位时按新偏移重新发起请求。

use std::io::{self, Read, Seek, SeekFrom};
use std::time::Duration;

use parking_lot::Mutex;
use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use reqwest::header::{ACCEPT_RANGES, CONTENT_RANGE, RANGE};
use tracing::debug;

use crate::error::{AudioError, AudioResult};

/// 远程音频数据源
pub struct HttpSource {
    client: Client,
    url: String,
    length: Option<u64>,
    seekable: bool,
    position: u64,
    /// 当前响应体；定位后置空，下次读取时按新偏移重新请求
    body: Mutex<Option<Response>>,
}

impl HttpSource {
    /// 连接并检测Range支持
    pub fn open(url: &str, timeout: Duration) -> AudioResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AudioError::Io(io::Error::other(e)))?;

        let response = client
            .get(url)
            .header(RANGE, "bytes=0-")
            .send()
            .and_then(Response::error_for_status)
            .map_err(|e| http_io_error(url, e))?;

        let (seekable, length) = range_capabilities(&response);
        debug!(url, seekable, ?length, "HTTP源已连接 / HTTP source connected");

        Ok(Self {
            client,
            url: url.to_string(),
            length,
            seekable,
            position: 0,
            body: Mutex::new(Some(response)),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_seekable(&self) -> bool {
        self.seekable
    }

    pub fn len(&self) -> Option<u64> {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == Some(0)
    }

    fn request_from(&self, offset: u64) -> io::Result<Response> {
        debug!(url = %self.url, offset, "HTTP Range请求 / range request");
        let response = self
            .client
            .get(&self.url)
            .header(RANGE, format!("bytes={offset}-"))
            .send()
            .and_then(Response::error_for_status)
            .map_err(|e| io::Error::from(http_io_error(&self.url, e)))?;
        if offset > 0 && response.status() != StatusCode::PARTIAL_CONTENT {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "服务器忽略了Range请求 / server ignored range request",
            ));
        }
        Ok(response)
    }
}

/// 由首个响应判断是否支持定位及总长度
fn range_capabilities(response: &Response) -> (bool, Option<u64>) {
    if response.status() == StatusCode::PARTIAL_CONTENT {
        // Content-Range: bytes 0-1023/4096
        let total = response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.rsplit('/').next())
            .and_then(|v| v.trim().parse::<u64>().ok());
        return (total.is_some(), total);
    }
    let accepts = response
        .headers()
        .get(ACCEPT_RANGES)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("bytes"));
    let length = response.content_length();
    (accepts && length.is_some(), length)
}

fn http_io_error(url: &str, err: reqwest::Error) -> AudioError {
    let kind = if err.is_timeout() {
        io::ErrorKind::TimedOut
    } else if err.status().is_some_and(|s| s == StatusCode::NOT_FOUND) {
        io::ErrorKind::NotFound
    } else {
        io::ErrorKind::Other
    };
    AudioError::Io(io::Error::new(kind, format!("{url}: {err}")))
}

impl Read for HttpSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.length.is_some_and(|len| self.position >= len) {
            return Ok(0);
        }
        if self.body.get_mut().is_none() {
            let response = self.request_from(self.position)?;
            *self.body.get_mut() = Some(response);
        }
        let n = match self.body.get_mut().as_mut() {
            Some(body) => body.read(buf)?,
            None => 0,
        };
        self.position += n as u64;
        Ok(n)
    }
}

impl Seek for HttpSource {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(p) => Some(p),
            SeekFrom::Current(delta) => self.position.checked_add_signed(delta),
            SeekFrom::End(delta) => self.length.and_then(|len| len.checked_add_signed(delta)),
        }
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "无效定位 / invalid seek"))?;

        if target == self.position {
            return Ok(target);
        }
        if !self.seekable {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                AudioError::NotSeekable,
            ));
        }
        self.position = target;
        *self.body.get_mut() = None;
        Ok(target)
    }
}

impl symphonia::core::io::MediaSource for HttpSource {
    fn is_seekable(&self) -> bool {
        self.seekable
    }

    fn byte_len(&self) -> Option<u64> {
        self.length
    }
}
