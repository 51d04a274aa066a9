//! 原生解码句柄
//!
//! [`RawHandle`] 是引擎侧会话的不透明标识；[`NativeHandle`] 是它的唯一所有者，
//! 通过原子关闭标记保证引擎的 `close` 恰好被调用一次，`Drop` 在所有退出路径上兜底关闭。

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::{debug, warn};

use super::NativeDecoder;
use crate::error::{AudioError, AudioResult};

/// 不透明的会话标识（0 表示无效）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawHandle(u64);

impl RawHandle {
    pub const NULL: RawHandle = RawHandle(0);

    #[inline]
    pub const fn new(value: u64) -> Self {
        RawHandle(value)
    }

    #[inline]
    pub fn value(&self) -> u64 {
        self.0
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        self.0 == 0
    }

    /// 分配进程内唯一的新标识
    pub fn allocate() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        RawHandle(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for RawHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 句柄唯一所有者
///
/// 不可克隆；需要在其他上下文中关闭时使用 [`HandleCloser`]。
pub struct NativeHandle {
    raw: RawHandle,
    engine: Arc<dyn NativeDecoder>,
    closed: Arc<AtomicBool>,
}

impl NativeHandle {
    pub fn new(engine: Arc<dyn NativeDecoder>, raw: RawHandle) -> Self {
        Self {
            raw,
            engine,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// 有效的原始句柄；已关闭时返回 `StreamClosed`
    pub fn raw(&self) -> AudioResult<RawHandle> {
        if self.is_closed() {
            Err(AudioError::StreamClosed)
        } else {
            Ok(self.raw)
        }
    }

    pub fn engine(&self) -> &dyn NativeDecoder {
        self.engine.as_ref()
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// 关闭句柄（幂等）；只有第一次调用会触达引擎
    pub fn close(&self) -> AudioResult<()> {
        close_once(&self.closed, self.engine.as_ref(), self.raw)
    }

    pub fn closer(&self) -> HandleCloser {
        HandleCloser {
            raw: self.raw,
            engine: Arc::clone(&self.engine),
            closed: Arc::clone(&self.closed),
        }
    }
}

impl Drop for NativeHandle {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(handle = %self.raw, engine = self.engine.name(), "关闭原生句柄失败 / close failed: {e}");
        }
    }
}

impl fmt::Debug for NativeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeHandle")
            .field("raw", &self.raw)
            .field("engine", &self.engine.name())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// 可跨上下文使用的关闭器（异常拆除路径）
#[derive(Clone)]
pub struct HandleCloser {
    raw: RawHandle,
    engine: Arc<dyn NativeDecoder>,
    closed: Arc<AtomicBool>,
}

impl HandleCloser {
    pub fn close(&self) -> AudioResult<()> {
        close_once(&self.closed, self.engine.as_ref(), self.raw)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

fn close_once(closed: &AtomicBool, engine: &dyn NativeDecoder, raw: RawHandle) -> AudioResult<()> {
    if closed.swap(true, Ordering::AcqRel) {
        return Ok(());
    }
    debug!(handle = %raw, engine = engine.name(), "关闭原生句柄 / closing native handle");
    engine.close(raw)
}

/// 引擎内部的会话表
///
/// 关闭时从表中移除；正在进行的填充持有自己的 `Arc`，会话在其结束后才释放。
pub(crate) struct SessionTable<S> {
    sessions: Mutex<HashMap<RawHandle, Arc<Mutex<S>>>>,
}

impl<S> SessionTable<S> {
    pub(crate) fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn insert(&self, session: S) -> RawHandle {
        let handle = RawHandle::allocate();
        self.sessions
            .lock()
            .insert(handle, Arc::new(Mutex::new(session)));
        handle
    }

    pub(crate) fn get(&self, handle: RawHandle) -> AudioResult<Arc<Mutex<S>>> {
        self.sessions
            .lock()
            .get(&handle)
            .cloned()
            .ok_or_else(|| AudioError::Engine(format!("无效句柄 / unknown handle {handle}")))
    }

    pub(crate) fn remove(&self, handle: RawHandle) -> Option<Arc<Mutex<S>>> {
        self.sessions.lock().remove(&handle)
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.sessions.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_is_unique_and_non_null() {
        let a = RawHandle::allocate();
        let b = RawHandle::allocate();
        assert_ne!(a, b);
        assert!(!a.is_null());
        assert!(RawHandle::NULL.is_null());
    }

    #[test]
    fn test_session_table_lifecycle() {
        let table: SessionTable<u32> = SessionTable::new();
        let h = table.insert(7);
        assert_eq!(*table.get(h).unwrap().lock(), 7);
        assert_eq!(table.len(), 1);

        let held = table.get(h).unwrap();
        assert!(table.remove(h).is_some());
        // 移除后仍持有的引用保持有效
        assert_eq!(*held.lock(), 7);
        assert!(table.get(h).is_err());
        assert!(table.remove(h).is_none());
    }
}
