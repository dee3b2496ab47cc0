//! Process-wide pool of scratch byte buffers with scoped acquisition.
//!
//! Row-synthesis loops need a growable buffer per block; pooling keeps the
//! peak allocation bounded by the number of concurrent workers instead of the
//! number of blocks processed.

use std::ops::{Deref, DerefMut};
use std::sync::Mutex;

static POOL: Mutex<Vec<Vec<u8>>> = Mutex::new(Vec::new());

/// Buffers kept around after release; beyond this the pool lets them drop.
const POOL_MAX_IDLE: usize = 16;

/// A pooled scratch buffer. Returned to the pool (cleared, capacity kept) on
/// drop.
#[derive(Debug, Default)]
pub struct ScratchBuf {
    buf: Vec<u8>,
}

impl Deref for ScratchBuf {
    type Target = Vec<u8>;
    fn deref(&self) -> &Self::Target {
        &self.buf
    }
}

impl DerefMut for ScratchBuf {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.buf
    }
}

impl Drop for ScratchBuf {
    fn drop(&mut self) {
        let mut buf = std::mem::take(&mut self.buf);
        buf.clear();
        if let Ok(mut pool) = POOL.lock() {
            if pool.len() < POOL_MAX_IDLE {
                pool.push(buf);
            }
        }
    }
}

/// Acquire a cleared scratch buffer from the process-wide pool.
pub fn acquire_scratch() -> ScratchBuf {
    let buf = POOL
        .lock()
        .ok()
        .and_then(|mut pool| pool.pop())
        .unwrap_or_default();
    ScratchBuf { buf }
}
