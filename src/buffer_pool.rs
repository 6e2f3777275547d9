use std::collections::HashMap;

/// Recycles fixed-length `f64` scratch buffers.
///
/// Buffers are bucketed by exact length and handed out last-in first-out.
/// A freshly allocated buffer is `NaN`-filled; a recycled buffer keeps
/// whatever its previous user wrote, so callers must overwrite every slot
/// they read.
///
/// A pool belongs to one computation context (a batch calculator or an
/// engine) and is passed explicitly; it is not shared between threads.
#[derive(Debug, Default)]
pub struct BufferPool {
    buckets: HashMap<usize, Vec<Vec<f64>>>,
}

impl BufferPool {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a buffer of exactly `len` elements.
    #[must_use]
    pub fn acquire(&mut self, len: usize) -> Vec<f64> {
        self.buckets
            .get_mut(&len)
            .and_then(Vec::pop)
            .unwrap_or_else(|| vec![f64::NAN; len])
    }

    /// Gives a buffer back for reuse by a later `acquire` of the same length.
    pub fn release(&mut self, buffer: Vec<f64>) {
        self.buckets.entry(buffer.len()).or_default().push(buffer);
    }

    /// Drops every pooled buffer.
    pub fn clear(&mut self) {
        self.buckets.clear();
    }

    /// Number of buffers currently waiting for reuse.
    #[must_use]
    pub fn pooled_len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_buffer_is_nan_filled() {
        let mut pool = BufferPool::new();
        let buf = pool.acquire(4);
        assert_eq!(buf.len(), 4);
        assert!(buf.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn released_buffer_is_reused() {
        let mut pool = BufferPool::new();
        let buf = pool.acquire(8);
        let ptr = buf.as_ptr();
        pool.release(buf);

        let again = pool.acquire(8);
        assert_eq!(again.as_ptr(), ptr);
        assert_eq!(pool.pooled_len(), 0);
    }

    #[test]
    fn reuse_is_last_in_first_out() {
        let mut pool = BufferPool::new();
        let first = pool.acquire(3);
        let second = pool.acquire(3);
        let (first_ptr, second_ptr) = (first.as_ptr(), second.as_ptr());
        pool.release(first);
        pool.release(second);

        assert_eq!(pool.acquire(3).as_ptr(), second_ptr);
        assert_eq!(pool.acquire(3).as_ptr(), first_ptr);
    }

    #[test]
    fn lengths_do_not_mix() {
        let mut pool = BufferPool::new();
        let buf = pool.acquire(5);
        let ptr = buf.as_ptr();
        pool.release(buf);

        let other = pool.acquire(6);
        assert_ne!(other.as_ptr(), ptr);
        assert_eq!(other.len(), 6);
        assert_eq!(pool.pooled_len(), 1);
    }

    #[test]
    fn recycled_buffer_keeps_stale_contents() {
        let mut pool = BufferPool::new();
        let mut buf = pool.acquire(2);
        buf[0] = 42.0;
        pool.release(buf);
        assert_eq!(pool.acquire(2)[0].to_bits(), 42.0_f64.to_bits());
    }

    #[test]
    fn clear_drops_pooled_buffers() {
        let mut pool = BufferPool::new();
        let buf = pool.acquire(7);
        pool.release(buf);
        pool.clear();
        assert_eq!(pool.pooled_len(), 0);
        assert!(pool.acquire(7).iter().all(|v| v.is_nan()));
    }
}
