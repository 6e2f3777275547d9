/// Fixed-capacity FIFO. Pushing into a full buffer evicts and returns the
/// oldest element.
#[derive(Clone, Debug)]
pub(crate) struct RingBuffer<T: Copy> {
    buffer: Vec<T>,
    head: usize,
    len: usize,
    capacity: usize,
}

impl<T: Copy> RingBuffer<T> {
    #[must_use]
    pub(crate) fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0, "ring buffer capacity must be positive");
        Self {
            buffer: Vec::with_capacity(capacity),
            head: 0,
            len: 0,
            capacity,
        }
    }

    #[inline]
    pub(crate) fn is_full(&self) -> bool {
        self.len == self.capacity
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub(crate) fn push(&mut self, value: T) -> Option<T> {
        if self.is_full() {
            let old = self.buffer[self.head];

            self.buffer[self.head] = value;

            self.head += 1;
            if self.head == self.capacity {
                self.head = 0;
            }

            Some(old)
        } else {
            self.buffer.push(value);
            self.len += 1;

            None
        }
    }

    /// Element `index` positions after the oldest.
    #[inline]
    pub(crate) fn get(&self, index: usize) -> Option<T> {
        (index < self.len).then(|| self.buffer[(self.head + index) % self.capacity])
    }

    /// Element that the next push into a full buffer would evict.
    #[inline]
    pub(crate) fn oldest(&self) -> Option<T> {
        self.get(0)
    }

    #[inline]
    pub(crate) fn newest(&self) -> Option<T> {
        self.len.checked_sub(1).and_then(|i| self.get(i))
    }

    /// Oldest to newest.
    pub(crate) fn iter(&self) -> impl Iterator<Item = T> + Clone + '_ {
        (0..self.len).map(|i| self.buffer[(self.head + i) % self.capacity])
    }
}
