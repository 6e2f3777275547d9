use crate::{Price, price_window::PriceWindow, ring_buffer::RingBuffer};

/// Price change over `length` bars: `x[t] − x[t − length]`.
#[derive(Clone, Debug)]
pub(crate) struct MomentumCore {
    length: usize,
    history: RingBuffer<Price>,
}

impl MomentumCore {
    pub(crate) fn new(length: usize) -> Self {
        Self {
            length,
            history: RingBuffer::new(length + 1),
        }
    }

    pub(crate) fn push(&mut self, price: Price) -> Option<f64> {
        self.history.push(price);
        self.history
            .is_full()
            .then(|| self.history.oldest())
            .flatten()
            .map(|base| price - base)
    }

    pub(crate) fn preview(&self, price: Price) -> Option<f64> {
        let base_index = self.history.len().checked_sub(self.length)?;
        self.history.get(base_index).map(|base| price - base)
    }
}

/// Awesome Oscillator: fast SMA minus slow SMA of the median price.
#[derive(Clone, Debug)]
pub(crate) struct AwesomeCore {
    fast: PriceWindow,
    slow: PriceWindow,
}

impl AwesomeCore {
    pub(crate) fn new(fast_length: usize, slow_length: usize) -> Self {
        Self {
            fast: PriceWindow::new(fast_length),
            slow: PriceWindow::new(slow_length),
        }
    }

    /// Feeds the median price `(high + low) / 2`.
    pub(crate) fn push(&mut self, median: Price) -> Option<f64> {
        self.fast.push(median);
        self.slow.push(median);
        Some(self.fast.mean()? - self.slow.mean()?)
    }

    pub(crate) fn preview(&self, median: Price) -> Option<f64> {
        Some(self.fast.preview_mean(median)? - self.slow.preview_mean(median)?)
    }
}
