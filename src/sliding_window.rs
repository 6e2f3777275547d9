//! Rolling maximum and minimum in O(n) using a monotonic deque.

/// Indices of window candidates kept in a fixed ring of `period + 1` slots.
struct MonotonicDeque {
    slots: Vec<usize>,
    head: usize,
    len: usize,
}

impl MonotonicDeque {
    fn new(period: usize) -> Self {
        Self {
            slots: vec![0; period + 1],
            head: 0,
            len: 0,
        }
    }

    #[inline]
    fn slot(&self, offset: usize) -> usize {
        (self.head + offset) % self.slots.len()
    }

    #[inline]
    fn front(&self) -> Option<usize> {
        (self.len > 0).then(|| self.slots[self.head])
    }

    #[inline]
    fn back(&self) -> Option<usize> {
        (self.len > 0).then(|| self.slots[self.slot(self.len - 1)])
    }

    #[inline]
    fn pop_front(&mut self) {
        self.head = self.slot(1);
        self.len -= 1;
    }

    #[inline]
    fn pop_back(&mut self) {
        self.len -= 1;
    }

    #[inline]
    fn push_back(&mut self, index: usize) {
        let slot = self.slot(self.len);
        self.slots[slot] = index;
        self.len += 1;
    }
}

/// Rolling maximum over `period` values.
///
/// `out[i]` is `NaN` for `i < period − 1`. `NaN` inputs never become the
/// extreme but still occupy their slot in the window; a window holding only
/// `NaN`s yields `NaN`. `period == 0` or `period > data.len()` yields all
/// `NaN`.
#[must_use]
pub fn rolling_max(data: &[f64], period: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; data.len()];
    rolling_max_into(data, period, &mut out);
    out
}

/// Rolling minimum over `period` values. See [`rolling_max`].
#[must_use]
pub fn rolling_min(data: &[f64], period: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; data.len()];
    rolling_min_into(data, period, &mut out);
    out
}

/// [`rolling_max`] into a caller-supplied buffer of the same length.
pub fn rolling_max_into(data: &[f64], period: usize, out: &mut [f64]) {
    rolling_extreme_into(data, period, out, |candidate, incoming| candidate <= incoming);
}

/// [`rolling_min`] into a caller-supplied buffer of the same length.
pub fn rolling_min_into(data: &[f64], period: usize, out: &mut [f64]) {
    rolling_extreme_into(data, period, out, |candidate, incoming| candidate >= incoming);
}

/// Maximum of a single window, ignoring `NaN`s; `NaN` when none is valid.
///
/// Agrees with the last element of [`rolling_max`] over the same values and
/// serves callers that keep their own bounded window.
pub(crate) fn window_max(values: impl IntoIterator<Item = f64>) -> f64 {
    values
        .into_iter()
        .filter(|v| !v.is_nan())
        .reduce(f64::max)
        .unwrap_or(f64::NAN)
}

/// Minimum of a single window. See [`window_max`].
pub(crate) fn window_min(values: impl IntoIterator<Item = f64>) -> f64 {
    values
        .into_iter()
        .filter(|v| !v.is_nan())
        .reduce(f64::min)
        .unwrap_or(f64::NAN)
}

/// `dominated(candidate, incoming)` is true when `incoming` makes the
/// queued candidate irrelevant for every later window.
fn rolling_extreme_into(
    data: &[f64],
    period: usize,
    out: &mut [f64],
    dominated: impl Fn(f64, f64) -> bool,
) {
    debug_assert_eq!(data.len(), out.len(), "output length must match input");
    out.fill(f64::NAN);

    if period == 0 || period > data.len() {
        return;
    }

    let mut deque = MonotonicDeque::new(period);

    for (i, &value) in data.iter().enumerate() {
        while deque.front().is_some_and(|front| front + period <= i) {
            deque.pop_front();
        }

        if !value.is_nan() {
            while deque.back().is_some_and(|back| dominated(data[back], value)) {
                deque.pop_back();
            }
            deque.push_back(i);
        }

        if i + 1 >= period
            && let Some(front) = deque.front()
        {
            out[i] = data[front];
        }
    }
}
