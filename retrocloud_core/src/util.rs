//! General utility types.
use std::collections::vec_deque::Iter;
use std::collections::VecDeque;

/// Keeps the last `N` values pushed, newest first.
#[derive(Clone)]
pub struct RingBuffer<T, const N: usize> {
    pub stack: VecDeque<T>,
}

impl<T, const N: usize> RingBuffer<T, N> {
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn push(&mut self, data: T) {
        self.stack.push_front(data);
        self.stack.truncate(N);
    }

    pub fn iter(&self) -> Iter<'_, T> {
        self.stack.iter()
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn clear(&mut self) {
        self.stack.clear();
    }
}

impl<const N: usize> RingBuffer<f64, N> {
    pub fn average(&self) -> Option<f64> {
        if self.is_empty() {
            None
        } else {
            Some(self.iter().sum::<f64>() / self.len() as f64)
        }
    }
}

impl<T, const N: usize> Default for RingBuffer<T, N> {
    fn default() -> Self {
        Self {
            stack: Default::default(),
        }
    }
}

/// Measures the rate of recurring events, e.g. frames per second.
#[derive(Clone, Default)]
pub struct RateMeter {
    last: Option<f64>,
    intervals: RingBuffer<f64, 60>,
}

impl RateMeter {
    /// Records an event at `now` seconds.
    pub fn tick(&mut self, now: f64) {
        if let Some(last) = self.last {
            if now > last {
                self.intervals.push(now - last);
            }
        }
        self.last = Some(now);
    }

    pub fn reset(&mut self) {
        self.last = None;
        self.intervals.clear();
    }

    pub fn rate(&self) -> Option<f64> {
        self.intervals
            .average()
            .filter(|interval| *interval > 0.0)
            .map(|interval| 1.0 / interval)
    }
}
