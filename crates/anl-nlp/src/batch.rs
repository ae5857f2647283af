//! Batch-size schedules and minibatching.

/// Infinite series `start, start * factor, start * factor², …` clipped to
/// `stop`. A shrinking series (`start > stop`) is clipped from below.
#[derive(Debug, Clone)]
pub struct Compounding {
    current: f64,
    stop: f64,
    factor: f64,
}

/// Build a [`Compounding`] schedule.
#[must_use]
pub const fn compounding(start: f64, stop: f64, factor: f64) -> Compounding {
    Compounding {
        current: start,
        stop,
        factor,
    }
}

impl Iterator for Compounding {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        let value = if self.current <= self.stop {
            self.current.min(self.stop)
        } else {
            self.current.max(self.stop)
        };
        self.current *= self.factor;
        Some(value)
    }
}

/// Consecutive slices of `items` whose lengths follow `sizes`.
///
/// Each size is truncated to an integer (minimum one). The last batch may be
/// shorter.
pub struct Minibatch<'a, T, S> {
    items: &'a [T],
    sizes: S,
}

/// Split `items` into batches sized by the `sizes` schedule.
pub const fn minibatch<T, S>(items: &[T], sizes: S) -> Minibatch<'_, T, S>
where
    S: Iterator<Item = f64>,
{
    Minibatch { items, sizes }
}

impl<'a, T, S> Iterator for Minibatch<'a, T, S>
where
    S: Iterator<Item = f64>,
{
    type Item = &'a [T];

    fn next(&mut self) -> Option<&'a [T]> {
        if self.items.is_empty() {
            return None;
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let size = (self.sizes.next()?.floor() as usize).max(1);
        let (batch, rest) = self.items.split_at(size.min(self.items.len()));
        self.items = rest;
        Some(batch)
    }
}
