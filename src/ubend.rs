//! Fixed-capacity circular buffer with eviction tracking.
//!
//! `Ubend` is the storage primitive shared by [`crate::Peaks`] (which layers
//! running moments on top) and [`crate::normalizer::Normalizer`] (which uses
//! it directly as a moving-average window). It never aliases its buffer: it
//! is always owned outright by exactly one of those two types.

/// A circular buffer of capacity `C` that starts empty, fills up, and then
/// overwrites its oldest entry on every further push.
#[derive(Debug, Clone)]
pub struct Ubend {
    cursor: usize,
    capacity: usize,
    last_erased: f64,
    filled: bool,
    data: Vec<f64>,
    /// Running sum of the buffer contents, maintained incrementally.
    sum: f64,
    /// Running sum of squares of the buffer contents, maintained incrementally.
    sum_sq: f64,
    /// Snapshot needed to undo the most recent push; consumed by `cancel`.
    undo: Option<PushUndo>,
}

#[derive(Debug, Clone, Copy)]
struct PushUndo {
    cursor: usize,
    filled: bool,
    sum: f64,
    sum_sq: f64,
    last_erased: f64,
    overwritten_slot_value: f64,
}

/// Wire representation matching the persistent-state layout: only the
/// fields that uniquely determine the buffer's contents are carried across
/// serialization, with `sum`/`sum_sq` rebuilt on load rather than trusted.
#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct UbendData {
    cursor: usize,
    capacity: usize,
    #[serde(
        rename = "last_erased_data",
        skip_serializing_if = "is_nan_ref",
        default = "nan"
    )]
    last_erased_data: f64,
    filled: bool,
    data: Vec<f64>,
}

#[cfg(feature = "serde")]
fn nan() -> f64 {
    f64::NAN
}

#[cfg(feature = "serde")]
fn is_nan_ref(x: &f64) -> bool {
    x.is_nan()
}

#[cfg(feature = "serde")]
impl serde::Serialize for Ubend {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        UbendData {
            cursor: self.cursor,
            capacity: self.capacity,
            last_erased_data: self.last_erased,
            filled: self.filled,
            data: self.data.clone(),
        }
        .serialize(serializer)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Ubend {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = UbendData::deserialize(deserializer)?;
        let mut ubend = Ubend {
            cursor: raw.cursor,
            capacity: raw.capacity,
            last_erased: raw.last_erased_data,
            filled: raw.filled,
            data: raw.data,
            sum: 0.0,
            sum_sq: 0.0,
            undo: None,
        };
        ubend.recompute_moments();
        Ok(ubend)
    }
}

impl Ubend {
    /// Creates an empty buffer of the given `capacity`. Capacity `0` is
    /// legal: every push then reports "no eviction" and size stays `0`.
    pub fn new(capacity: usize) -> Self {
        Self {
            cursor: 0,
            capacity,
            last_erased: f64::NAN,
            filled: false,
            data: vec![0.0; capacity],
            sum: 0.0,
            sum_sq: 0.0,
            undo: None,
        }
    }

    /// Capacity of the buffer, fixed at construction.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of valid entries: `capacity` once filled, else the cursor.
    pub fn size(&self) -> usize {
        if self.filled {
            self.capacity
        } else {
            self.cursor
        }
    }

    /// Whether the buffer has wrapped at least once.
    pub fn is_filled(&self) -> bool {
        self.filled
    }

    /// Value most recently overwritten by a push, or `NaN` if none has
    /// happened yet.
    pub fn last_erased(&self) -> f64 {
        self.last_erased
    }

    /// Pushes `x`, returning the value evicted from the cursor slot, or
    /// `NaN` if nothing was evicted (buffer not yet filled).
    pub fn push(&mut self, x: f64) -> f64 {
        if self.capacity == 0 {
            return f64::NAN;
        }

        let undo = PushUndo {
            cursor: self.cursor,
            filled: self.filled,
            sum: self.sum,
            sum_sq: self.sum_sq,
            last_erased: self.last_erased,
            overwritten_slot_value: self.data[self.cursor],
        };
        self.undo = Some(undo);

        let evicted = if self.filled {
            let e = self.data[self.cursor];
            self.sum -= e;
            self.sum_sq -= e * e;
            self.last_erased = e;
            e
        } else {
            f64::NAN
        };

        self.data[self.cursor] = x;
        self.sum += x;
        self.sum_sq += x * x;

        if self.cursor == self.capacity - 1 {
            self.cursor = 0;
            self.filled = true;
        } else {
            self.cursor += 1;
        }

        evicted
    }

    /// Undoes the most recent [`Ubend::push`], restoring `sum`, `sum_sq`,
    /// `cursor` and `filled` to their exact pre-push state. Only valid once
    /// per push: a second call with no intervening push is a no-op, which
    /// is how the "only one cancel permitted per push" rule is enforced.
    pub fn cancel(&mut self) {
        if let Some(undo) = self.undo.take() {
            self.cursor = undo.cursor;
            self.filled = undo.filled;
            self.sum = undo.sum;
            self.sum_sq = undo.sum_sq;
            self.last_erased = undo.last_erased;
            self.data[undo.cursor] = undo.overwritten_slot_value;
        }
    }

    /// Mean of the currently stored values, `NaN` if empty.
    pub fn mean(&self) -> f64 {
        let n = self.size();
        if n == 0 {
            f64::NAN
        } else {
            self.sum / n as f64
        }
    }

    /// Population variance of the currently stored values, `NaN` if empty.
    pub fn var(&self) -> f64 {
        let n = self.size();
        if n == 0 {
            f64::NAN
        } else {
            let n = n as f64;
            let mean = self.sum / n;
            self.sum_sq / n - mean * mean
        }
    }

    /// Population standard deviation, `NaN` if empty.
    pub fn std(&self) -> f64 {
        self.var().sqrt()
    }

    /// Raw sum of the currently stored values.
    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// Raw sum of squares of the currently stored values.
    pub fn sum_sq(&self) -> f64 {
        self.sum_sq
    }

    /// Value at logical index `i` (`0` = oldest), in insertion order.
    pub fn get(&self, i: usize) -> Option<f64> {
        let size = self.size();
        if i >= size {
            return None;
        }
        if !self.filled {
            Some(self.data[i])
        } else {
            Some(self.data[(self.cursor + i) % self.capacity])
        }
    }

    /// Iterates over the stored values in insertion order (oldest first).
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.size()).map(move |i| self.get(i).unwrap())
    }

    /// Direct access to the backing storage, in raw (unrotated) layout.
    /// Only meaningful together with [`Ubend::size`]/[`Ubend::is_filled`];
    /// used by [`crate::Peaks`] to do a single O(n) rebuild pass.
    pub fn raw_data(&self) -> &[f64] {
        &self.data
    }

    /// Rebuilds `sum`/`sum_sq` by scanning the current contents. Used after
    /// an eviction that invalidates incrementally maintained statistics
    /// elsewhere (e.g. `Peaks` min/max) to avoid drift accumulating in the
    /// buffer's own running sums at the same time.
    pub fn recompute_moments(&mut self) {
        self.sum = 0.0;
        self.sum_sq = 0.0;
        for i in 0..self.size() {
            let v = self.data[i];
            self.sum += v;
            self.sum_sq += v * v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn zero_capacity_never_evicts() {
        let mut u = Ubend::new(0);
        for i in 0..5 {
            let e = u.push(i as f64);
            assert!(e.is_nan());
            assert_eq!(u.size(), 0);
        }
    }

    #[test]
    fn fills_then_wraps() {
        let mut u = Ubend::new(3);
        assert!(u.push(1.0).is_nan());
        assert!(u.push(2.0).is_nan());
        assert!(u.push(3.0).is_nan());
        assert!(u.is_filled());
        assert_eq!(u.size(), 3);

        assert_relative_eq!(u.push(4.0), 1.0);
        assert_relative_eq!(u.push(5.0), 2.0);
        assert_eq!(u.size(), 3);
    }

    #[test]
    fn capacity_one_evicts_every_time() {
        let mut u = Ubend::new(1);
        assert!(u.push(1.0).is_nan());
        assert_relative_eq!(u.push(2.0), 1.0);
        assert_relative_eq!(u.push(3.0), 2.0);
    }

    #[test]
    fn scenario_s4_capacity_10_push_0_through_14() {
        let mut u = Ubend::new(10);
        let mut last_evicted = f64::NAN;
        for i in 0..15 {
            last_evicted = u.push(i as f64);
        }
        assert_eq!(u.size(), 10);
        assert_eq!(u.cursor, 5);
        assert!(u.is_filled());
        assert_relative_eq!(last_evicted, 4.0);
    }

    #[test]
    fn get_handles_wraparound() {
        let mut u = Ubend::new(3);
        u.push(10.0);
        u.push(20.0);
        u.push(30.0);
        u.push(40.0); // evicts 10.0
        assert_relative_eq!(u.get(0).unwrap(), 20.0);
        assert_relative_eq!(u.get(1).unwrap(), 30.0);
        assert_relative_eq!(u.get(2).unwrap(), 40.0);
        assert!(u.get(3).is_none());
    }

    #[test]
    fn cancel_restores_pre_push_state_exactly() {
        let mut u = Ubend::new(3);
        u.push(1.0);
        u.push(2.0);
        u.push(3.0); // now filled

        let before_cursor = u.cursor;
        let before_sum = u.sum;
        let before_sum_sq = u.sum_sq;
        let before_filled = u.filled;
        let before_data = u.data.clone();

        u.push(4.0);
        u.cancel();

        assert_eq!(u.cursor, before_cursor);
        assert_eq!(u.filled, before_filled);
        assert_relative_eq!(u.sum, before_sum);
        assert_relative_eq!(u.sum_sq, before_sum_sq);
        assert_eq!(u.data, before_data);
    }

    #[test]
    fn cancel_before_full_restores_not_filled() {
        let mut u = Ubend::new(3);
        u.push(1.0);
        u.push(2.0);
        u.cancel();
        assert_eq!(u.size(), 1);
        assert!(!u.is_filled());
        assert_relative_eq!(u.mean(), 1.0);
    }

    #[test]
    fn mean_and_var_empty_are_nan() {
        let u = Ubend::new(4);
        assert!(u.mean().is_nan());
        assert!(u.var().is_nan());
        assert!(u.std().is_nan());
    }

    #[test]
    fn mean_constant_stream_is_exact() {
        let mut u = Ubend::new(10);
        for _ in 0..10 {
            u.push(2.5);
        }
        assert_relative_eq!(u.mean(), 2.5);
        assert_relative_eq!(u.var(), 0.0, epsilon = 1e-12);
    }

    proptest::proptest! {
        #[test]
        fn size_cursor_filled_match_push_count(pushes in proptest::collection::vec(-1e6f64..1e6f64, 0..200), capacity in 1usize..20) {
            let mut u = Ubend::new(capacity);
            for (k, &x) in pushes.iter().enumerate() {
                u.push(x);
                let k1 = k + 1;
                proptest::prop_assert_eq!(u.size(), k1.min(capacity));
                proptest::prop_assert_eq!(u.cursor, k1 % capacity);
                proptest::prop_assert_eq!(u.is_filled(), k1 >= capacity);
            }
        }
    }
}
