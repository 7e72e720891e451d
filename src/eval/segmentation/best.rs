//! Best-score tracking

/// Compare `value` against `best` with a strict `>`.
///
/// Returns the updated best and whether `value` replaced it. Equal scores
/// and NaN never count as improvements.
pub fn is_new_best(value: f64, best: f64) -> (f64, bool) {
    if value > best {
        (value, true)
    } else {
        (best, false)
    }
}

/// Running best of a score that should increase
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BestScore {
    value: f64,
}

impl BestScore {
    pub fn new(initial: f64) -> Self {
        Self { value: initial }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// Record `value`; true when it strictly improves the best.
    pub fn update(&mut self, value: f64) -> bool {
        let (best, is_new) = is_new_best(value, self.value);
        self.value = best;
        is_new
    }
}
