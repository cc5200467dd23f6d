//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Round a f64 and clamp it to the i32 range, returning 0 for NaN values.
#[must_use]
pub fn round_f64_to_i32(value: f64) -> i32 {
    if value.is_nan() {
        return 0;
    }
    let min = cast::<i32, f64>(i32::MIN).unwrap_or(f64::MIN);
    let max = cast::<i32, f64>(i32::MAX).unwrap_or(f64::MAX);
    let clamped = value.clamp(min, max).round();
    cast::<f64, i32>(clamped).unwrap_or(0)
}

/// Convert a count to f64 while allowing precision loss in a single location.
#[must_use]
pub fn usize_to_f64(value: usize) -> f64 {
    cast::<usize, f64>(value).unwrap_or(0.0)
}

/// Scale a unit-interval sample onto `0..len`, i.e. `floor(unit * len)`.
///
/// Out-of-range or non-finite samples are clamped so the result is always a
/// valid index for a non-empty range. Returns 0 when `len` is 0.
#[must_use]
pub fn unit_to_index(unit: f64, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let unit = if unit.is_finite() {
        unit.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let scaled = (unit * usize_to_f64(len)).floor();
    cast::<f64, usize>(scaled).unwrap_or(0).min(len - 1)
}
