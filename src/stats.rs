//! Statistical reduction primitives.
//!
//! Per-character recognition samples are noisy, so every document-level
//! metric is a median (interpolated quantile at 0.5) rather than a mean.
//! Rounding to a fixed number of decimals keeps metric records stable across
//! runs and readable in diagnostics output.

/// Interpolated quantile of `values` at `q` in [0, 1].
///
/// Returns `None` for an empty slice. Uses linear interpolation between the
/// two nearest order statistics, so `quantile(&[1.0, 2.0], 0.5)` is 1.5.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
  if values.is_empty() {
    return None;
  }
  let mut sorted = values.to_vec();
  sorted.sort_by(|a, b| a.total_cmp(b));

  let pos = (sorted.len() - 1) as f64 * q;
  let base = pos.floor() as usize;
  let rest = pos - base as f64;
  match sorted.get(base + 1) {
    Some(next) => Some(sorted[base] + rest * (next - sorted[base])),
    None => Some(sorted[base]),
  }
}

/// Median of `values`, or `None` when empty.
pub fn median(values: &[f64]) -> Option<f64> {
  quantile(values, 0.5)
}

/// Rounds to 6 decimal places.
pub fn round6(value: f64) -> f64 {
  (value * 1e6).round() / 1e6
}

/// Rounds to 3 decimal places.
pub fn round3(value: f64) -> f64 {
  (value * 1e3).round() / 1e3
}
