use std::cmp::Ordering;

/// Percentile of already-sorted values with linear interpolation between
/// neighbouring ranks. `pct` is a fraction in `[0, 1]`.
pub fn percentile_sorted(sorted: &[f64], pct: f64) -> Option<f64> {
    if sorted.is_empty() || !pct.is_finite() {
        return None;
    }
    if sorted.len() == 1 {
        return Some(sorted[0]);
    }
    let pos = pct.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Tukey fences `[Q1 - 1.5·IQR, Q3 + 1.5·IQR]` of `values`.
pub fn iqr_fences(values: &[f64]) -> Option<(f64, f64)> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let q1 = percentile_sorted(&sorted, 0.25)?;
    let q3 = percentile_sorted(&sorted, 0.75)?;
    let iqr = q3 - q1;
    Some((q1 - 1.5 * iqr, q3 + 1.5 * iqr))
}

/// Drop values outside the 1.5×IQR fences, keeping the rest in their
/// original order. Empty input gives empty output.
pub fn filter_outliers(values: &[f64]) -> Vec<f64> {
    match iqr_fences(values) {
        Some((lower, upper)) => values
            .iter()
            .copied()
            .filter(|&v| v >= lower && v <= upper)
            .collect(),
        None => Vec::new(),
    }
}
