/// Break a plot line wherever consecutive timestamps are more than
/// `gap_threshold` apart.
///
/// A NaN point is inserted into both outputs right after the earlier sample
/// of each qualifying gap, so a line renderer lifts the pen instead of
/// interpolating across missing data. Input with fewer than two points is
/// returned unchanged.
pub fn split_at_gaps(x: &[f64], y: &[f64], gap_threshold: f64) -> (Vec<f64>, Vec<f64>) {
    let n = x.len().min(y.len());
    if n < 2 {
        return (x[..n].to_vec(), y[..n].to_vec());
    }

    let gaps = count_gaps(&x[..n], gap_threshold);
    let mut out_x = Vec::with_capacity(n + gaps);
    let mut out_y = Vec::with_capacity(n + gaps);

    for i in 0..n {
        out_x.push(x[i]);
        out_y.push(y[i]);
        if i + 1 < n && x[i + 1] - x[i] > gap_threshold {
            out_x.push(f64::NAN);
            out_y.push(f64::NAN);
        }
    }

    (out_x, out_y)
}

/// Number of adjacent pairs whose time difference exceeds `gap_threshold`.
pub fn count_gaps(x: &[f64], gap_threshold: f64) -> usize {
    x.windows(2).filter(|w| w[1] - w[0] > gap_threshold).count()
}
