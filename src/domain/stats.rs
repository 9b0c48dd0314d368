//! Descriptive statistics over columns with missing values.
//!
//! Every function takes the present values only; use [`present`] to drop
//! missing entries first. Standard deviations are sample (n - 1) deviations.

/// Collect the present values of an optional column.
pub fn present<I>(values: I) -> Vec<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    values.into_iter().flatten().filter(|v| !v.is_nan()).collect()
}

pub fn sum(values: &[f64]) -> f64 {
    values.iter().sum()
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(sum(values) / values.len() as f64)
    }
}

pub fn std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

pub fn min(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::min)
}

pub fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

/// Quantile with linear interpolation between closest ranks.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

pub fn median(values: &[f64]) -> Option<f64> {
    quantile(values, 0.5)
}

/// Pearson correlation over pairs where both sides are present.
///
/// `None` with fewer than two pairs or when either side is constant.
pub fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let my = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let mut cov = 0.0;
    let mut vx = 0.0;
    let mut vy = 0.0;
    for (x, y) in pairs {
        cov += (x - mx) * (y - my);
        vx += (x - mx).powi(2);
        vy += (y - my).powi(2);
    }
    if vx == 0.0 || vy == 0.0 {
        return None;
    }
    Some(cov / (vx.sqrt() * vy.sqrt()))
}

/// Pair up two optional columns, dropping rows where either is missing.
pub fn complete_pairs<I>(rows: I) -> Vec<(f64, f64)>
where
    I: IntoIterator<Item = (Option<f64>, Option<f64>)>,
{
    rows.into_iter()
        .filter_map(|(a, b)| Some((a?, b?)))
        .filter(|(a, b)| !a.is_nan() && !b.is_nan())
        .collect()
}

/// Trailing-window mean; `None` until a full window is available.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    rolling(values, window, mean)
}

/// Trailing-window sample std; `None` until a full window is available.
pub fn rolling_std(values: &[f64], window: usize) -> Vec<Option<f64>> {
    rolling(values, window, std_dev)
}

fn rolling(values: &[f64], window: usize, f: fn(&[f64]) -> Option<f64>) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }
    (0..values.len())
        .map(|i| {
            if i + 1 < window {
                None
            } else {
                f(&values[i + 1 - window..=i])
            }
        })
        .collect()
}

/// Ratio that is `None` instead of infinite or NaN.
pub fn safe_ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 || denominator.is_nan() || numerator.is_nan() {
        None
    } else {
        Some(numerator / denominator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn present_drops_missing_and_nan() {
        assert_eq!(present(vec![Some(1.0), None, Some(f64::NAN), Some(3.0)]), vec![1.0, 3.0]);
    }

    #[test]
    fn mean_and_sample_std() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_relative_eq!(mean(&v).unwrap(), 5.0);
        assert_relative_eq!(std_dev(&v).unwrap(), 2.138089935299395, epsilon = 1e-12);
        assert_eq!(mean(&[]), None);
        assert_eq!(std_dev(&[1.0]), None);
    }

    #[test]
    fn quantiles_interpolate_linearly() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert_relative_eq!(median(&v).unwrap(), 2.5);
        assert_relative_eq!(quantile(&v, 0.25).unwrap(), 1.75);
        assert_relative_eq!(quantile(&v, 0.0).unwrap(), 1.0);
        assert_relative_eq!(quantile(&v, 1.0).unwrap(), 4.0);
        assert_eq!(quantile(&v, 1.5), None);
    }

    #[test]
    fn min_max() {
        let v = [3.0, -1.0, 8.0];
        assert_eq!(min(&v), Some(-1.0));
        assert_eq!(max(&v), Some(8.0));
        assert_eq!(min(&[]), None);
    }

    #[test]
    fn pearson_perfect_and_degenerate() {
        let up = [(1.0, 2.0), (2.0, 4.0), (3.0, 6.0)];
        let down = [(1.0, 3.0), (2.0, 2.0), (3.0, 1.0)];
        assert_relative_eq!(pearson(&up).unwrap(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(pearson(&down).unwrap(), -1.0, epsilon = 1e-12);
        assert_eq!(pearson(&[(1.0, 1.0), (2.0, 1.0)]), None);
        assert_eq!(pearson(&[(1.0, 1.0)]), None);
    }

    #[test]
    fn complete_pairs_skip_missing() {
        let pairs = complete_pairs(vec![(Some(1.0), Some(2.0)), (None, Some(3.0)), (Some(4.0), None)]);
        assert_eq!(pairs, vec![(1.0, 2.0)]);
    }

    #[test]
    fn rolling_windows_need_full_window() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(rolling_mean(&v, 2), vec![None, Some(1.5), Some(2.5), Some(3.5)]);
        let std = rolling_std(&v, 3);
        assert_eq!(std[1], None);
        assert_relative_eq!(std[2].unwrap(), 1.0);
        assert_eq!(rolling_mean(&v, 1), vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0)]);
    }

    #[test]
    fn safe_ratio_guards_zero() {
        assert_eq!(safe_ratio(1.0, 0.0), None);
        assert_eq!(safe_ratio(1.0, 4.0), Some(0.25));
    }
}
