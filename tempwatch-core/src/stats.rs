use serde::Serialize;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator). `None` for fewer than two values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

/// Mean and sample std of one rolling window.
///
/// `None` if the window holds a non-finite value or fewer than two values.
/// A window of identical values yields exactly `(value, 0.0)`.
pub fn window_stats(window: &[f64]) -> Option<(f64, f64)> {
    if window.len() < 2 || window.iter().any(|v| !v.is_finite()) {
        return None;
    }

    let first = window[0];
    if window.iter().all(|&v| v == first) {
        return Some((first, 0.0));
    }

    Some((mean(window)?, sample_std(window)?))
}

/// Quantile with linear interpolation between closest ranks. `sorted` must be ascending.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }

    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;

    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Descriptive statistics of a numeric column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    pub std: Option<f64>,
    pub min: f64,
    pub p25: f64,
    pub median: f64,
    pub p75: f64,
    pub max: f64,
}

/// Summarize the finite values of `values`; `None` when there are none.
pub fn describe(values: &[f64]) -> Option<Summary> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);

    Some(Summary {
        count: sorted.len(),
        mean: mean(&sorted)?,
        std: sample_std(&sorted),
        min: sorted[0],
        p25: quantile(&sorted, 0.25)?,
        median: quantile(&sorted, 0.5)?,
        p75: quantile(&sorted, 0.75)?,
        max: sorted[sorted.len() - 1],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_std_uses_n_minus_one() {
        let std = sample_std(&[0.0, 5.0, 10.0]).unwrap();
        assert!((std - 5.0).abs() < 1e-12);
        assert_eq!(sample_std(&[3.0]), None);
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn constant_window_has_zero_std() {
        let window = vec![7.3; 30];
        assert_eq!(window_stats(&window), Some((7.3, 0.0)));
    }

    #[test]
    fn window_with_nan_is_undefined() {
        assert_eq!(window_stats(&[1.0, f64::NAN, 3.0]), None);
        assert_eq!(window_stats(&[1.0]), None);
    }

    #[test]
    fn quantiles_interpolate_linearly() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&sorted, 0.0), Some(1.0));
        assert_eq!(quantile(&sorted, 0.5), Some(2.5));
        assert_eq!(quantile(&sorted, 0.25), Some(1.75));
        assert_eq!(quantile(&sorted, 1.0), Some(4.0));
        assert_eq!(quantile(&sorted, 1.5), None);
        assert_eq!(quantile(&[], 0.5), None);
    }

    #[test]
    fn describe_summarizes_values() {
        let summary = describe(&[4.0, 1.0, 3.0, 2.0, f64::NAN]).unwrap();

        assert_eq!(summary.count, 4);
        assert_eq!(summary.mean, 2.5);
        assert_eq!(summary.min, 1.0);
        assert_eq!(summary.max, 4.0);
        assert_eq!(summary.median, 2.5);
        assert_eq!(summary.p75, 3.25);
        assert!(describe(&[]).is_none());
    }
}
