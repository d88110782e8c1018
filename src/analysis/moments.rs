//! Small numeric helpers shared by the statistics and correlation engines.
//! All functions take already null-free samples.

use statrs::distribution::{ChiSquared, ContinuousCDF};

use crate::error::{AnalysisError, Result};

pub fn mean(xs: &[f64]) -> Option<f64> {
    if xs.is_empty() {
        return None;
    }
    Some(xs.iter().sum::<f64>() / xs.len() as f64)
}

/// Variance with `ddof` delta degrees of freedom; `None` when `n <= ddof`.
pub fn variance(xs: &[f64], ddof: usize) -> Option<f64> {
    let n = xs.len();
    if n <= ddof {
        return None;
    }
    let m = mean(xs)?;
    let ss: f64 = xs.iter().map(|x| (x - m).powi(2)).sum();
    Some(ss / (n - ddof) as f64)
}

/// Sorted copy of the sample, NaNs last.
pub fn sorted(xs: &[f64]) -> Vec<f64> {
    let mut v = xs.to_vec();
    v.sort_by(f64::total_cmp);
    v
}

/// Quantile of a sorted sample with linear interpolation between ranks.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

pub fn median(xs: &[f64]) -> Option<f64> {
    quantile(&sorted(xs), 0.5)
}

/// Biased central moments `(m2, m3, m4)`.
fn central_moments(xs: &[f64]) -> Option<(f64, f64, f64)> {
    let m = mean(xs)?;
    let n = xs.len() as f64;
    let (mut m2, mut m3, mut m4) = (0.0, 0.0, 0.0);
    for x in xs {
        let d = x - m;
        let d2 = d * d;
        m2 += d2;
        m3 += d2 * d;
        m4 += d2 * d2;
    }
    Some((m2 / n, m3 / n, m4 / n))
}

/// Adjusted Fisher–Pearson skewness (G1). Needs at least three values; a
/// constant sample has zero skew.
pub fn skewness(xs: &[f64]) -> Option<f64> {
    let n = xs.len();
    if n < 3 {
        return None;
    }
    let (m2, m3, _) = central_moments(xs)?;
    if m2 == 0.0 {
        return Some(0.0);
    }
    let n = n as f64;
    let g1 = m3 / m2.powf(1.5);
    Some((n * (n - 1.0)).sqrt() / (n - 2.0) * g1)
}

/// D'Agostino–Pearson omnibus normality test. Returns `(K², p-value)`.
pub fn normal_test(xs: &[f64]) -> Result<(f64, f64)> {
    let n = xs.len();
    if n < 8 {
        return Err(AnalysisError::ComputationFailure(format!(
            "normality test: needs at least 8 values, got {n}"
        )));
    }
    let (m2, m3, m4) = central_moments(xs)
        .ok_or_else(|| AnalysisError::ComputationFailure("normality test: empty sample".into()))?;
    if m2 == 0.0 {
        return Err(AnalysisError::ComputationFailure(
            "normality test: sample has zero variance".into(),
        ));
    }

    let zs = skew_z(n as f64, m3 / m2.powf(1.5));
    let zk = kurtosis_z(n as f64, m4 / (m2 * m2));
    let k2 = zs * zs + zk * zk;
    if !k2.is_finite() {
        return Err(AnalysisError::ComputationFailure(
            "normality test: statistic is not finite".into(),
        ));
    }

    let chi2 = ChiSquared::new(2.0)
        .map_err(|e| AnalysisError::ComputationFailure(format!("normality test: {e}")))?;
    Ok((k2, chi2.sf(k2)))
}

/// Z-score of the sample skewness `b1` under normality.
fn skew_z(n: f64, b1: f64) -> f64 {
    let y = b1 * ((n + 1.0) * (n + 3.0) / (6.0 * (n - 2.0))).sqrt();
    let beta2 = 3.0 * (n * n + 27.0 * n - 70.0) * (n + 1.0) * (n + 3.0)
        / ((n - 2.0) * (n + 5.0) * (n + 7.0) * (n + 9.0));
    let w2 = -1.0 + (2.0 * (beta2 - 1.0)).sqrt();
    let delta = 1.0 / (0.5 * w2.ln()).sqrt();
    let alpha = (2.0 / (w2 - 1.0)).sqrt();
    let y = if y == 0.0 { 1.0 } else { y };
    delta * (y / alpha + ((y / alpha).powi(2) + 1.0).sqrt()).ln()
}

/// Z-score of the sample (Pearson) kurtosis `b2` under normality.
fn kurtosis_z(n: f64, b2: f64) -> f64 {
    let e = 3.0 * (n - 1.0) / (n + 1.0);
    let var_b2 = 24.0 * n * (n - 2.0) * (n - 3.0) / ((n + 1.0).powi(2) * (n + 3.0) * (n + 5.0));
    let x = (b2 - e) / var_b2.sqrt();
    let sqrt_beta1 = 6.0 * (n * n - 5.0 * n + 2.0) / ((n + 7.0) * (n + 9.0))
        * (6.0 * (n + 3.0) * (n + 5.0) / (n * (n - 2.0) * (n - 3.0))).sqrt();
    let a = 6.0 + 8.0 / sqrt_beta1 * (2.0 / sqrt_beta1 + (1.0 + 4.0 / sqrt_beta1.powi(2)).sqrt());
    let term1 = 1.0 - 2.0 / (9.0 * a);
    let denom = 1.0 + x * (2.0 / (a - 4.0)).sqrt();
    let term2 = if denom == 0.0 {
        f64::NAN
    } else {
        denom.signum() * ((1.0 - 2.0 / a) / denom.abs()).powf(1.0 / 3.0)
    };
    (term1 - term2) / (2.0 / (9.0 * a)).sqrt()
}

/// Pearson correlation of two aligned samples. `None` when fewer than two
/// pairs or either side has zero variance.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return None;
    }
    let (xs, ys) = (&xs[..n], &ys[..n]);
    let mx = mean(xs)?;
    let my = mean(ys)?;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mx;
        let dy = y - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn mean_and_variance() {
        let xs = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_relative_eq!(mean(&xs).unwrap(), 5.0);
        assert_relative_eq!(variance(&xs, 0).unwrap(), 4.0);
        assert_relative_eq!(variance(&xs, 1).unwrap(), 32.0 / 7.0);
        assert!(variance(&[1.0], 1).is_none());
        assert!(mean(&[]).is_none());
    }

    #[test]
    fn quantiles_interpolate_linearly() {
        let s = sorted(&[4.0, 1.0, 3.0, 2.0]);
        assert_relative_eq!(quantile(&s, 0.25).unwrap(), 1.75);
        assert_relative_eq!(quantile(&s, 0.5).unwrap(), 2.5);
        assert_relative_eq!(quantile(&s, 0.75).unwrap(), 3.25);
        assert_relative_eq!(median(&[5.0, 1.0, 3.0]).unwrap(), 3.0);
    }

    #[test]
    fn skewness_matches_adjusted_fisher_pearson() {
        // pd.Series([1, 2, 3, 10]).skew() == 1.7636...
        let g = skewness(&[1.0, 2.0, 3.0, 10.0]).unwrap();
        assert_relative_eq!(g, 1.763_632_6, epsilon = 1e-6);
        assert_relative_eq!(skewness(&[1.0, 2.0, 3.0]).unwrap(), 0.0);
        assert_eq!(skewness(&[4.0, 4.0, 4.0]), Some(0.0));
        assert!(skewness(&[1.0, 2.0]).is_none());
    }

    #[test]
    fn normal_test_needs_eight_values() {
        assert!(matches!(
            normal_test(&[1.0, 2.0, 3.0]),
            Err(AnalysisError::ComputationFailure(_))
        ));
        assert!(matches!(
            normal_test(&[1.0; 10]),
            Err(AnalysisError::ComputationFailure(_))
        ));
    }

    #[test]
    fn normal_test_flags_skewed_data() {
        let symmetric: Vec<f64> = (-10..=10).map(f64::from).collect();
        let skewed: Vec<f64> = (0..30).map(|i| f64::from(i).powi(4)).collect();
        let (_, p_sym) = normal_test(&symmetric).unwrap();
        let (k2, p_skew) = normal_test(&skewed).unwrap();
        assert!(k2 > 0.0);
        assert!(p_skew < 0.05, "p = {p_skew}");
        assert!(p_sym > p_skew);
        assert!((0.0..=1.0).contains(&p_sym));
    }

    #[test]
    fn pearson_basics() {
        let xs = [1.0, 2.0, 3.0, 4.0];
        assert_relative_eq!(pearson(&xs, &[2.0, 4.0, 6.0, 8.0]).unwrap(), 1.0);
        assert_relative_eq!(pearson(&xs, &[8.0, 6.0, 4.0, 2.0]).unwrap(), -1.0);
        assert!(pearson(&xs, &[1.0, 1.0, 1.0, 1.0]).is_none());
        assert!(pearson(&[1.0], &[1.0]).is_none());
    }
}
