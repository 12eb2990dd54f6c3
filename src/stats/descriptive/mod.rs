use std::cmp::Ordering;

use num_traits::{Float, FromPrimitive};

/// Sum of the values; zero for an empty slice
pub fn sum<F: Float>(data: &[F]) -> F {
    data.iter().fold(F::zero(), |acc, &x| acc + x)
}

/// Arithmetic mean, `None` for an empty slice
pub fn mean<F: Float + FromPrimitive>(data: &[F]) -> Option<F> {
    if data.is_empty() {
        return None;
    }
    Some(sum(data) / F::from_usize(data.len())?)
}

/// Unbiased sample variance (n - 1 denominator), `None` with fewer than two values
pub fn sample_variance<F: Float + FromPrimitive>(data: &[F]) -> Option<F> {
    if data.len() < 2 {
        return None;
    }
    let m = mean(data)?;
    let squared = data.iter().fold(F::zero(), |acc, &x| acc + (x - m).powi(2));
    Some(squared / F::from_usize(data.len() - 1)?)
}

/// Sample standard deviation
pub fn std_dev<F: Float + FromPrimitive>(data: &[F]) -> Option<F> {
    sample_variance(data).map(Float::sqrt)
}

/// Median; the mean of the two middle values for even-length input
pub fn median<F: Float + FromPrimitive>(data: &[F]) -> Option<F> {
    percentile(data, 0.5)
}

/// Linear-interpolated percentile, `p` in `[0, 1]`
pub fn percentile<F: Float + FromPrimitive>(data: &[F], p: f64) -> Option<F> {
    if data.is_empty() || !(0.0..=1.0).contains(&p) {
        return None;
    }
    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let n = sorted.len();
    let idx = p * (n - 1) as f64;
    let lo = idx.floor() as usize;
    let hi = idx.ceil() as usize;
    if lo == hi {
        return Some(sorted[lo]);
    }

    let w_hi = F::from_f64(idx - lo as f64)?;
    let w_lo = F::one() - w_hi;
    Some(sorted[lo] * w_lo + sorted[hi] * w_hi)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_and_median() {
        let data = [4.0, 1.0, 3.0, 2.0];
        assert_eq!(mean(&data), Some(2.5));
        assert_eq!(median(&data), Some(2.5));
        assert_eq!(median(&[5.0, 1.0, 3.0]), Some(3.0));
    }

    #[test]
    fn variance_needs_two_values() {
        assert_eq!(sample_variance(&[1.0]), None);
        let sd = std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((sd - 2.138_089_935).abs() < 1e-6);
    }

    #[test]
    fn empty_input() {
        let empty: [f64; 0] = [];
        assert_eq!(mean(&empty), None);
        assert_eq!(sum(&empty), 0.0);
    }
}
