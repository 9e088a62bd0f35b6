use crate::core::error::{CoreError, CoreResult};

/// Numerically stable softmax over a set of activations
///
/// Divides by the temperature first, subtracts the maximum before
/// exponentiating, then normalizes so the result sums to 1. The actual
/// draw over the returned weights is the caller's job.
pub fn boltzmann(values: &[f64], temperature: f64) -> CoreResult<Vec<f64>> {
    if !temperature.is_finite() || temperature <= 0.0 {
        return Err(CoreError::InvalidArgument(format!(
            "Boltzmann temperature must be a finite positive number, got {}",
            temperature
        )));
    }
    if values.is_empty() {
        return Ok(Vec::new());
    }

    let scaled: Vec<f64> = values.iter().map(|v| v / temperature).collect();
    let max = scaled.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exponentials: Vec<f64> = scaled.iter().map(|v| (v - max).exp()).collect();
    let total: f64 = exponentials.iter().sum();
    Ok(exponentials.iter().map(|e| e / total).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_positive_temperature() {
        assert!(boltzmann(&[1.0, 2.0], 0.0).is_err());
        assert!(boltzmann(&[1.0, 2.0], -0.5).is_err());
        assert!(boltzmann(&[1.0, 2.0], f64::NAN).is_err());
    }

    #[test]
    fn test_sums_to_one() {
        let weights = boltzmann(&[0.3, -1.2, 2.5, 0.0], 0.2).unwrap();
        let total: f64 = weights.iter().sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert!(weights.iter().all(|w| *w >= 0.0));
    }

    #[test]
    fn test_shift_invariance() {
        let base = [0.1, 0.7, -0.4];
        let shifted: Vec<f64> = base.iter().map(|v| v + 42.0).collect();
        let a = boltzmann(&base, 0.5).unwrap();
        let b = boltzmann(&shifted, 0.5).unwrap();
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-12);
        }
    }

    #[test]
    fn test_extreme_values_stay_finite() {
        let weights = boltzmann(&[1000.0, -1000.0], 0.1).unwrap();
        assert!(weights.iter().all(|w| w.is_finite()));
        assert!((weights[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_higher_temperature_flattens() {
        let cold = boltzmann(&[1.0, 0.0], 0.1).unwrap();
        let hot = boltzmann(&[1.0, 0.0], 10.0).unwrap();
        assert!(cold[0] > hot[0]);
        assert!(hot[0] > 0.5);
    }

    #[test]
    fn test_empty_input() {
        assert!(boltzmann(&[], 1.0).unwrap().is_empty());
    }
}
