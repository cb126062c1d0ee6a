/// Half squared error of one output, `0.5 · (target − output)²`.
pub fn squared_error(target: f64, output: f64) -> f64 {
    let e = target - output;
    0.5 * e * e
}

/// Mean of per-sample errors; `0.0` for an empty slice.
pub fn mean_error(errors: &[f64]) -> f64 {
    if errors.is_empty() {
        return 0.0;
    }
    errors.iter().sum::<f64>() / errors.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_squared_error() {
        assert_eq!(squared_error(1.0, 0.5), 0.125);
        assert_eq!(squared_error(0.0, 0.5), 0.125);
    }

    #[test]
    fn mean_of_nothing_is_zero() {
        assert_eq!(mean_error(&[]), 0.0);
        assert_eq!(mean_error(&[0.1, 0.3]), 0.2);
    }
}
