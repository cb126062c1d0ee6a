use std::f64::consts::E;

/// Logistic sigmoid, `1 / (1 + e^(-x))`.
///
/// Never panics: for very negative `x` the exponential saturates to `inf` and
/// the result is `0.0`, for very positive `x` it is `1.0`. Callers keep the
/// activity in a sane range by recentring the raw input first.
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + E.powf(-x))
}

/// Sigmoid derivative expressed through its own output `y = sigmoid(x)`.
pub fn sigmoid_derivative(y: f64) -> f64 {
    y * (1.0 - y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn sigmoid_of_zero_is_one_half() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert_eq!(sigmoid_derivative(0.5), 0.25);
    }

    #[test]
    fn sigmoid_saturates_without_panicking() {
        assert_eq!(sigmoid(-1.0e4), 0.0);
        assert_eq!(sigmoid(1.0e4), 1.0);
    }

    proptest! {
        #[test]
        fn sigmoid_stays_in_open_unit_interval(x in -30.0f64..30.0) {
            let y = sigmoid(x);
            prop_assert!(y > 0.0 && y < 1.0);
        }

        #[test]
        fn sigmoid_is_symmetric(x in -30.0f64..30.0) {
            prop_assert!((sigmoid(x) + sigmoid(-x) - 1.0).abs() < 1e-12);
        }
    }
}
