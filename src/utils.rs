/// Numeric helpers shared by the layers and the prediction engine.

/// Sigmoid activation function: σ(x) = 1 / (1 + e^(-x))
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Hyperbolic tangent activation: tanh(x) = (e^x - e^(-x)) / (e^x + e^(-x))
pub fn tanh(x: f64) -> f64 {
    x.tanh()
}

/// Round to `decimals` places, halves away from zero.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sigmoid() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-10);
        assert!(sigmoid(1000.0) > 0.99);
        assert!(sigmoid(-1000.0) < 0.01);
    }

    #[test]
    fn test_tanh() {
        assert!((tanh(0.0) - 0.0).abs() < 1e-10);
        assert!(tanh(1000.0) > 0.99);
        assert!(tanh(-1000.0) < -0.99);
    }

    #[test]
    fn test_round_to_two_decimals() {
        assert_eq!(round_to(712.4799999, 2), 712.48);
        assert_eq!(round_to(1.005_1, 2), 1.01);
        assert_eq!(round_to(-3.14159, 2), -3.14);
        assert_eq!(round_to(2.0, 2), 2.0);
    }
}
