//! Cent-level rounding and the paid-in-full tolerance.

/// Tolerance when comparing a paid total against an owed total. A payment
/// within 0.9 of a cent counts as covering the remainder.
pub const PAID_EPSILON: f64 = 0.009;

/// Round to two decimal places, half away from zero at the cent scale.
pub fn round2(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Whether `paid` covers `total` within [`PAID_EPSILON`].
pub fn covers(paid: f64, total: f64) -> bool {
    paid + PAID_EPSILON >= total
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2_half_up() {
        assert_eq!(round2(149.995), 150.0);
        assert_eq!(round2(149.994), 149.99);
        assert_eq!(round2(0.005), 0.01);
        assert_eq!(round2(100.0), 100.0);
    }

    #[test]
    fn test_covers_exact_and_epsilon() {
        assert!(covers(150.0, 150.0));
        assert!(covers(149.995, 150.0));
        // A full cent short is not covered.
        assert!(!covers(149.99, 150.0));
        assert!(covers(150.01, 150.0));
    }
}
