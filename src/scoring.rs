//! The logDice association measure.
//!
//! `logDice(fxy, fx, fy) = 14 + log2(2 * fxy / (fx + fy))`
//!
//! The same function scores edge rows at import time and candidates at
//! query time. Degenerate values are replaced so that the result always
//! fits a 32-bit float column: `+inf` becomes [`LOG_DICE_MAX`], `-inf`
//! becomes [`LOG_DICE_MIN`] and `NaN` (0/0) becomes zero.

/// Substitute for `+inf` (a joint frequency with zero marginals).
pub const LOG_DICE_MAX: f64 = 3.4e38;

/// Substitute for `-inf` (a zero joint frequency).
pub const LOG_DICE_MIN: f64 = -3.4e38;

/// Theoretical maximum of a well-formed score (`fxy == fx == fy`).
pub const LOG_DICE_PERFECT: f64 = 14.0;

/// Compute logDice from a joint frequency and two marginal frequencies.
pub fn log_dice(fxy: i64, fx: i64, fy: i64) -> f64 {
    let value = 14.0 + (2.0 * fxy as f64 / (fx as f64 + fy as f64)).log2();
    sanitize(value)
}

/// Replace the non-finite values of a computed score by their sentinels.
pub fn sanitize(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else if value == f64::INFINITY {
        LOG_DICE_MAX
    } else if value == f64::NEG_INFINITY {
        LOG_DICE_MIN
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_association() {
        assert_eq!(log_dice(10, 10, 10), LOG_DICE_PERFECT);
    }

    #[test]
    fn test_known_value() {
        // 2 * 1 / (3 + 5) = 0.25 -> log2 = -2
        assert!((log_dice(1, 3, 5) - 12.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_over_zero_is_zero() {
        assert_eq!(log_dice(0, 0, 0), 0.0);
    }

    #[test]
    fn test_sentinels() {
        assert_eq!(log_dice(0, 4, 7), LOG_DICE_MIN);
        assert_eq!(log_dice(3, 0, 0), LOG_DICE_MAX);
        assert_eq!(sanitize(f64::NAN), 0.0);
    }

    #[test]
    fn test_bounded_and_monotonic() {
        for fx in 1..20i64 {
            for fy in 0..20i64 {
                let mut prev = f64::NEG_INFINITY;
                for fxy in 0..40i64 {
                    let score = log_dice(fxy, fx, fy);
                    assert!(score.is_finite());
                    assert!((LOG_DICE_MIN..=LOG_DICE_MAX).contains(&score));
                    assert!(score >= prev, "not monotonic at {fxy}/{fx}/{fy}");
                    prev = score;
                }
            }
        }
    }
}
