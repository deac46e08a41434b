//! Easing curves.

/// Quartic ease-in-out on `[0, 1]`.
///
/// Non-decreasing in `t` and exact at 0, 0.5 and 1. In `f64` the upper
/// half saturates early: once `1 - t` drops below roughly `6e-5`, the
/// `u⁴ / 2` term is lost to rounding and the result is exactly `1.0`.
pub fn ease_in_out_quart(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        8.0 * t * t * t * t
    } else {
        let u = -2.0 * t + 2.0;
        1.0 - u * u * u * u / 2.0
    }
}

/// Linear interpolation, exact at both ends.
pub fn lerp(from: f64, to: f64, t: f64) -> f64 {
    from * (1.0 - t) + to * t
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn quart_endpoints_and_midpoint() {
        assert_eq!(ease_in_out_quart(0.0), 0.0);
        assert_eq!(ease_in_out_quart(1.0), 1.0);
        assert_eq!(ease_in_out_quart(0.5), 0.5);
        assert_eq!(ease_in_out_quart(2.0), 1.0);
    }

    #[test]
    fn quart_saturates_next_to_one() {
        assert_eq!(ease_in_out_quart(1.0 - 1e-5), 1.0);
        assert!(ease_in_out_quart(1.0 - 1e-3) < 1.0);
    }

    proptest! {
        #[test]
        fn quart_is_monotonic(a in 0.0f64..=1.0, b in 0.0f64..=1.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(ease_in_out_quart(lo) <= ease_in_out_quart(hi));
        }

        #[test]
        fn quart_stays_in_unit_range(t in -2.0f64..3.0) {
            let v = ease_in_out_quart(t);
            prop_assert!((0.0..=1.0).contains(&v));
        }

        #[test]
        fn lerp_hits_endpoints_exactly(from in -1e6f64..1e6, to in -1e6f64..1e6) {
            prop_assert_eq!(lerp(from, to, 0.0), from);
            prop_assert_eq!(lerp(from, to, 1.0), to);
        }
    }
}
