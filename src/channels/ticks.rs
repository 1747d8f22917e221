//! Mapping between continuous time and discrete sample ticks.
//!
//! Tick `n` of a channel with frequency `f` lies at time `n / f`. Time to
//! tick rounds up, tick to time is biased one representable step upward so
//! that converting back lands on the same tick:
//!
//! ```text
//! time_to_tick(t, f) = trunc(down(down(t) * f)) + 1
//! tick_to_time(n, f) = up(n / f)
//! ```
//!
//! where `up`/`down` move to the adjacent representable double.
//! Both functions are monotonic non-decreasing in their first argument.
//! Tick 0 maps to time 0 and all times `<= 0` map to tick 0.

/// Smallest tick whose time is not less than `time`
pub fn convert_time_to_tick_at_or_after(time: f64, frequency: f64) -> u64 {
    if !(time > 0.0) || !(frequency > 0.0) {
        return 0;
    }
    let scaled = (time.next_down() * frequency).next_down();
    // `as` saturates, so huge values stay monotonic
    (scaled as u64).saturating_add(1)
}

/// Time of `tick`, nudged upward by one representable step
pub fn convert_tick_to_time(tick: u64, frequency: f64) -> f64 {
    if tick == 0 || !(frequency > 0.0) {
        return 0.0;
    }
    (tick as f64 / frequency).next_up()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_exact_boundaries() {
        assert_eq!(convert_time_to_tick_at_or_after(1.0, 1000.0), 1000);
        assert_eq!(convert_time_to_tick_at_or_after(1.0005, 1000.0), 1001);
        assert_eq!(convert_time_to_tick_at_or_after(0.001, 1000.0), 1);
        assert_eq!(convert_time_to_tick_at_or_after(0.25, 4.0), 1);
        assert_eq!(convert_time_to_tick_at_or_after(0.2500001, 4.0), 2);
    }

    #[test]
    fn test_round_trip_at_common_rates() {
        for frequency in [1.0, 100.0, 1000.0, 48_000.0, 1e6] {
            for tick in [1u64, 2, 3, 500, 1000, 4096, 123_456_789] {
                let time = convert_tick_to_time(tick, frequency);
                assert!(time >= tick as f64 / frequency);
                assert_eq!(convert_time_to_tick_at_or_after(time, frequency), tick);
            }
        }
    }

    #[test]
    fn test_zero_and_negative() {
        assert_eq!(convert_tick_to_time(0, 1000.0), 0.0);
        assert_eq!(convert_time_to_tick_at_or_after(0.0, 1000.0), 0);
        assert_eq!(convert_time_to_tick_at_or_after(-0.0, 1000.0), 0);
        assert_eq!(convert_time_to_tick_at_or_after(-5.0, 1000.0), 0);
        assert_eq!(convert_time_to_tick_at_or_after(f64::NAN, 1000.0), 0);
    }

    #[test]
    fn test_invalid_frequency() {
        assert_eq!(convert_time_to_tick_at_or_after(1.0, 0.0), 0);
        assert_eq!(convert_tick_to_time(5, -1.0), 0.0);
        assert_eq!(convert_tick_to_time(5, f64::NAN), 0.0);
    }

    #[test]
    fn test_saturates() {
        assert_eq!(convert_time_to_tick_at_or_after(f64::MAX, 1e300), u64::MAX);
        assert_eq!(convert_time_to_tick_at_or_after(f64::INFINITY, 1.0), u64::MAX);
    }

    proptest! {
        #[test]
        fn test_round_trip(tick in 1u64..(1u64 << 50), frequency in 1e-3f64..1e9) {
            let exact = tick as f64 / frequency;
            prop_assume!(exact * frequency == tick as f64);
            let time = convert_tick_to_time(tick, frequency);
            prop_assert_eq!(convert_time_to_tick_at_or_after(time, frequency), tick);
        }

        #[test]
        fn test_time_to_tick_monotonic(a in 0f64..1e6, b in 0f64..1e6, frequency in 1e-3f64..1e7) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(
                convert_time_to_tick_at_or_after(lo, frequency)
                    <= convert_time_to_tick_at_or_after(hi, frequency)
            );
        }

        #[test]
        fn test_tick_to_time_monotonic(a in any::<u64>(), b in any::<u64>(), frequency in 1e-3f64..1e9) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(convert_tick_to_time(lo, frequency) <= convert_tick_to_time(hi, frequency));
        }

        #[test]
        fn test_tick_is_at_or_after(time in 1e-6f64..1e6, frequency in 1e-3f64..1e7) {
            let tick = convert_time_to_tick_at_or_after(time, frequency);
            // the previous tick lies strictly before `time`
            prop_assert!(((tick - 1) as f64) / frequency < time);
        }
    }
}
