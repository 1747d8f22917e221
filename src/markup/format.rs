//! Round-trip exact text forms for numbers.
//!
//! Doubles use Rust's shortest representation that parses back to the
//! identical bit pattern (`inf`, `-inf` and `NaN` included).

use crate::error::{PluginError, Result};
use std::str::FromStr;

/// Text form of a double that parses back exactly
pub fn format_f64(value: f64) -> String {
    value.to_string()
}

/// Parse a value from trimmed text
pub fn parse_value<T: FromStr>(text: &str) -> Result<T> {
    let trimmed = text.trim();
    trimmed.parse().map_err(|_| {
        PluginError::Parse(format!(
            "cannot read '{}' as {}",
            trimmed,
            std::any::type_name::<T>()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_special_values() {
        for value in [f64::INFINITY, f64::NEG_INFINITY, -0.0, 0.1, 1e300, f64::MIN_POSITIVE] {
            let parsed: f64 = parse_value(&format_f64(value)).unwrap();
            assert_eq!(parsed.to_bits(), value.to_bits());
        }
        let nan: f64 = parse_value(&format_f64(f64::NAN)).unwrap();
        assert!(nan.is_nan());
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_value::<u32>("-1").is_err());
        assert!(parse_value::<f64>("").is_err());
        assert_eq!(parse_value::<i64>(" 42 ").unwrap(), 42);
    }

    proptest! {
        #[test]
        fn test_f64_text_round_trip(bits in any::<u64>()) {
            let value = f64::from_bits(bits);
            prop_assume!(!value.is_nan());
            let parsed: f64 = parse_value(&format_f64(value)).unwrap();
            prop_assert_eq!(parsed.to_bits(), value.to_bits());
        }
    }
}
