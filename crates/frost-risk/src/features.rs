//! Positional layout of the frost feature vector.
//!
//! The vector is assembled by the caller from hourly weather data; this crate
//! never computes features, it only needs to know which slot holds what.

/// Number of features the frost classifier is trained on.
pub const FEATURE_COUNT: usize = 12;

/// Feature names in vector order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "HR",        // relative humidity at the target hour (%)
    "FF",        // wind speed
    "PP",        // surface pressure, or precipitation when pressure is missing
    "dew_point", // dew point (°C)
    "TT_change", // temperature delta over the previous hour
    "hour_sin",
    "hour_cos",
    "month_sin",
    "month_cos",
    "is_night",
    "TT_lag_6h", // temperature six hours before the target (°C)
    "HR_lag_3h", // relative humidity three hours before the target (%)
];

pub const HUMIDITY: usize = 0;
pub const DEW_POINT: usize = 3;
pub const TEMPERATURE_LAG_6H: usize = 10;

/// Pair each value with its feature name, for logging.
///
/// Values past [`FEATURE_COUNT`] are labelled `extra`.
pub fn named(vector: &[f64]) -> impl Iterator<Item = (&'static str, f64)> + '_ {
    vector.iter().enumerate().map(|(idx, &value)| {
        let name = FEATURE_NAMES.get(idx).copied().unwrap_or("extra");
        (name, value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_indices() {
        assert_eq!(FEATURE_NAMES[HUMIDITY], "HR");
        assert_eq!(FEATURE_NAMES[DEW_POINT], "dew_point");
        assert_eq!(FEATURE_NAMES[TEMPERATURE_LAG_6H], "TT_lag_6h");
    }

    #[test]
    fn test_named_labels_extra_values() {
        let vector: Vec<f64> = (0..14).map(f64::from).collect();
        let pairs: Vec<_> = named(&vector).collect();
        assert_eq!(pairs.len(), 14);
        assert_eq!(pairs[0], ("HR", 0.0));
        assert_eq!(pairs[11], ("HR_lag_3h", 11.0));
        assert_eq!(pairs[12], ("extra", 12.0));
    }
}
