use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

/// Deserializes a value through an intermediate string, applying `parser` and
/// wrapping failures with the field name the caller is decoding.
pub fn parse_via_string<'de, D, T, F>(deserializer: D, kind: &str, parser: F) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    F: FnOnce(&str) -> Result<T, String>,
{
    let raw = String::deserialize(deserializer)?;
    parser(&raw).map_err(|err| D::Error::custom(format!("invalid {kind} `{raw}`: {err}")))
}

/// Clamps a confidence-like float into `[lo, hi]`, treating NaN as `lo`.
pub fn clamp_f32(value: f32, lo: f32, hi: f32) -> f32 {
    if value.is_nan() {
        return lo;
    }
    value.max(lo).min(hi)
}
