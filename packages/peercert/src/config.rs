//! Generator configuration and per-request options

use crate::algorithm::MIN_RSA_MODULUS_BITS;
use crate::error::{CertificateError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// One day
pub const ONE_DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Lifetime applied when a request does not override it
pub const DEFAULT_LIFETIME: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Configuration shared by every certificate a generator produces
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Lifetime used when a request carries no usable override
    pub default_lifetime: Duration,
    /// How far `notBefore` is moved into the past to tolerate peer clock skew
    pub backdate: Duration,
    /// Smallest RSA modulus accepted; never lower than 1024
    pub min_rsa_modulus_bits: u32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            default_lifetime: DEFAULT_LIFETIME,
            backdate: ONE_DAY,
            min_rsa_modulus_bits: MIN_RSA_MODULUS_BITS,
        }
    }
}

impl GeneratorConfig {
    /// Load configuration overrides from JSON; absent fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns `CertificateError::UnsupportedAlgorithm` if the document is not
    /// valid configuration JSON or sets a zero default lifetime.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| CertificateError::unsupported(format!("invalid generator config: {e}")))?;
        config.normalized()
    }

    /// Apply the configuration invariants
    ///
    /// # Errors
    ///
    /// Returns `CertificateError::UnsupportedAlgorithm` if the default lifetime is
    /// zero, or either duration does not fit in signed microseconds.
    pub fn normalized(mut self) -> Result<Self> {
        if self.default_lifetime.is_zero() {
            return Err(CertificateError::unsupported(
                "default certificate lifetime must be positive",
            ));
        }
        for (name, duration) in [
            ("default_lifetime", self.default_lifetime),
            ("backdate", self.backdate),
        ] {
            if i64::try_from(duration.as_micros()).is_err() {
                return Err(CertificateError::unsupported(format!(
                    "{name} of {duration:?} is out of range"
                )));
            }
        }
        self.min_rsa_modulus_bits = self.min_rsa_modulus_bits.max(MIN_RSA_MODULUS_BITS);
        Ok(self)
    }

    /// Lifetime to use for a request
    #[must_use]
    pub fn lifetime_for(&self, options: &CertificateOptions) -> Duration {
        options
            .lifetime
            .filter(|lifetime| !lifetime.is_zero())
            .unwrap_or(self.default_lifetime)
    }
}

/// Per-request options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CertificateOptions {
    /// Requested lifetime; `None` or zero means the configured default
    pub lifetime: Option<Duration>,
}

impl CertificateOptions {
    /// Options with an explicit lifetime
    #[must_use]
    pub const fn with_lifetime(lifetime: Duration) -> Self {
        Self {
            lifetime: Some(lifetime),
        }
    }

    /// Read the optional `expires` field of a loosely typed descriptor.
    ///
    /// The value is a count of microseconds. It overrides the default only if it
    /// converts to a positive integer; anything malformed or missing is ignored.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let lifetime = value
            .get("expires")
            .and_then(loose_to_i64)
            .filter(|micros| *micros > 0)
            .and_then(|micros| u64::try_from(micros).ok())
            .map(Duration::from_micros);
        Self { lifetime }
    }
}

/// Integer conversion with the leniency of a scripting-language `ToInt64`:
/// integers pass through, finite floats truncate, numeric strings parse.
fn loose_to_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(truncate_f64)),
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().and_then(truncate_f64))
        }
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn truncate_f64(f: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive.
    (f.is_finite() && f >= i64::MIN as f64 && f < i64::MAX as f64).then(|| f.trunc() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_expires_integer_overrides() {
        let options = CertificateOptions::from_value(&json!({ "expires": 5_000_000 }));
        assert_eq!(options.lifetime, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_expires_float_and_string_are_truncated() {
        let options = CertificateOptions::from_value(&json!({ "expires": 1500.9 }));
        assert_eq!(options.lifetime, Some(Duration::from_micros(1500)));

        let options = CertificateOptions::from_value(&json!({ "expires": " 2500 " }));
        assert_eq!(options.lifetime, Some(Duration::from_micros(2500)));
    }

    #[test]
    fn test_expires_malformed_is_ignored() {
        for value in [
            json!({ "expires": -5 }),
            json!({ "expires": 0 }),
            json!({ "expires": "soon" }),
            json!({ "expires": null }),
            json!({ "expires": [1] }),
            json!({ "name": "ECDSA" }),
            json!("ECDSA"),
        ] {
            assert_eq!(CertificateOptions::from_value(&value).lifetime, None, "{value}");
        }
    }

    #[test]
    fn test_zero_lifetime_falls_back_to_default() {
        let config = GeneratorConfig::default();
        let options = CertificateOptions::with_lifetime(Duration::ZERO);
        assert_eq!(config.lifetime_for(&options), DEFAULT_LIFETIME);
    }

    #[test]
    fn test_config_from_json_clamps_rsa_floor() {
        let config = GeneratorConfig::from_json(r#"{ "min_rsa_modulus_bits": 512 }"#)
            .expect("valid config");
        assert_eq!(config.min_rsa_modulus_bits, MIN_RSA_MODULUS_BITS);
        assert_eq!(config.default_lifetime, DEFAULT_LIFETIME);
        assert_eq!(config.backdate, ONE_DAY);
    }

    #[test]
    fn test_normalized_rejects_out_of_range_backdate() {
        let config = GeneratorConfig {
            backdate: Duration::from_secs(u64::MAX),
            ..GeneratorConfig::default()
        };
        assert!(config.normalized().is_err());
    }

    #[test]
    fn test_config_rejects_zero_lifetime() {
        let result =
            GeneratorConfig::from_json(r#"{ "default_lifetime": { "secs": 0, "nanos": 0 } }"#);
        assert!(result.is_err());
    }
}
