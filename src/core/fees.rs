//! Fee policy applied by the conversion pipeline.

use crate::core::error::{ConversionError, QuoteResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The three fee fractions charged on a conversion, each in `[0, 1)`.
///
/// A `FeePolicy` can only be obtained through [`FeePolicy::new`] (or
/// deserialization, which goes through it), so every instance is valid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFeePolicy", into = "RawFeePolicy")]
pub struct FeePolicy {
    bank_fee_rate: Decimal,
    platform_fee_rate: Decimal,
    spread_rate: Decimal,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct RawFeePolicy {
    #[serde(with = "rust_decimal::serde::float")]
    bank_fee_rate: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    platform_fee_rate: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    spread_rate: Decimal,
}

impl FeePolicy {
    pub fn new(
        bank_fee_rate: Decimal,
        platform_fee_rate: Decimal,
        spread_rate: Decimal,
    ) -> QuoteResult<Self> {
        validate_fraction("bank_fee_rate", bank_fee_rate)?;
        validate_fraction("platform_fee_rate", platform_fee_rate)?;
        validate_fraction("spread_rate", spread_rate)?;
        Ok(FeePolicy {
            bank_fee_rate,
            platform_fee_rate,
            spread_rate,
        })
    }

    /// A policy that charges nothing.
    pub fn zero() -> Self {
        FeePolicy {
            bank_fee_rate: Decimal::ZERO,
            platform_fee_rate: Decimal::ZERO,
            spread_rate: Decimal::ZERO,
        }
    }

    pub fn bank_fee_rate(&self) -> Decimal {
        self.bank_fee_rate
    }

    pub fn platform_fee_rate(&self) -> Decimal {
        self.platform_fee_rate
    }

    pub fn spread_rate(&self) -> Decimal {
        self.spread_rate
    }

    /// Fraction of the original value kept after all three stages.
    pub fn retained_fraction(&self) -> Decimal {
        (Decimal::ONE - self.bank_fee_rate)
            * (Decimal::ONE - self.platform_fee_rate)
            * (Decimal::ONE - self.spread_rate)
    }

    /// Combined fee fraction charged across all three stages.
    pub fn effective_rate(&self) -> Decimal {
        Decimal::ONE - self.retained_fraction()
    }
}

impl Default for FeePolicy {
    /// Bank 2%, platform 1.95%, spread 1%.
    fn default() -> Self {
        FeePolicy {
            bank_fee_rate: Decimal::new(2, 2),
            platform_fee_rate: Decimal::new(195, 4),
            spread_rate: Decimal::new(1, 2),
        }
    }
}

impl TryFrom<RawFeePolicy> for FeePolicy {
    type Error = ConversionError;

    fn try_from(raw: RawFeePolicy) -> Result<Self, Self::Error> {
        FeePolicy::new(raw.bank_fee_rate, raw.platform_fee_rate, raw.spread_rate)
    }
}

impl From<FeePolicy> for RawFeePolicy {
    fn from(policy: FeePolicy) -> Self {
        RawFeePolicy {
            bank_fee_rate: policy.bank_fee_rate,
            platform_fee_rate: policy.platform_fee_rate,
            spread_rate: policy.spread_rate,
        }
    }
}

fn validate_fraction(name: &str, value: Decimal) -> QuoteResult<()> {
    if value < Decimal::ZERO || value >= Decimal::ONE {
        return Err(ConversionError::InvalidConfiguration(format!(
            "{name} must be in [0, 1), got {value}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_policy() {
        let policy = FeePolicy::default();
        assert_eq!(policy.bank_fee_rate(), dec!(0.02));
        assert_eq!(policy.platform_fee_rate(), dec!(0.0195));
        assert_eq!(policy.spread_rate(), dec!(0.01));
        assert_eq!(
            FeePolicy::new(dec!(0.02), dec!(0.0195), dec!(0.01)).unwrap(),
            policy
        );
    }

    #[test]
    fn test_out_of_range_fractions_are_rejected() {
        let err = FeePolicy::new(dec!(0.02), dec!(1.2), dec!(0.01)).unwrap_err();
        assert!(matches!(err, ConversionError::InvalidConfiguration(_)));
        assert!(err.to_string().contains("platform_fee_rate"));

        assert!(FeePolicy::new(dec!(1), dec!(0), dec!(0)).is_err());
        assert!(FeePolicy::new(dec!(0), dec!(0), dec!(-0.01)).is_err());
        assert!(FeePolicy::new(dec!(0), dec!(0), dec!(0.9999)).is_ok());
    }

    #[test]
    fn test_effective_rate() {
        let policy = FeePolicy::new(dec!(0.1), dec!(0.1), dec!(0)).unwrap();
        assert_eq!(policy.retained_fraction(), dec!(0.81));
        assert_eq!(policy.effective_rate(), dec!(0.19));
        assert_eq!(FeePolicy::zero().effective_rate(), dec!(0));
    }

    #[test]
    fn test_policy_deserialization_validates() {
        let yaml = r#"
bank_fee_rate: 0.02
platform_fee_rate: 0.0195
spread_rate: 0.01
"#;
        let policy: FeePolicy = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(policy, FeePolicy::default());

        let yaml = r#"
bank_fee_rate: 0.02
platform_fee_rate: 1.2
spread_rate: 0.01
"#;
        let err = serde_yaml::from_str::<FeePolicy>(yaml).unwrap_err();
        assert!(err.to_string().contains("platform_fee_rate"));
    }
}
