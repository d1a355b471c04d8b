//! The conversion pipeline: source currency -> USDT -> target currency.
//!
//! Fees are charged in a fixed order, each on the balance left by the
//! previous stage:
//!
//! 1. bank fee, in the source currency
//! 2. acquire USDT at the source `sell_rate`
//! 3. platform fee, in USDT
//! 4. spread, in USDT
//! 5. deliver the target currency at the target `buy_rate`
//!
//! Every intermediate quantity is kept at full precision in the returned
//! [`ConversionResult`]; rounding is left to presentation.

use crate::core::currency::Currency;
use crate::core::error::{ConversionError, FeeStage, QuoteResult};
use crate::core::fees::FeePolicy;
use crate::core::rate::Rate;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, trace};

/// Scale used when presenting money amounts.
pub const MONEY_DP: u32 = 2;
/// Scale used when presenting USDT quantities.
pub const USDT_DP: u32 = 6;

#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRequest {
    pub amount: Decimal,
    pub source: Currency,
    pub target: Currency,
}

impl ConversionRequest {
    pub fn new(amount: Decimal, source: Currency, target: Currency) -> QuoteResult<Self> {
        validate_amount(amount)?;
        Ok(ConversionRequest {
            amount,
            source,
            target,
        })
    }

    /// Builds a request from user input, as typed in a form or on the command line.
    pub fn parse(amount: &str, source: &str, target: &str) -> QuoteResult<Self> {
        let amount = parse_amount(amount)?;
        ConversionRequest::new(amount, Currency::new(source)?, Currency::new(target)?)
    }

    pub fn is_same_currency(&self) -> bool {
        self.source == self.target
    }

    /// The same amount in the opposite direction.
    pub fn reversed(&self) -> Self {
        ConversionRequest {
            amount: self.amount,
            source: self.target.clone(),
            target: self.source.clone(),
        }
    }
}

/// Parses a positive decimal amount.
pub fn parse_amount(input: &str) -> QuoteResult<Decimal> {
    let trimmed = input.trim();
    let amount = Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| ConversionError::InvalidAmount(format!("{input:?} is not a number")))?;
    validate_amount(amount)?;
    Ok(amount)
}

fn validate_amount(amount: Decimal) -> QuoteResult<()> {
    if amount <= Decimal::ZERO {
        return Err(ConversionError::InvalidAmount(format!(
            "amount must be greater than zero, got {amount}"
        )));
    }
    Ok(())
}

/// Rates and fee fractions actually applied to a conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRateUsed {
    #[serde(with = "rust_decimal::serde::float")]
    pub from: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub to: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub bank_fee_rate: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub usdt: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub spread_rate: Decimal,
}

/// Itemized intermediate quantities of one conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionSteps {
    #[serde(with = "rust_decimal::serde::float")]
    pub bank_fee: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub net_after_bank: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub usdt_acquired: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub platform_fee: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub net_usdt: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub spread: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub final_usdt: Decimal,
    pub exchange_rate_used: ExchangeRateUsed,
}

impl ConversionSteps {
    fn rounded(&self) -> Self {
        ConversionSteps {
            bank_fee: round(self.bank_fee, MONEY_DP),
            net_after_bank: round(self.net_after_bank, MONEY_DP),
            usdt_acquired: round(self.usdt_acquired, USDT_DP),
            platform_fee: round(self.platform_fee, USDT_DP),
            net_usdt: round(self.net_usdt, USDT_DP),
            spread: round(self.spread, USDT_DP),
            final_usdt: round(self.final_usdt, USDT_DP),
            exchange_rate_used: self.exchange_rate_used.clone(),
        }
    }
}

/// Outcome of one conversion. `steps` is `None` when source and target match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResult {
    #[serde(with = "rust_decimal::serde::float")]
    pub original_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub final_amount: Decimal,
    pub from_currency: Currency,
    pub to_currency: Currency,
    pub steps: Option<ConversionSteps>,
}

impl ConversionResult {
    /// Target units delivered per source unit, fees included.
    ///
    /// `None` when the original amount is zero.
    pub fn effective_rate(&self) -> Option<Decimal> {
        self.final_amount.checked_div(self.original_amount)
    }

    pub fn bank_fee(&self) -> Decimal {
        self.steps.as_ref().map_or(Decimal::ZERO, |s| s.bank_fee)
    }

    pub fn platform_fee(&self) -> Decimal {
        self.steps.as_ref().map_or(Decimal::ZERO, |s| s.platform_fee)
    }

    pub fn spread(&self) -> Decimal {
        self.steps.as_ref().map_or(Decimal::ZERO, |s| s.spread)
    }

    /// Presentation copy: money at 2 decimals, USDT at 6.
    pub fn rounded(&self) -> Self {
        ConversionResult {
            original_amount: round(self.original_amount, MONEY_DP),
            final_amount: round(self.final_amount, MONEY_DP),
            from_currency: self.from_currency.clone(),
            to_currency: self.to_currency.clone(),
            steps: self.steps.as_ref().map(ConversionSteps::rounded),
        }
    }
}

pub fn round(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Applies a [`FeePolicy`] to conversion requests.
///
/// Holds no mutable state; one `Converter` can serve concurrent callers.
#[derive(Debug, Clone, Default)]
pub struct Converter {
    policy: FeePolicy,
    max_rate_age: Option<Duration>,
}

impl Converter {
    pub fn new(policy: FeePolicy) -> Self {
        Converter {
            policy,
            max_rate_age: None,
        }
    }

    /// Rejects rates older than `max_age` when converting.
    pub fn with_max_rate_age(mut self, max_age: Duration) -> Self {
        self.max_rate_age = Some(max_age);
        self
    }

    pub fn max_rate_age(&self) -> Option<Duration> {
        self.max_rate_age
    }

    /// Runs the pipeline.
    ///
    /// `as_of` is only used to judge rate staleness; passing the same inputs
    /// always yields the same result.
    pub fn convert(
        &self,
        request: &ConversionRequest,
        rate_from: &Rate,
        rate_to: &Rate,
        as_of: DateTime<Utc>,
    ) -> QuoteResult<ConversionResult> {
        validate_amount(request.amount)?;

        if request.is_same_currency() {
            debug!(currency = %request.source, "Same currency, no conversion needed");
            return Ok(ConversionResult {
                original_amount: request.amount,
                final_amount: request.amount,
                from_currency: request.source.clone(),
                to_currency: request.target.clone(),
                steps: None,
            });
        }

        let policy = &self.policy;
        let amount = request.amount;

        let bank_fee = mul(amount, policy.bank_fee_rate())?;
        let net_after_bank = residual(amount, bank_fee, FeeStage::Bank)?;

        self.check_rate(rate_from, &request.source, as_of)?;
        let usdt_acquired = net_after_bank
            .checked_div(rate_from.sell_rate)
            .ok_or_else(overflow)?;

        let platform_fee = mul(usdt_acquired, policy.platform_fee_rate())?;
        let net_usdt = residual(usdt_acquired, platform_fee, FeeStage::Platform)?;

        let spread = mul(net_usdt, policy.spread_rate())?;
        let final_usdt = residual(net_usdt, spread, FeeStage::Spread)?;

        self.check_rate(rate_to, &request.target, as_of)?;
        let final_amount = mul(final_usdt, rate_to.buy_rate)?;

        trace!(
            %bank_fee, %net_after_bank, %usdt_acquired, %platform_fee,
            %net_usdt, %spread, %final_usdt, %final_amount,
            "Conversion stages"
        );

        Ok(ConversionResult {
            original_amount: amount,
            final_amount,
            from_currency: request.source.clone(),
            to_currency: request.target.clone(),
            steps: Some(ConversionSteps {
                bank_fee,
                net_after_bank,
                usdt_acquired,
                platform_fee,
                net_usdt,
                spread,
                final_usdt,
                exchange_rate_used: ExchangeRateUsed {
                    from: rate_from.sell_rate,
                    to: rate_to.buy_rate,
                    bank_fee_rate: policy.bank_fee_rate(),
                    usdt: policy.platform_fee_rate(),
                    spread_rate: policy.spread_rate(),
                },
            }),
        })
    }

    fn check_rate(&self, rate: &Rate, expected: &Currency, as_of: DateTime<Utc>) -> QuoteResult<()> {
        if &rate.currency != expected {
            return Err(ConversionError::rate_unavailable(
                expected.code(),
                format!("got a rate for {} instead", rate.currency),
            ));
        }
        rate.check_positive()?;
        rate.check_fresh(self.max_rate_age, as_of)
    }
}

fn mul(a: Decimal, b: Decimal) -> QuoteResult<Decimal> {
    a.checked_mul(b).ok_or_else(overflow)
}

fn residual(balance: Decimal, fee: Decimal, stage: FeeStage) -> QuoteResult<Decimal> {
    let net = balance.checked_sub(fee).ok_or_else(overflow)?;
    if net < Decimal::ZERO {
        return Err(ConversionError::FeeExceedsAmount { stage });
    }
    Ok(net)
}

fn overflow() -> ConversionError {
    ConversionError::InvalidAmount("amount is too large to convert".to_string())
}
