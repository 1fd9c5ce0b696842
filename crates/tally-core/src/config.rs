//! # Ledger Configuration
//!
//! Currency and flat-rate settings used by the totals calculator.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`TALLY_*`), via [`LedgerConfig::from_env`]
//! 2. Defaults (this file)
//!
//! Configuration is read-only once the store is built.

use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::Rate;
use crate::validation::validate_rate_bps;
use crate::{DEFAULT_CURRENCY, WALK_IN_CUSTOMER_NAME};

/// Ledger configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerConfig {
    /// Currency code (ISO 4217) shown next to amounts.
    pub currency_code: String,

    /// Flat tax applied to every invoice subtotal.
    pub tax_rate: Rate,

    /// Flat discount applied to every invoice subtotal.
    pub discount_rate: Rate,

    /// Customer name recorded when no customer is selected at the POS.
    pub walk_in_customer_name: String,
}

impl Default for LedgerConfig {
    /// LKR, 10% tax, 5% discount.
    fn default() -> Self {
        LedgerConfig {
            currency_code: DEFAULT_CURRENCY.to_string(),
            tax_rate: Rate::from_bps(1000),
            discount_rate: Rate::from_bps(500),
            walk_in_customer_name: WALK_IN_CUSTOMER_NAME.to_string(),
        }
    }
}

impl LedgerConfig {
    /// Creates a LedgerConfig from environment variables and defaults.
    ///
    /// ## Environment Variables
    /// - `TALLY_CURRENCY`: Override currency code
    /// - `TALLY_TAX_RATE`: Override tax rate in percent (e.g., "10")
    /// - `TALLY_DISCOUNT_RATE`: Override discount rate in percent (e.g., "5")
    ///
    /// Unparseable or out-of-range values keep the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`LedgerConfig::from_env`] with an injectable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = LedgerConfig::default();

        if let Some(currency) = lookup("TALLY_CURRENCY") {
            let currency = currency.trim();
            if !currency.is_empty() {
                config.currency_code = currency.to_uppercase();
            }
        }

        if let Some(rate) = lookup("TALLY_TAX_RATE").and_then(|s| parse_rate(&s)) {
            config.tax_rate = rate;
        }

        if let Some(rate) = lookup("TALLY_DISCOUNT_RATE").and_then(|s| parse_rate(&s)) {
            config.discount_rate = rate;
        }

        config
    }

    /// Formats an amount as a currency string with digit grouping.
    ///
    /// Amounts are always shown with two decimals, matching [`Money`].
    ///
    /// ```rust
    /// use tally_core::config::LedgerConfig;
    /// use tally_core::money::Money;
    ///
    /// let config = LedgerConfig::default();
    /// assert_eq!(config.format_currency(Money::from_cents(6_234_375)), "LKR 62,343.75");
    /// ```
    pub fn format_currency(&self, amount: Money) -> String {
        let digits = amount.major().unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }

        let sign = if amount.is_negative() { "-" } else { "" };
        format!(
            "{}{} {}.{:02}",
            sign,
            self.currency_code,
            grouped,
            amount.minor()
        )
    }
}

fn parse_rate(raw: &str) -> Option<Rate> {
    let pct = raw.trim().parse::<f64>().ok()?;
    if !pct.is_finite() || pct < 0.0 {
        return None;
    }
    let rate = Rate::from_percentage(pct);
    validate_rate_bps("rate", rate.bps()).ok()?;
    Some(rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = LedgerConfig::default();
        assert_eq!(config.currency_code, "LKR");
        assert_eq!(config.tax_rate.bps(), 1000);
        assert_eq!(config.discount_rate.bps(), 500);
        assert_eq!(config.walk_in_customer_name, "Walk-in Customer");
    }

    #[test]
    fn test_from_lookup_overrides() {
        let vars: HashMap<&str, &str> = [
            ("TALLY_CURRENCY", "usd"),
            ("TALLY_TAX_RATE", "8.25"),
            ("TALLY_DISCOUNT_RATE", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let config = LedgerConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.currency_code, "USD");
        assert_eq!(config.tax_rate.bps(), 825);
        assert_eq!(config.discount_rate.bps(), 500);
    }

    #[test]
    fn test_out_of_range_rate_ignored() {
        let config = LedgerConfig::from_lookup(|k| {
            (k == "TALLY_TAX_RATE").then(|| "150".to_string())
        });
        assert_eq!(config.tax_rate.bps(), 1000);
    }

    #[test]
    fn test_format_currency() {
        let config = LedgerConfig::default();
        let fmt = |cents| config.format_currency(Money::from_cents(cents));
        assert_eq!(fmt(0), "LKR 0.00");
        assert_eq!(fmt(1), "LKR 0.01");
        assert_eq!(fmt(-5), "-LKR 0.05");
        assert_eq!(fmt(34_870_000), "LKR 348,700.00");
        assert_eq!(fmt(-150_000), "-LKR 1,500.00");
        assert_eq!(fmt(i64::MIN), "-LKR 92,233,720,368,547,758.08");
    }
}
