//! Cart configuration

use decimal_percentage::Percentage;
use rusty_money::iso::{self, Currency};

/// The single jurisdiction whose orders incur sales tax.
///
/// This engine applies a one-jurisdiction rule, not a general tax table:
/// orders billed to this state are taxed at `rate`, everything else is
/// untaxed.
#[derive(Debug, Clone)]
pub struct TaxJurisdiction {
    /// Short state code, lower case (e.g. `"wi"`).
    pub code: String,

    /// Full state name, lower case (e.g. `"wisconsin"`).
    pub name: String,

    /// Fractional tax rate (`0.05` = 5%).
    pub rate: Percentage,
}

impl TaxJurisdiction {
    /// Whether a billing state names this jurisdiction, case-insensitively,
    /// by code or by full name.
    #[must_use]
    pub fn matches(&self, billing_state: &str) -> bool {
        let state = billing_state.trim().to_lowercase();

        state == self.code || state == self.name
    }
}

/// Behaviour switches for a [`Cart`](crate::cart::Cart).
///
/// The reference system shipped two near-duplicate cart classes differing in
/// shipping-resolution strictness and handling defaults; those deltas are
/// explicit flags here so one cart type covers both.
#[derive(Debug, Clone)]
pub struct CartConfig {
    /// Currency every monetary value is denominated in.
    pub currency: &'static Currency,

    /// Taxable jurisdiction and rate.
    pub tax: TaxJurisdiction,

    /// Handling charge in minor units applied when no override is set.
    pub handling_cost_minor: i64,

    /// Fail `set_shipping_info` when no cached rate matches the requested
    /// method, instead of leaving the cost untouched.
    pub strict_shipping: bool,
}

impl Default for CartConfig {
    fn default() -> Self {
        CartConfig {
            currency: iso::USD,
            tax: TaxJurisdiction {
                code: "wi".to_string(),
                name: "wisconsin".to_string(),
                rate: Percentage::from(0.05),
            },
            handling_cost_minor: 300,
            strict_shipping: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jurisdiction_matches_code_and_name_case_insensitively() {
        let config = CartConfig::default();

        assert!(config.tax.matches("WI"));
        assert!(config.tax.matches("wi"));
        assert!(config.tax.matches("Wisconsin"));
        assert!(config.tax.matches("WISCONSIN"));
        assert!(!config.tax.matches("IL"));
        assert!(!config.tax.matches(""));
    }

    #[test]
    fn default_config_matches_reference_deployment() {
        let config = CartConfig::default();

        assert_eq!(config.currency, iso::USD);
        assert_eq!(config.handling_cost_minor, 300);
        assert!(config.strict_shipping);
        assert_eq!(config.tax.rate, Percentage::from(0.05));
    }
}
