//! Loan input parameters and validation

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when loan parameters cannot be amortized
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoanError {
    #[error("invalid loan input: {0}")]
    InvalidInput(String),
}

/// How often a payment is made
///
/// Informational only: the periodic rate is always derived as annual / 12.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentFrequency {
    #[default]
    Monthly,
    Biweekly,
    Weekly,
}

impl PaymentFrequency {
    /// Nominal number of payments per year for this frequency
    pub fn periods_per_year(&self) -> u32 {
        match self {
            PaymentFrequency::Monthly => 12,
            PaymentFrequency::Biweekly => 26,
            PaymentFrequency::Weekly => 52,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentFrequency::Monthly => "monthly",
            PaymentFrequency::Biweekly => "biweekly",
            PaymentFrequency::Weekly => "weekly",
        }
    }
}

impl std::str::FromStr for PaymentFrequency {
    type Err = LoanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "monthly" => Ok(PaymentFrequency::Monthly),
            "biweekly" => Ok(PaymentFrequency::Biweekly),
            "weekly" => Ok(PaymentFrequency::Weekly),
            other => Err(LoanError::InvalidInput(format!(
                "unknown payment frequency: {}",
                other
            ))),
        }
    }
}

/// Parameters of a fixed-rate installment loan
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoanParameters {
    /// Amount borrowed (currency units)
    pub principal: f64,

    /// Nominal annual rate in percent (15.0 = 15%)
    pub annual_interest_rate_percent: f64,

    /// Number of payment periods
    pub term_in_periods: u32,

    /// Payment frequency
    #[serde(default)]
    pub payment_frequency: PaymentFrequency,
}

impl LoanParameters {
    /// Create monthly loan parameters
    pub fn new(principal: f64, annual_interest_rate_percent: f64, term_in_periods: u32) -> Self {
        Self {
            principal,
            annual_interest_rate_percent,
            term_in_periods,
            payment_frequency: PaymentFrequency::Monthly,
        }
    }

    /// Set the payment frequency
    pub fn with_frequency(mut self, frequency: PaymentFrequency) -> Self {
        self.payment_frequency = frequency;
        self
    }

    /// Reject inputs the annuity formula cannot handle
    pub fn validate(&self) -> Result<(), LoanError> {
        if !self.principal.is_finite() || self.principal <= 0.0 {
            return Err(LoanError::InvalidInput(format!(
                "principal must be positive, got {}",
                self.principal
            )));
        }
        if !self.annual_interest_rate_percent.is_finite() || self.annual_interest_rate_percent < 0.0 {
            return Err(LoanError::InvalidInput(format!(
                "annual interest rate must be non-negative, got {}",
                self.annual_interest_rate_percent
            )));
        }
        if self.term_in_periods == 0 {
            return Err(LoanError::InvalidInput(
                "term must be at least one period".to_string(),
            ));
        }
        Ok(())
    }

    /// Periodic rate as a decimal
    ///
    /// Always annual / 12, whatever `payment_frequency` says.
    pub fn periodic_rate(&self) -> f64 {
        (self.annual_interest_rate_percent / 100.0) / 12.0
    }
}
