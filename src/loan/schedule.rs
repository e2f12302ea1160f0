//! Amortization schedule output structures

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One period of an amortization schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentScheduleEntry {
    /// Period number (1-indexed)
    pub period_index: u32,

    /// Calculation date + 30 days per period. Cosmetic, not part of equality.
    pub due_date: NaiveDate,

    /// Portion of the payment that reduces the balance
    pub principal_component: f64,

    /// Portion of the payment that is interest
    pub interest_component: f64,

    /// Level payment for the period
    pub total_payment: f64,

    /// Balance after this payment, floored at 0
    pub remaining_balance: f64,
}

impl PartialEq for PaymentScheduleEntry {
    fn eq(&self, other: &Self) -> bool {
        self.period_index == other.period_index
            && self.principal_component == other.principal_component
            && self.interest_component == other.interest_component
            && self.total_payment == other.total_payment
            && self.remaining_balance == other.remaining_balance
    }
}

/// Complete amortization output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationResult {
    /// Level payment per period
    pub periodic_payment: f64,

    /// periodic_payment * number of periods
    pub total_payment: f64,

    /// total_payment - principal
    pub total_interest: f64,

    /// Period-by-period breakdown
    pub schedule: Vec<PaymentScheduleEntry>,
}

impl AmortizationResult {
    /// Original principal, recovered from the totals
    pub fn principal(&self) -> f64 {
        self.total_payment - self.total_interest
    }

    /// Get summary statistics
    pub fn summary(&self) -> LoanSummary {
        let interest_share = if self.total_payment > 0.0 {
            self.total_interest / self.total_payment
        } else {
            0.0
        };

        LoanSummary {
            periodic_payment: self.periodic_payment,
            total_payment: self.total_payment,
            total_interest: self.total_interest,
            term_periods: self.schedule.len() as u32,
            interest_share,
        }
    }

    /// Aggregate the schedule into 12-period years
    pub fn yearly_breakdown(&self) -> Vec<YearlyBreakdown> {
        self.schedule
            .chunks(12)
            .enumerate()
            .map(|(i, chunk)| YearlyBreakdown {
                year: i as u32 + 1,
                principal_paid: chunk.iter().map(|e| e.principal_component).sum(),
                interest_paid: chunk.iter().map(|e| e.interest_component).sum(),
                closing_balance: chunk.last().map(|e| e.remaining_balance).unwrap_or(0.0),
            })
            .collect()
    }
}

/// Headline numbers for a loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanSummary {
    pub periodic_payment: f64,
    pub total_payment: f64,
    pub total_interest: f64,
    pub term_periods: u32,
    /// Fraction of everything paid that is interest
    pub interest_share: f64,
}

/// Principal and interest paid within one 12-period year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyBreakdown {
    pub year: u32,
    pub principal_paid: f64,
    pub interest_paid: f64,
    pub closing_balance: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(period_index: u32, due_date: NaiveDate) -> PaymentScheduleEntry {
        PaymentScheduleEntry {
            period_index,
            due_date,
            principal_component: 80.0,
            interest_component: 20.0,
            total_payment: 100.0,
            remaining_balance: 920.0,
        }
    }

    #[test]
    fn test_entry_equality_ignores_due_date() {
        let a = entry(1, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        let b = entry(1, NaiveDate::from_ymd_opt(2030, 6, 15).unwrap());
        assert_eq!(a, b);

        let c = entry(2, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_ne!(a, c);
    }

    #[test]
    fn test_summary_interest_share() {
        let result = AmortizationResult {
            periodic_payment: 100.0,
            total_payment: 1200.0,
            total_interest: 200.0,
            schedule: Vec::new(),
        };

        let summary = result.summary();
        assert!((summary.interest_share - 200.0 / 1200.0).abs() < 1e-12);
        assert!((result.principal() - 1000.0).abs() < 1e-12);
    }
}
