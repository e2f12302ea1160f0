//! Level-payment amortization engine

use chrono::{Days, Local, NaiveDate};
use log::debug;

use super::params::{LoanError, LoanParameters};
use super::schedule::{AmortizationResult, PaymentScheduleEntry};

/// Days between consecutive due dates
pub const DAYS_PER_PERIOD: u64 = 30;

/// Computes amortization schedules for fixed-rate installment loans
///
/// The engine is stateless apart from the calculation date used to derive
/// due dates, so the same engine can be shared freely.
#[derive(Debug, Clone)]
pub struct AmortizationEngine {
    calculation_date: NaiveDate,
}

impl AmortizationEngine {
    /// Create an engine dated today
    pub fn new() -> Self {
        Self {
            calculation_date: Local::now().date_naive(),
        }
    }

    /// Create an engine with a fixed calculation date
    pub fn with_calculation_date(calculation_date: NaiveDate) -> Self {
        Self { calculation_date }
    }

    pub fn calculation_date(&self) -> NaiveDate {
        self.calculation_date
    }

    /// Compute the schedule for raw monthly inputs
    pub fn compute_schedule(
        &self,
        principal: f64,
        annual_rate_percent: f64,
        term_periods: u32,
    ) -> Result<AmortizationResult, LoanError> {
        self.compute(&LoanParameters::new(principal, annual_rate_percent, term_periods))
    }

    /// Compute the schedule for validated loan parameters
    pub fn compute(&self, params: &LoanParameters) -> Result<AmortizationResult, LoanError> {
        params.validate()?;

        let principal = params.principal;
        let n = params.term_in_periods;
        let r = params.periodic_rate();

        if self.due_date(n).is_none() {
            return Err(due_date_out_of_range(n));
        }

        let payment = level_payment(principal, r, n);

        debug!(
            "Amortizing {:.2} at {}% over {} {} periods: payment {:.2}",
            principal,
            params.annual_interest_rate_percent,
            n,
            params.payment_frequency.as_str(),
            payment
        );

        let mut schedule = Vec::with_capacity(n as usize);
        let mut balance = principal;

        for period in 1..=n {
            // Present value of the payments still owed, never above the prior balance
            let next_balance = remaining_balance(payment, r, n - period).clamp(0.0, balance);
            let principal_part = balance - next_balance;
            let interest = if r == 0.0 {
                0.0
            } else {
                (payment - principal_part).max(0.0)
            };
            balance = next_balance;

            schedule.push(PaymentScheduleEntry {
                period_index: period,
                due_date: self.due_date(period).ok_or_else(|| due_date_out_of_range(n))?,
                principal_component: principal_part,
                interest_component: interest,
                total_payment: payment,
                remaining_balance: balance,
            });
        }

        let total_payment = payment * n as f64;

        Ok(AmortizationResult {
            periodic_payment: payment,
            total_payment,
            total_interest: total_payment - principal,
            schedule,
        })
    }
}

impl AmortizationEngine {
    /// Calculation date + 30 days per period, `None` past the last representable date
    fn due_date(&self, period: u32) -> Option<NaiveDate> {
        self.calculation_date
            .checked_add_days(Days::new(DAYS_PER_PERIOD * period as u64))
    }
}

fn due_date_out_of_range(term: u32) -> LoanError {
    LoanError::InvalidInput(format!(
        "term of {} periods runs past the last representable due date",
        term
    ))
}

impl Default for AmortizationEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Level payment from the annuity formula
///
/// `A = P * r / (1 - (1+r)^-n)`, or `P / n` when `r` is exactly 0. The
/// discount form stays finite for any `n`; for very long terms it tends to `P * r`.
pub fn level_payment(principal: f64, periodic_rate: f64, periods: u32) -> f64 {
    if periodic_rate == 0.0 {
        return principal / periods as f64;
    }

    principal / annuity_factor(periodic_rate, periods)
}

/// Balance still owed with `periods_left` level payments outstanding
pub fn remaining_balance(payment: f64, periodic_rate: f64, periods_left: u32) -> f64 {
    if periodic_rate == 0.0 {
        return payment * periods_left as f64;
    }

    payment * annuity_factor(periodic_rate, periods_left)
}

/// Present value of 1 per period for `periods` periods: `(1 - (1+r)^-n) / r`
fn annuity_factor(periodic_rate: f64, periods: u32) -> f64 {
    let discount_m1 = (-(periods as f64) * periodic_rate.ln_1p()).exp_m1();
    -discount_m1 / periodic_rate
}

/// Compute a schedule dated today
pub fn compute_schedule(
    principal: f64,
    annual_rate_percent: f64,
    term_periods: u32,
) -> Result<AmortizationResult, LoanError> {
    AmortizationEngine::new().compute_schedule(principal, annual_rate_percent, term_periods)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loan::PaymentFrequency;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn engine() -> AmortizationEngine {
        AmortizationEngine::with_calculation_date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
    }

    #[test]
    fn test_reference_loan() {
        // KES 100,000 at 15% over 12 months
        let result = engine().compute_schedule(100_000.0, 15.0, 12).unwrap();

        assert_abs_diff_eq!(result.periodic_payment, 9025.83, epsilon = 0.01);
        assert_abs_diff_eq!(result.total_interest, 8309.96, epsilon = 0.02);
        assert_eq!(result.schedule.len(), 12);

        // First month interest: 100,000 * 0.0125
        assert_abs_diff_eq!(result.schedule[0].interest_component, 1250.0, epsilon = 1e-9);
    }

    #[test]
    fn test_principal_sums_to_loan() {
        for &(p, rate, n) in &[
            (100_000.0, 15.0, 12),
            (2_500_000.0, 13.5, 240),
            (750.0, 36.0, 3),
            (10_000.0, 0.001, 600),
            (1.0, 99.0, 1),
        ] {
            let result = engine().compute_schedule(p, rate, n).unwrap();
            let principal_paid: f64 = result.schedule.iter().map(|e| e.principal_component).sum();

            assert_relative_eq!(principal_paid, p, max_relative = 1e-6);
            assert_abs_diff_eq!(
                result.schedule.last().unwrap().remaining_balance,
                0.0,
                epsilon = p * 1e-6
            );
        }
    }

    #[test]
    fn test_entry_identities() {
        let result = engine().compute_schedule(500_000.0, 18.0, 36).unwrap();
        let mut previous_balance = 500_000.0;

        for (i, entry) in result.schedule.iter().enumerate() {
            assert_eq!(entry.period_index, i as u32 + 1);
            assert_abs_diff_eq!(
                entry.total_payment,
                entry.principal_component + entry.interest_component,
                epsilon = 1e-9
            );
            assert!(entry.principal_component >= 0.0);
            assert!(entry.interest_component >= 0.0);
            assert!(entry.remaining_balance <= previous_balance);
            assert!(entry.remaining_balance >= 0.0);
            assert_eq!(entry.total_payment, result.periodic_payment);
            previous_balance = entry.remaining_balance;
        }
    }

    #[test]
    fn test_zero_rate() {
        let result = engine().compute_schedule(12_000.0, 0.0, 24).unwrap();

        assert_eq!(result.periodic_payment, 12_000.0 / 24.0);
        assert!(result.schedule.iter().all(|e| e.interest_component == 0.0));
        assert_abs_diff_eq!(result.total_interest, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_total_interest_by_construction() {
        let result = engine().compute_schedule(80_000.0, 11.0, 48).unwrap();
        assert_eq!(result.total_interest, result.total_payment - 80_000.0);
        assert_eq!(result.total_payment, result.periodic_payment * 48.0);
    }

    #[test]
    fn test_idempotent_ignoring_dates() {
        let a = engine().compute_schedule(250_000.0, 14.0, 60).unwrap();
        let b = AmortizationEngine::with_calculation_date(NaiveDate::from_ymd_opt(2031, 7, 9).unwrap())
            .compute_schedule(250_000.0, 14.0, 60)
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_due_dates_step_thirty_days() {
        let result = engine().compute_schedule(1_000.0, 10.0, 3).unwrap();
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

        assert_eq!(result.schedule[0].due_date, start + Days::new(30));
        assert_eq!(result.schedule[2].due_date, start + Days::new(90));
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        assert!(matches!(
            engine().compute_schedule(0.0, 10.0, 12),
            Err(LoanError::InvalidInput(_))
        ));
        assert!(engine().compute_schedule(1000.0, -1.0, 12).is_err());
        assert!(engine().compute_schedule(1000.0, 10.0, 0).is_err());
    }

    #[test]
    fn test_long_term_tiny_rate_is_finite() {
        let result = engine().compute_schedule(1_000_000.0, 1e-9, 10_000).unwrap();
        assert!(result.periodic_payment.is_finite());
        assert_relative_eq!(result.periodic_payment, 100.0, max_relative = 1e-3);
    }

    #[test]
    fn test_very_long_term_stays_finite() {
        // (1.0125)^60000 overflows f64
        let result = engine().compute_schedule(1_000.0, 15.0, 60_000).unwrap();

        assert!(result.periodic_payment.is_finite());
        assert_relative_eq!(result.periodic_payment, 1_000.0 * 0.0125, max_relative = 1e-9);
        assert!(result.schedule.iter().all(|e| {
            e.principal_component.is_finite() && e.interest_component.is_finite() && e.remaining_balance.is_finite()
        }));

        let principal_paid: f64 = result.schedule.iter().map(|e| e.principal_component).sum();
        assert_relative_eq!(principal_paid, 1_000.0, max_relative = 1e-6);
        assert_eq!(result.schedule.last().unwrap().remaining_balance, 0.0);
    }

    #[test]
    fn test_term_beyond_due_date_range_rejected() {
        assert!(matches!(
            engine().compute_schedule(1_000_000.0, 0.0, 4_000_000),
            Err(LoanError::InvalidInput(_))
        ));
        assert!(engine().compute_schedule(1_000.0, 5.0, u32::MAX).is_err());
    }

    #[test]
    fn test_level_payment_matches_closed_form() {
        let r: f64 = 0.0125;
        let growth = (1.0 + r).powi(12);
        assert_relative_eq!(
            level_payment(100_000.0, r, 12),
            100_000.0 * r * growth / (growth - 1.0),
            max_relative = 1e-12
        );
        assert_eq!(remaining_balance(500.0, r, 0), 0.0);
    }

    #[test]
    fn test_frequency_is_informational() {
        let monthly = LoanParameters::new(60_000.0, 12.0, 52);
        let weekly = monthly.with_frequency(PaymentFrequency::Weekly);

        assert_eq!(engine().compute(&monthly).unwrap(), engine().compute(&weekly).unwrap());
    }

    #[test]
    fn test_yearly_breakdown() {
        let result = engine().compute_schedule(120_000.0, 12.0, 30).unwrap();
        let years = result.yearly_breakdown();

        assert_eq!(years.len(), 3);
        assert_eq!(years[0].year, 1);
        let principal: f64 = years.iter().map(|y| y.principal_paid).sum();
        assert_relative_eq!(principal, 120_000.0, max_relative = 1e-9);
        assert_eq!(years[2].closing_balance, result.schedule[29].remaining_balance);
    }
}
