//! Loan amortization
//!
//! Computes level-payment schedules for fixed-rate installment loans:
//! - Annuity-formula periodic payment (zero-rate loans split evenly)
//! - Period-by-period principal/interest breakdown with a floored balance
//! - Summary, yearly aggregation, KES formatting and CSV export
//!
//! Everything here is pure; the only non-numeric input is the calculation
//! date used to stamp due dates.

mod params;
mod schedule;
mod engine;
mod format;
mod export;

pub use params::{LoanError, LoanParameters, PaymentFrequency};
pub use schedule::{AmortizationResult, LoanSummary, PaymentScheduleEntry, YearlyBreakdown};
pub use engine::{compute_schedule, level_payment, remaining_balance, AmortizationEngine, DAYS_PER_PERIOD};
pub use format::{format_kes, group_thousands, CURRENCY_CODE};
pub use export::write_schedule_csv;
