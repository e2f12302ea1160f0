//! CSV export of amortization schedules

use std::io::Write;

use serde::Serialize;

use super::schedule::AmortizationResult;

#[derive(Serialize)]
struct CsvRow {
    #[serde(rename = "Period")]
    period: u32,
    #[serde(rename = "DueDate")]
    due_date: String,
    #[serde(rename = "Payment")]
    payment: String,
    #[serde(rename = "Principal")]
    principal: String,
    #[serde(rename = "Interest")]
    interest: String,
    #[serde(rename = "Balance")]
    balance: String,
}

/// Write the schedule as CSV, one row per period
pub fn write_schedule_csv<W: Write>(writer: W, result: &AmortizationResult) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    for entry in &result.schedule {
        csv_writer.serialize(CsvRow {
            period: entry.period_index,
            due_date: entry.due_date.format("%Y-%m-%d").to_string(),
            payment: format!("{:.2}", entry.total_payment),
            principal: format!("{:.2}", entry.principal_component),
            interest: format!("{:.2}", entry.interest_component),
            balance: format!("{:.2}", entry.remaining_balance),
        })?;
    }

    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loan::AmortizationEngine;
    use chrono::NaiveDate;

    #[test]
    fn test_schedule_csv() {
        let engine = AmortizationEngine::with_calculation_date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        let result = engine.compute_schedule(100_000.0, 15.0, 12).unwrap();

        let mut buffer = Vec::new();
        write_schedule_csv(&mut buffer, &result).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 13);
        assert_eq!(lines[0], "Period,DueDate,Payment,Principal,Interest,Balance");
        assert!(lines[1].starts_with("1,2024-01-31,9025.83,7775.83,1250.00,"));
        assert!(lines[12].ends_with(",0.00"));
    }
}
