//! Financial risk aggregation: overdue, high-value, and at-risk buckets from
//! invoice rows, plus the prompt for the sales forecast oracle.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::config::AT_RISK_STALE_DAYS;
use crate::types::InvoiceRecord;

#[derive(Debug, Clone, Serialize)]
pub struct CustomerRevenue {
    pub customer: String,
    pub paid_revenue: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AtRiskCustomer {
    pub customer: String,
    pub outstanding: f64,
    pub days_since_last_invoice: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RiskBuckets {
    /// Unpaid invoices whose due date has passed.
    pub overdue: Vec<InvoiceRecord>,
    /// Top-N customers by paid revenue, descending.
    pub high_value: Vec<CustomerRevenue>,
    /// Customers with an unpaid balance and no invoice activity for over
    /// 30 days.
    pub at_risk: Vec<AtRiskCustomer>,
}

/// Classify a tenant's invoices into the three risk buckets.
///
/// `as_of` anchors every date comparison so the same rows always produce the
/// same buckets.
pub fn aggregate_risk(invoices: &[InvoiceRecord], as_of: NaiveDate, top_n: usize) -> RiskBuckets {
    let overdue: Vec<InvoiceRecord> = invoices
        .iter()
        .filter(|inv| !inv.status.is_paid() && inv.due_date < as_of)
        .cloned()
        .collect();

    // customer -> (paid revenue, outstanding balance, newest invoice date)
    let mut by_customer: HashMap<&str, (f64, f64, NaiveDate)> = HashMap::new();
    for inv in invoices {
        let entry = by_customer
            .entry(inv.customer.as_str())
            .or_insert((0.0, 0.0, inv.created_at.date_naive()));
        if inv.status.is_paid() {
            entry.0 += inv.amount;
        } else {
            entry.1 += inv.amount;
        }
        let created = inv.created_at.date_naive();
        if created > entry.2 {
            entry.2 = created;
        }
    }

    let mut high_value: Vec<CustomerRevenue> = by_customer
        .iter()
        .filter(|(_, (paid, _, _))| *paid > 0.0)
        .map(|(customer, (paid, _, _))| CustomerRevenue {
            customer: (*customer).to_string(),
            paid_revenue: *paid,
        })
        .collect();
    high_value.sort_by(|a, b| {
        b.paid_revenue
            .total_cmp(&a.paid_revenue)
            .then_with(|| a.customer.cmp(&b.customer))
    });
    high_value.truncate(top_n);

    let mut at_risk: Vec<AtRiskCustomer> = by_customer
        .iter()
        .filter_map(|(customer, (_, outstanding, last))| {
            let days = (as_of - *last).num_days();
            (*outstanding > 0.0 && days > AT_RISK_STALE_DAYS).then(|| AtRiskCustomer {
                customer: (*customer).to_string(),
                outstanding: *outstanding,
                days_since_last_invoice: days,
            })
        })
        .collect();
    at_risk.sort_by(|a, b| {
        b.outstanding
            .total_cmp(&a.outstanding)
            .then_with(|| a.customer.cmp(&b.customer))
    });

    RiskBuckets { overdue, high_value, at_risk }
}

/// Build the natural-language prompt the forecast oracle is asked to answer
/// with a JSON object.
pub fn forecast_prompt(buckets: &RiskBuckets, invoice_count: usize) -> String {
    let overdue_total: f64 = buckets.overdue.iter().map(|i| i.amount).sum();
    let at_risk_total: f64 = buckets.at_risk.iter().map(|c| c.outstanding).sum();
    let top = buckets
        .high_value
        .iter()
        .map(|c| format!("{} (${:.0})", c.customer, c.paid_revenue))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "You are a revenue analyst for a small business.\n\
         Invoices on file: {invoice_count}.\n\
         Overdue: {} invoices totaling ${overdue_total:.2}.\n\
         At-risk customers (unpaid balance, inactive over {AT_RISK_STALE_DAYS} days): {} totaling ${at_risk_total:.2}.\n\
         Top customers by paid revenue: {top}.\n\
         Reply with a JSON object only, with fields:\n\
         - predicted_orders: integer, expected orders next month\n\
         - recommendations: array of short action strings\n\
         - forecast: one-sentence revenue outlook",
        buckets.overdue.len(),
        buckets.at_risk.len(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    use crate::types::{InvoiceRecord, InvoiceStatus};

    fn invoice(
        id: &str,
        customer: &str,
        amount: f64,
        status: InvoiceStatus,
        due: &str,
        created: &str,
    ) -> InvoiceRecord {
        let created_date: NaiveDate = created.parse().unwrap();
        InvoiceRecord {
            id: id.to_string(),
            customer: customer.to_string(),
            amount,
            status,
            due_date: due.parse().unwrap(),
            created_at: Utc
                .from_utc_datetime(&created_date.and_hms_opt(12, 0, 0).unwrap()),
        }
    }

    fn as_of() -> NaiveDate {
        "2026-06-15".parse().unwrap()
    }

    #[test]
    fn overdue_requires_unpaid_and_past_due() {
        let invoices = vec![
            invoice("i1", "acme", 100.0, InvoiceStatus::Sent, "2026-06-01", "2026-05-01"),
            invoice("i2", "acme", 100.0, InvoiceStatus::Paid, "2026-06-01", "2026-05-01"),
            invoice("i3", "acme", 100.0, InvoiceStatus::Sent, "2026-07-01", "2026-06-01"),
        ];
        let buckets = aggregate_risk(&invoices, as_of(), 5);
        assert_eq!(buckets.overdue.len(), 1);
        assert_eq!(buckets.overdue[0].id, "i1");
    }

    #[test]
    fn due_today_is_not_overdue() {
        let invoices =
            vec![invoice("i1", "acme", 50.0, InvoiceStatus::Sent, "2026-06-15", "2026-06-01")];
        let buckets = aggregate_risk(&invoices, as_of(), 5);
        assert!(buckets.overdue.is_empty());
    }

    #[test]
    fn high_value_ranks_paid_revenue_descending() {
        let invoices = vec![
            invoice("i1", "acme", 500.0, InvoiceStatus::Paid, "2026-05-01", "2026-04-01"),
            invoice("i2", "acme", 300.0, InvoiceStatus::Paid, "2026-05-15", "2026-04-15"),
            invoice("i3", "globex", 600.0, InvoiceStatus::Paid, "2026-05-01", "2026-04-01"),
            invoice("i4", "initech", 100.0, InvoiceStatus::Sent, "2026-05-01", "2026-04-01"),
        ];
        let buckets = aggregate_risk(&invoices, as_of(), 2);
        assert_eq!(buckets.high_value.len(), 2);
        assert_eq!(buckets.high_value[0].customer, "acme");
        assert!((buckets.high_value[0].paid_revenue - 800.0).abs() < 1e-9);
        assert_eq!(buckets.high_value[1].customer, "globex");
    }

    #[test]
    fn at_risk_needs_balance_and_staleness() {
        let invoices = vec![
            // unpaid balance, last invoice 45 days old -> at risk
            invoice("i1", "acme", 200.0, InvoiceStatus::Sent, "2026-05-10", "2026-05-01"),
            // unpaid balance but recent activity -> not at risk
            invoice("i2", "globex", 200.0, InvoiceStatus::Sent, "2026-06-20", "2026-06-10"),
            // stale but fully paid -> not at risk
            invoice("i3", "initech", 200.0, InvoiceStatus::Paid, "2026-04-10", "2026-04-01"),
        ];
        let buckets = aggregate_risk(&invoices, as_of(), 5);
        assert_eq!(buckets.at_risk.len(), 1);
        assert_eq!(buckets.at_risk[0].customer, "acme");
        assert_eq!(buckets.at_risk[0].days_since_last_invoice, 45);
    }

    #[test]
    fn recent_invoice_resets_staleness_despite_old_balance() {
        let invoices = vec![
            invoice("i1", "acme", 200.0, InvoiceStatus::Sent, "2026-04-10", "2026-04-01"),
            invoice("i2", "acme", 100.0, InvoiceStatus::Paid, "2026-06-20", "2026-06-10"),
        ];
        let buckets = aggregate_risk(&invoices, as_of(), 5);
        assert!(buckets.at_risk.is_empty());
    }

    #[test]
    fn buckets_are_deterministic_for_fixed_as_of() {
        let invoices = vec![
            invoice("i1", "acme", 200.0, InvoiceStatus::Sent, "2026-05-10", "2026-05-01"),
            invoice("i2", "globex", 400.0, InvoiceStatus::Paid, "2026-05-10", "2026-05-01"),
        ];
        let first = aggregate_risk(&invoices, as_of(), 5);
        let second = aggregate_risk(&invoices, as_of(), 5);
        assert_eq!(first.overdue.len(), second.overdue.len());
        assert_eq!(first.high_value.len(), second.high_value.len());
        assert_eq!(first.at_risk.len(), second.at_risk.len());
    }

    #[test]
    fn prompt_mentions_bucket_totals() {
        let invoices =
            vec![invoice("i1", "acme", 150.0, InvoiceStatus::Sent, "2026-05-10", "2026-05-01")];
        let buckets = aggregate_risk(&invoices, as_of(), 5);
        let prompt = forecast_prompt(&buckets, invoices.len());
        assert!(prompt.contains("$150.00"));
        assert!(prompt.contains("predicted_orders"));
    }
}
