use chrono::NaiveDate;

use crate::fmt;
use crate::models::SalesRecord;
use crate::reports::{
    histogram, month_name, monthly_sales, price_history, product_preference, sales_distribution,
    weekly_sales, DateRange, DistributionStats, PriceStats, WeeklySummary, ALL_BRANCHES, ALL_MONTHS,
    ALL_YEARS,
};

pub const HISTOGRAM_BINS: usize = 30;
pub const PREFERENCE_CHART_TOP: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Monthly,
    PriceHistory,
    Weekly,
    Preference,
    Distribution,
}

impl ReportKind {
    pub fn title(self) -> &'static str {
        match self {
            ReportKind::Monthly => "Monthly Sales Report",
            ReportKind::PriceHistory => "Price Analysis",
            ReportKind::Weekly => "Weekly Sales Summary",
            ReportKind::Preference => "Product Preference",
            ReportKind::Distribution => "Sales Distribution",
        }
    }
}

/// One report invocation with its filters already resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportRequest {
    Monthly {
        branch: Option<String>,
        year: Option<i32>,
        month: Option<u32>,
    },
    PriceHistory {
        product: String,
    },
    Weekly {
        range: DateRange,
        branch: Option<String>,
    },
    Preference {
        range: DateRange,
        branch: Option<String>,
    },
    Distribution {
        range: DateRange,
        branch: Option<String>,
    },
}

impl ReportRequest {
    pub fn kind(&self) -> ReportKind {
        match self {
            ReportRequest::Monthly { .. } => ReportKind::Monthly,
            ReportRequest::PriceHistory { .. } => ReportKind::PriceHistory,
            ReportRequest::Weekly { .. } => ReportKind::Weekly,
            ReportRequest::Preference { .. } => ReportKind::Preference,
            ReportRequest::Distribution { .. } => ReportKind::Distribution,
        }
    }

    /// Short name used for default export file names.
    pub fn slug(&self) -> &'static str {
        match self {
            ReportRequest::Monthly { .. } => "monthly_sales",
            ReportRequest::PriceHistory { .. } => "price_history",
            ReportRequest::Weekly { .. } => "weekly_sales",
            ReportRequest::Preference { .. } => "product_preference",
            ReportRequest::Distribution { .. } => "sales_distribution",
        }
    }
}

/// A typed table cell. Exporters keep numbers numeric; screens format them.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Date(NaiveDate),
    Quantity(f64),
    Money(f64),
    Count(usize),
}

impl Value {
    pub fn display(&self, currency: &str) -> String {
        match self {
            Value::Text(s) => s.clone(),
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
            Value::Quantity(q) => fmt::quantity(*q),
            Value::Money(m) => fmt::money(*m, currency),
            Value::Count(c) => c.to_string(),
        }
    }

    /// Full-precision text, as the backing file stores it.
    pub fn exact(&self) -> String {
        match self {
            Value::Quantity(v) | Value::Money(v) => v.to_string(),
            _ => self.raw(),
        }
    }

    /// Unformatted text for CSV output.
    pub fn raw(&self) -> String {
        match self {
            Value::Text(s) => s.clone(),
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
            Value::Quantity(q) => q.to_string(),
            Value::Money(m) => format!("{m:.2}"),
            Value::Count(c) => c.to_string(),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Quantity(v) | Value::Money(v) => Some(*v),
            Value::Count(c) => Some(*c as f64),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.as_f64().is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Chart {
    /// Labelled bars; `money` marks currency-valued bars.
    Bars {
        title: String,
        bars: Vec<(String, f64)>,
        money: bool,
    },
    /// Dated points joined in order.
    Line {
        title: String,
        points: Vec<(NaiveDate, f64)>,
    },
    Histogram {
        title: String,
        bins: Vec<(f64, usize)>,
    },
}

impl Chart {
    pub fn title(&self) -> &str {
        match self {
            Chart::Bars { title, .. } | Chart::Line { title, .. } | Chart::Histogram { title, .. } => {
                title
            }
        }
    }
}

/// Presentation-neutral result of one report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportOutput {
    pub title: String,
    /// Human description of the active filters.
    pub subtitle: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    pub chart: Option<Chart>,
    pub summary: Vec<(String, Value)>,
    /// Set when nothing matched; the rest of the output is then informational only.
    pub empty_message: Option<String>,
}

impl ReportOutput {
    pub fn is_empty(&self) -> bool {
        self.empty_message.is_some()
    }

    fn new(title: &str, subtitle: String, headers: &[&str]) -> Self {
        Self {
            title: title.to_string(),
            subtitle,
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
            chart: None,
            summary: Vec::new(),
            empty_message: None,
        }
    }
}

fn branch_label(branch: &Option<String>) -> String {
    branch.clone().unwrap_or_else(|| ALL_BRANCHES.to_string())
}

fn range_label(range: &DateRange) -> String {
    format!("{} to {}", range.start.format("%Y-%m-%d"), range.end.format("%Y-%m-%d"))
}

/// Run the query behind `request` and shape its result.
pub fn build(request: &ReportRequest, records: &[SalesRecord]) -> ReportOutput {
    let mut out = match request {
        ReportRequest::Monthly { branch, year, month } => monthly(records, branch, *year, *month),
        ReportRequest::PriceHistory { product } => price(records, product),
        ReportRequest::Weekly { range, branch } => weekly(records, range, branch),
        ReportRequest::Preference { range, branch } => preference(records, range, branch),
        ReportRequest::Distribution { range, branch } => distribution(records, range, branch),
    };
    if records.is_empty() {
        out.empty_message = Some("Please import sales data first to generate reports.".to_string());
    }
    tracing::debug!(
        report = request.slug(),
        rows = out.rows.len(),
        empty = out.is_empty(),
        "built report"
    );
    out
}

fn monthly(
    records: &[SalesRecord],
    branch: &Option<String>,
    year: Option<i32>,
    month: Option<u32>,
) -> ReportOutput {
    let month_label = month.map_or(ALL_MONTHS, month_name);
    let year_label = year.map_or_else(|| ALL_YEARS.to_string(), |y| y.to_string());
    let mut out = ReportOutput::new(
        "Monthly Sales Report",
        format!("{} | {month_label} {year_label}", branch_label(branch)),
        &["Product", "Quantity", "Avg Unit Price", "Total"],
    );
    let items = monthly_sales(records, branch.as_deref(), year, month);
    if items.is_empty() {
        out.empty_message = Some("No sales data found for the selected criteria.".to_string());
        return out;
    }
    out.chart = Some(Chart::Bars {
        title: format!("Total Sales per Product ({month_label} {year_label})"),
        bars: items.iter().map(|i| (i.product.clone(), i.total)).collect(),
        money: true,
    });
    let grand: f64 = items.iter().map(|i| i.total).sum();
    out.rows = items
        .into_iter()
        .map(|i| {
            vec![
                Value::Text(i.product),
                Value::Quantity(i.quantity),
                Value::Money(i.avg_unit_price),
                Value::Money(i.total),
            ]
        })
        .collect();
    out.summary.push(("Total Sales".to_string(), Value::Money(grand)));
    out
}

fn price(records: &[SalesRecord], product: &str) -> ReportOutput {
    let mut out = ReportOutput::new("Price Analysis", product.to_string(), &["Date", "Price"]);
    let history = price_history(records, product);
    let Some(stats) = PriceStats::from_history(&history) else {
        out.empty_message = Some(format!("No price history found for {product}."));
        return out;
    };
    out.chart = Some(Chart::Line {
        title: format!("Price Fluctuation for {product}"),
        points: history.iter().map(|p| (p.date, p.unit_price)).collect(),
    });
    out.rows = history
        .iter()
        .map(|p| vec![Value::Date(p.date), Value::Money(p.unit_price)])
        .collect();
    out.summary = vec![
        ("Average Price".to_string(), Value::Money(stats.average)),
        ("Max Price".to_string(), Value::Money(stats.max)),
        ("Min Price".to_string(), Value::Money(stats.min)),
        ("Current Price".to_string(), Value::Money(stats.current)),
    ];
    out
}

fn weekly(records: &[SalesRecord], range: &DateRange, branch: &Option<String>) -> ReportOutput {
    let mut out = ReportOutput::new(
        "Weekly Sales Summary",
        format!("{} | {}", branch_label(branch), range_label(range)),
        &["Day of Week", "Total Sales"],
    );
    let days = weekly_sales(records, range, branch.as_deref());
    let summary = WeeklySummary::from_days(&days);
    out.rows = days
        .iter()
        .map(|d| vec![Value::Text(d.name().to_string()), Value::Money(d.total)])
        .collect();
    if summary.total_revenue == 0.0 {
        out.empty_message = Some("No sales data found for the selected week and branch.".to_string());
        return out;
    }
    out.chart = Some(Chart::Bars {
        title: format!("Weekly Sales Summary ({})", range_label(range)),
        bars: days.iter().map(|d| (d.name()[..3].to_string(), d.total)).collect(),
        money: true,
    });
    out.summary = vec![
        ("Total Revenue".to_string(), Value::Money(summary.total_revenue)),
        ("Average Daily Sales".to_string(), Value::Money(summary.avg_daily_sales)),
    ];
    out
}

fn preference(records: &[SalesRecord], range: &DateRange, branch: &Option<String>) -> ReportOutput {
    let mut out = ReportOutput::new(
        "Product Preference",
        format!("{} | {}", branch_label(branch), range_label(range)),
        &["Product", "Units Sold", "Revenue"],
    );
    let items = product_preference(records, range, branch.as_deref());
    if items.is_empty() {
        out.empty_message =
            Some("No product preference data found for the selected criteria.".to_string());
        return out;
    }
    let top = &items[..items.len().min(PREFERENCE_CHART_TOP)];
    let top_units: f64 = top.iter().map(|i| i.units_sold).sum();
    out.chart = Some(Chart::Bars {
        title: format!("Top {} Product Preferences by Units Sold", top.len()),
        bars: top
            .iter()
            .map(|i| {
                let share = if top_units > 0.0 {
                    i.units_sold / top_units * 100.0
                } else {
                    0.0
                };
                (format!("{} ({share:.1}%)", i.product), i.units_sold)
            })
            .collect(),
        money: false,
    });
    out.summary.push(("Top Product".to_string(), Value::Text(items[0].product.clone())));
    out.rows = items
        .into_iter()
        .map(|i| {
            vec![
                Value::Text(i.product),
                Value::Quantity(i.units_sold),
                Value::Money(i.revenue),
            ]
        })
        .collect();
    out
}

fn distribution(records: &[SalesRecord], range: &DateRange, branch: &Option<String>) -> ReportOutput {
    let mut out = ReportOutput::new(
        "Sales Distribution",
        format!("{} | {}", branch_label(branch), range_label(range)),
        &["From", "To", "Frequency"],
    );
    let values = sales_distribution(records, range, branch.as_deref());
    let Some(stats) = DistributionStats::from_values(&values) else {
        out.empty_message =
            Some("No sales distribution data found for the selected criteria.".to_string());
        return out;
    };
    let bins = histogram(&values, HISTOGRAM_BINS);
    let width = if bins.len() > 1 { bins[1].0 - bins[0].0 } else { 0.0 };
    out.rows = bins
        .iter()
        .map(|&(lo, count)| vec![Value::Money(lo), Value::Money(lo + width), Value::Count(count)])
        .collect();
    out.chart = Some(Chart::Histogram {
        title: "Sales Amount Distribution".to_string(),
        bins,
    });
    out.summary = vec![
        ("Sales".to_string(), Value::Count(stats.count)),
        ("Mean".to_string(), Value::Money(stats.mean)),
        ("Median".to_string(), Value::Money(stats.median)),
        ("Mode".to_string(), stats.mode.map_or(Value::Text("N/A".into()), Value::Money)),
        ("Min".to_string(), Value::Money(stats.min)),
        ("Max".to_string(), Value::Money(stats.max)),
        ("Std Dev".to_string(), stats.std_dev.map_or(Value::Text("N/A".into()), Value::Money)),
    ];
    out
}

/// Header and rows for a plain record export.
pub fn record_table(records: &[SalesRecord]) -> (Vec<String>, Vec<Vec<Value>>) {
    let headers = crate::models::REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect();
    let rows = records
        .iter()
        .map(|r| {
            vec![
                Value::Date(r.date),
                Value::Text(r.branch.clone()),
                Value::Text(r.product.clone()),
                Value::Quantity(r.quantity),
                Value::Money(r.unit_price),
                Value::Money(r.total),
            ]
        })
        .collect();
    (headers, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::parse_ymd;

    fn rec(date: &str, branch: &str, product: &str, qty: f64, price: f64, total: f64) -> SalesRecord {
        SalesRecord {
            date: parse_ymd(date).unwrap(),
            branch: branch.to_string(),
            product: product.to_string(),
            quantity: qty,
            unit_price: price,
            total,
        }
    }

    fn data() -> Vec<SalesRecord> {
        vec![
            rec("2024-06-01", "Colombo", "Milk", 5.0, 150.0, 750.0),
            rec("2024-06-02", "Kandy", "Bread", 10.0, 50.0, 500.0),
        ]
    }

    #[test]
    fn test_monthly_output_has_rows_chart_and_total() {
        let req = ReportRequest::Monthly {
            branch: None,
            year: Some(2024),
            month: Some(6),
        };
        let out = build(&req, &data());
        assert!(!out.is_empty());
        assert_eq!(out.rows.len(), 2);
        assert_eq!(out.rows[0][0], Value::Text("Bread".into()));
        assert_eq!(out.summary[0].1, Value::Money(1250.0));
        assert!(out.subtitle.contains("June 2024"));
        assert!(matches!(out.chart, Some(Chart::Bars { ref bars, .. }) if bars.len() == 2));
    }

    #[test]
    fn test_empty_dataset_message() {
        let req = ReportRequest::PriceHistory {
            product: "Milk".into(),
        };
        let out = build(&req, &[]);
        assert_eq!(
            out.empty_message.as_deref(),
            Some("Please import sales data first to generate reports.")
        );
    }

    #[test]
    fn test_weekly_all_zero_is_empty_but_keeps_seven_rows() {
        let req = ReportRequest::Weekly {
            range: DateRange::parse("2020-01-01", "2020-01-07").unwrap(),
            branch: None,
        };
        let out = build(&req, &data());
        assert!(out.is_empty());
        assert_eq!(out.rows.len(), 7);
        assert!(out.chart.is_none());
    }

    #[test]
    fn test_weekly_summary_lines() {
        let req = ReportRequest::Weekly {
            range: DateRange::parse("2024-06-01", "2024-06-02").unwrap(),
            branch: None,
        };
        let out = build(&req, &data());
        assert_eq!(out.summary[0], ("Total Revenue".to_string(), Value::Money(1250.0)));
        assert_eq!(out.summary[1], ("Average Daily Sales".to_string(), Value::Money(625.0)));
    }

    #[test]
    fn test_price_stats_in_summary() {
        let mut d = data();
        d.push(rec("2024-06-05", "Kandy", "Milk", 1.0, 170.0, 170.0));
        let out = build(&ReportRequest::PriceHistory { product: "Milk".into() }, &d);
        assert_eq!(out.rows.len(), 2);
        assert_eq!(out.summary[3], ("Current Price".to_string(), Value::Money(170.0)));
        let missing = build(&ReportRequest::PriceHistory { product: "Tea".into() }, &d);
        assert_eq!(missing.empty_message.as_deref(), Some("No price history found for Tea."));
    }

    #[test]
    fn test_preference_chart_limited_to_top_ten() {
        let d: Vec<SalesRecord> = (0..12)
            .map(|i| rec("2024-06-01", "Colombo", &format!("P{i:02}"), i as f64 + 1.0, 1.0, 1.0))
            .collect();
        let req = ReportRequest::Preference {
            range: DateRange::parse("2024-01-01", "2024-12-31").unwrap(),
            branch: None,
        };
        let out = build(&req, &d);
        assert_eq!(out.rows.len(), 12);
        match out.chart {
            Some(Chart::Bars { bars, money, .. }) => {
                assert_eq!(bars.len(), 10);
                assert!(!money);
                assert!(bars[0].0.starts_with("P11"));
            }
            other => panic!("unexpected chart {other:?}"),
        }
        assert_eq!(out.summary[0].1, Value::Text("P11".into()));
    }

    #[test]
    fn test_distribution_output() {
        let req = ReportRequest::Distribution {
            range: DateRange::parse("2024-01-01", "2024-12-31").unwrap(),
            branch: None,
        };
        let out = build(&req, &data());
        assert_eq!(out.rows.len(), HISTOGRAM_BINS);
        let freq: usize = out
            .rows
            .iter()
            .map(|r| match r[2] {
                Value::Count(c) => c,
                _ => 0,
            })
            .sum();
        assert_eq!(freq, 2);
        assert!(out.summary.iter().any(|(k, _)| k == "Std Dev"));
    }

    #[test]
    fn test_value_rendering() {
        assert_eq!(Value::Money(1500.0).display("Rs."), "Rs. 1,500.00");
        assert_eq!(Value::Money(1500.0).raw(), "1500.00");
        assert_eq!(Value::Money(33.3333).exact(), "33.3333");
        assert_eq!(Value::Quantity(5.0).display("Rs."), "5");
        assert!(!Value::Text("x".into()).is_numeric());
    }
}
