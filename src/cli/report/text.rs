use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use crate::outputs::{Chart, ReportOutput};

/// Plain-text rendition of a report: title, filters, table, summary.
pub fn format_report(report: &ReportOutput, currency: &str) -> String {
    let mut out = format!("{}\n{}\n", report.title.bold(), report.subtitle);

    if let Some(msg) = &report.empty_message {
        out.push_str(&format!("\n{}", msg.yellow()));
        return out;
    }

    let mut table = Table::new();
    table.set_header(report.headers.iter().map(|h| Cell::new(h).fg(comfy_table::Color::Cyan)));
    for row in &report.rows {
        table.add_row(row.iter().map(|v| {
            let cell = Cell::new(v.display(currency));
            if v.is_numeric() {
                cell.set_alignment(CellAlignment::Right)
            } else {
                cell
            }
        }));
    }
    out.push_str(&table.to_string());

    if !report.summary.is_empty() {
        out.push('\n');
        let width = report.summary.iter().map(|(l, _)| l.len()).max().unwrap_or(0);
        for (label, value) in &report.summary {
            out.push_str(&format!("\n{:<width$}  {}", label, value.display(currency)));
        }
    }

    if let Some(Chart::Bars { title, bars, money }) = &report.chart {
        out.push_str(&format!("\n\n{}\n", title.bold()));
        out.push_str(&text_bars(bars, *money, currency));
    }
    out
}

/// Horizontal `#` bars scaled to the largest value.
fn text_bars(bars: &[(String, f64)], money: bool, currency: &str) -> String {
    const WIDTH: f64 = 40.0;
    let max = bars.iter().map(|(_, v)| *v).fold(0.0_f64, f64::max);
    let label_w = bars.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0);
    bars.iter()
        .map(|(label, v)| {
            let len = if max > 0.0 { (v / max * WIDTH).round() as usize } else { 0 };
            let shown = if money {
                crate::fmt::money(*v, currency)
            } else {
                crate::fmt::quantity(*v)
            };
            format!("{label:<label_w$} {} {shown}", "#".repeat(len))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SalesRecord;
    use crate::outputs::{build, ReportRequest};
    use crate::reports::{parse_ymd, DateRange};

    fn records() -> Vec<SalesRecord> {
        vec![
            SalesRecord {
                date: parse_ymd("2024-06-01").unwrap(),
                branch: "Colombo".into(),
                product: "Milk".into(),
                quantity: 5.0,
                unit_price: 150.0,
                total: 750.0,
            },
            SalesRecord {
                date: parse_ymd("2024-06-02").unwrap(),
                branch: "Kandy".into(),
                product: "Bread".into(),
                quantity: 10.0,
                unit_price: 50.0,
                total: 500.0,
            },
        ]
    }

    #[test]
    fn test_preference_text_has_rows_and_bars() {
        colored::control::set_override(false);
        let req = ReportRequest::Preference {
            range: DateRange::parse("2024-06-01", "2024-06-30").unwrap(),
            branch: None,
        };
        let s = format_report(&build(&req, &records()), "Rs.");
        assert!(s.starts_with("Product Preference"));
        assert!(s.contains("Rs. 750.00"));
        let bread = s.find("Bread").unwrap();
        let milk = s.find("Milk").unwrap();
        assert!(bread < milk);
        assert!(s.contains('#'));
    }

    #[test]
    fn test_empty_report_prints_message_only() {
        colored::control::set_override(false);
        let req = ReportRequest::PriceHistory {
            product: "Cheese".into(),
        };
        let s = format_report(&build(&req, &records()), "Rs.");
        assert!(s.contains("No price history found for Cheese."));
        assert!(!s.contains('+'));
    }

    #[test]
    fn test_text_bars_scale_to_max() {
        let s = text_bars(&[("A".into(), 10.0), ("B".into(), 5.0)], false, "");
        let lines: Vec<&str> = s.lines().collect();
        assert_eq!(lines[0].matches('#').count(), 40);
        assert_eq!(lines[1].matches('#').count(), 20);
    }
}
