use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, NaiveDate, Weekday};

use crate::error::{Result, SalesError};
use crate::models::SalesRecord;

pub const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(SalesError::InvalidRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// Parse two `YYYY-MM-DD` strings.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Self::new(parse_ymd(start)?, parse_ymd(end)?)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

pub fn parse_ymd(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| SalesError::InvalidDate(raw.trim().to_string()))
}

pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

pub fn month_name(month: u32) -> &'static str {
    MONTH_NAMES
        .get((month as usize).wrapping_sub(1))
        .copied()
        .unwrap_or("")
}

/// Accept `1`-`12`, a full month name or its three-letter abbreviation.
pub fn parse_month(raw: &str) -> Result<u32> {
    let s = raw.trim();
    if let Ok(n) = s.parse::<u32>() {
        if (1..=12).contains(&n) {
            return Ok(n);
        }
        return Err(SalesError::InvalidMonth(s.to_string()));
    }
    let lower = s.to_lowercase();
    MONTH_NAMES
        .iter()
        .position(|m| {
            let m = m.to_lowercase();
            m == lower || (lower.len() == 3 && m.starts_with(&lower))
        })
        .map(|i| i as u32 + 1)
        .ok_or_else(|| SalesError::InvalidMonth(s.to_string()))
}

pub const ALL_BRANCHES: &str = "All Branches";
pub const ALL_PRODUCTS: &str = "All Products";
pub const ALL_YEARS: &str = "All Years";
pub const ALL_MONTHS: &str = "All Months";

/// Map one of the exact "All ..." choice labels to no filter. Any other
/// value, including a branch that happens to start with "All", is kept.
pub fn selection(value: &str) -> Option<&str> {
    match value {
        "" | "all" | ALL_BRANCHES | ALL_PRODUCTS | ALL_YEARS | ALL_MONTHS => None,
        v => Some(v),
    }
}

fn branch_matches(record: &SalesRecord, branch: Option<&str>) -> bool {
    branch.map_or(true, |b| record.branch == b)
}

// ---------------------------------------------------------------------------
// Monthly sales
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyItem {
    pub product: String,
    pub quantity: f64,
    pub avg_unit_price: f64,
    pub total: f64,
}

/// Per-product quantity, average unit price and total, ordered by product name.
pub fn monthly_sales(
    records: &[SalesRecord],
    branch: Option<&str>,
    year: Option<i32>,
    month: Option<u32>,
) -> Vec<MonthlyItem> {
    // product -> (quantity, price sum, count, total)
    let mut groups: BTreeMap<&str, (f64, f64, usize, f64)> = BTreeMap::new();
    for r in records.iter().filter(|r| {
        branch_matches(r, branch)
            && year.map_or(true, |y| r.date.year() == y)
            && month.map_or(true, |m| r.date.month() == m)
    }) {
        let entry = groups.entry(r.product.as_str()).or_default();
        entry.0 += r.quantity;
        entry.1 += r.unit_price;
        entry.2 += 1;
        entry.3 += r.total;
    }
    groups
        .into_iter()
        .map(|(product, (quantity, price_sum, count, total))| MonthlyItem {
            product: product.to_string(),
            quantity,
            avg_unit_price: price_sum / count as f64,
            total,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Price history
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub unit_price: f64,
}

/// Distinct (date, unit price) points for one product, oldest first.
pub fn price_history(records: &[SalesRecord], product: &str) -> Vec<PricePoint> {
    let mut points: Vec<PricePoint> = Vec::new();
    for r in records.iter().filter(|r| r.product == product) {
        let point = PricePoint {
            date: r.date,
            unit_price: r.unit_price,
        };
        if !points.contains(&point) {
            points.push(point);
        }
    }
    points.sort_by_key(|p| p.date);
    points
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceStats {
    pub average: f64,
    pub max: f64,
    pub min: f64,
    pub current: f64,
}

impl PriceStats {
    pub fn from_history(history: &[PricePoint]) -> Option<Self> {
        let last = history.last()?;
        let prices = history.iter().map(|p| p.unit_price);
        Some(Self {
            average: prices.clone().sum::<f64>() / history.len() as f64,
            max: prices.clone().fold(f64::MIN, f64::max),
            min: prices.fold(f64::MAX, f64::min),
            current: last.unit_price,
        })
    }
}

// ---------------------------------------------------------------------------
// Weekly sales
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayTotal {
    pub day: Weekday,
    pub total: f64,
}

impl DayTotal {
    pub fn name(&self) -> &'static str {
        weekday_name(self.day)
    }
}

/// Totals per weekday, always seven rows Monday through Sunday.
pub fn weekly_sales(records: &[SalesRecord], range: &DateRange, branch: Option<&str>) -> Vec<DayTotal> {
    let mut totals = [0.0f64; 7];
    for r in records
        .iter()
        .filter(|r| range.contains(r.date) && branch_matches(r, branch))
    {
        totals[r.date.weekday().num_days_from_monday() as usize] += r.total;
    }
    WEEKDAYS
        .iter()
        .zip(totals)
        .map(|(&day, total)| DayTotal { day, total })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeeklySummary {
    pub total_revenue: f64,
    pub avg_daily_sales: f64,
}

impl WeeklySummary {
    pub fn from_days(days: &[DayTotal]) -> Self {
        let total_revenue: f64 = days.iter().map(|d| d.total).sum();
        let active = days.iter().filter(|d| d.total > 0.0).count();
        Self {
            total_revenue,
            avg_daily_sales: if active > 0 {
                total_revenue / active as f64
            } else {
                0.0
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Product preference
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct PreferenceItem {
    pub product: String,
    pub units_sold: f64,
    pub revenue: f64,
}

/// Units sold and revenue per product, most units first. Products with equal
/// units keep the order in which they first appear in the data.
pub fn product_preference(
    records: &[SalesRecord],
    range: &DateRange,
    branch: Option<&str>,
) -> Vec<PreferenceItem> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut items: Vec<PreferenceItem> = Vec::new();
    for r in records
        .iter()
        .filter(|r| range.contains(r.date) && branch_matches(r, branch))
    {
        let i = *index.entry(r.product.as_str()).or_insert_with(|| {
            items.push(PreferenceItem {
                product: r.product.clone(),
                units_sold: 0.0,
                revenue: 0.0,
            });
            items.len() - 1
        });
        items[i].units_sold += r.quantity;
        items[i].revenue += r.total;
    }
    items.sort_by(|a, b| b.units_sold.total_cmp(&a.units_sold));
    items
}

// ---------------------------------------------------------------------------
// Sales distribution
// ---------------------------------------------------------------------------

/// Per-record totals in data order.
pub fn sales_distribution(records: &[SalesRecord], range: &DateRange, branch: Option<&str>) -> Vec<f64> {
    records
        .iter()
        .filter(|r| range.contains(r.date) && branch_matches(r, branch))
        .map(|r| r.total)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistributionStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    /// Smallest of the most frequent values.
    pub mode: Option<f64>,
    pub min: f64,
    pub max: f64,
    /// Sample standard deviation; absent for fewer than two values.
    pub std_dev: Option<f64>,
}

impl DistributionStats {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let n = values.len();
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let mean = sorted.iter().sum::<f64>() / n as f64;
        let median = if n % 2 == 1 {
            sorted[n / 2]
        } else {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        };

        // Runs over the sorted values; strict `>` keeps the smallest on ties.
        let mut mode = None;
        let mut best = 0usize;
        let mut i = 0;
        while i < n {
            let mut j = i;
            while j < n && sorted[j] == sorted[i] {
                j += 1;
            }
            if j - i > best {
                best = j - i;
                mode = Some(sorted[i]);
            }
            i = j;
        }

        let std_dev = (n > 1).then(|| {
            let var = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
            var.sqrt()
        });

        Some(Self {
            count: n,
            mean,
            median,
            mode,
            min: sorted[0],
            max: sorted[n - 1],
            std_dev,
        })
    }
}

/// Equal-width histogram. Returns (bin lower edge, count) pairs.
pub fn histogram(values: &[f64], bins: usize) -> Vec<(f64, usize)> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }
    let min = values.iter().copied().fold(f64::MAX, f64::min);
    let max = values.iter().copied().fold(f64::MIN, f64::max);
    if max == min {
        return vec![(min, values.len())];
    }
    let width = (max - min) / bins as f64;
    let mut counts = vec![0usize; bins];
    for v in values {
        let i = (((v - min) / width) as usize).min(bins - 1);
        counts[i] += 1;
    }
    counts
        .into_iter()
        .enumerate()
        .map(|(i, c)| (min + width * i as f64, c))
        .collect()
}

// ---------------------------------------------------------------------------
// Dashboard summary and export filter
// ---------------------------------------------------------------------------

pub struct DashboardSummary {
    pub total_sales: f64,
    pub record_count: usize,
    pub top_product: Option<String>,
}

pub fn dashboard_summary(records: &[SalesRecord]) -> DashboardSummary {
    let mut by_product: BTreeMap<&str, f64> = BTreeMap::new();
    for r in records {
        *by_product.entry(r.product.as_str()).or_default() += r.total;
    }
    let top_product = by_product
        .iter()
        .fold(None::<(&str, f64)>, |best, (&p, &t)| match best {
            Some((_, bt)) if bt >= t => best,
            _ => Some((p, t)),
        })
        .map(|(p, _)| p.to_string());
    DashboardSummary {
        total_sales: records.iter().map(|r| r.total).sum(),
        record_count: records.len(),
        top_product,
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExportFilter {
    pub branch: Option<String>,
    pub product: Option<String>,
    pub range: Option<DateRange>,
}

pub fn filter_records(records: &[SalesRecord], filter: &ExportFilter) -> Vec<SalesRecord> {
    records
        .iter()
        .filter(|r| {
            branch_matches(r, filter.branch.as_deref())
                && filter.product.as_deref().map_or(true, |p| r.product == p)
                && filter.range.map_or(true, |range| range.contains(r.date))
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

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

    fn scenario() -> Vec<SalesRecord> {
        vec![
            rec("2024-06-01", "Colombo", "Milk", 5.0, 150.0, 750.0),
            rec("2024-06-02", "Kandy", "Bread", 10.0, 50.0, 500.0),
        ]
    }

    fn find<'a>(items: &'a [MonthlyItem], product: &str) -> &'a MonthlyItem {
        items.iter().find(|i| i.product == product).unwrap()
    }

    #[test]
    fn test_monthly_sales_scenario() {
        let items = monthly_sales(&scenario(), None, Some(2024), Some(6));
        assert_eq!(items.len(), 2);
        let milk = find(&items, "Milk");
        assert_eq!((milk.quantity, milk.avg_unit_price, milk.total), (5.0, 150.0, 750.0));
        let bread = find(&items, "Bread");
        assert_eq!((bread.quantity, bread.avg_unit_price, bread.total), (10.0, 50.0, 500.0));
    }

    #[test]
    fn test_monthly_sales_aggregates_and_filters() {
        let mut data = scenario();
        data.push(rec("2024-06-15", "Colombo", "Milk", 3.0, 170.0, 510.0));
        data.push(rec("2024-07-01", "Colombo", "Milk", 100.0, 1.0, 100.0));

        let items = monthly_sales(&data, Some("Colombo"), Some(2024), Some(6));
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 8.0);
        assert_eq!(items[0].avg_unit_price, 160.0);
        assert_eq!(items[0].total, 1260.0);

        assert_eq!(monthly_sales(&data, None, Some(2024), None).len(), 2);
        assert!(monthly_sales(&data, None, Some(2023), None).is_empty());
        assert!(monthly_sales(&[], None, None, None).is_empty());
    }

    #[test]
    fn test_price_history_dedupes_and_sorts() {
        let data = vec![
            rec("2024-06-03", "Colombo", "Milk", 1.0, 160.0, 160.0),
            rec("2024-06-01", "Kandy", "Milk", 1.0, 150.0, 150.0),
            rec("2024-06-01", "Colombo", "Milk", 2.0, 150.0, 300.0),
            rec("2024-06-02", "Colombo", "Bread", 1.0, 50.0, 50.0),
            rec("2024-06-01", "Galle", "Milk", 1.0, 155.0, 155.0),
        ];
        let history = price_history(&data, "Milk");
        assert_eq!(history.len(), 3);
        assert!(history.windows(2).all(|w| w[0].date <= w[1].date));
        assert_eq!(history[2].unit_price, 160.0);
        assert!(price_history(&data, "milk").is_empty());

        let stats = PriceStats::from_history(&history).unwrap();
        assert_eq!(stats.current, 160.0);
        assert_eq!(stats.max, 160.0);
        assert_eq!(stats.min, 150.0);
        assert_eq!(stats.average, 155.0);
        assert!(PriceStats::from_history(&[]).is_none());
    }

    #[test]
    fn test_weekly_sales_scenario() {
        let range = DateRange::parse("2024-06-01", "2024-06-02").unwrap();
        let days = weekly_sales(&scenario(), &range, None);
        let names: Vec<&str> = days.iter().map(|d| d.name()).collect();
        assert_eq!(
            names,
            ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday"]
        );
        assert_eq!(days[5].total, 750.0);
        assert_eq!(days[6].total, 500.0);
        assert!(days[..5].iter().all(|d| d.total == 0.0));

        let summary = WeeklySummary::from_days(&days);
        assert_eq!(summary.total_revenue, 1250.0);
        assert_eq!(summary.avg_daily_sales, 625.0);
    }

    #[test]
    fn test_weekly_sales_empty_still_has_seven_days() {
        let range = DateRange::parse("2020-01-01", "2020-01-07").unwrap();
        let days = weekly_sales(&scenario(), &range, None);
        assert_eq!(days.len(), 7);
        assert!(days.iter().all(|d| d.total == 0.0));
        assert_eq!(weekly_sales(&[], &range, Some("Kandy")).len(), 7);
        assert_eq!(WeeklySummary::from_days(&days).avg_daily_sales, 0.0);
    }

    #[test]
    fn test_weekly_sales_range_is_inclusive_and_branch_filtered() {
        let range = DateRange::parse("2024-06-02", "2024-06-02").unwrap();
        let days = weekly_sales(&scenario(), &range, Some("Kandy"));
        assert_eq!(days[6].total, 500.0);
        assert_eq!(days.iter().map(|d| d.total).sum::<f64>(), 500.0);
        let days = weekly_sales(&scenario(), &range, Some("Colombo"));
        assert!(days.iter().all(|d| d.total == 0.0));
    }

    #[test]
    fn test_product_preference_sorted_with_stable_ties() {
        let data = vec![
            rec("2024-06-01", "Colombo", "Tea", 5.0, 10.0, 50.0),
            rec("2024-06-01", "Colombo", "Milk", 5.0, 150.0, 750.0),
            rec("2024-06-02", "Kandy", "Bread", 10.0, 50.0, 500.0),
            rec("2024-06-03", "Kandy", "Bread", 2.0, 50.0, 100.0),
            rec("2025-01-01", "Kandy", "Eggs", 99.0, 1.0, 99.0),
        ];
        let range = DateRange::parse("2024-01-01", "2024-12-31").unwrap();
        let items = product_preference(&data, &range, None);
        let order: Vec<&str> = items.iter().map(|i| i.product.as_str()).collect();
        assert_eq!(order, ["Bread", "Tea", "Milk"]);
        assert_eq!(items[0].units_sold, 12.0);
        assert_eq!(items[0].revenue, 600.0);
        assert!(items.windows(2).all(|w| w[0].units_sold >= w[1].units_sold));

        let kandy = product_preference(&data, &range, Some("Kandy"));
        assert_eq!(kandy.len(), 1);
    }

    #[test]
    fn test_sales_distribution_returns_raw_totals() {
        let range = DateRange::parse("2024-06-01", "2024-06-30").unwrap();
        assert_eq!(sales_distribution(&scenario(), &range, None), vec![750.0, 500.0]);
        assert_eq!(sales_distribution(&scenario(), &range, Some("Kandy")), vec![500.0]);
        assert!(sales_distribution(&[], &range, None).is_empty());
    }

    #[test]
    fn test_distribution_stats() {
        let stats = DistributionStats::from_values(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_eq!(stats.mean, 5.0);
        assert_eq!(stats.median, 4.5);
        assert_eq!(stats.mode, Some(4.0));
        assert_eq!(stats.min, 2.0);
        assert_eq!(stats.max, 9.0);
        let sd = stats.std_dev.unwrap();
        assert!((sd - 2.138089935).abs() < 1e-6);

        let tie = DistributionStats::from_values(&[3.0, 1.0, 3.0, 1.0]).unwrap();
        assert_eq!(tie.mode, Some(1.0));

        let single = DistributionStats::from_values(&[10.0]).unwrap();
        assert_eq!(single.median, 10.0);
        assert!(single.std_dev.is_none());

        assert!(DistributionStats::from_values(&[]).is_none());
    }

    #[test]
    fn test_histogram() {
        let bins = histogram(&[0.0, 1.0, 2.0, 3.0, 4.0], 2);
        assert_eq!(bins, vec![(0.0, 2), (2.0, 3)]);
        assert_eq!(histogram(&[5.0, 5.0], 10), vec![(5.0, 2)]);
        assert!(histogram(&[], 10).is_empty());
    }

    #[test]
    fn test_date_range_validation() {
        assert!(DateRange::parse("2024-06-01", "2024-06-01").is_ok());
        assert!(matches!(
            DateRange::parse("2024-06-02", "2024-06-01"),
            Err(SalesError::InvalidRange { .. })
        ));
        assert!(matches!(
            DateRange::parse("2024-6-1x", "2024-06-01"),
            Err(SalesError::InvalidDate(_))
        ));
        assert!(matches!(
            DateRange::parse("2024-06-01", "06/02/2024"),
            Err(SalesError::InvalidDate(_))
        ));
    }

    #[test]
    fn test_parse_month() {
        assert_eq!(parse_month("6").unwrap(), 6);
        assert_eq!(parse_month("June").unwrap(), 6);
        assert_eq!(parse_month("dec").unwrap(), 12);
        assert!(matches!(parse_month("13"), Err(SalesError::InvalidMonth(_))));
        assert!(matches!(parse_month("Juneteenth"), Err(SalesError::InvalidMonth(_))));
        assert_eq!(month_name(2), "February");
        assert_eq!(month_name(0), "");
    }

    #[test]
    fn test_selection_maps_all_to_none() {
        assert_eq!(selection("All Branches"), None);
        assert_eq!(selection("All Years"), None);
        assert_eq!(selection("Kandy"), Some("Kandy"));
        assert_eq!(selection(""), None);
        assert_eq!(selection("all"), None);
        assert_eq!(selection("All Saints"), Some("All Saints"));
        assert_eq!(selection("All Natural Yogurt"), Some("All Natural Yogurt"));
    }

    #[test]
    fn test_dashboard_summary() {
        let mut data = scenario();
        data.push(rec("2024-06-03", "Kandy", "Bread", 10.0, 50.0, 500.0));
        let summary = dashboard_summary(&data);
        assert_eq!(summary.total_sales, 1750.0);
        assert_eq!(summary.record_count, 3);
        assert_eq!(summary.top_product.as_deref(), Some("Bread"));
        assert!(dashboard_summary(&[]).top_product.is_none());
    }

    #[test]
    fn test_filter_records() {
        let data = scenario();
        let filter = ExportFilter {
            branch: Some("Kandy".into()),
            product: None,
            range: Some(DateRange::parse("2024-01-01", "2024-12-31").unwrap()),
        };
        let out = filter_records(&data, &filter);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].product, "Bread");
        assert_eq!(filter_records(&data, &ExportFilter::default()).len(), 2);
        let none = ExportFilter {
            product: Some("Tea".into()),
            ..Default::default()
        };
        assert!(filter_records(&data, &none).is_empty());
    }
}
