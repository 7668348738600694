use crate::error::Result;
use crate::fmt::money;
use crate::reports::dashboard_summary;
use crate::settings::Settings;
use crate::store::SalesStore;

pub fn run(mut store: SalesStore, settings: &Settings) -> Result<()> {
    if let Some(notice) = store.take_notice() {
        eprintln!("Warning: {notice}");
    }

    println!("User:       {}", if settings.user_name.is_empty() { "(not set)" } else { &settings.user_name });
    println!("Data file:  {}", store.path().display());
    println!("Currency:   {}", settings.currency);

    if !store.path().exists() {
        println!();
        println!("No sales data yet. Import a file with `salesdesk import <FILE>`.");
        return Ok(());
    }

    let summary = dashboard_summary(store.records());
    let first = store.records().iter().map(|r| r.date).min();
    let last = store.records().iter().map(|r| r.date).max();

    println!();
    println!("Records:      {}", summary.record_count);
    println!("Branches:     {}", store.branches().len());
    println!("Products:     {}", store.products().len());
    if let (Some(first), Some(last)) = (first, last) {
        println!("Date range:   {} to {}", first.format("%Y-%m-%d"), last.format("%Y-%m-%d"));
    }
    println!("Total sales:  {}", money(summary.total_sales, &settings.currency));
    println!("Top product:  {}", summary.top_product.as_deref().unwrap_or("N/A"));
    Ok(())
}
