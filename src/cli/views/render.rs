//! Ratatui widgets for a `ReportOutput`.

use ratatui::{
    layout::{Alignment, Constraint, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        Axis, Bar, BarChart, BarGroup, Block, Borders, Cell, Chart, Dataset, GraphType, Paragraph,
        Row, Table,
    },
    Frame,
};

use crate::outputs::{Chart as ChartData, ReportOutput, Value};
use crate::tui::{AMOUNT_STYLE, BOLD, FOOTER_STYLE};

const HEADER_ROW_STYLE: Style = Style::new()
    .fg(Color::DarkGray)
    .add_modifier(Modifier::BOLD);
const BAR_STYLE: Style = Style::new().fg(Color::Rgb(110, 170, 230));

fn cell(value: &Value, currency: &str) -> Cell<'static> {
    let text = value.display(currency);
    match value {
        Value::Money(_) => Cell::from(Line::from(Span::styled(text, AMOUNT_STYLE)).alignment(Alignment::Right)),
        Value::Quantity(_) | Value::Count(_) => Cell::from(Line::from(text).alignment(Alignment::Right)),
        Value::Text(_) | Value::Date(_) => Cell::from(text),
    }
}

/// Table rows starting at `offset`, sized to `area`.
pub fn render_table(frame: &mut Frame, area: Rect, out: &ReportOutput, currency: &str, offset: usize) {
    let widths: Vec<Constraint> = out
        .headers
        .iter()
        .enumerate()
        .map(|(i, _)| {
            let numeric = out.rows.first().and_then(|r| r.get(i)).is_some_and(Value::is_numeric);
            if numeric {
                Constraint::Length(18)
            } else {
                Constraint::Fill(1)
            }
        })
        .collect();
    let header = Row::new(
        out.headers
            .iter()
            .map(|h| Cell::from(h.clone()))
            .collect::<Vec<_>>(),
    )
    .style(HEADER_ROW_STYLE)
    .bottom_margin(1);

    let visible = area.height.saturating_sub(2) as usize;
    let rows: Vec<Row> = out
        .rows
        .iter()
        .skip(offset)
        .take(visible)
        .map(|r| Row::new(r.iter().map(|v| cell(v, currency)).collect::<Vec<_>>()))
        .collect();

    let table = Table::new(rows, widths).header(header).column_spacing(2);
    frame.render_widget(table, area);
}

pub fn render_summary(frame: &mut Frame, area: Rect, out: &ReportOutput, currency: &str) {
    let mut spans = vec![Span::raw(" ")];
    for (i, (label, value)) in out.summary.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled("  |  ", FOOTER_STYLE));
        }
        spans.push(Span::styled(format!("{label}: "), BOLD));
        spans.push(Span::raw(value.display(currency)));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Compact axis label: 1.2k, 3.4M.
pub fn compact(val: f64) -> String {
    let abs = val.abs();
    if abs >= 1_000_000.0 {
        format!("{:.1}M", val / 1_000_000.0)
    } else if abs >= 1000.0 {
        format!("{:.1}k", val / 1000.0)
    } else {
        format!("{val:.0}")
    }
}

pub fn render_chart(frame: &mut Frame, area: Rect, chart: &ChartData) {
    let block = Block::default()
        .title(chart.title().to_string())
        .title_style(BOLD)
        .borders(Borders::NONE);
    match chart {
        ChartData::Bars { bars, .. } => {
            let width = bars.len().max(1) as u16;
            let bar_width = (area.width / width).saturating_sub(1).clamp(1, 12);
            let items: Vec<Bar> = bars
                .iter()
                .map(|(label, v)| {
                    Bar::default()
                        .value(v.max(0.0).round() as u64)
                        .text_value(compact(*v))
                        .label(Line::from(label.clone()))
                        .style(BAR_STYLE)
                })
                .collect();
            let widget = BarChart::default()
                .block(block)
                .bar_width(bar_width)
                .bar_gap(1)
                .data(BarGroup::default().bars(&items));
            frame.render_widget(widget, area);
        }
        ChartData::Histogram { bins, .. } => {
            let width = bins.len().max(1) as u16;
            let bar_width = (area.width / width).clamp(1, 4);
            let items: Vec<Bar> = bins
                .iter()
                .map(|(_, count)| Bar::default().value(*count as u64).style(BAR_STYLE))
                .collect();
            let widget = BarChart::default()
                .block(block)
                .bar_width(bar_width)
                .bar_gap(0)
                .data(BarGroup::default().bars(&items));
            frame.render_widget(widget, area);
        }
        ChartData::Line { points, .. } => {
            let Some(first) = points.first() else {
                return;
            };
            let origin = first.0;
            let data: Vec<(f64, f64)> = points
                .iter()
                .map(|(d, p)| ((*d - origin).num_days() as f64, *p))
                .collect();
            let x_max = data.last().map(|p| p.0).unwrap_or(0.0).max(1.0);
            let y_min = data.iter().map(|p| p.1).fold(f64::MAX, f64::min);
            let y_max = data.iter().map(|p| p.1).fold(f64::MIN, f64::max);
            let pad = ((y_max - y_min) * 0.1).max(1.0);
            let (lo, hi) = ((y_min - pad).max(0.0), y_max + pad);
            let last_date = points.last().map(|p| p.0).unwrap_or(origin);

            let dataset = Dataset::default()
                .name("Unit price")
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(BAR_STYLE)
                .data(&data);
            let widget = Chart::new(vec![dataset])
                .block(block)
                .x_axis(
                    Axis::default()
                        .style(FOOTER_STYLE)
                        .bounds([0.0, x_max])
                        .labels(vec![
                            origin.format("%Y-%m-%d").to_string(),
                            last_date.format("%Y-%m-%d").to_string(),
                        ]),
                )
                .y_axis(
                    Axis::default()
                        .style(FOOTER_STYLE)
                        .bounds([lo, hi])
                        .labels(vec![compact(lo), compact((lo + hi) / 2.0), compact(hi)]),
                );
            frame.render_widget(widget, area);
        }
    }
}
