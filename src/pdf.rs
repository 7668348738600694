use std::io::BufWriter;

use printpdf::*;

use crate::error::{Result, SalesError};
use crate::fmt;
use crate::outputs::{Chart, ReportOutput, Value};

// A4 dimensions (mm)
const PAGE_W: f32 = 210.0;
const PAGE_H: f32 = 297.0;
const MARGIN_TOP: f32 = 20.0;
const MARGIN_BOTTOM: f32 = 20.0;
const MARGIN_LEFT: f32 = 18.0;
const MARGIN_RIGHT: f32 = 18.0;
const ROW_H: f32 = 5.0;
const FONT_SIZE: f32 = 9.0;
const TITLE_SIZE: f32 = 16.0;
const SUBTITLE_SIZE: f32 = 10.0;
const CHART_H: f32 = 70.0;
const CONTENT_W: f32 = PAGE_W - MARGIN_LEFT - MARGIN_RIGHT;

fn approx_text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * 0.18
}

/// Cut text to fit a column, marking the cut with "..".
fn fit(text: &str, width: f32, size: f32) -> String {
    if approx_text_width(text, size) <= width - 2.0 {
        return text.to_string();
    }
    let max_chars = ((width - 2.0) / (size * 0.18)).max(3.0) as usize;
    let kept: String = text.chars().take(max_chars.saturating_sub(2)).collect();
    format!("{kept}..")
}

#[derive(Clone, Copy)]
enum Align {
    Left,
    Right,
}

struct Col {
    width: f32,
    align: Align,
}

/// Text columns get double weight; numeric columns are right aligned.
fn columns_for(headers: &[String], rows: &[Vec<Value>]) -> Vec<Col> {
    let numeric: Vec<bool> = (0..headers.len())
        .map(|i| rows.first().and_then(|r| r.get(i)).is_some_and(Value::is_numeric))
        .collect();
    let weights: Vec<f32> = numeric.iter().map(|&n| if n { 1.0 } else { 2.0 }).collect();
    let total: f32 = weights.iter().sum::<f32>().max(1.0);
    numeric
        .iter()
        .zip(weights)
        .map(|(&n, w)| Col {
            width: CONTENT_W * w / total,
            align: if n { Align::Right } else { Align::Left },
        })
        .collect()
}

struct PdfWriter {
    doc: PdfDocumentReference,
    font: IndirectFontRef,
    font_bold: IndirectFontRef,
    current_page: PdfPageIndex,
    current_layer: PdfLayerIndex,
    y: f32,
}

impl PdfWriter {
    fn new(title: &str) -> Result<Self> {
        let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| SalesError::Pdf(format!("{e:?}")))?;
        let font_bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| SalesError::Pdf(format!("{e:?}")))?;
        Ok(Self {
            doc,
            font,
            font_bold,
            current_page: page,
            current_layer: layer,
            y: MARGIN_TOP,
        })
    }

    fn pdf_y(&self) -> f32 {
        PAGE_H - self.y
    }

    fn layer(&self) -> PdfLayerReference {
        self.doc
            .get_page(self.current_page)
            .get_layer(self.current_layer)
    }

    fn new_page(&mut self) {
        let (page, layer) = self.doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "Layer");
        self.current_page = page;
        self.current_layer = layer;
        self.y = MARGIN_TOP;
    }

    fn ensure_space(&mut self, needed: f32) {
        if self.y + needed > PAGE_H - MARGIN_BOTTOM {
            self.new_page();
        }
    }

    fn text(&self, s: &str, x: f32, size: f32, bold: bool) {
        let font = if bold { &self.font_bold } else { &self.font };
        self.layer().use_text(s, size, Mm(x), Mm(self.pdf_y()), font);
    }

    fn line(&self, from: (f32, f32), to: (f32, f32)) {
        let line = Line {
            points: vec![
                (Point::new(Mm(from.0), Mm(PAGE_H - from.1)), false),
                (Point::new(Mm(to.0), Mm(PAGE_H - to.1)), false),
            ],
            is_closed: false,
        };
        self.layer().add_line(line);
    }

    fn hline(&self, x1: f32, x2: f32) {
        self.layer().set_outline_thickness(0.5);
        self.line((x1, self.y), (x2, self.y));
    }

    fn header(&mut self, title: &str, subtitle: &str) {
        self.text(title, MARGIN_LEFT, TITLE_SIZE, true);
        self.y += 7.0;
        if !subtitle.is_empty() {
            self.text(subtitle, MARGIN_LEFT, SUBTITLE_SIZE, false);
            self.y += 5.0;
        }
        let ts = chrono::Local::now()
            .format("Generated %Y-%m-%d %H:%M")
            .to_string();
        self.text(&ts, MARGIN_LEFT, 8.0, false);
        self.y += 5.0;
        self.hline(MARGIN_LEFT, PAGE_W - MARGIN_RIGHT);
        self.y += 5.0;
    }

    fn cells(&mut self, cols: &[Col], values: &[String], bold: bool) {
        let mut x = MARGIN_LEFT;
        for (col, value) in cols.iter().zip(values) {
            let shown = fit(value, col.width, FONT_SIZE);
            match col.align {
                Align::Left => self.text(&shown, x, FONT_SIZE, bold),
                Align::Right => {
                    let tw = approx_text_width(&shown, FONT_SIZE);
                    self.text(&shown, x + col.width - tw, FONT_SIZE, bold);
                }
            }
            x += col.width;
        }
    }

    fn table_header(&mut self, cols: &[Col], headers: &[String]) {
        self.ensure_space(ROW_H * 2.0);
        self.cells(cols, headers, true);
        self.y += ROW_H;
        self.hline(MARGIN_LEFT, PAGE_W - MARGIN_RIGHT);
        self.y += 4.0;
    }

    /// Rows repeat the header after a page break.
    fn table(&mut self, headers: &[String], rows: &[Vec<Value>], currency: &str) {
        let cols = columns_for(headers, rows);
        self.table_header(&cols, headers);
        for row in rows {
            if self.y + ROW_H > PAGE_H - MARGIN_BOTTOM {
                self.new_page();
                self.table_header(&cols, headers);
            }
            let values: Vec<String> = row.iter().map(|v| v.display(currency)).collect();
            self.cells(&cols, &values, false);
            self.y += ROW_H;
        }
    }

    fn summary(&mut self, lines: &[(String, Value)], currency: &str) {
        if lines.is_empty() {
            return;
        }
        self.ensure_space(ROW_H * (lines.len() as f32 + 1.0));
        self.hline(MARGIN_LEFT, PAGE_W - MARGIN_RIGHT);
        self.y += 5.0;
        for (label, value) in lines {
            self.text(&format!("{label}:"), MARGIN_LEFT, FONT_SIZE, true);
            self.text(&value.display(currency), MARGIN_LEFT + 45.0, FONT_SIZE, false);
            self.y += ROW_H;
        }
        self.y += ROW_H;
    }

    /// Vertical bars drawn as thick strokes, one per label.
    fn bar_chart(&mut self, title: &str, bars: &[(String, f64)], value_label: impl Fn(f64) -> String) {
        if bars.is_empty() {
            return;
        }
        self.ensure_space(CHART_H + ROW_H * 4.0);
        self.text(title, MARGIN_LEFT, SUBTITLE_SIZE, true);
        self.y += ROW_H * 2.0;

        let max = bars.iter().map(|b| b.1).fold(0.0f64, f64::max);
        let top = self.y;
        let base = top + CHART_H;
        let slot = CONTENT_W / bars.len() as f32;
        let bar_w = (slot * 0.6).min(18.0);

        let layer = self.layer();
        layer.set_outline_thickness(0.5);
        self.line((MARGIN_LEFT, base), (PAGE_W - MARGIN_RIGHT, base));

        layer.set_outline_color(Color::Rgb(Rgb::new(0.35, 0.6, 0.85, None)));
        // Line width is in points; 1 mm = 2.835 pt.
        layer.set_outline_thickness(bar_w * 2.835);
        for (i, (_, value)) in bars.iter().enumerate() {
            if max <= 0.0 || *value <= 0.0 {
                continue;
            }
            let h = (*value / max) as f32 * CHART_H;
            let x = MARGIN_LEFT + slot * (i as f32 + 0.5);
            self.line((x, base), (x, base - h));
        }
        layer.set_outline_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
        layer.set_outline_thickness(0.5);

        for (i, (label, value)) in bars.iter().enumerate() {
            let x = MARGIN_LEFT + slot * i as f32 + 1.0;
            let h = if max > 0.0 { (*value / max) as f32 * CHART_H } else { 0.0 };
            self.y = base - h - 1.5;
            self.text(&fit(&value_label(*value), slot, 6.0), x, 6.0, false);
            self.y = base + 4.0;
            self.text(&fit(label, slot, 7.0), x, 7.0, false);
        }
        self.y = base + ROW_H * 2.0;
    }

    fn to_bytes(self) -> Result<Vec<u8>> {
        let mut buf = BufWriter::new(Vec::new());
        self.doc
            .save(&mut buf)
            .map_err(|e| SalesError::Pdf(format!("{e:?}")))?;
        buf.into_inner().map_err(|e| SalesError::Pdf(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Render functions
// ---------------------------------------------------------------------------

/// Report table, summary lines and, for bar-type reports, a bar chart.
pub fn render_report(report: &ReportOutput, currency: &str) -> Result<Vec<u8>> {
    let mut pdf = PdfWriter::new(&report.title)?;
    pdf.header(&report.title, &report.subtitle);

    if let Some(msg) = &report.empty_message {
        pdf.text(msg, MARGIN_LEFT, FONT_SIZE, false);
        return pdf.to_bytes();
    }

    pdf.summary(&report.summary, currency);
    match &report.chart {
        Some(Chart::Bars { title, bars, money }) => {
            pdf.bar_chart(title, bars, |v| {
                if *money {
                    fmt::number(v)
                } else {
                    fmt::quantity(v)
                }
            });
        }
        Some(Chart::Histogram { title, bins }) => {
            let bars: Vec<(String, f64)> = bins
                .iter()
                .map(|(lo, count)| (format!("{lo:.0}"), *count as f64))
                .collect();
            pdf.bar_chart(title, &bars, fmt::quantity);
        }
        Some(Chart::Line { .. }) | None => {}
    }
    pdf.table(&report.headers, &report.rows, currency);
    pdf.to_bytes()
}

/// Plain record listing for the dataset export.
pub fn render_records(
    title: &str,
    subtitle: &str,
    headers: &[String],
    rows: &[Vec<Value>],
    currency: &str,
) -> Result<Vec<u8>> {
    let mut pdf = PdfWriter::new(title)?;
    pdf.header(title, subtitle);
    pdf.table(headers, rows, currency);
    pdf.y += ROW_H;
    pdf.ensure_space(ROW_H);
    pdf.text(&format!("{} records", rows.len()), MARGIN_LEFT, FONT_SIZE, true);
    pdf.to_bytes()
}
