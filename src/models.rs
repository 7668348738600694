use chrono::NaiveDate;

/// Column names of the backing file and of every import file, in file order.
pub const REQUIRED_COLUMNS: [&str; 6] = ["Date", "Branch", "Product", "Quantity", "UnitPrice", "Total"];

#[derive(Debug, Clone, PartialEq)]
pub struct SalesRecord {
    pub date: NaiveDate,
    pub branch: String,
    pub product: String,
    pub quantity: f64,
    pub unit_price: f64,
    /// Taken as supplied; not checked against `quantity * unit_price`.
    pub total: f64,
}

/// Raw rows read from a CSV or spreadsheet before validation.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Batch {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Required columns absent from this batch, in canonical order.
    pub fn missing_columns(&self) -> Vec<String> {
        REQUIRED_COLUMNS
            .iter()
            .filter(|c| self.column_index(c).is_none())
            .map(|c| c.to_string())
            .collect()
    }
}

/// Result of a successful append.
#[derive(Debug, Clone, PartialEq)]
pub struct AppendOutcome {
    pub added: usize,
    pub dropped: usize,
    /// Set when the rows were merged but writing the backing file failed.
    pub persist_error: Option<String>,
}
