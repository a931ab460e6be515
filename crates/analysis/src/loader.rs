//! CSV snapshot loaders.
//!
//! Parses CSV text (not files) into input records using the configured
//! column mapping. Only the key column is required; every other mapped
//! column may be missing from the header, and cells that do not parse load
//! as `None`. Ragged rows are accepted; missing trailing cells are `None`.

use chrono::{NaiveDate, NaiveDateTime};

use crate::config::{RowFilter, SalesColumns, StockColumns};
use crate::error::AnalysisError;
use crate::model::{LocationInfo, ProductInfo, SalesRecord, StockRecord};

/// Header lookup over a reader that borrows the caller's CSV text.
struct Table<'a> {
    name: &'static str,
    headers: Vec<String>,
    reader: csv::Reader<&'a [u8]>,
}

impl<'a> Table<'a> {
    fn open(name: &'static str, csv_data: &'a str) -> Result<Self, AnalysisError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(csv_data.as_bytes());
        let headers = reader
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect();
        Ok(Self {
            name,
            headers,
            reader,
        })
    }

    fn optional(&self, column: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == column)
    }

    fn required(&self, column: &str) -> Result<usize, AnalysisError> {
        self.optional(column).ok_or_else(|| AnalysisError::MissingColumn {
            table: self.name.into(),
            column: column.into(),
        })
    }

    /// Filter column index; a configured filter on an absent column is an error.
    fn filter_index(&self, filter: Option<&RowFilter>) -> Result<Option<usize>, AnalysisError> {
        filter.map(|f| self.required(&f.column)).transpose()
    }

    /// Iterate records, dropping rows the filter rejects.
    fn rows(
        &mut self,
        filter: Option<&RowFilter>,
        filter_idx: Option<usize>,
    ) -> Result<Vec<csv::StringRecord>, AnalysisError> {
        let mut rows = Vec::new();
        for record in self.reader.records() {
            let record = record?;
            if let (Some(f), Some(fi)) = (filter, filter_idx) {
                let val = record.get(fi).unwrap_or("");
                if !f.values.iter().any(|v| v == val) {
                    continue;
                }
            }
            rows.push(record);
        }
        Ok(rows)
    }
}

fn text(record: &csv::StringRecord, idx: Option<usize>) -> Option<String> {
    idx.and_then(|i| record.get(i))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn number(record: &csv::StringRecord, idx: Option<usize>) -> Option<f64> {
    let raw = idx.and_then(|i| record.get(i))?.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => {
            log::debug!("unparseable number '{raw}' treated as missing");
            None
        }
    }
}

/// `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS` or `YYYY-MM-DDTHH:MM:SS`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(d);
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.date())
}

pub fn load_stock_csv(
    csv_data: &str,
    columns: &StockColumns,
    filter: Option<&RowFilter>,
) -> Result<Vec<StockRecord>, AnalysisError> {
    let mut table = Table::open("stock", csv_data)?;
    let product_id = table.required(&columns.product_id)?;
    let product_name = table.optional(&columns.product_name);
    let location_id = table.optional(&columns.location_id);
    let location_name = table.optional(&columns.location_name);
    let quantity = table.optional(&columns.quantity);
    let unit_cost = table.optional(&columns.unit_cost);
    let inventory_value = table.optional(&columns.inventory_value);
    let filter_idx = table.filter_index(filter)?;

    let rows = table
        .rows(filter, filter_idx)?
        .iter()
        .map(|r| StockRecord {
            product_id: text(r, Some(product_id)),
            product_name: text(r, product_name),
            location_id: text(r, location_id),
            location_name: text(r, location_name),
            quantity: number(r, quantity),
            unit_cost: number(r, unit_cost),
            inventory_value: number(r, inventory_value),
        })
        .collect();
    Ok(rows)
}

pub fn load_sales_csv(
    csv_data: &str,
    columns: &SalesColumns,
    filter: Option<&RowFilter>,
) -> Result<Vec<SalesRecord>, AnalysisError> {
    let mut table = Table::open("sales", csv_data)?;
    let product_id = table.required(&columns.product_id)?;
    let product_name = table.optional(&columns.product_name);
    let date = table.optional(&columns.transaction_date);
    let quantity_sold = table.optional(&columns.quantity_sold);
    let revenue = table.optional(&columns.revenue);
    let filter_idx = table.filter_index(filter)?;

    let rows = table
        .rows(filter, filter_idx)?
        .iter()
        .map(|r| SalesRecord {
            product_id: text(r, Some(product_id)),
            product_name: text(r, product_name),
            transaction_date: text(r, date).as_deref().and_then(parse_date),
            quantity_sold: number(r, quantity_sold),
            revenue: number(r, revenue),
        })
        .collect();
    Ok(rows)
}

/// Columns: `product_id` (required), `name`, `default_code`, `category`,
/// `list_price`, `standard_cost`. Rows with a blank id are dropped.
pub fn load_products_csv(csv_data: &str) -> Result<Vec<ProductInfo>, AnalysisError> {
    let mut table = Table::open("products", csv_data)?;
    let product_id = table.required("product_id")?;
    let name = table.optional("name");
    let default_code = table.optional("default_code");
    let category = table.optional("category");
    let list_price = table.optional("list_price");
    let standard_cost = table.optional("standard_cost");

    let rows = table
        .rows(None, None)?
        .iter()
        .filter_map(|r| {
            Some(ProductInfo {
                product_id: text(r, Some(product_id))?,
                name: text(r, name),
                default_code: text(r, default_code),
                category: text(r, category),
                list_price: number(r, list_price),
                standard_cost: number(r, standard_cost),
            })
        })
        .collect();
    Ok(rows)
}

/// Columns: `location_id` (required), `name`, `usage`.
pub fn load_locations_csv(csv_data: &str) -> Result<Vec<LocationInfo>, AnalysisError> {
    let mut table = Table::open("locations", csv_data)?;
    let location_id = table.required("location_id")?;
    let name = table.optional("name");
    let usage = table.optional("usage");

    let rows = table
        .rows(None, None)?
        .iter()
        .filter_map(|r| {
            Some(LocationInfo {
                location_id: text(r, Some(location_id))?,
                name: text(r, name),
                usage: text(r, usage),
            })
        })
        .collect();
    Ok(rows)
}
