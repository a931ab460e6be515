//! Enrichment and aggregation: stock + sales rows to per-product and
//! per-(product, location) sums.
//!
//! The product set is the outer union of both tables. A product that only
//! sells, or only sits in stock, still gets a row with the other side zeroed.
//! Grouping goes through `BTreeMap`, so output order is `product_id` order
//! (then `location_id`) for any input order.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::config::AnalysisParams;
use crate::model::{AnalysisInput, LocationInfo, LocationTotals, ProductInfo, ProductTotals};

/// Name used when neither the catalog nor any row names a product/location.
pub const UNKNOWN_NAME: &str = "(unknown)";

/// Location key for stock rows that carry no location at all.
pub const UNASSIGNED_LOCATION: &str = "(unassigned)";

/// Upper bound on XYZ periods per product. Longer windows fold their oldest
/// sales into the first period.
pub const MAX_PERIODS: usize = 5_200;

#[derive(Debug, Clone)]
pub struct Aggregation {
    pub products: Vec<ProductTotals>,
    pub locations: Vec<LocationTotals>,
    pub as_of: Option<NaiveDate>,
    pub period_count: usize,
    pub skipped_rows: usize,
}

#[derive(Default)]
struct ProductAcc {
    row_name: Option<String>,
    quantity: f64,
    value: f64,
    max_unit_cost: f64,
    units_sold: f64,
    revenue: f64,
    period_units: Vec<f64>,
}

/// Maps a sale date onto a period index, oldest period first.
#[derive(Debug, Clone, Copy)]
pub struct PeriodGrid {
    pub as_of: Option<NaiveDate>,
    pub period_days: i64,
    pub period_count: usize,
}

impl PeriodGrid {
    pub fn new(as_of: Option<NaiveDate>, window_days: i64, period_days: i64) -> Self {
        let period_days = period_days.max(1);
        let window_days = window_days.max(1);
        let whole = window_days / period_days;
        let periods = if window_days % period_days == 0 { whole } else { whole + 1 };
        let period_count = usize::try_from(periods).unwrap_or(usize::MAX).clamp(1, MAX_PERIODS);
        if period_count as i64 != periods {
            log::warn!("{window_days}-day window spans {periods} periods, capped at {MAX_PERIODS}");
        }
        Self {
            as_of,
            period_days,
            period_count,
        }
    }

    /// Dates after `as_of` and undated lines land in the last period; dates
    /// before the window start land in the first.
    pub fn index(&self, date: Option<NaiveDate>) -> usize {
        let last = self.period_count - 1;
        let (Some(as_of), Some(date)) = (self.as_of, date) else {
            return last;
        };
        let days_back = (as_of - date).num_days().max(0);
        let back = (days_back / self.period_days) as usize;
        last - back.min(last)
    }
}

/// Latest dated sales line, used as the window end when none is configured.
pub fn latest_sale_date(input: &AnalysisInput) -> Option<NaiveDate> {
    input
        .sales
        .iter()
        .filter(|s| clean_id(s.product_id.as_deref()).is_some())
        .filter_map(|s| s.transaction_date)
        .max()
}

pub fn aggregate(input: &AnalysisInput, params: &AnalysisParams) -> Aggregation {
    let catalog: BTreeMap<&str, &ProductInfo> = input
        .products
        .iter()
        .map(|p| (p.product_id.trim(), p))
        .collect();
    let sites: BTreeMap<&str, &LocationInfo> = input
        .locations
        .iter()
        .map(|l| (l.location_id.trim(), l))
        .collect();

    let as_of = params.as_of.or_else(|| latest_sale_date(input));
    let grid = PeriodGrid::new(as_of, params.window_days, params.xyz.period_days);

    let mut products: BTreeMap<String, ProductAcc> = BTreeMap::new();
    let mut locations: BTreeMap<(String, String), LocationTotals> = BTreeMap::new();
    let mut skipped_rows = 0usize;

    for row in &input.stock {
        let Some(product_id) = clean_id(row.product_id.as_deref()) else {
            log::debug!("stock row without product_id skipped: {row:?}");
            skipped_rows += 1;
            continue;
        };

        let location_id = clean_id(row.location_id.as_deref())
            .or_else(|| clean_id(row.location_name.as_deref()))
            .unwrap_or(UNASSIGNED_LOCATION)
            .to_string();
        let site = sites.get(location_id.as_str());

        if params.internal_locations_only {
            if let Some(usage) = site.and_then(|l| l.usage.as_deref()) {
                if !usage.trim().eq_ignore_ascii_case("internal") {
                    log::debug!("stock row for {product_id} in {usage} location {location_id} skipped");
                    skipped_rows += 1;
                    continue;
                }
            }
        }

        let quantity = row.quantity();
        let value = row.value();

        let acc = products
            .entry(product_id.to_string())
            .or_insert_with(|| ProductAcc::new(grid.period_count));
        acc.quantity += quantity;
        acc.value += value;
        acc.max_unit_cost = acc.max_unit_cost.max(row.unit_cost());
        if acc.row_name.is_none() {
            acc.row_name = clean_id(row.product_name.as_deref()).map(str::to_string);
        }

        let location_name = site
            .and_then(|l| clean_id(l.name.as_deref()))
            .or_else(|| clean_id(row.location_name.as_deref()))
            .unwrap_or(location_id.as_str())
            .to_string();
        let entry = locations
            .entry((product_id.to_string(), location_id.clone()))
            .or_insert_with(|| LocationTotals {
                product_id: product_id.to_string(),
                location_id: location_id.clone(),
                location_name,
                quantity: 0.0,
                inventory_value: 0.0,
            });
        entry.quantity += quantity;
        entry.inventory_value += value;
    }

    for row in &input.sales {
        let Some(product_id) = clean_id(row.product_id.as_deref()) else {
            log::debug!("sales row without product_id skipped: {row:?}");
            skipped_rows += 1;
            continue;
        };

        let units = row.quantity_sold();
        let acc = products
            .entry(product_id.to_string())
            .or_insert_with(|| ProductAcc::new(grid.period_count));
        acc.units_sold += units;
        acc.revenue += row.revenue();
        acc.period_units[grid.index(row.transaction_date)] += units;
        if acc.row_name.is_none() {
            acc.row_name = clean_id(row.product_name.as_deref()).map(str::to_string);
        }
    }

    if skipped_rows > 0 {
        log::warn!("{skipped_rows} input row(s) skipped (missing product_id or non-internal location)");
    }

    let products = products
        .into_iter()
        .map(|(product_id, acc)| {
            let info = catalog.get(product_id.as_str()).copied();
            finish_product(product_id, acc, info)
        })
        .collect();

    Aggregation {
        products,
        locations: locations.into_values().collect(),
        as_of,
        period_count: grid.period_count,
        skipped_rows,
    }
}

impl ProductAcc {
    fn new(period_count: usize) -> Self {
        Self {
            period_units: vec![0.0; period_count],
            ..Default::default()
        }
    }
}

fn finish_product(product_id: String, acc: ProductAcc, info: Option<&ProductInfo>) -> ProductTotals {
    let product_name = info
        .and_then(|p| clean_id(p.name.as_deref()))
        .map(str::to_string)
        .or(acc.row_name)
        .unwrap_or_else(|| UNKNOWN_NAME.to_string());

    let unit_cost = resolve_unit_cost(info, acc.quantity, acc.value, acc.max_unit_cost);

    ProductTotals {
        product_id,
        product_name,
        default_code: info.and_then(|p| p.default_code.clone()),
        category: info.and_then(|p| p.category.clone()),
        quantity_on_hand: acc.quantity,
        inventory_value: acc.value,
        units_sold: acc.units_sold,
        revenue: acc.revenue,
        unit_cost,
        list_price: info
            .and_then(|p| p.list_price)
            .filter(|price| price.is_finite() && *price > 0.0)
            .unwrap_or(0.0),
        period_units: acc.period_units,
    }
}

/// Catalog standard cost, else average cost of the stock on hand, else the
/// highest cost any stock row recorded, else zero.
fn resolve_unit_cost(info: Option<&ProductInfo>, quantity: f64, value: f64, max_row_cost: f64) -> f64 {
    if let Some(cost) = info.and_then(|p| p.standard_cost) {
        if cost.is_finite() && cost > 0.0 {
            return cost;
        }
    }
    if quantity > 0.0 && value > 0.0 {
        return value / quantity;
    }
    max_row_cost.max(0.0)
}

/// Trimmed, non-empty identifier or `None`.
fn clean_id(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SalesRecord, StockRecord};

    fn stock(product: &str, location: &str, qty: f64, cost: f64) -> StockRecord {
        StockRecord {
            product_id: Some(product.into()),
            product_name: Some(format!("{product} name")),
            location_id: Some(location.into()),
            location_name: Some(format!("{location} name")),
            quantity: Some(qty),
            unit_cost: Some(cost),
            inventory_value: None,
        }
    }

    fn sale(product: &str, date: &str, qty: f64, revenue: f64) -> SalesRecord {
        SalesRecord {
            product_id: Some(product.into()),
            product_name: None,
            transaction_date: Some(NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap()),
            quantity_sold: Some(qty),
            revenue: Some(revenue),
        }
    }

    #[test]
    fn outer_union_of_stock_and_sales() {
        let input = AnalysisInput {
            stock: vec![stock("P2", "WH", 5.0, 2.0)],
            sales: vec![sale("P1", "2026-01-10", 3.0, 30.0)],
            ..Default::default()
        };
        let agg = aggregate(&input, &AnalysisParams::default());
        assert_eq!(agg.products.len(), 2);
        assert_eq!(agg.products[0].product_id, "P1");
        assert_eq!(agg.products[0].quantity_on_hand, 0.0);
        assert_eq!(agg.products[0].units_sold, 3.0);
        assert_eq!(agg.products[1].product_id, "P2");
        assert_eq!(agg.products[1].units_sold, 0.0);
        assert_eq!(agg.products[1].quantity_on_hand, 5.0);
    }

    #[test]
    fn sums_across_locations() {
        let input = AnalysisInput {
            stock: vec![
                stock("P1", "WH1", 10.0, 2.0),
                stock("P1", "WH2", 5.0, 2.0),
                stock("P1", "WH1", 1.0, 2.0),
            ],
            ..Default::default()
        };
        let agg = aggregate(&input, &AnalysisParams::default());
        assert_eq!(agg.products.len(), 1);
        assert_eq!(agg.products[0].quantity_on_hand, 16.0);
        assert_eq!(agg.products[0].inventory_value, 32.0);
        assert_eq!(agg.locations.len(), 2);
        assert_eq!(agg.locations[0].location_id, "WH1");
        assert_eq!(agg.locations[0].quantity, 11.0);
        assert_eq!(agg.locations[1].quantity, 5.0);
    }

    #[test]
    fn rows_without_product_id_are_skipped() {
        let mut orphan = stock("", "WH", 5.0, 1.0);
        orphan.product_id = Some("   ".into());
        let input = AnalysisInput {
            stock: vec![orphan, stock("P1", "WH", 1.0, 1.0)],
            sales: vec![SalesRecord {
                product_id: None,
                quantity_sold: Some(9.0),
                ..Default::default()
            }],
            ..Default::default()
        };
        let agg = aggregate(&input, &AnalysisParams::default());
        assert_eq!(agg.products.len(), 1);
        assert_eq!(agg.skipped_rows, 2);
    }

    #[test]
    fn name_resolution_prefers_catalog() {
        let input = AnalysisInput {
            stock: vec![stock("P1", "WH", 1.0, 1.0)],
            sales: vec![sale("P9", "2026-01-10", 1.0, 1.0)],
            products: vec![ProductInfo {
                product_id: "P1".into(),
                name: Some("Catalog Widget".into()),
                category: Some("Tools".into()),
                ..Default::default()
            }],
            ..Default::default()
        };
        let agg = aggregate(&input, &AnalysisParams::default());
        assert_eq!(agg.products[0].product_name, "Catalog Widget");
        assert_eq!(agg.products[0].category.as_deref(), Some("Tools"));
        assert_eq!(agg.products[1].product_name, UNKNOWN_NAME);
    }

    #[test]
    fn non_internal_locations_dropped() {
        let input = AnalysisInput {
            stock: vec![stock("P1", "WH", 4.0, 1.0), stock("P1", "TRANSIT", 6.0, 1.0)],
            locations: vec![
                LocationInfo {
                    location_id: "WH".into(),
                    name: Some("Main".into()),
                    usage: Some("internal".into()),
                },
                LocationInfo {
                    location_id: "TRANSIT".into(),
                    name: None,
                    usage: Some("transit".into()),
                },
            ],
            ..Default::default()
        };
        let agg = aggregate(&input, &AnalysisParams::default());
        assert_eq!(agg.products[0].quantity_on_hand, 4.0);
        assert_eq!(agg.locations.len(), 1);
        assert_eq!(agg.locations[0].location_name, "Main");
        assert_eq!(agg.skipped_rows, 1);

        let params = AnalysisParams {
            internal_locations_only: false,
            ..Default::default()
        };
        let agg = aggregate(&input, &params);
        assert_eq!(agg.products[0].quantity_on_hand, 10.0);
    }

    #[test]
    fn unit_cost_fallbacks() {
        // Zero stock: fall back to the recorded row cost
        let input = AnalysisInput {
            stock: vec![stock("P1", "WH", 0.0, 10.0)],
            ..Default::default()
        };
        let agg = aggregate(&input, &AnalysisParams::default());
        assert_eq!(agg.products[0].unit_cost, 10.0);

        // Supplied value wins over per-row cost for the average
        let mut row = stock("P1", "WH", 4.0, 10.0);
        row.inventory_value = Some(48.0);
        let input = AnalysisInput {
            stock: vec![row],
            ..Default::default()
        };
        let agg = aggregate(&input, &AnalysisParams::default());
        assert_eq!(agg.products[0].unit_cost, 12.0);
        assert_eq!(agg.products[0].inventory_value, 48.0);
    }

    #[test]
    fn period_buckets_oldest_first() {
        let params = AnalysisParams {
            window_days: 28,
            ..Default::default()
        };
        let input = AnalysisInput {
            sales: vec![
                sale("P1", "2026-01-28", 4.0, 4.0),
                sale("P1", "2026-01-22", 1.0, 1.0),
                sale("P1", "2026-01-01", 2.0, 2.0),
                sale("P1", "2025-12-01", 3.0, 3.0),
            ],
            ..Default::default()
        };
        let agg = aggregate(&input, &params);
        assert_eq!(agg.period_count, 4);
        assert_eq!(agg.as_of, NaiveDate::from_ymd_opt(2026, 1, 28));
        // 01-28 and 01-22 share the last week; 01-01 and the older line clamp to the first
        assert_eq!(agg.products[0].period_units, vec![5.0, 0.0, 0.0, 5.0]);
    }

    #[test]
    fn undated_sales_land_in_last_period() {
        let grid = PeriodGrid::new(None, 30, 7);
        assert_eq!(grid.period_count, 5);
        assert_eq!(grid.index(NaiveDate::from_ymd_opt(2020, 1, 1)), 4);
        let grid = PeriodGrid::new(NaiveDate::from_ymd_opt(2026, 1, 31), 30, 7);
        assert_eq!(grid.index(None), 4);
        assert_eq!(grid.index(NaiveDate::from_ymd_opt(2026, 2, 5)), 4);
    }

    #[test]
    fn huge_windows_are_capped() {
        let grid = PeriodGrid::new(None, i64::MAX, 7);
        assert_eq!(grid.period_count, MAX_PERIODS);
        let grid = PeriodGrid::new(None, 10_000_000_000, 1);
        assert_eq!(grid.period_count, MAX_PERIODS);
        assert_eq!(PeriodGrid::new(None, i64::MAX, i64::MAX).period_count, 1);
        assert_eq!(PeriodGrid::new(None, 28, 7).period_count, 4);
        assert_eq!(PeriodGrid::new(None, 29, 7).period_count, 5);

        let grid = PeriodGrid::new(NaiveDate::from_ymd_opt(2026, 1, 31), i64::MAX, 1);
        assert_eq!(grid.index(NaiveDate::from_ymd_opt(1900, 1, 1)), 0);
    }
}
