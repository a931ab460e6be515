//! Ratio derivation. Every division goes through [`crate::ratio`].

use std::collections::BTreeMap;

use crate::model::{LocationMetric, LocationTotals, ProductTotals};
use crate::ratio::{coverage_days, ratio_or_zero};

/// Ratios derived from one product's totals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ratios {
    pub daily_sale_rate: f64,
    pub coverage_days: f64,
    pub unit_price: f64,
    pub gross_margin: f64,
    pub margin_pct: f64,
    pub gmroi: f64,
    pub sell_through_rate: f64,
    pub turnover: f64,
}

/// `window_days` has already been validated as positive by the engine.
pub fn derive_ratios(totals: &ProductTotals, window_days: i64) -> Ratios {
    let daily_sale_rate = ratio_or_zero(totals.units_sold, window_days as f64);
    let cost_of_goods_sold = totals.units_sold * totals.unit_cost;
    let gross_margin = totals.revenue - cost_of_goods_sold;

    Ratios {
        daily_sale_rate,
        coverage_days: coverage_days(totals.quantity_on_hand, daily_sale_rate),
        unit_price: unit_price(totals),
        gross_margin,
        margin_pct: ratio_or_zero(gross_margin, totals.revenue),
        gmroi: ratio_or_zero(gross_margin, totals.inventory_value),
        sell_through_rate: ratio_or_zero(
            totals.units_sold,
            totals.units_sold + totals.quantity_on_hand,
        ),
        turnover: ratio_or_zero(cost_of_goods_sold, totals.inventory_value),
    }
}

/// Realised price when anything sold, else the catalog list price.
fn unit_price(totals: &ProductTotals) -> f64 {
    if totals.units_sold > 0.0 {
        ratio_or_zero(totals.revenue, totals.units_sold)
    } else {
        totals.list_price
    }
}

/// Per-location view. Sales carry no location, so a product's daily rate is
/// split evenly across the locations that hold it.
pub fn derive_location_metrics(
    locations: &[LocationTotals],
    product_rates: &BTreeMap<&str, f64>,
) -> Vec<LocationMetric> {
    let mut per_product: BTreeMap<&str, usize> = BTreeMap::new();
    for loc in locations {
        *per_product.entry(loc.product_id.as_str()).or_insert(0) += 1;
    }

    locations
        .iter()
        .map(|loc| {
            let share = per_product.get(loc.product_id.as_str()).copied().unwrap_or(1);
            let product_rate = product_rates
                .get(loc.product_id.as_str())
                .copied()
                .unwrap_or(0.0);
            let daily_sale_rate = ratio_or_zero(product_rate, share as f64);
            LocationMetric {
                product_id: loc.product_id.clone(),
                location_id: loc.location_id.clone(),
                location_name: loc.location_name.clone(),
                quantity: loc.quantity,
                inventory_value: loc.inventory_value,
                daily_sale_rate,
                coverage_days: coverage_days(loc.quantity, daily_sale_rate),
            }
        })
        .collect()
}
