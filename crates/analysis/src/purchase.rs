//! Target-coverage replenishment.
//!
//! Only products whose diagnostic triggers a purchase are considered. The
//! suggestion tops stock up to `daily_sale_rate x target_coverage_days`,
//! rounded up to whole units. Products already at or above target produce no
//! row at all.

use crate::model::{ProductMetric, PurchaseSuggestion};

/// Quantities within this distance of a whole unit are not rounded up past it.
const WHOLE_UNIT_EPSILON: f64 = 1e-9;

pub fn suggest_purchases(products: &[ProductMetric], target_coverage_days: i64) -> Vec<PurchaseSuggestion> {
    products
        .iter()
        .filter(|p| p.diagnostic.triggers_purchase())
        .filter_map(|p| {
            let target_quantity = p.daily_sale_rate * target_coverage_days as f64;
            let shortfall = (target_quantity - p.quantity_on_hand).max(0.0);
            let suggested_quantity = round_up_units(shortfall);
            if suggested_quantity <= 0.0 {
                return None;
            }
            Some(PurchaseSuggestion {
                product_id: p.product_id.clone(),
                product_name: p.product_name.clone(),
                diagnostic: p.diagnostic,
                current_quantity: p.quantity_on_hand,
                daily_sale_rate: p.daily_sale_rate,
                target_quantity,
                suggested_quantity,
                unit_cost: p.unit_cost,
                estimated_cost: suggested_quantity * p.unit_cost,
            })
        })
        .collect()
}

fn round_up_units(quantity: f64) -> f64 {
    if !quantity.is_finite() || quantity <= 0.0 {
        return 0.0;
    }
    (quantity - WHOLE_UNIT_EPSILON).ceil().max(0.0)
}
