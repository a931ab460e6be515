use std::collections::BTreeMap;

use crate::model::{AnalysisSummary, ProductMetric, PurchaseSuggestion, TransferSuggestion};

/// Compute summary statistics from the product table and suggestions.
pub fn compute_summary(
    products: &[ProductMetric],
    purchases: &[PurchaseSuggestion],
    transfers: &[TransferSuggestion],
) -> AnalysisSummary {
    let mut summary = AnalysisSummary {
        product_count: products.len(),
        ..Default::default()
    };

    for p in products {
        summary.total_quantity += p.quantity_on_hand;
        summary.total_inventory_value += p.inventory_value;
        summary.total_units_sold += p.units_sold;
        summary.total_revenue += p.revenue;
        summary.total_gross_margin += p.gross_margin;

        bump(&mut summary.abc_counts, p.abc_class.to_string());
        bump(&mut summary.xyz_counts, p.xyz_class.to_string());
        bump(&mut summary.strategic_counts, p.strategic_class.to_string());
        bump(&mut summary.diagnostic_counts, p.diagnostic.to_string());

        if p.diagnostic == crate::model::Diagnostic::Stockout {
            summary.stockout_count += 1;
        }
        if p.diagnostic.is_excess() {
            summary.excess_inventory_value += p.inventory_value;
        }
    }

    summary.purchase_count = purchases.len();
    summary.purchase_total_cost = purchases.iter().map(|s| s.estimated_cost).sum();
    summary.transfer_count = transfers.len();
    summary.transfer_total_units = transfers.iter().map(|t| t.suggested_quantity).sum();

    summary
}

fn bump(counts: &mut BTreeMap<String, usize>, key: String) {
    *counts.entry(key).or_insert(0) += 1;
}
