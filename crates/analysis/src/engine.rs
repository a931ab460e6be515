use std::collections::BTreeMap;

use crate::aggregate::aggregate;
use crate::classify::{classify_abc, classify_xyz};
use crate::config::AnalysisParams;
use crate::diagnostic::{diagnose, DiagnosticInput};
use crate::error::AnalysisError;
use crate::metrics::{derive_location_metrics, derive_ratios};
use crate::model::{
    AnalysisInput, AnalysisMeta, AnalysisResult, ProductMetric, SalesRecord, StockRecord, StrategicClass,
};
use crate::purchase::suggest_purchases;
use crate::ratio::finite_or_zero;
use crate::summary::compute_summary;
use crate::transfer::suggest_transfers;

/// Run the full analysis over one snapshot. Fails only on invalid parameters;
/// row-level defects are skipped or zeroed.
pub fn run(params: &AnalysisParams, input: &AnalysisInput) -> Result<AnalysisResult, AnalysisError> {
    params.validate()?;

    let agg = aggregate(input, params);
    log::debug!(
        "aggregated {} product(s), {} location row(s), {} period(s)",
        agg.products.len(),
        agg.locations.len(),
        agg.period_count
    );

    let revenues: Vec<f64> = agg.products.iter().map(|p| p.revenue).collect();
    let abc = classify_abc(&revenues, &params.abc);
    let series: Vec<&[f64]> = agg.products.iter().map(|p| p.period_units.as_slice()).collect();
    let xyz = classify_xyz(&series, &params.xyz);

    let mut location_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for loc in &agg.locations {
        *location_counts.entry(loc.product_id.as_str()).or_insert(0) += 1;
    }

    let products: Vec<ProductMetric> = agg
        .products
        .iter()
        .zip(abc.iter().zip(xyz.iter()))
        .map(|(totals, (abc, xyz))| {
            let ratios = derive_ratios(totals, params.window_days);
            let strategic_class = StrategicClass::new(abc.class, xyz.class);
            let diagnostic = diagnose(
                &DiagnosticInput {
                    strategic_class,
                    coverage_days: ratios.coverage_days,
                    quantity_on_hand: totals.quantity_on_hand,
                    units_sold: totals.units_sold,
                },
                &params.diagnostic,
            );
            ProductMetric {
                product_id: totals.product_id.clone(),
                product_name: totals.product_name.clone(),
                default_code: totals.default_code.clone(),
                category: totals.category.clone(),
                quantity_on_hand: finite_or_zero(totals.quantity_on_hand),
                inventory_value: finite_or_zero(totals.inventory_value),
                units_sold: finite_or_zero(totals.units_sold),
                revenue: finite_or_zero(totals.revenue),
                unit_cost: finite_or_zero(totals.unit_cost),
                unit_price: ratios.unit_price,
                daily_sale_rate: ratios.daily_sale_rate,
                coverage_days: ratios.coverage_days,
                gross_margin: finite_or_zero(ratios.gross_margin),
                margin_pct: ratios.margin_pct,
                gmroi: ratios.gmroi,
                sell_through_rate: ratios.sell_through_rate,
                turnover: ratios.turnover,
                revenue_share: abc.revenue_share,
                cumulative_revenue_share: abc.cumulative_share,
                coefficient_of_variation: xyz.coefficient_of_variation,
                abc_class: abc.class,
                xyz_class: xyz.class,
                strategic_class,
                diagnostic,
                location_count: location_counts
                    .get(totals.product_id.as_str())
                    .copied()
                    .unwrap_or(0),
            }
        })
        .collect();

    let rates: BTreeMap<&str, f64> = products
        .iter()
        .map(|p| (p.product_id.as_str(), p.daily_sale_rate))
        .collect();
    let locations = derive_location_metrics(&agg.locations, &rates);

    let purchases = suggest_purchases(&products, params.target_coverage_days);
    let transfers = suggest_transfers(&products, &locations, &params.transfer, params.target_coverage_days);
    let summary = compute_summary(&products, &purchases, &transfers);

    log::info!(
        "analysis: {} product(s), {} stockout(s), {} purchase and {} transfer suggestion(s)",
        summary.product_count,
        summary.stockout_count,
        summary.purchase_count,
        summary.transfer_count
    );

    Ok(AnalysisResult {
        meta: AnalysisMeta {
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            window_days: params.window_days,
            target_coverage_days: params.target_coverage_days,
            as_of: agg.as_of,
            period_count: agg.period_count,
            stock_rows: input.stock.len(),
            sales_rows: input.sales.len(),
            skipped_rows: agg.skipped_rows,
        },
        summary,
        products,
        locations,
        purchases,
        transfers,
    })
}

/// Stock and sales only, no lookup tables. Each call works on its own copy
/// of the rows.
pub fn run_analysis(
    stock: &[StockRecord],
    sales: &[SalesRecord],
    params: &AnalysisParams,
) -> Result<AnalysisResult, AnalysisError> {
    let input = AnalysisInput {
        stock: stock.to_vec(),
        sales: sales.to_vec(),
        ..Default::default()
    };
    run(params, &input)
}
