//! CSV exports of the analysis tables.
//!
//! Columns are written explicitly rather than through serde so optional
//! fields keep a stable header.

use std::path::Path;

use stocksight_analysis::{ProductMetric, PurchaseSuggestion, TransferSuggestion};

use crate::exit_codes::EXIT_OUTPUT;
use crate::CliError;

fn num(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v:.4}")
    }
}

fn write_csv(path: &Path, header: &[&str], rows: Vec<Vec<String>>) -> Result<(), CliError> {
    let out_err = |e: &dyn std::fmt::Display| CliError {
        code: EXIT_OUTPUT,
        message: format!("cannot write {}: {e}", path.display()),
        hint: None,
    };

    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
    writer.write_record(header).map_err(|e| out_err(&e))?;
    for row in &rows {
        writer.write_record(row).map_err(|e| out_err(&e))?;
    }
    let bytes = writer.into_inner().map_err(|e| out_err(&e))?;
    std::fs::write(path, bytes).map_err(|e| out_err(&e))?;
    log::debug!("wrote {} row(s) to {}", rows.len(), path.display());
    Ok(())
}

pub fn write_products(path: &Path, products: &[ProductMetric]) -> Result<(), CliError> {
    let rows = products
        .iter()
        .map(|p| {
            vec![
                p.product_id.clone(),
                p.product_name.clone(),
                p.default_code.clone().unwrap_or_default(),
                p.category.clone().unwrap_or_default(),
                num(p.quantity_on_hand),
                num(p.inventory_value),
                num(p.units_sold),
                num(p.revenue),
                num(p.daily_sale_rate),
                num(p.coverage_days),
                num(p.gross_margin),
                num(p.gmroi),
                num(p.sell_through_rate),
                num(p.turnover),
                p.abc_class.to_string(),
                p.xyz_class.to_string(),
                p.strategic_class.to_string(),
                p.diagnostic.to_string(),
            ]
        })
        .collect();
    write_csv(
        path,
        &[
            "product_id",
            "product_name",
            "default_code",
            "category",
            "quantity_on_hand",
            "inventory_value",
            "units_sold",
            "revenue",
            "daily_sale_rate",
            "coverage_days",
            "gross_margin",
            "gmroi",
            "sell_through_rate",
            "turnover",
            "abc_class",
            "xyz_class",
            "strategic_class",
            "diagnostic",
        ],
        rows,
    )
}

pub fn write_purchases(path: &Path, purchases: &[PurchaseSuggestion]) -> Result<(), CliError> {
    let rows = purchases
        .iter()
        .map(|s| {
            vec![
                s.product_id.clone(),
                s.product_name.clone(),
                s.diagnostic.to_string(),
                num(s.current_quantity),
                num(s.daily_sale_rate),
                num(s.target_quantity),
                num(s.suggested_quantity),
                num(s.unit_cost),
                num(s.estimated_cost),
            ]
        })
        .collect();
    write_csv(
        path,
        &[
            "product_id",
            "product_name",
            "diagnostic",
            "current_quantity",
            "daily_sale_rate",
            "target_quantity",
            "suggested_quantity",
            "unit_cost",
            "estimated_cost",
        ],
        rows,
    )
}

pub fn write_transfers(path: &Path, transfers: &[TransferSuggestion]) -> Result<(), CliError> {
    let rows = transfers
        .iter()
        .map(|t| {
            vec![
                t.product_id.clone(),
                t.product_name.clone(),
                t.source_location.clone(),
                t.destination_location.clone(),
                num(t.suggested_quantity),
                t.reason.clone(),
            ]
        })
        .collect();
    write_csv(
        path,
        &[
            "product_id",
            "product_name",
            "source_location",
            "destination_location",
            "suggested_quantity",
            "reason",
        ],
        rows,
    )
}
