use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

// ---------------------------------------------------------------------------
// Top-level parameters
// ---------------------------------------------------------------------------

/// Parameters for one analysis run.
///
/// Every field has a default, so an empty TOML document is a valid config.
/// `window_days` and `target_coverage_days` are signed on purpose: a caller
/// passing `0` or a negative window gets a `Parameter` error instead of a
/// silently clamped run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisParams {
    #[serde(default = "default_window_days")]
    pub window_days: i64,
    #[serde(default = "default_target_coverage_days")]
    pub target_coverage_days: i64,
    /// End of the analysis window. Defaults to the latest dated sales line.
    #[serde(default)]
    pub as_of: Option<NaiveDate>,
    /// Drop stock held in locations whose lookup `usage` is not `internal`.
    #[serde(default = "default_true")]
    pub internal_locations_only: bool,
    #[serde(default)]
    pub abc: AbcThresholds,
    #[serde(default)]
    pub xyz: XyzThresholds,
    #[serde(default)]
    pub diagnostic: DiagnosticThresholds,
    #[serde(default)]
    pub transfer: TransferConfig,
    #[serde(default)]
    pub columns: ColumnsConfig,
    #[serde(default)]
    pub filter: FilterConfig,
}

fn default_window_days() -> i64 {
    30
}

fn default_target_coverage_days() -> i64 {
    30
}

fn default_true() -> bool {
    true
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            window_days: default_window_days(),
            target_coverage_days: default_target_coverage_days(),
            as_of: None,
            internal_locations_only: true,
            abc: AbcThresholds::default(),
            xyz: XyzThresholds::default(),
            diagnostic: DiagnosticThresholds::default(),
            transfer: TransferConfig::default(),
            columns: ColumnsConfig::default(),
            filter: FilterConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Classification thresholds
// ---------------------------------------------------------------------------

/// Cumulative revenue share cut-offs for ABC.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AbcThresholds {
    #[serde(default = "default_a_max")]
    pub a_max: f64,
    #[serde(default = "default_b_max")]
    pub b_max: f64,
}

fn default_a_max() -> f64 {
    0.80
}

fn default_b_max() -> f64 {
    0.95
}

impl Default for AbcThresholds {
    fn default() -> Self {
        Self {
            a_max: default_a_max(),
            b_max: default_b_max(),
        }
    }
}

/// Coefficient-of-variation cut-offs for XYZ, plus the bucket width used to
/// build each product's demand series.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct XyzThresholds {
    #[serde(default = "default_x_max")]
    pub x_max: f64,
    #[serde(default = "default_y_max")]
    pub y_max: f64,
    #[serde(default = "default_period_days")]
    pub period_days: i64,
}

fn default_x_max() -> f64 {
    0.5
}

fn default_y_max() -> f64 {
    1.0
}

fn default_period_days() -> i64 {
    7
}

impl Default for XyzThresholds {
    fn default() -> Self {
        Self {
            x_max: default_x_max(),
            y_max: default_y_max(),
            period_days: default_period_days(),
        }
    }
}

/// Coverage-day limits used by the diagnostic rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiagnosticThresholds {
    #[serde(default = "default_urgent_buy_days")]
    pub urgent_buy_days: f64,
    #[serde(default = "default_review_days")]
    pub review_days: f64,
    #[serde(default = "default_liquidate_days")]
    pub liquidate_days: f64,
    #[serde(default = "default_obsolete_days")]
    pub obsolete_days: f64,
}

fn default_urgent_buy_days() -> f64 {
    15.0
}

fn default_review_days() -> f64 {
    7.0
}

fn default_liquidate_days() -> f64 {
    180.0
}

fn default_obsolete_days() -> f64 {
    365.0
}

impl Default for DiagnosticThresholds {
    fn default() -> Self {
        Self {
            urgent_buy_days: default_urgent_buy_days(),
            review_days: default_review_days(),
            liquidate_days: default_liquidate_days(),
            obsolete_days: default_obsolete_days(),
        }
    }
}

// ---------------------------------------------------------------------------
// Transfers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferRule {
    /// Excess: stock above `excess_multiple` x the product's mean per-location
    /// stock. Shortage: no stock.
    MeanMultiple,
    /// Excess: location coverage above `excess_coverage_days`. Shortage: no
    /// stock or coverage below `shortage_coverage_days`.
    CoverageDays,
}

impl Default for TransferRule {
    fn default() -> Self {
        Self::MeanMultiple
    }
}

impl std::fmt::Display for TransferRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MeanMultiple => write!(f, "mean_multiple"),
            Self::CoverageDays => write!(f, "coverage_days"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransferConfig {
    #[serde(default)]
    pub rule: TransferRule,
    #[serde(default = "default_excess_multiple")]
    pub excess_multiple: f64,
    #[serde(default = "default_excess_coverage_days")]
    pub excess_coverage_days: f64,
    #[serde(default = "default_shortage_coverage_days")]
    pub shortage_coverage_days: f64,
    /// Share of the source location's surplus proposed for moving.
    #[serde(default = "default_fraction")]
    pub fraction: f64,
}

fn default_excess_multiple() -> f64 {
    1.5
}

fn default_excess_coverage_days() -> f64 {
    90.0
}

fn default_shortage_coverage_days() -> f64 {
    10.0
}

fn default_fraction() -> f64 {
    0.5
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            rule: TransferRule::default(),
            excess_multiple: default_excess_multiple(),
            excess_coverage_days: default_excess_coverage_days(),
            shortage_coverage_days: default_shortage_coverage_days(),
            fraction: default_fraction(),
        }
    }
}

// ---------------------------------------------------------------------------
// CSV column mapping + filter
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnsConfig {
    #[serde(default)]
    pub stock: StockColumns,
    #[serde(default)]
    pub sales: SalesColumns,
}

/// Header names for the stock snapshot. `product_id` is required in the
/// file; every other column may be absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StockColumns {
    pub product_id: String,
    pub product_name: String,
    pub location_id: String,
    pub location_name: String,
    pub quantity: String,
    pub unit_cost: String,
    pub inventory_value: String,
}

impl Default for StockColumns {
    fn default() -> Self {
        Self {
            product_id: "product_id".into(),
            product_name: "product_name".into(),
            location_id: "location_id".into(),
            location_name: "location_name".into(),
            quantity: "quantity".into(),
            unit_cost: "unit_cost".into(),
            inventory_value: "inventory_value".into(),
        }
    }
}

/// Header names for the sales snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SalesColumns {
    pub product_id: String,
    pub product_name: String,
    pub transaction_date: String,
    pub quantity_sold: String,
    pub revenue: String,
}

impl Default for SalesColumns {
    fn default() -> Self {
        Self {
            product_id: "product_id".into(),
            product_name: "product_name".into(),
            transaction_date: "transaction_date".into(),
            quantity_sold: "quantity_sold".into(),
            revenue: "revenue".into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterConfig {
    #[serde(default)]
    pub sales: Option<RowFilter>,
    #[serde(default)]
    pub stock: Option<RowFilter>,
}

/// Keep only rows whose `column` holds one of `values`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RowFilter {
    pub column: String,
    pub values: Vec<String>,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl AnalysisParams {
    pub fn from_toml(input: &str) -> Result<Self, AnalysisError> {
        let params: AnalysisParams =
            toml::from_str(input).map_err(|e| AnalysisError::ConfigParse(e.to_string()))?;
        params.validate()?;
        Ok(params)
    }

    /// Window and coverage target first (caller bugs the engine refuses to
    /// run with), then threshold consistency.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.window_days <= 0 {
            return Err(AnalysisError::Parameter(format!(
                "window_days must be > 0, got {}",
                self.window_days
            )));
        }
        if self.target_coverage_days <= 0 {
            return Err(AnalysisError::Parameter(format!(
                "target_coverage_days must be > 0, got {}",
                self.target_coverage_days
            )));
        }

        let abc = &self.abc;
        if !(abc.a_max > 0.0 && abc.a_max < abc.b_max && abc.b_max <= 1.0) {
            return Err(AnalysisError::ConfigValidation(format!(
                "abc thresholds must satisfy 0 < a_max < b_max <= 1, got a_max={} b_max={}",
                abc.a_max, abc.b_max
            )));
        }

        let xyz = &self.xyz;
        if !(xyz.x_max >= 0.0 && xyz.x_max < xyz.y_max && xyz.y_max.is_finite()) {
            return Err(AnalysisError::ConfigValidation(format!(
                "xyz thresholds must satisfy 0 <= x_max < y_max, got x_max={} y_max={}",
                xyz.x_max, xyz.y_max
            )));
        }
        if xyz.period_days <= 0 {
            return Err(AnalysisError::ConfigValidation(format!(
                "xyz.period_days must be > 0, got {}",
                xyz.period_days
            )));
        }

        let d = &self.diagnostic;
        for (name, value) in [
            ("urgent_buy_days", d.urgent_buy_days),
            ("review_days", d.review_days),
            ("liquidate_days", d.liquidate_days),
            ("obsolete_days", d.obsolete_days),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(AnalysisError::ConfigValidation(format!(
                    "diagnostic.{name} must be a positive number of days, got {value}"
                )));
            }
        }

        let t = &self.transfer;
        if !(t.fraction > 0.0 && t.fraction <= 1.0) {
            return Err(AnalysisError::ConfigValidation(format!(
                "transfer.fraction must be in (0, 1], got {}",
                t.fraction
            )));
        }
        if !(t.excess_multiple.is_finite() && t.excess_multiple >= 1.0) {
            return Err(AnalysisError::ConfigValidation(format!(
                "transfer.excess_multiple must be >= 1, got {}",
                t.excess_multiple
            )));
        }
        if !(t.shortage_coverage_days >= 0.0 && t.shortage_coverage_days < t.excess_coverage_days)
        {
            return Err(AnalysisError::ConfigValidation(format!(
                "transfer coverage bounds must satisfy 0 <= shortage < excess, got shortage={} excess={}",
                t.shortage_coverage_days, t.excess_coverage_days
            )));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
window_days = 60
target_coverage_days = 45
as_of = "2026-03-31"
internal_locations_only = false

[abc]
a_max = 0.7
b_max = 0.9

[xyz]
x_max = 0.25
y_max = 0.75
period_days = 14

[diagnostic]
urgent_buy_days = 20
review_days = 10
liquidate_days = 120
obsolete_days = 300

[transfer]
rule = "coverage_days"
excess_coverage_days = 60
shortage_coverage_days = 5
fraction = 0.25

[columns.stock]
product_id = "product"
quantity = "qty"

[columns.sales]
transaction_date = "date_order"
quantity_sold = "product_uom_qty"
revenue = "price_subtotal"

[filter.sales]
column = "state"
values = ["sale", "done"]
"#;

    #[test]
    fn empty_config_uses_defaults() {
        let params = AnalysisParams::from_toml("").unwrap();
        assert_eq!(params.window_days, 30);
        assert_eq!(params.target_coverage_days, 30);
        assert!(params.as_of.is_none());
        assert!(params.internal_locations_only);
        assert_eq!(params.abc.a_max, 0.80);
        assert_eq!(params.abc.b_max, 0.95);
        assert_eq!(params.xyz.x_max, 0.5);
        assert_eq!(params.xyz.y_max, 1.0);
        assert_eq!(params.xyz.period_days, 7);
        assert_eq!(params.diagnostic.urgent_buy_days, 15.0);
        assert_eq!(params.diagnostic.obsolete_days, 365.0);
        assert_eq!(params.transfer.rule, TransferRule::MeanMultiple);
        assert_eq!(params.transfer.excess_multiple, 1.5);
        assert_eq!(params.columns.stock.product_id, "product_id");
        assert!(params.filter.sales.is_none());
    }

    #[test]
    fn parse_full_config() {
        let params = AnalysisParams::from_toml(FULL).unwrap();
        assert_eq!(params.window_days, 60);
        assert_eq!(params.target_coverage_days, 45);
        assert_eq!(params.as_of.unwrap().to_string(), "2026-03-31");
        assert!(!params.internal_locations_only);
        assert_eq!(params.abc.a_max, 0.7);
        assert_eq!(params.xyz.period_days, 14);
        assert_eq!(params.diagnostic.liquidate_days, 120.0);
        assert_eq!(params.transfer.rule, TransferRule::CoverageDays);
        assert_eq!(params.transfer.fraction, 0.25);

        // Unlisted columns keep their canonical names
        assert_eq!(params.columns.stock.product_id, "product");
        assert_eq!(params.columns.stock.quantity, "qty");
        assert_eq!(params.columns.stock.location_id, "location_id");
        assert_eq!(params.columns.sales.revenue, "price_subtotal");

        let filt = params.filter.sales.unwrap();
        assert_eq!(filt.column, "state");
        assert_eq!(filt.values, vec!["sale", "done"]);
    }

    #[test]
    fn reject_zero_window() {
        let err = AnalysisParams::from_toml("window_days = 0").unwrap_err();
        assert!(matches!(err, AnalysisError::Parameter(_)));
        assert!(err.to_string().contains("window_days"));
    }

    #[test]
    fn reject_negative_target() {
        let err = AnalysisParams::from_toml("target_coverage_days = -3").unwrap_err();
        assert!(matches!(err, AnalysisError::Parameter(_)));
    }

    #[test]
    fn reject_inverted_abc() {
        let err = AnalysisParams::from_toml("[abc]\na_max = 0.95\nb_max = 0.8\n").unwrap_err();
        assert!(err.to_string().contains("a_max < b_max"));
    }

    #[test]
    fn reject_bad_fraction() {
        let err = AnalysisParams::from_toml("[transfer]\nfraction = 1.5\n").unwrap_err();
        assert!(err.to_string().contains("transfer.fraction"));
    }

    #[test]
    fn reject_unknown_rule() {
        let err = AnalysisParams::from_toml("[transfer]\nrule = \"optimal\"\n").unwrap_err();
        assert!(matches!(err, AnalysisError::ConfigParse(_)));
    }

    #[test]
    fn reject_unknown_key() {
        let err = AnalysisParams::from_toml("window = 30").unwrap_err();
        assert!(matches!(err, AnalysisError::ConfigParse(_)));
    }
}
