use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer};

use crate::ratio::{finite_or_zero, ratio_or_zero};

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One stock snapshot row: a product's quantity at one location.
///
/// Every field is optional because ERP exports are sparse. A row without a
/// `product_id` is malformed and skipped; missing numbers count as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StockRecord {
    pub product_id: Option<String>,
    pub product_name: Option<String>,
    pub location_id: Option<String>,
    pub location_name: Option<String>,
    pub quantity: Option<f64>,
    pub unit_cost: Option<f64>,
    /// Authoritative value when the source supplies it.
    pub inventory_value: Option<f64>,
}

impl StockRecord {
    pub fn quantity(&self) -> f64 {
        self.quantity.map(finite_or_zero).unwrap_or(0.0)
    }

    pub fn unit_cost(&self) -> f64 {
        self.unit_cost.map(finite_or_zero).unwrap_or(0.0)
    }

    /// Supplied value if present and finite, else `quantity x unit_cost`.
    pub fn value(&self) -> f64 {
        match self.inventory_value {
            Some(v) if v.is_finite() => v,
            _ => self.quantity() * self.unit_cost(),
        }
    }
}

/// One confirmed sales line inside the analysis window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub product_id: Option<String>,
    pub product_name: Option<String>,
    pub transaction_date: Option<NaiveDate>,
    pub quantity_sold: Option<f64>,
    /// Line subtotal, net.
    pub revenue: Option<f64>,
}

impl SalesRecord {
    pub fn quantity_sold(&self) -> f64 {
        self.quantity_sold.map(finite_or_zero).unwrap_or(0.0)
    }

    pub fn revenue(&self) -> f64 {
        self.revenue.map(finite_or_zero).unwrap_or(0.0)
    }

    /// `revenue / quantity_sold`, `0.0` when nothing was sold.
    pub fn unit_price(&self) -> f64 {
        ratio_or_zero(self.revenue(), self.quantity_sold())
    }
}

/// Product catalog lookup row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductInfo {
    pub product_id: String,
    pub name: Option<String>,
    pub default_code: Option<String>,
    pub category: Option<String>,
    pub list_price: Option<f64>,
    pub standard_cost: Option<f64>,
}

/// Location lookup row. `usage` follows the ERP convention
/// (`internal`, `view`, `transit`, `customer`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationInfo {
    pub location_id: String,
    pub name: Option<String>,
    pub usage: Option<String>,
}

/// An immutable snapshot of the source tables. Each analysis run reads one
/// of these and never writes back into it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisInput {
    pub stock: Vec<StockRecord>,
    pub sales: Vec<SalesRecord>,
    #[serde(default)]
    pub products: Vec<ProductInfo>,
    #[serde(default)]
    pub locations: Vec<LocationInfo>,
}

// ---------------------------------------------------------------------------
// Classification labels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AbcClass {
    A,
    B,
    C,
}

impl std::fmt::Display for AbcClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::B => write!(f, "B"),
            Self::C => write!(f, "C"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum XyzClass {
    X,
    Y,
    Z,
}

impl std::fmt::Display for XyzClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::X => write!(f, "X"),
            Self::Y => write!(f, "Y"),
            Self::Z => write!(f, "Z"),
        }
    }
}

/// ABC label followed by XYZ label (`AX` .. `CZ`). Serialized as the
/// two-letter string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StrategicClass {
    pub abc: AbcClass,
    pub xyz: XyzClass,
}

impl StrategicClass {
    pub const fn new(abc: AbcClass, xyz: XyzClass) -> Self {
        Self { abc, xyz }
    }
}

impl std::fmt::Display for StrategicClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.abc, self.xyz)
    }
}

impl Serialize for StrategicClass {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Diagnostic {
    Stockout,
    HighRiskUrgentBuy,
    MediumRiskReview,
    CriticalExcessLiquidate,
    ObsoleteInventory,
    Healthy,
}

impl Diagnostic {
    /// Diagnostics that feed the purchase suggestion generator.
    pub fn triggers_purchase(&self) -> bool {
        matches!(
            self,
            Self::Stockout | Self::HighRiskUrgentBuy | Self::MediumRiskReview
        )
    }

    /// Diagnostics whose stock counts as excess capital.
    pub fn is_excess(&self) -> bool {
        matches!(self, Self::CriticalExcessLiquidate | Self::ObsoleteInventory)
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stockout => write!(f, "STOCKOUT"),
            Self::HighRiskUrgentBuy => write!(f, "HIGH_RISK_URGENT_BUY"),
            Self::MediumRiskReview => write!(f, "MEDIUM_RISK_REVIEW"),
            Self::CriticalExcessLiquidate => write!(f, "CRITICAL_EXCESS_LIQUIDATE"),
            Self::ObsoleteInventory => write!(f, "OBSOLETE_INVENTORY"),
            Self::Healthy => write!(f, "HEALTHY"),
        }
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Per-product sums, before any ratio is taken.
#[derive(Debug, Clone, Default)]
pub struct ProductTotals {
    pub product_id: String,
    pub product_name: String,
    pub default_code: Option<String>,
    pub category: Option<String>,
    pub quantity_on_hand: f64,
    pub inventory_value: f64,
    pub units_sold: f64,
    pub revenue: f64,
    pub unit_cost: f64,
    /// Catalog sale price, `0.0` when the catalog has none.
    pub list_price: f64,
    /// Units sold per period, oldest first. Length = the run's period count.
    pub period_units: Vec<f64>,
}

/// Per-(product, location) sums.
#[derive(Debug, Clone, Default)]
pub struct LocationTotals {
    pub product_id: String,
    pub location_id: String,
    pub location_name: String,
    pub quantity: f64,
    pub inventory_value: f64,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// The central output row: one per product seen in stock or sales.
#[derive(Debug, Clone, Serialize)]
pub struct ProductMetric {
    pub product_id: String,
    pub product_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub quantity_on_hand: f64,
    pub inventory_value: f64,
    pub units_sold: f64,
    pub revenue: f64,
    pub unit_cost: f64,
    pub unit_price: f64,
    pub daily_sale_rate: f64,
    pub coverage_days: f64,
    pub gross_margin: f64,
    pub margin_pct: f64,
    pub gmroi: f64,
    pub sell_through_rate: f64,
    pub turnover: f64,
    pub revenue_share: f64,
    pub cumulative_revenue_share: f64,
    pub coefficient_of_variation: f64,
    pub abc_class: AbcClass,
    pub xyz_class: XyzClass,
    pub strategic_class: StrategicClass,
    pub diagnostic: Diagnostic,
    pub location_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct LocationMetric {
    pub product_id: String,
    pub location_id: String,
    pub location_name: String,
    pub quantity: f64,
    pub inventory_value: f64,
    pub daily_sale_rate: f64,
    pub coverage_days: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PurchaseSuggestion {
    pub product_id: String,
    pub product_name: String,
    pub diagnostic: Diagnostic,
    pub current_quantity: f64,
    pub daily_sale_rate: f64,
    pub target_quantity: f64,
    pub suggested_quantity: f64,
    pub unit_cost: f64,
    pub estimated_cost: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransferSuggestion {
    pub product_id: String,
    pub product_name: String,
    pub source_location: String,
    pub destination_location: String,
    pub suggested_quantity: f64,
    pub reason: String,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalysisSummary {
    pub product_count: usize,
    pub total_quantity: f64,
    pub total_inventory_value: f64,
    pub total_units_sold: f64,
    pub total_revenue: f64,
    pub total_gross_margin: f64,
    pub stockout_count: usize,
    pub excess_inventory_value: f64,
    pub abc_counts: BTreeMap<String, usize>,
    pub xyz_counts: BTreeMap<String, usize>,
    pub strategic_counts: BTreeMap<String, usize>,
    pub diagnostic_counts: BTreeMap<String, usize>,
    pub purchase_count: usize,
    pub purchase_total_cost: f64,
    pub transfer_count: usize,
    pub transfer_total_units: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisMeta {
    pub engine_version: String,
    pub window_days: i64,
    pub target_coverage_days: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub as_of: Option<NaiveDate>,
    pub period_count: usize,
    pub stock_rows: usize,
    pub sales_rows: usize,
    /// Rows dropped for a missing `product_id` or a non-internal location.
    pub skipped_rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub meta: AnalysisMeta,
    pub summary: AnalysisSummary,
    pub products: Vec<ProductMetric>,
    pub locations: Vec<LocationMetric>,
    pub purchases: Vec<PurchaseSuggestion>,
    pub transfers: Vec<TransferSuggestion>,
}

impl AnalysisResult {
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn product(&self, product_id: &str) -> Option<&ProductMetric> {
        self.products.iter().find(|p| p.product_id == product_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_value_prefers_supplied() {
        let row = StockRecord {
            product_id: Some("P1".into()),
            quantity: Some(10.0),
            unit_cost: Some(2.0),
            inventory_value: Some(21.5),
            ..Default::default()
        };
        assert_eq!(row.value(), 21.5);

        let derived = StockRecord {
            inventory_value: None,
            ..row.clone()
        };
        assert_eq!(derived.value(), 20.0);

        let nan = StockRecord {
            inventory_value: Some(f64::NAN),
            ..row
        };
        assert_eq!(nan.value(), 20.0);
    }

    #[test]
    fn unit_price_without_units_is_zero() {
        let line = SalesRecord {
            product_id: Some("P1".into()),
            quantity_sold: Some(0.0),
            revenue: Some(50.0),
            ..Default::default()
        };
        assert_eq!(line.unit_price(), 0.0);

        let line = SalesRecord {
            quantity_sold: Some(4.0),
            ..line
        };
        assert_eq!(line.unit_price(), 12.5);
    }

    #[test]
    fn strategic_class_labels() {
        let class = StrategicClass::new(AbcClass::B, XyzClass::Z);
        assert_eq!(class.to_string(), "BZ");
        assert_eq!(Diagnostic::HighRiskUrgentBuy.to_string(), "HIGH_RISK_URGENT_BUY");
        assert!(Diagnostic::Stockout.triggers_purchase());
        assert!(!Diagnostic::Healthy.triggers_purchase());
        assert!(Diagnostic::ObsoleteInventory.is_excess());
    }
}
