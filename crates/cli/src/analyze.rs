//! `stocksight analyze` and `stocksight validate`.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::Args;
use stocksight_analysis::config::{ColumnsConfig, FilterConfig};
use stocksight_analysis::loader::{load_locations_csv, load_products_csv, load_sales_csv, load_stock_csv};
use stocksight_analysis::model::AnalysisResult;
use stocksight_analysis::{
    analyze_source, AnalysisError, AnalysisParams, Diagnostic, LocationInfo, ProductInfo, RecordSource,
    SalesRecord, StockRecord,
};

use crate::exit_codes::{analysis_exit_code, EXIT_ERROR, EXIT_INPUT, EXIT_OUTPUT};
use crate::export;
use crate::CliError;

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Stock snapshot CSV (one row per product per location)
    #[arg(long)]
    pub stock: PathBuf,

    /// Sales lines CSV for the analysis window
    #[arg(long)]
    pub sales: PathBuf,

    /// Product catalog CSV (product_id,name,default_code,category,list_price,standard_cost)
    #[arg(long)]
    pub products: Option<PathBuf>,

    /// Location lookup CSV (location_id,name,usage)
    #[arg(long)]
    pub locations: Option<PathBuf>,

    /// Analysis parameters (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override window_days
    #[arg(long)]
    pub window_days: Option<i64>,

    /// Override target_coverage_days
    #[arg(long)]
    pub target_coverage: Option<i64>,

    /// End of the analysis window (YYYY-MM-DD)
    #[arg(long)]
    pub as_of: Option<NaiveDate>,

    /// Output JSON to stdout instead of human summary
    #[arg(long)]
    pub json: bool,

    /// Write JSON output to file
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Write purchase suggestions as CSV
    #[arg(long, value_name = "FILE")]
    pub purchases_csv: Option<PathBuf>,

    /// Write transfer suggestions as CSV
    #[arg(long, value_name = "FILE")]
    pub transfers_csv: Option<PathBuf>,

    /// Write the per-product metrics table as CSV
    #[arg(long, value_name = "FILE")]
    pub products_csv: Option<PathBuf>,
}

fn engine_err(e: AnalysisError) -> CliError {
    let hint = match &e {
        AnalysisError::MissingColumn { table, .. } => {
            Some(format!("map the header under [columns.{table}] in the config file"))
        }
        AnalysisError::Parameter(_) => Some("window and coverage days must be positive".to_string()),
        _ => None,
    };
    CliError {
        code: analysis_exit_code(&e),
        message: e.to_string(),
        hint,
    }
}

// ============================================================================
// Record source over CSV files
// ============================================================================

/// Reads the snapshot tables from CSV files on every fetch.
pub struct CsvFileSource {
    stock: PathBuf,
    sales: PathBuf,
    products: Option<PathBuf>,
    locations: Option<PathBuf>,
    columns: ColumnsConfig,
    filter: FilterConfig,
}

impl CsvFileSource {
    pub fn new(args: &AnalyzeArgs, params: &AnalysisParams) -> Self {
        Self {
            stock: args.stock.clone(),
            sales: args.sales.clone(),
            products: args.products.clone(),
            locations: args.locations.clone(),
            columns: params.columns.clone(),
            filter: params.filter.clone(),
        }
    }
}

fn read_input(path: &Path) -> Result<String, AnalysisError> {
    std::fs::read_to_string(path).map_err(|e| AnalysisError::Source(format!("cannot read {}: {e}", path.display())))
}

impl RecordSource for CsvFileSource {
    fn fetch_stock(&self) -> Result<Vec<StockRecord>, AnalysisError> {
        load_stock_csv(&read_input(&self.stock)?, &self.columns.stock, self.filter.stock.as_ref())
    }

    fn fetch_sales(&self) -> Result<Vec<SalesRecord>, AnalysisError> {
        load_sales_csv(&read_input(&self.sales)?, &self.columns.sales, self.filter.sales.as_ref())
    }

    fn fetch_products(&self) -> Result<Vec<ProductInfo>, AnalysisError> {
        match &self.products {
            Some(path) => load_products_csv(&read_input(path)?),
            None => Ok(Vec::new()),
        }
    }

    fn fetch_locations(&self) -> Result<Vec<LocationInfo>, AnalysisError> {
        match &self.locations {
            Some(path) => load_locations_csv(&read_input(path)?),
            None => Ok(Vec::new()),
        }
    }
}

// ============================================================================
// Commands
// ============================================================================

fn load_params(config: Option<&Path>) -> Result<AnalysisParams, CliError> {
    let Some(path) = config else {
        return Ok(AnalysisParams::default());
    };
    let text = std::fs::read_to_string(path).map_err(|e| CliError {
        code: EXIT_INPUT,
        message: format!("cannot read config: {e}"),
        hint: None,
    })?;
    // Overrides are applied afterwards, so only parse here
    toml::from_str::<AnalysisParams>(&text)
        .map_err(|e| engine_err(AnalysisError::ConfigParse(e.to_string())))
}

pub fn cmd_analyze(args: AnalyzeArgs) -> Result<(), CliError> {
    let mut params = load_params(args.config.as_deref())?;
    if let Some(days) = args.window_days {
        params.window_days = days;
    }
    if let Some(days) = args.target_coverage {
        params.target_coverage_days = days;
    }
    if args.as_of.is_some() {
        params.as_of = args.as_of;
    }
    params.validate().map_err(engine_err)?;

    let source = CsvFileSource::new(&args, &params);
    let result = analyze_source(&source, &params).map_err(engine_err)?;

    let json_str = serde_json::to_string_pretty(&result).map_err(|e| CliError {
        code: EXIT_ERROR,
        message: format!("JSON serialization error: {e}"),
        hint: None,
    })?;

    if let Some(ref path) = args.output {
        std::fs::write(path, &json_str).map_err(|e| CliError {
            code: EXIT_OUTPUT,
            message: format!("cannot write output: {e}"),
            hint: None,
        })?;
        eprintln!("wrote {}", path.display());
    }
    if let Some(ref path) = args.purchases_csv {
        export::write_purchases(path, &result.purchases)?;
    }
    if let Some(ref path) = args.transfers_csv {
        export::write_transfers(path, &result.transfers)?;
    }
    if let Some(ref path) = args.products_csv {
        export::write_products(path, &result.products)?;
    }

    if args.json {
        println!("{json_str}");
    } else {
        print!("{}", render_summary(&result));
    }
    Ok(())
}

pub fn cmd_validate(config: PathBuf) -> Result<(), CliError> {
    let text = std::fs::read_to_string(&config).map_err(|e| CliError {
        code: EXIT_INPUT,
        message: format!("cannot read config: {e}"),
        hint: None,
    })?;
    let params = AnalysisParams::from_toml(&text).map_err(engine_err)?;
    eprintln!(
        "config OK: window {} days, target coverage {} days, transfer rule {}",
        params.window_days, params.target_coverage_days, params.transfer.rule
    );
    Ok(())
}

// ============================================================================
// Human summary
// ============================================================================

fn counts(map: &std::collections::BTreeMap<String, usize>) -> String {
    if map.is_empty() {
        return "-".to_string();
    }
    map.iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn render_summary(result: &AnalysisResult) -> String {
    let s = &result.summary;
    let m = &result.meta;
    let mut out = String::new();

    if result.is_empty() {
        out.push_str("no data: stock and sales snapshots are empty\n");
        return out;
    }

    let as_of = m.as_of.map(|d| d.to_string()).unwrap_or_else(|| "undated".to_string());
    out.push_str(&format!(
        "as of {as_of}, {}-day window: {} product(s), {} skipped row(s)\n",
        m.window_days, s.product_count, m.skipped_rows
    ));
    out.push_str(&format!(
        "inventory value {:.2}, revenue {:.2}, gross margin {:.2}\n",
        s.total_inventory_value, s.total_revenue, s.total_gross_margin
    ));
    out.push_str(&format!(
        "ABC: {}  XYZ: {}\n",
        counts(&s.abc_counts),
        counts(&s.xyz_counts)
    ));
    out.push_str(&format!("diagnostics: {}\n", counts(&s.diagnostic_counts)));

    let flagged: Vec<_> = result
        .products
        .iter()
        .filter(|p| p.diagnostic != Diagnostic::Healthy)
        .collect();
    for p in &flagged {
        out.push_str(&format!(
            "  {:<12} {:<28} {:<2} {:<26} coverage {:.1}d\n",
            p.product_id,
            p.product_name,
            p.strategic_class.to_string(),
            p.diagnostic.to_string(),
            p.coverage_days
        ));
    }

    out.push_str(&format!(
        "purchases: {} suggestion(s), estimated cost {:.2}\n",
        s.purchase_count, s.purchase_total_cost
    ));
    out.push_str(&format!(
        "transfers: {} suggestion(s), {} unit(s)\n",
        s.transfer_count, s.transfer_total_units
    ));
    out
}
