//! `stocksight-analysis`: inventory intelligence engine.
//!
//! Pure engine crate: receives stock and sales snapshots, returns per-product
//! metrics, ABC/XYZ segmentation, diagnostics, and purchase and transfer
//! suggestions. CSV is parsed from strings; no file or network IO.

pub mod aggregate;
pub mod classify;
pub mod config;
pub mod diagnostic;
pub mod engine;
pub mod error;
pub mod loader;
pub mod metrics;
pub mod model;
pub mod purchase;
pub mod ratio;
pub mod source;
pub mod summary;
pub mod transfer;

pub use config::AnalysisParams;
pub use engine::{run, run_analysis};
pub use error::AnalysisError;
pub use model::{
    AnalysisInput, AnalysisResult, Diagnostic, LocationInfo, ProductInfo, ProductMetric, PurchaseSuggestion,
    SalesRecord, StockRecord, TransferSuggestion,
};
pub use source::{analyze_source, CachedSource, RecordSource};
