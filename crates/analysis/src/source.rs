//! Record sources.
//!
//! The engine never fetches anything itself; a [`RecordSource`] is handed to
//! [`analyze_source`], which takes one owned snapshot and runs the analysis
//! over it.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::config::AnalysisParams;
use crate::engine::run;
use crate::error::AnalysisError;
use crate::model::{AnalysisInput, AnalysisResult, LocationInfo, ProductInfo, SalesRecord, StockRecord};

/// Raw retrieval of the input tables. No business logic.
pub trait RecordSource {
    fn fetch_stock(&self) -> Result<Vec<StockRecord>, AnalysisError>;

    fn fetch_sales(&self) -> Result<Vec<SalesRecord>, AnalysisError>;

    fn fetch_products(&self) -> Result<Vec<ProductInfo>, AnalysisError> {
        Ok(Vec::new())
    }

    fn fetch_locations(&self) -> Result<Vec<LocationInfo>, AnalysisError> {
        Ok(Vec::new())
    }

    /// All four tables as one owned snapshot.
    fn fetch_snapshot(&self) -> Result<AnalysisInput, AnalysisError> {
        Ok(AnalysisInput {
            stock: self.fetch_stock()?,
            sales: self.fetch_sales()?,
            products: self.fetch_products()?,
            locations: self.fetch_locations()?,
        })
    }
}

/// An in-memory snapshot is its own source.
impl RecordSource for AnalysisInput {
    fn fetch_stock(&self) -> Result<Vec<StockRecord>, AnalysisError> {
        Ok(self.stock.clone())
    }

    fn fetch_sales(&self) -> Result<Vec<SalesRecord>, AnalysisError> {
        Ok(self.sales.clone())
    }

    fn fetch_products(&self) -> Result<Vec<ProductInfo>, AnalysisError> {
        Ok(self.products.clone())
    }

    fn fetch_locations(&self) -> Result<Vec<LocationInfo>, AnalysisError> {
        Ok(self.locations.clone())
    }

    fn fetch_snapshot(&self) -> Result<AnalysisInput, AnalysisError> {
        Ok(self.clone())
    }
}

/// Caches the wrapped source's snapshot for `ttl`.
///
/// Every fetch returns an independent clone of the cached tables, so callers
/// can never observe each other's edits.
pub struct CachedSource<S> {
    inner: S,
    ttl: Duration,
    cached: Mutex<Option<(Instant, AnalysisInput)>>,
}

impl<S: RecordSource> CachedSource<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            cached: Mutex::new(None),
        }
    }

    /// Drop the cached snapshot; the next fetch goes to the inner source.
    pub fn invalidate(&self) {
        if let Ok(mut guard) = self.cached.lock() {
            *guard = None;
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn snapshot(&self) -> Result<AnalysisInput, AnalysisError> {
        let mut guard = self
            .cached
            .lock()
            .map_err(|_| AnalysisError::Source("snapshot cache lock poisoned".into()))?;
        if let Some((fetched_at, snapshot)) = guard.as_ref() {
            if fetched_at.elapsed() < self.ttl {
                return Ok(snapshot.clone());
            }
            log::debug!("cached snapshot expired after {:?}", self.ttl);
        }
        let fresh = self.inner.fetch_snapshot()?;
        *guard = Some((Instant::now(), fresh.clone()));
        Ok(fresh)
    }
}

impl<S: RecordSource> RecordSource for CachedSource<S> {
    fn fetch_stock(&self) -> Result<Vec<StockRecord>, AnalysisError> {
        Ok(self.snapshot()?.stock)
    }

    fn fetch_sales(&self) -> Result<Vec<SalesRecord>, AnalysisError> {
        Ok(self.snapshot()?.sales)
    }

    fn fetch_products(&self) -> Result<Vec<ProductInfo>, AnalysisError> {
        Ok(self.snapshot()?.products)
    }

    fn fetch_locations(&self) -> Result<Vec<LocationInfo>, AnalysisError> {
        Ok(self.snapshot()?.locations)
    }

    fn fetch_snapshot(&self) -> Result<AnalysisInput, AnalysisError> {
        self.snapshot()
    }
}

/// Fetch one snapshot from `source` and analyze it.
pub fn analyze_source(source: &dyn RecordSource, params: &AnalysisParams) -> Result<AnalysisResult, AnalysisError> {
    params.validate()?;
    let input = source.fetch_snapshot()?;
    log::debug!(
        "fetched {} stock row(s), {} sales row(s), {} product(s), {} location(s)",
        input.stock.len(),
        input.sales.len(),
        input.products.len(),
        input.locations.len()
    );
    run(params, &input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct Counting {
        fetches: Cell<usize>,
    }

    impl RecordSource for Counting {
        fn fetch_stock(&self) -> Result<Vec<StockRecord>, AnalysisError> {
            self.fetches.set(self.fetches.get() + 1);
            Ok(vec![StockRecord {
                product_id: Some("P1".into()),
                quantity: Some(3.0),
                ..Default::default()
            }])
        }

        fn fetch_sales(&self) -> Result<Vec<SalesRecord>, AnalysisError> {
            Ok(Vec::new())
        }
    }

    struct Broken;

    impl RecordSource for Broken {
        fn fetch_stock(&self) -> Result<Vec<StockRecord>, AnalysisError> {
            Err(AnalysisError::Source("connection refused".into()))
        }

        fn fetch_sales(&self) -> Result<Vec<SalesRecord>, AnalysisError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn snapshot_source_round_trip() {
        let input = AnalysisInput {
            stock: vec![StockRecord {
                product_id: Some("P1".into()),
                quantity: Some(1.0),
                ..Default::default()
            }],
            ..Default::default()
        };
        let result = analyze_source(&input, &AnalysisParams::default()).unwrap();
        assert_eq!(result.products.len(), 1);
        assert!(input.fetch_products().unwrap().is_empty());
    }

    #[test]
    fn cache_serves_within_ttl() {
        let cached = CachedSource::new(
            Counting {
                fetches: Cell::new(0),
            },
            Duration::from_secs(3600),
        );
        cached.fetch_snapshot().unwrap();
        cached.fetch_stock().unwrap();
        cached.fetch_sales().unwrap();
        assert_eq!(cached.inner().fetches.get(), 1);

        cached.invalidate();
        cached.fetch_stock().unwrap();
        assert_eq!(cached.inner().fetches.get(), 2);
    }

    #[test]
    fn zero_ttl_always_refetches() {
        let cached = CachedSource::new(
            Counting {
                fetches: Cell::new(0),
            },
            Duration::ZERO,
        );
        cached.fetch_stock().unwrap();
        cached.fetch_stock().unwrap();
        assert_eq!(cached.inner().fetches.get(), 2);
    }

    #[test]
    fn cached_copies_are_independent() {
        let cached = CachedSource::new(
            Counting {
                fetches: Cell::new(0),
            },
            Duration::from_secs(3600),
        );
        let mut first = cached.fetch_stock().unwrap();
        first[0].quantity = Some(999.0);
        let second = cached.fetch_stock().unwrap();
        assert_eq!(second[0].quantity, Some(3.0));
    }

    #[test]
    fn source_errors_propagate() {
        let err = analyze_source(&Broken, &AnalysisParams::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::Source(_)));
    }

    #[test]
    fn params_checked_before_fetch() {
        let params = AnalysisParams {
            window_days: 0,
            ..Default::default()
        };
        let err = analyze_source(&Broken, &params).unwrap_err();
        assert!(matches!(err, AnalysisError::Parameter(_)));
    }
}
