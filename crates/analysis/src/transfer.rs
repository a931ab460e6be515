//! Inter-location transfer suggestions.
//!
//! Best-effort heuristic, not an optimization. For each product its
//! locations are split into excess and shortage lists, both in `location_id`
//! order, and paired greedily: first excess with first shortage, second with
//! second, and so on. Leftovers on either side stay unpaired. The proposed
//! quantity is a fixed fraction of the source's surplus over its local
//! target, rounded down to whole units. No claim of balance or minimality is
//! made; the fixed iteration order is what makes the output repeatable.

use std::collections::BTreeMap;

use crate::config::{TransferConfig, TransferRule};
use crate::model::{LocationMetric, ProductMetric, TransferSuggestion};
use crate::ratio::ratio_or_zero;

struct Excess<'a> {
    location: &'a LocationMetric,
    local_target: f64,
    quantity: f64,
}

pub fn suggest_transfers(
    products: &[ProductMetric],
    locations: &[LocationMetric],
    config: &TransferConfig,
    target_coverage_days: i64,
) -> Vec<TransferSuggestion> {
    let mut by_product: BTreeMap<&str, Vec<&LocationMetric>> = BTreeMap::new();
    for loc in locations {
        by_product.entry(loc.product_id.as_str()).or_default().push(loc);
    }
    for locs in by_product.values_mut() {
        locs.sort_by(|a, b| a.location_id.cmp(&b.location_id));
    }

    let mut out = Vec::new();
    for product in products {
        let Some(locs) = by_product.get(product.product_id.as_str()) else {
            continue;
        };
        if locs.len() < 2 {
            continue;
        }

        let (excess, shortage) = match config.rule {
            TransferRule::MeanMultiple => partition_by_mean(locs, config),
            TransferRule::CoverageDays => {
                if product.daily_sale_rate <= 0.0 {
                    continue;
                }
                partition_by_coverage(locs, config, target_coverage_days)
            }
        };

        for (src, dst) in excess.iter().zip(shortage.iter()) {
            out.push(TransferSuggestion {
                product_id: product.product_id.clone(),
                product_name: product.product_name.clone(),
                source_location: src.location.location_id.clone(),
                destination_location: dst.location_id.clone(),
                suggested_quantity: src.quantity,
                reason: reason(src, dst, config.rule),
            });
        }
    }

    if !out.is_empty() {
        log::debug!("{} transfer suggestion(s) via {}", out.len(), config.rule);
    }
    out
}

/// Excess: above `excess_multiple` x mean per-location stock; target is the
/// mean. Shortage: nothing on hand.
fn partition_by_mean<'a>(
    locs: &[&'a LocationMetric],
    config: &TransferConfig,
) -> (Vec<Excess<'a>>, Vec<&'a LocationMetric>) {
    let total: f64 = locs.iter().map(|l| l.quantity).sum();
    let mean = ratio_or_zero(total, locs.len() as f64);

    let mut excess = Vec::new();
    let mut shortage = Vec::new();
    for &loc in locs {
        if loc.quantity <= 0.0 {
            shortage.push(loc);
        } else if mean > 0.0 && loc.quantity > config.excess_multiple * mean {
            push_excess(&mut excess, loc, mean, config.fraction);
        }
    }
    (excess, shortage)
}

/// Excess: location coverage above `excess_coverage_days`; target is
/// `target_coverage_days` worth of the location's demand. Shortage: nothing
/// on hand, or coverage below `shortage_coverage_days`.
fn partition_by_coverage<'a>(
    locs: &[&'a LocationMetric],
    config: &TransferConfig,
    target_coverage_days: i64,
) -> (Vec<Excess<'a>>, Vec<&'a LocationMetric>) {
    let mut excess = Vec::new();
    let mut shortage = Vec::new();
    for &loc in locs {
        if loc.quantity <= 0.0 || loc.coverage_days < config.shortage_coverage_days {
            shortage.push(loc);
        } else if loc.coverage_days > config.excess_coverage_days {
            let local_target = loc.daily_sale_rate * target_coverage_days as f64;
            push_excess(&mut excess, loc, local_target, config.fraction);
        }
    }
    (excess, shortage)
}

fn push_excess<'a>(
    excess: &mut Vec<Excess<'a>>,
    location: &'a LocationMetric,
    local_target: f64,
    fraction: f64,
) {
    let surplus = location.quantity - local_target;
    let quantity = (surplus * fraction).floor();
    if quantity >= 1.0 {
        excess.push(Excess {
            location,
            local_target,
            quantity,
        });
    }
}

fn reason(src: &Excess<'_>, dst: &LocationMetric, rule: TransferRule) -> String {
    let source = format!(
        "{} holds {} vs local target {:.1}",
        src.location.location_name, src.location.quantity, src.local_target
    );
    let destination = if dst.quantity <= 0.0 {
        format!("{} is out of stock", dst.location_name)
    } else {
        format!("{} covers {:.1} days", dst.location_name, dst.coverage_days)
    };
    format!("{source}; {destination} ({rule})")
}
