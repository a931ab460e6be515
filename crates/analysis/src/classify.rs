//! ABC (value) and XYZ (volatility) segmentation.
//!
//! ABC: rank by revenue descending, ties kept in input (`product_id`) order.
//! A is the longest prefix whose cumulative revenue share stays within
//! `a_max`; the product that pushes the share past `a_max` starts B. B runs
//! while the share stays within `b_max`; the rest is C. A product holding
//! all of the revenue is A, since it is the whole value base. A top product
//! that merely exceeds `a_max` on its own starts B like any other boundary
//! product. Zero total revenue makes every product C.
//!
//! XYZ: coefficient of variation = population std-dev of the product's
//! per-period units / mean per-period units across *all* products. The
//! denominator is the population mean, not the product's own mean. A product
//! that sold nothing has CV 0 (X).

use ordered_float::OrderedFloat;

use crate::config::{AbcThresholds, XyzThresholds};
use crate::model::{AbcClass, XyzClass};
use crate::ratio::ratio_or_zero;

/// Absorbs float noise in running sums (0.1 + 0.7 > 0.8).
const SHARE_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AbcAssignment {
    pub class: AbcClass,
    pub revenue_share: f64,
    pub cumulative_share: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct XyzAssignment {
    pub class: XyzClass,
    pub coefficient_of_variation: f64,
}

/// ABC class per product, returned in input order.
pub fn classify_abc(revenues: &[f64], thresholds: &AbcThresholds) -> Vec<AbcAssignment> {
    let counted: Vec<f64> = revenues
        .iter()
        .map(|r| if r.is_finite() { r.max(0.0) } else { 0.0 })
        .collect();
    let total: f64 = counted.iter().sum();

    let mut out = vec![
        AbcAssignment {
            class: AbcClass::C,
            revenue_share: 0.0,
            cumulative_share: 0.0,
        };
        revenues.len()
    ];
    if total <= 0.0 {
        return out;
    }

    // Stable sort: equal revenue keeps input order
    let mut ranked: Vec<usize> = (0..counted.len()).collect();
    ranked.sort_by_key(|&i| std::cmp::Reverse(OrderedFloat(counted[i])));

    let mut cumulative = 0.0;
    for (rank, &i) in ranked.iter().enumerate() {
        let share = ratio_or_zero(counted[i], total);
        cumulative += share;
        let class = if rank == 0 && share >= 1.0 - SHARE_EPSILON {
            AbcClass::A
        } else if cumulative <= thresholds.a_max + SHARE_EPSILON {
            AbcClass::A
        } else if cumulative <= thresholds.b_max + SHARE_EPSILON {
            AbcClass::B
        } else {
            AbcClass::C
        };
        out[i] = AbcAssignment {
            class,
            revenue_share: share,
            cumulative_share: cumulative.min(1.0),
        };
    }

    // Zero-revenue products never earn A/B even when they rank inside the prefix
    for (assignment, revenue) in out.iter_mut().zip(&counted) {
        if *revenue <= 0.0 {
            assignment.class = AbcClass::C;
        }
    }

    out
}

/// XYZ class per product series, returned in input order. Every series must
/// have the same number of periods.
pub fn classify_xyz(series: &[&[f64]], thresholds: &XyzThresholds) -> Vec<XyzAssignment> {
    let cells: usize = series.iter().map(|s| s.len()).sum();
    let grand_total: f64 = series.iter().flat_map(|s| s.iter()).sum();
    let population_mean = ratio_or_zero(grand_total, cells as f64);

    series
        .iter()
        .map(|s| {
            let cv = if s.iter().all(|u| *u == 0.0) {
                0.0
            } else {
                ratio_or_zero(population_std_dev(s), population_mean)
            };
            XyzAssignment {
                class: xyz_class(cv, thresholds),
                coefficient_of_variation: cv,
            }
        })
        .collect()
}

pub fn xyz_class(cv: f64, thresholds: &XyzThresholds) -> XyzClass {
    if cv <= thresholds.x_max {
        XyzClass::X
    } else if cv <= thresholds.y_max {
        XyzClass::Y
    } else {
        XyzClass::Z
    }
}

fn population_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classes(revenues: &[f64]) -> Vec<AbcClass> {
        classify_abc(revenues, &AbcThresholds::default())
            .into_iter()
            .map(|a| a.class)
            .collect()
    }

    #[test]
    fn pareto_split() {
        // Shares: 50, 30, 10, 5, 5 (%), in scrambled input order
        let revenues = [10.0, 50.0, 5.0, 30.0, 5.0];
        assert_eq!(
            classes(&revenues),
            vec![AbcClass::B, AbcClass::A, AbcClass::B, AbcClass::A, AbcClass::C]
        );
    }

    #[test]
    fn boundary_product_goes_to_b() {
        // 70% then 20% -> cumulative 90% crosses 80%, so the second is B
        let revenues = [70.0, 20.0, 10.0];
        let out = classify_abc(&revenues, &AbcThresholds::default());
        assert_eq!(out[0].class, AbcClass::A);
        assert_eq!(out[1].class, AbcClass::B);
        assert!((out[1].cumulative_share - 0.9).abs() < 1e-12);
        assert_eq!(out[2].class, AbcClass::C);
    }

    #[test]
    fn exact_threshold_stays_in_a() {
        let revenues = [50.0, 30.0, 15.0, 5.0];
        assert_eq!(
            classes(&revenues),
            vec![AbcClass::A, AbcClass::A, AbcClass::B, AbcClass::C]
        );
    }

    #[test]
    fn single_dominant_product_is_a() {
        assert_eq!(classes(&[100.0]), vec![AbcClass::A]);
        assert_eq!(classes(&[100.0, 0.0, 0.0]), vec![AbcClass::A, AbcClass::C, AbcClass::C]);
    }

    #[test]
    fn dominant_but_not_sole_product_is_b() {
        // 84% alone crosses 80%; only a product holding everything is forced into A
        let out = classify_abc(&[800.0, 100.0, 50.0], &AbcThresholds::default());
        assert_eq!(out[0].class, AbcClass::B);
        assert_eq!(out[1].class, AbcClass::B);
        assert_eq!(out[2].class, AbcClass::C);
    }

    #[test]
    fn zero_total_revenue_is_all_c() {
        assert_eq!(classes(&[0.0, 0.0]), vec![AbcClass::C, AbcClass::C]);
        assert_eq!(classes(&[]), Vec::<AbcClass>::new());
        // Negative revenue (returns) never counts toward the total
        assert_eq!(classes(&[-50.0]), vec![AbcClass::C]);
    }

    #[test]
    fn ties_resolve_in_input_order() {
        // Four equal products: 25, 50, 75 (A), 100 (C)
        let out = classes(&[1.0, 1.0, 1.0, 1.0]);
        assert_eq!(out, vec![AbcClass::A, AbcClass::A, AbcClass::A, AbcClass::C]);
    }

    #[test]
    fn zero_sales_is_x() {
        let a = [0.0, 0.0, 0.0];
        let b = [3.0, 3.0, 3.0];
        let out = classify_xyz(&[&a, &b], &XyzThresholds::default());
        assert_eq!(out[0].class, XyzClass::X);
        assert_eq!(out[0].coefficient_of_variation, 0.0);
        // Flat demand has zero spread
        assert_eq!(out[1].class, XyzClass::X);
    }

    #[test]
    fn cv_uses_population_mean() {
        // Population mean = (0+8+4+4)/4 = 4; std-dev of [0, 8] = 4 -> CV 1.0 (Y)
        // std-dev of [4, 4] = 0 -> X
        let a = [0.0, 8.0];
        let b = [4.0, 4.0];
        let out = classify_xyz(&[&a, &b], &XyzThresholds::default());
        assert!((out[0].coefficient_of_variation - 1.0).abs() < 1e-12);
        assert_eq!(out[0].class, XyzClass::Y);
        assert_eq!(out[1].class, XyzClass::X);
    }

    #[test]
    fn volatile_product_is_z() {
        // Population mean = 12/6 = 2; std-dev of [0, 0, 12] = 5.657 -> CV 2.83
        let a = [0.0, 0.0, 12.0];
        let b = [0.0, 0.0, 0.0];
        let out = classify_xyz(&[&a, &b], &XyzThresholds::default());
        assert_eq!(out[0].class, XyzClass::Z);
        assert!(out[0].coefficient_of_variation > 2.8);
    }

    #[test]
    fn xyz_thresholds_inclusive() {
        let t = XyzThresholds::default();
        assert_eq!(xyz_class(0.5, &t), XyzClass::X);
        assert_eq!(xyz_class(0.51, &t), XyzClass::Y);
        assert_eq!(xyz_class(1.0, &t), XyzClass::Y);
        assert_eq!(xyz_class(1.01, &t), XyzClass::Z);
    }
}
