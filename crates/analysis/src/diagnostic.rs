//! Diagnostic state machine.
//!
//! An ordered table of (predicate, outcome) rules evaluated top to bottom;
//! the first rule that holds decides the diagnostic and later rules are not
//! consulted. Table order is part of the contract: a product matching several
//! rules gets the earliest one. No rule matching means `Healthy`.

use crate::config::DiagnosticThresholds;
use crate::model::{AbcClass as A, Diagnostic, StrategicClass, XyzClass as X};

/// The facts a diagnostic is a pure function of.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiagnosticInput {
    pub strategic_class: StrategicClass,
    pub coverage_days: f64,
    pub quantity_on_hand: f64,
    pub units_sold: f64,
}

type Predicate = fn(&DiagnosticInput, &DiagnosticThresholds) -> bool;

pub struct Rule {
    pub outcome: Diagnostic,
    pub description: &'static str,
    predicate: Predicate,
}

impl Rule {
    pub fn matches(&self, input: &DiagnosticInput, thresholds: &DiagnosticThresholds) -> bool {
        (self.predicate)(input, thresholds)
    }
}

const URGENT_CLASSES: [StrategicClass; 3] = [
    StrategicClass::new(A::A, X::X),
    StrategicClass::new(A::A, X::Y),
    StrategicClass::new(A::B, X::X),
];

const REVIEW_CLASSES: [StrategicClass; 3] = [
    StrategicClass::new(A::A, X::Z),
    StrategicClass::new(A::B, X::Y),
    StrategicClass::new(A::C, X::X),
];

const LIQUIDATE_CLASSES: [StrategicClass; 2] = [
    StrategicClass::new(A::C, X::Z),
    StrategicClass::new(A::C, X::Y),
];

fn is_stockout(i: &DiagnosticInput, _: &DiagnosticThresholds) -> bool {
    i.quantity_on_hand <= 0.0 && i.units_sold > 0.0
}

fn is_urgent_buy(i: &DiagnosticInput, t: &DiagnosticThresholds) -> bool {
    URGENT_CLASSES.contains(&i.strategic_class) && i.coverage_days < t.urgent_buy_days
}

fn needs_review(i: &DiagnosticInput, t: &DiagnosticThresholds) -> bool {
    REVIEW_CLASSES.contains(&i.strategic_class) && i.coverage_days < t.review_days
}

fn should_liquidate(i: &DiagnosticInput, t: &DiagnosticThresholds) -> bool {
    LIQUIDATE_CLASSES.contains(&i.strategic_class) && i.coverage_days > t.liquidate_days
}

fn is_obsolete(i: &DiagnosticInput, t: &DiagnosticThresholds) -> bool {
    i.coverage_days > t.obsolete_days
}

/// Priority order, highest first.
pub const RULES: [Rule; 5] = [
    Rule {
        outcome: Diagnostic::Stockout,
        description: "no stock on hand while the product is selling",
        predicate: is_stockout,
    },
    Rule {
        outcome: Diagnostic::HighRiskUrgentBuy,
        description: "AX/AY/BX with coverage below urgent_buy_days",
        predicate: is_urgent_buy,
    },
    Rule {
        outcome: Diagnostic::MediumRiskReview,
        description: "AZ/BY/CX with coverage below review_days",
        predicate: needs_review,
    },
    Rule {
        outcome: Diagnostic::CriticalExcessLiquidate,
        description: "CZ/CY with coverage above liquidate_days",
        predicate: should_liquidate,
    },
    Rule {
        outcome: Diagnostic::ObsoleteInventory,
        description: "coverage above obsolete_days",
        predicate: is_obsolete,
    },
];

pub fn diagnose(input: &DiagnosticInput, thresholds: &DiagnosticThresholds) -> Diagnostic {
    RULES
        .iter()
        .find(|rule| rule.matches(input, thresholds))
        .map(|rule| rule.outcome)
        .unwrap_or(Diagnostic::Healthy)
}
